use crate::blockette::{Blockette, Coefficient, ComplexValue, Gain};
use crate::convert::{decode_volume, encode_volume};
use crate::document::{
    Channel, CoefBlock, Comment, DecimationBlock, DocumentOptions, FirBlock, GainBlock, Network,
    PolynomialBlock, PzBlock, Station, StationDocument, Stage, StageBlock,
};
use crate::error::{ConvertError, FormatErrorKind};
use crate::field::SeedTime;
use crate::mapper::{to_document, to_volume};
use crate::volume::{Volume, VolumeBuilder};
use crate::xml::{read_document, write_document};

fn time(s: &str) -> Option<SeedTime> {
    Some(SeedTime::parse(s).unwrap())
}

fn channel(code: &str) -> Channel {
    Channel {
        code: code.to_string(),
        location: "00".to_string(),
        latitude: 34.9459,
        longitude: -106.4572,
        elevation: 1850.0,
        depth: 100.0,
        azimuth: 0.0,
        dip: -90.0,
        sample_rate: 20.0,
        clock_drift: 0.0,
        flags: "CG".to_string(),
        start: time("1989,241"),
        ..Channel::default()
    }
}

fn anmo_document() -> StationDocument {
    StationDocument {
        source: "IRIS DMC".to_string(),
        created: time("2004,032,12:30:07"),
        networks: vec![Network {
            code: "IU".to_string(),
            description: Some("Global Seismograph Network".to_string()),
            stations: vec![
                Station {
                    code: "ANMO".to_string(),
                    latitude: 34.9459,
                    longitude: -106.457199,
                    elevation: 1850.0,
                    site_name: "Albuquerque, New Mexico, USA".to_string(),
                    start: time("1989,241"),
                    end: time("1995,195"),
                    comments: vec![
                        Comment {
                            text: "Station is within the New Mexico quiet zone".to_string(),
                            start: time("1989,241"),
                            end: None,
                        },
                        Comment {
                            text: "Vault temperature is regulated".to_string(),
                            start: None,
                            end: None,
                        },
                        Comment {
                            text: "Site relocated from the original tunnel".to_string(),
                            start: None,
                            end: None,
                        },
                    ],
                    channels: vec![
                        channel("BHZ"),
                        channel("BHN"),
                        channel("BHE"),
                        channel("LHZ"),
                        channel("LHN"),
                    ],
                },
                Station {
                    code: "COLA".to_string(),
                    latitude: 64.873599,
                    longitude: -147.8616,
                    elevation: 200.0,
                    site_name: "College Outpost, Alaska, USA".to_string(),
                    start: time("1996,300"),
                    channels: vec![channel("BHZ")],
                    ..Station::default()
                },
            ],
            ..Network::default()
        }],
        ..StationDocument::default()
    }
}

fn bcip_volume() -> Volume {
    let doc = StationDocument {
        source: "CU".to_string(),
        networks: vec![Network {
            code: "CU".to_string(),
            description: Some("Caribbean USGS Network".to_string()),
            stations: vec![Station {
                code: "BCIP".to_string(),
                latitude: 9.166539,
                longitude: -79.8366,
                elevation: 61.0,
                site_name: "Isla Barro Colorado, Panama".to_string(),
                start: time("2007,178"),
                channels: ["VMU", "VMV", "VMW"]
                    .iter()
                    .map(|code| {
                        let mut c = channel(code);
                        c.stages = vec![Stage {
                            number: 1,
                            blocks: vec![StageBlock::Polynomial(PolynomialBlock {
                                approximation_type: 'M',
                                input_units: Some("V".to_string()),
                                output_units: Some("COUNTS".to_string()),
                                lower_frequency: 0.0,
                                upper_frequency: 0.05,
                                lower_bound: 0.0,
                                upper_bound: 10.0,
                                max_error: 0.0,
                                coefficients: vec![
                                    Coefficient {
                                        value: -2.5,
                                        error: 0.0,
                                    },
                                    Coefficient {
                                        value: 6.5,
                                        error: 0.0,
                                    },
                                ],
                            })],
                        }];
                        c
                    })
                    .collect(),
                ..Station::default()
            }],
            ..Network::default()
        }],
        ..StationDocument::default()
    };
    to_volume(&doc)
}

#[test]
fn anmo_station_record_encodes_exactly() {
    let volume = to_volume(&anmo_document());
    let record = volume
        .all()
        .iter()
        .find(|b| matches!(b, Blockette::StationIdentifier(s) if s.code == "ANMO"))
        .unwrap();
    assert_eq!(
        record.encode(),
        "0500134ANMO +34.945900-106.457199+1850.00005003\
         Albuquerque, New Mexico, USA~001321010\
         1989,241,00:00:00.0000~1995,195,00:00:00.0000~NIU"
    );
}

#[test]
fn volume_header_carries_earliest_station_start() {
    let volume = to_volume(&anmo_document());
    let header = volume.volume_identifier().unwrap();
    assert_eq!(header.version, "02.4");
    assert_eq!(header.organization, "IRIS DMC");
    assert_eq!(
        header.begin.unwrap().to_seed_string(),
        "1989,241,00:00:00.0000"
    );
    let index = volume
        .all()
        .iter()
        .find_map(|b| match b {
            Blockette::StationIndex(i) => Some(i),
            _ => None,
        })
        .unwrap();
    assert_eq!(index.entries.len(), 2);
    assert_eq!(index.entries[0].code, "ANMO");
    assert!(index.entries[0].sequence < index.entries[1].sequence);
}

#[test]
fn binary_round_trip_preserves_document() {
    let doc = anmo_document();
    let volume = to_volume(&doc);

    let mut bytes = Vec::new();
    encode_volume(&volume, &mut bytes).unwrap();
    let decoded = decode_volume(&mut bytes.as_slice()).unwrap();

    let restored = to_document(&decoded, &DocumentOptions::default());
    assert_eq!(restored, doc);

    // the binary form is stable across a second pass
    let mut again = Vec::new();
    encode_volume(&to_volume(&restored), &mut again).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn trailing_record_padding_is_tolerated() {
    let volume = to_volume(&anmo_document());
    let mut bytes = Vec::new();
    encode_volume(&volume, &mut bytes).unwrap();
    bytes.extend_from_slice(b"      ");
    let decoded = decode_volume(&mut bytes.as_slice()).unwrap();
    assert_eq!(decoded.len(), volume.len());
}

#[test]
fn non_ascii_input_is_rejected() {
    let mut bytes = b"0100054".to_vec();
    bytes.push(0xff);
    match decode_volume(&mut bytes.as_slice()) {
        Err(ConvertError::Format(e)) => {
            assert!(matches!(e.kind, FormatErrorKind::NotAscii));
            assert_eq!(e.offset, 7);
        }
        Err(other) => panic!("expected a format error, got {}", other),
        Ok(_) => panic!("expected a format error"),
    }
}

#[test]
fn bcip_channels_group_into_single_stages() {
    let doc = to_document(&bcip_volume(), &DocumentOptions::default());
    assert_eq!(doc.networks.len(), 1);
    let station = &doc.networks[0].stations[0];
    assert_eq!(station.code, "BCIP");
    let codes: Vec<_> = station.channels.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, ["VMU", "VMV", "VMW"]);
    for channel in &station.channels {
        assert_eq!(channel.stages.len(), 1);
        assert_eq!(channel.stages[0].number, 1);
        assert_eq!(channel.stages[0].blocks.len(), 1);
        assert!(matches!(
            channel.stages[0].blocks[0],
            StageBlock::Polynomial(_)
        ));
    }
}

#[test]
fn stage_zero_sensitivity_never_becomes_a_stage() {
    let anmo = to_volume(&anmo_document());
    let station = anmo
        .all()
        .iter()
        .find_map(|b| match b {
            Blockette::StationIdentifier(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap();
    let chan = anmo
        .all()
        .iter()
        .find_map(|b| match b {
            Blockette::ChannelIdentifier(c) => Some(c.clone()),
            _ => None,
        })
        .unwrap();

    let mut builder = VolumeBuilder::new();
    builder.station(station);
    assert!(builder.channel(chan));
    assert!(builder.response(Blockette::Gain(Gain {
        stage: 0,
        value: 1.2e9,
        frequency: 0.02,
        history: Vec::new(),
    })));
    assert!(builder.response(Blockette::Gain(Gain {
        stage: 1,
        value: 1500.0,
        frequency: 0.02,
        history: Vec::new(),
    })));
    let volume = builder.finish();

    let doc = to_document(&volume, &DocumentOptions::default());
    let stages = &doc.networks[0].stations[0].channels[0].stages;
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].number, 1);
}

#[test]
fn long_comment_text_splits_across_dictionary_keys() {
    let station_text = "s".repeat(91);
    let channel_text = "c".repeat(93);
    let mut doc = anmo_document();
    doc.networks[0].stations[0].comments = vec![Comment {
        text: station_text.clone(),
        start: None,
        end: None,
    }];
    doc.networks[0].stations[0].channels[0].comments = vec![Comment {
        text: channel_text.clone(),
        start: None,
        end: None,
    }];
    let volume = to_volume(&doc);

    assert_eq!(volume.dictionary_text(31, 1).unwrap().len(), 70);
    assert_eq!(volume.dictionary_text(31, 2).unwrap().len(), 21);
    assert_eq!(volume.dictionary_text(31, 3).unwrap().len(), 70);
    assert_eq!(volume.dictionary_text(31, 4).unwrap().len(), 23);
    assert!(volume.is_referenced(31, 1));
    assert!(!volume.is_referenced(31, 2));

    let mut bytes = Vec::new();
    encode_volume(&volume, &mut bytes).unwrap();
    let restored = to_document(
        &decode_volume(&mut bytes.as_slice()).unwrap(),
        &DocumentOptions::default(),
    );
    assert_eq!(
        restored.networks[0].stations[0].comments[0].text,
        station_text
    );
    assert_eq!(
        restored.networks[0].stations[0].channels[0].comments[0].text,
        channel_text
    );
}

#[test]
fn identical_comment_text_shares_one_key() {
    let mut doc = anmo_document();
    let shared = Comment {
        text: "Recording interrupted for maintenance".to_string(),
        start: None,
        end: None,
    };
    doc.networks[0].stations[0].comments = vec![shared.clone()];
    doc.networks[0].stations[1].comments = vec![shared];
    let volume = to_volume(&doc);

    let keys: Vec<_> = volume
        .all()
        .iter()
        .filter_map(|b| match b {
            Blockette::StationComment(c) => Some(c.key),
            _ => None,
        })
        .collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
    let entries = volume
        .all()
        .iter()
        .filter(|b| matches!(b, Blockette::CommentDescription(_)))
        .count();
    assert_eq!(entries, 1);
}

#[test]
fn dictionary_key_overflow_is_rejected_on_encode() {
    // 1000 distinct unit names need a 4-digit key; B034 keys carry 3
    let mut doc = anmo_document();
    doc.networks[0].stations[0].channels = (0..1000)
        .map(|i| {
            let mut c = channel("BHZ");
            c.calibration_units = Some(format!("UNIT{:04}", i));
            c
        })
        .collect();
    let volume = to_volume(&doc);

    let mut sink = Vec::new();
    match encode_volume(&volume, &mut sink) {
        Err(ConvertError::Format(e)) => {
            assert_eq!(e.blockette_type, 34);
            assert!(matches!(
                e.kind,
                FormatErrorKind::KeyOverflow {
                    key: 1000,
                    max: 999
                }
            ));
        }
        Err(other) => panic!("expected a format error, got {}", other),
        Ok(_) => panic!("expected a format error"),
    }
}

#[test]
fn organization_option_overrides_source() {
    let volume = to_volume(&anmo_document());
    let doc = to_document(
        &volume,
        &DocumentOptions {
            organization: Some("ASL".to_string()),
            label: Some("rebuild".to_string()),
        },
    );
    assert_eq!(doc.source, "ASL - rebuild");
    let plain = to_document(&volume, &DocumentOptions::default());
    assert_eq!(plain.source, "IRIS DMC");
}

#[test]
fn xml_round_trip_preserves_document() {
    let mut doc = anmo_document();
    // exercise the remaining stage block kinds through the markup
    doc.networks[0].stations[0].channels[0].sensor_description =
        Some("Streckeisen STS-1".to_string());
    doc.networks[0].stations[0].channels[0].calibration_units = Some("V".to_string());
    doc.networks[0].stations[0].channels[0].stages = vec![
        Stage {
            number: 1,
            blocks: vec![
                StageBlock::PolesZeros(PzBlock {
                    function_type: 'A',
                    input_units: Some("M/S".to_string()),
                    output_units: Some("V".to_string()),
                    normalization: 3948.58,
                    normalization_frequency: 0.02,
                    zeros: vec![ComplexValue {
                        real: 0.0,
                        imaginary: 0.0,
                        real_error: 0.0,
                        imaginary_error: 0.0,
                    }],
                    poles: vec![ComplexValue {
                        real: -0.01234,
                        imaginary: 0.01234,
                        real_error: 0.0,
                        imaginary_error: 0.0,
                    }],
                }),
                StageBlock::Gain(GainBlock {
                    value: 2400.0,
                    frequency: 0.02,
                }),
            ],
        },
        Stage {
            number: 2,
            blocks: vec![
                StageBlock::Coefficients(CoefBlock {
                    response_type: 'D',
                    input_units: Some("V".to_string()),
                    output_units: Some("COUNTS".to_string()),
                    numerators: vec![Coefficient {
                        value: 1.0,
                        error: 0.0,
                    }],
                    denominators: Vec::new(),
                }),
                StageBlock::Decimation(DecimationBlock {
                    input_sample_rate: 5120.0,
                    factor: 16,
                    offset: 0,
                    delay: 0.0015,
                    correction: 0.0015,
                }),
                StageBlock::Fir(FirBlock {
                    name: "FIR_LP16".to_string(),
                    symmetry: 'B',
                    input_units: Some("COUNTS".to_string()),
                    output_units: Some("COUNTS".to_string()),
                    coefficients: vec![0.25, 0.5, 0.25],
                }),
            ],
        },
    ];

    let mut out = Vec::new();
    write_document(&doc, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("<FDSNStationXML"));
    assert!(text.contains("schemaVersion=\"1.1\""));

    let restored = read_document(&text).unwrap();
    assert_eq!(restored, doc);
}

#[test]
fn xml_parse_errors_carry_position() {
    let err = read_document("<FDSNStationXML><Source>x</Sender>").unwrap_err();
    assert!(err.line >= 1);
    assert!(err.column > 1);
    assert!(!err.message.is_empty());
}

#[test]
fn unknown_xml_elements_are_skipped() {
    let text = r#"<?xml version="1.0"?>
<FDSNStationXML xmlns="http://www.fdsn.org/xml/station/1" schemaVersion="1.1">
  <Source>TEST</Source>
  <ModuleURI>http://example.org/converter</ModuleURI>
  <Network code="XX">
    <TotalNumberStations>1</TotalNumberStations>
    <Station code="AAAA" startDate="2007-06-27T00:00:00">
      <Latitude>9.166539</Latitude>
      <Longitude>-79.8366</Longitude>
      <Elevation>61</Elevation>
      <Site><Name>Somewhere</Name><Country>Panama</Country></Site>
      <CreationDate>2007-06-27T00:00:00</CreationDate>
    </Station>
  </Network>
</FDSNStationXML>"#;
    let doc = read_document(text).unwrap();
    assert_eq!(doc.source, "TEST");
    assert_eq!(doc.station_count(), 1);
    let station = &doc.networks[0].stations[0];
    assert_eq!(station.code, "AAAA");
    assert_eq!(station.latitude, 9.166539);
    assert_eq!(station.site_name, "Somewhere");
    assert_eq!(
        station.start.unwrap().to_seed_string(),
        "2007,178,00:00:00.0000"
    );
}

#[test]
fn station_count_is_idempotent_across_conversions() {
    let doc = anmo_document();
    let once = to_document(&to_volume(&doc), &DocumentOptions::default());
    assert_eq!(once.station_count(), doc.station_count());
    let twice = to_document(&to_volume(&once), &DocumentOptions::default());
    assert_eq!(twice.station_count(), doc.station_count());
}

#[test]
fn polynomial_round_trips_through_binary() {
    let volume = bcip_volume();
    let mut bytes = Vec::new();
    encode_volume(&volume, &mut bytes).unwrap();
    let decoded = decode_volume(&mut bytes.as_slice()).unwrap();
    let record = decoded
        .all()
        .iter()
        .find_map(|b| match b {
            Blockette::Polynomial(p) => Some(p),
            _ => None,
        })
        .unwrap();
    assert_eq!(record.stage, 1);
    assert_eq!(record.function_type, 'P');
    assert_eq!(record.approximation_type, 'M');
    assert_eq!(record.coefficients.len(), 2);
    assert_eq!(record.coefficients[0].value, -2.5);
    assert_eq!(record.coefficients[1].value, 6.5);
}
