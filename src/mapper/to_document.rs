//! Binary→document mapping: walk the volume hierarchy, dereference every
//! dictionary key inline, and group response records into numbered stages.

use crate::abbrev;
use crate::blockette::Blockette;
use crate::document::{
    Channel, CoefBlock, Comment, DecimationBlock, DocumentOptions, FirBlock, GainBlock, Network,
    PolynomialBlock, PzBlock, StageBlock, Station, StationDocument, Stage,
};
use crate::volume::{ChannelRef, StationRef, Volume};

/// Builds a document tree from a volume. Never fails: unresolved dictionary
/// references surface as absent text, not as errors.
pub fn to_document(volume: &Volume, options: &DocumentOptions) -> StationDocument {
    let mut doc = StationDocument::default();
    if let Some(header) = volume.volume_identifier() {
        doc.source = header.organization.clone();
        doc.created = header.volume_time;
    }
    if let Some(org) = &options.organization {
        doc.source = match &options.label {
            Some(label) => format!("{} - {}", org, label),
            None => org.clone(),
        };
    }

    for station in volume.stations() {
        let code = station.record().network_code.clone();
        let network = match doc.networks.iter_mut().find(|n| n.code == code) {
            Some(network) => network,
            None => {
                doc.networks.push(Network {
                    code,
                    description: abbrev::resolve(volume, 33, station.record().network_key),
                    ..Network::default()
                });
                doc.networks.last_mut().unwrap()
            }
        };
        network.stations.push(map_station(volume, station));
    }
    doc
}

fn map_station(volume: &Volume, station: StationRef<'_>) -> Station {
    let record = station.record();
    Station {
        code: record.code.clone(),
        latitude: record.latitude,
        longitude: record.longitude,
        elevation: record.elevation,
        site_name: record.site_name.clone(),
        start: record.start,
        end: record.end,
        comments: station
            .comments()
            .iter()
            .map(|c| Comment {
                text: abbrev::resolve(volume, 31, c.key).unwrap_or_default(),
                start: c.start,
                end: c.end,
            })
            .collect(),
        channels: station
            .channels()
            .into_iter()
            .map(|c| map_channel(volume, c))
            .collect(),
    }
}

fn map_channel(volume: &Volume, channel: ChannelRef<'_>) -> Channel {
    let record = channel.record();
    Channel {
        code: record.code.clone(),
        location: record.location.clone(),
        latitude: record.latitude,
        longitude: record.longitude,
        elevation: record.elevation,
        depth: record.depth,
        azimuth: record.azimuth,
        dip: record.dip,
        sample_rate: record.sample_rate,
        clock_drift: record.clock_drift,
        flags: record.flags.clone(),
        sensor_description: abbrev::resolve(volume, 33, record.instrument_key),
        calibration_units: abbrev::resolve(volume, 34, record.calibration_units_key),
        start: record.start,
        end: record.end,
        comments: channel
            .comments()
            .iter()
            .map(|c| Comment {
                text: abbrev::resolve(volume, 31, c.key).unwrap_or_default(),
                start: c.start,
                end: c.end,
            })
            .collect(),
        stages: channel
            .response_stages()
            .into_iter()
            .map(|(number, records)| Stage {
                number,
                blocks: records
                    .into_iter()
                    .map(|r| map_block(volume, r))
                    .collect(),
            })
            .collect(),
    }
}

fn map_block(volume: &Volume, record: &Blockette) -> StageBlock {
    let units = |key| abbrev::resolve(volume, 34, key);
    match record {
        Blockette::PolesZeros(b) => StageBlock::PolesZeros(PzBlock {
            function_type: b.function_type,
            input_units: units(b.input_units_key),
            output_units: units(b.output_units_key),
            normalization: b.normalization,
            normalization_frequency: b.normalization_frequency,
            zeros: b.zeros.clone(),
            poles: b.poles.clone(),
        }),
        Blockette::Coefficients(b) => StageBlock::Coefficients(CoefBlock {
            response_type: b.response_type,
            input_units: units(b.input_units_key),
            output_units: units(b.output_units_key),
            numerators: b.numerators.clone(),
            denominators: b.denominators.clone(),
        }),
        Blockette::Decimation(b) => StageBlock::Decimation(DecimationBlock {
            input_sample_rate: b.input_sample_rate,
            factor: b.factor,
            offset: b.offset,
            delay: b.delay,
            correction: b.correction,
        }),
        Blockette::Gain(b) => StageBlock::Gain(GainBlock {
            value: b.value,
            frequency: b.frequency,
        }),
        Blockette::FirResponse(b) => StageBlock::Fir(FirBlock {
            name: b.name.clone(),
            symmetry: b.symmetry,
            input_units: units(b.input_units_key),
            output_units: units(b.output_units_key),
            coefficients: b.coefficients.clone(),
        }),
        Blockette::Polynomial(b) => StageBlock::Polynomial(PolynomialBlock {
            approximation_type: b.approximation_type,
            input_units: units(b.input_units_key),
            output_units: units(b.output_units_key),
            lower_frequency: b.lower_frequency,
            upper_frequency: b.upper_frequency,
            lower_bound: b.lower_bound,
            upper_bound: b.upper_bound,
            max_error: b.max_error,
            coefficients: b.coefficients.clone(),
        }),
        other => unreachable!("non-response record {:03} in a stage", other.type_code()),
    }
}
