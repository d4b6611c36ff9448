//! Document→binary mapping: rebuild station/channel records, allocate
//! dictionary entries for every piece of shared text, and emit the volume
//! control records.

use crate::abbrev::KeyAllocator;
use crate::blockette::{
    Blockette, ChannelComment, ChannelIdentifier, Coefficients, CommentDescription, Decimation,
    FirResponse, Gain, GenericAbbreviation, PolesZeros, Polynomial, StationComment,
    StationIdentifier, StationIndex, StationIndexEntry, UnitAbbreviation, VolumeIdentifier,
};
use crate::document::{Channel, Station, StationDocument, StageBlock};
use crate::volume::{Volume, VolumeBuilder};

const FORMAT_VERSION: &str = "02.4";
const LOGICAL_RECORD_LENGTH: u32 = 12;
const WORD_ORDER_32: &str = "3210";
const WORD_ORDER_16: &str = "10";

/// Builds a volume from a document tree. Dictionary keys are allocated
/// fresh per call; identical text deduplicates onto one key.
pub fn to_volume(doc: &StationDocument) -> Volume {
    let mut mapper = Mapper {
        alloc: KeyAllocator::new(),
        dictionary: Vec::new(),
    };

    // station sections first so every dictionary entry they need exists
    let mut sections: Vec<Vec<Blockette>> = Vec::new();
    let mut codes: Vec<String> = Vec::new();
    for network in &doc.networks {
        let description = network.description.as_deref().unwrap_or(&network.code);
        let network_key = mapper.abbreviation(description);
        for station in &network.stations {
            codes.push(station.code.clone());
            sections.push(mapper.station_section(station, &network.code, network_key));
        }
    }

    let header = Blockette::VolumeIdentifier(VolumeIdentifier {
        version: FORMAT_VERSION.to_string(),
        record_length: LOGICAL_RECORD_LENGTH,
        begin: doc
            .networks
            .iter()
            .flat_map(|n| n.stations.iter())
            .filter_map(|s| s.start)
            .min(),
        end: None,
        volume_time: doc.created,
        organization: doc.source.clone(),
        label: String::new(),
    });

    // each index entry points at its station's 1-based record ordinal
    let mut entries = Vec::with_capacity(sections.len());
    let mut ordinal = 2 + mapper.dictionary.len() as u32;
    for (code, section) in codes.iter().zip(&sections) {
        ordinal += 1;
        entries.push(StationIndexEntry {
            code: code.clone(),
            sequence: ordinal,
        });
        ordinal += section.len() as u32 - 1;
    }
    let index = Blockette::StationIndex(StationIndex { entries });

    let mut builder = VolumeBuilder::new();
    builder.control(header);
    builder.control(index);
    for record in mapper.dictionary {
        let fresh = builder.dictionary(record);
        debug_assert!(fresh, "allocator assigns unique keys");
    }
    for section in sections {
        for record in section {
            let placed = builder.push(record, 0).is_ok();
            debug_assert!(placed, "sections are pushed in hierarchical order");
        }
    }
    builder.finish()
}

struct Mapper {
    alloc: KeyAllocator,
    dictionary: Vec<Blockette>,
}

impl Mapper {
    /// Generic abbreviation (blockette 33) for network or instrument text.
    fn abbreviation(&mut self, text: &str) -> u16 {
        let (key, chunks) = self.alloc.assign(33, text);
        for (i, chunk) in chunks.into_iter().enumerate() {
            self.dictionary
                .push(Blockette::GenericAbbreviation(GenericAbbreviation {
                    key: key + i as u16,
                    description: chunk,
                }));
        }
        key
    }

    /// Units abbreviation (blockette 34); unit names never split.
    fn units(&mut self, name: &str) -> u16 {
        let (key, chunks) = self.alloc.assign(34, name);
        for chunk in chunks {
            self.dictionary
                .push(Blockette::UnitAbbreviation(UnitAbbreviation {
                    key,
                    name: chunk,
                    description: String::new(),
                }));
        }
        key
    }

    fn opt_units(&mut self, name: &Option<String>) -> u16 {
        match name {
            Some(name) => self.units(name),
            None => 0,
        }
    }

    /// Comment description (blockette 31), split over consecutive keys when
    /// the text exceeds the field width.
    fn comment_text(&mut self, text: &str, class_code: char) -> u16 {
        let (key, chunks) = self.alloc.assign(31, text);
        for (i, chunk) in chunks.into_iter().enumerate() {
            self.dictionary
                .push(Blockette::CommentDescription(CommentDescription {
                    key: key + i as u16,
                    class_code,
                    description: chunk,
                    units_key: 0,
                }));
        }
        key
    }

    fn station_section(
        &mut self,
        station: &Station,
        network_code: &str,
        network_key: u16,
    ) -> Vec<Blockette> {
        let mut section = Vec::new();
        section.push(Blockette::StationIdentifier(StationIdentifier {
            code: station.code.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            elevation: station.elevation,
            channel_count: station.channels.len() as u16,
            comment_count: station.comments.len() as u16,
            site_name: station.site_name.clone(),
            network_key,
            word_order_32: WORD_ORDER_32.to_string(),
            word_order_16: WORD_ORDER_16.to_string(),
            start: station.start,
            end: station.end,
            update_flag: 'N',
            network_code: network_code.to_string(),
        }));
        for comment in &station.comments {
            section.push(Blockette::StationComment(StationComment {
                start: comment.start,
                end: comment.end,
                key: self.comment_text(&comment.text, 'S'),
                level: 0,
            }));
        }
        for channel in &station.channels {
            self.channel_section(channel, &mut section);
        }
        section
    }

    fn channel_section(&mut self, channel: &Channel, section: &mut Vec<Blockette>) {
        let signal_units_key = channel
            .stages
            .first()
            .and_then(|stage| stage.blocks.first())
            .map_or(0, |block| self.opt_units(block_input_units(block)));
        section.push(Blockette::ChannelIdentifier(ChannelIdentifier {
            location: channel.location.clone(),
            code: channel.code.clone(),
            subchannel: 0,
            instrument_key: match &channel.sensor_description {
                Some(text) => self.abbreviation(text),
                None => 0,
            },
            optional_comment: String::new(),
            signal_units_key,
            calibration_units_key: self.opt_units(&channel.calibration_units),
            latitude: channel.latitude,
            longitude: channel.longitude,
            elevation: channel.elevation,
            depth: channel.depth,
            azimuth: channel.azimuth,
            dip: channel.dip,
            format_key: 0,
            record_length: LOGICAL_RECORD_LENGTH,
            sample_rate: channel.sample_rate,
            clock_drift: channel.clock_drift,
            comment_count: channel.comments.len() as u16,
            flags: channel.flags.clone(),
            start: channel.start,
            end: channel.end,
            update_flag: 'N',
        }));
        for comment in &channel.comments {
            section.push(Blockette::ChannelComment(ChannelComment {
                start: comment.start,
                end: comment.end,
                key: self.comment_text(&comment.text, 'C'),
                level: 0,
            }));
        }
        // stages renumber from 1 in document order; 0 stays reserved
        for (i, stage) in channel.stages.iter().enumerate() {
            let number = (i + 1) as u8;
            for block in &stage.blocks {
                section.push(self.block_record(block, number));
            }
        }
    }

    fn block_record(&mut self, block: &StageBlock, stage: u8) -> Blockette {
        match block {
            StageBlock::PolesZeros(b) => Blockette::PolesZeros(PolesZeros {
                function_type: b.function_type,
                stage,
                input_units_key: self.opt_units(&b.input_units),
                output_units_key: self.opt_units(&b.output_units),
                normalization: b.normalization,
                normalization_frequency: b.normalization_frequency,
                zeros: b.zeros.clone(),
                poles: b.poles.clone(),
            }),
            StageBlock::Coefficients(b) => Blockette::Coefficients(Coefficients {
                response_type: b.response_type,
                stage,
                input_units_key: self.opt_units(&b.input_units),
                output_units_key: self.opt_units(&b.output_units),
                numerators: b.numerators.clone(),
                denominators: b.denominators.clone(),
            }),
            StageBlock::Decimation(b) => Blockette::Decimation(Decimation {
                stage,
                input_sample_rate: b.input_sample_rate,
                factor: b.factor,
                offset: b.offset,
                delay: b.delay,
                correction: b.correction,
            }),
            StageBlock::Gain(b) => Blockette::Gain(Gain {
                stage,
                value: b.value,
                frequency: b.frequency,
                history: Vec::new(),
            }),
            StageBlock::Fir(b) => Blockette::FirResponse(FirResponse {
                stage,
                name: b.name.clone(),
                symmetry: b.symmetry,
                input_units_key: self.opt_units(&b.input_units),
                output_units_key: self.opt_units(&b.output_units),
                coefficients: b.coefficients.clone(),
            }),
            StageBlock::Polynomial(b) => Blockette::Polynomial(Polynomial {
                function_type: 'P',
                stage,
                input_units_key: self.opt_units(&b.input_units),
                output_units_key: self.opt_units(&b.output_units),
                approximation_type: b.approximation_type,
                frequency_unit: 'B',
                lower_frequency: b.lower_frequency,
                upper_frequency: b.upper_frequency,
                lower_bound: b.lower_bound,
                upper_bound: b.upper_bound,
                max_error: b.max_error,
                coefficients: b.coefficients.clone(),
            }),
        }
    }
}

fn block_input_units(block: &StageBlock) -> &Option<String> {
    match block {
        StageBlock::PolesZeros(b) => &b.input_units,
        StageBlock::Coefficients(b) => &b.input_units,
        StageBlock::Fir(b) => &b.input_units,
        StageBlock::Polynomial(b) => &b.input_units,
        StageBlock::Decimation(_) | StageBlock::Gain(_) => &None,
    }
}
