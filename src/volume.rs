//! The in-memory decode of one binary volume: every record in stream order
//! plus the derived hierarchy (station → channel → response/comment) and the
//! dictionary index.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::blockette::{
    Blockette, ChannelComment, ChannelIdentifier, StationComment, StationIdentifier,
    VolumeIdentifier,
};
use crate::error::{FormatError, FormatErrorKind};

#[derive(Debug, Clone)]
struct StationEntry {
    record: usize,
    comments: Vec<usize>,
    channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone)]
struct ChannelEntry {
    record: usize,
    comments: Vec<usize>,
    responses: Vec<usize>,
}

/// One decoded volume. Built once, then only read; `all()` preserves the
/// original record stream order.
#[derive(Debug, Clone)]
pub struct Volume {
    records: Vec<Blockette>,
    stations: Vec<StationEntry>,
    dictionary: HashMap<(u16, u16), usize>,
    referenced: HashSet<(u16, u16)>,
}

impl Volume {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[Blockette] {
        &self.records
    }

    pub fn volume_identifier(&self) -> Option<&VolumeIdentifier> {
        self.records.iter().find_map(|b| match b {
            Blockette::VolumeIdentifier(v) => Some(v),
            _ => None,
        })
    }

    pub fn stations(&self) -> impl Iterator<Item = StationRef<'_>> {
        self.stations
            .iter()
            .map(move |entry| StationRef { volume: self, entry })
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Dictionary lookup; absent keys are the caller's policy decision.
    pub fn dictionary_entry(&self, blockette_type: u16, key: u16) -> Option<&Blockette> {
        self.dictionary
            .get(&(blockette_type, key))
            .map(|&i| &self.records[i])
    }

    /// The descriptive text of a dictionary entry, without reassembly.
    pub fn dictionary_text(&self, blockette_type: u16, key: u16) -> Option<&str> {
        match self.dictionary_entry(blockette_type, key)? {
            Blockette::DataFormat(b) => Some(&b.name),
            Blockette::CommentDescription(b) => Some(&b.description),
            Blockette::GenericAbbreviation(b) => Some(&b.description),
            Blockette::UnitAbbreviation(b) => Some(&b.name),
            _ => None,
        }
    }

    /// Whether some record references this dictionary key directly.
    /// Unreferenced entries are continuations of split text.
    pub fn is_referenced(&self, blockette_type: u16, key: u16) -> bool {
        self.referenced.contains(&(blockette_type, key))
    }
}

/// A station record together with its owned comments and channels.
#[derive(Clone, Copy)]
pub struct StationRef<'a> {
    volume: &'a Volume,
    entry: &'a StationEntry,
}

impl<'a> StationRef<'a> {
    pub fn record(&self) -> &'a StationIdentifier {
        match &self.volume.records[self.entry.record] {
            Blockette::StationIdentifier(s) => s,
            _ => unreachable!("station entry indexes a station identifier"),
        }
    }

    pub fn comments(&self) -> Vec<&'a StationComment> {
        self.entry
            .comments
            .iter()
            .map(|&i| match &self.volume.records[i] {
                Blockette::StationComment(c) => c,
                _ => unreachable!("comment entry indexes a station comment"),
            })
            .collect()
    }

    pub fn channels(&self) -> Vec<ChannelRef<'a>> {
        self.entry
            .channels
            .iter()
            .map(|entry| ChannelRef {
                volume: self.volume,
                entry,
            })
            .collect()
    }
}

/// A channel record together with its comments and response records.
#[derive(Clone, Copy)]
pub struct ChannelRef<'a> {
    volume: &'a Volume,
    entry: &'a ChannelEntry,
}

impl<'a> ChannelRef<'a> {
    pub fn record(&self) -> &'a ChannelIdentifier {
        match &self.volume.records[self.entry.record] {
            Blockette::ChannelIdentifier(c) => c,
            _ => unreachable!("channel entry indexes a channel identifier"),
        }
    }

    pub fn comments(&self) -> Vec<&'a ChannelComment> {
        self.entry
            .comments
            .iter()
            .map(|&i| match &self.volume.records[i] {
                Blockette::ChannelComment(c) => c,
                _ => unreachable!("comment entry indexes a channel comment"),
            })
            .collect()
    }

    /// All response records of the channel in stream order.
    pub fn response_records(&self) -> Vec<&'a Blockette> {
        self.entry
            .responses
            .iter()
            .map(|&i| &self.volume.records[i])
            .collect()
    }

    /// Response records grouped by stage number, ascending. Stage 0 holds
    /// the overall sensitivity and never materializes as a stage.
    pub fn response_stages(&self) -> BTreeMap<u8, Vec<&'a Blockette>> {
        let mut stages: BTreeMap<u8, Vec<&Blockette>> = BTreeMap::new();
        for record in self.response_records() {
            let stage = record.stage().unwrap_or(0);
            if stage == 0 {
                continue;
            }
            stages.entry(stage).or_default().push(record);
        }
        stages
    }

    pub fn response_stage(&self, number: u8) -> Option<Vec<&'a Blockette>> {
        if number == 0 {
            return None;
        }
        self.response_stages().remove(&number)
    }
}

/// Append-only constructor for a `Volume`. Records arrive in stream order;
/// ownership is tracked with a cursor over the current station and channel.
#[derive(Debug, Default)]
pub struct VolumeBuilder {
    records: Vec<Blockette>,
    stations: Vec<StationEntry>,
    dictionary: HashMap<(u16, u16), usize>,
    referenced: HashSet<(u16, u16)>,
}

impl VolumeBuilder {
    pub fn new() -> Self {
        VolumeBuilder::default()
    }

    /// Appends a control record.
    pub fn control(&mut self, record: Blockette) {
        self.records.push(record);
    }

    /// Appends a dictionary record; false when its key is already taken.
    pub fn dictionary(&mut self, record: Blockette) -> bool {
        let type_code = record.type_code();
        let key = match record.dictionary_key() {
            Some(key) => key,
            None => return false,
        };
        if let Blockette::CommentDescription(c) = &record {
            self.reference(34, c.units_key);
        }
        let index = self.records.len();
        self.records.push(record);
        self.dictionary.insert((type_code, key), index).is_none()
    }

    pub fn station(&mut self, record: StationIdentifier) {
        self.reference(33, record.network_key);
        let index = self.records.len();
        self.records.push(Blockette::StationIdentifier(record));
        self.stations.push(StationEntry {
            record: index,
            comments: Vec::new(),
            channels: Vec::new(),
        });
    }

    pub fn station_comment(&mut self, record: StationComment) -> bool {
        self.reference(31, record.key);
        let index = self.records.len();
        match self.stations.last_mut() {
            Some(station) => {
                self.records.push(Blockette::StationComment(record));
                station.comments.push(index);
                true
            }
            None => false,
        }
    }

    pub fn channel(&mut self, record: ChannelIdentifier) -> bool {
        self.reference(33, record.instrument_key);
        self.reference(34, record.signal_units_key);
        self.reference(34, record.calibration_units_key);
        self.reference(30, record.format_key);
        let index = self.records.len();
        match self.stations.last_mut() {
            Some(station) => {
                self.records.push(Blockette::ChannelIdentifier(record));
                station.channels.push(ChannelEntry {
                    record: index,
                    comments: Vec::new(),
                    responses: Vec::new(),
                });
                true
            }
            None => false,
        }
    }

    pub fn channel_comment(&mut self, record: ChannelComment) -> bool {
        self.reference(31, record.key);
        let index = self.records.len();
        let channel = match self.stations.last_mut().and_then(|s| s.channels.last_mut()) {
            Some(channel) => channel,
            None => return false,
        };
        self.records.push(Blockette::ChannelComment(record));
        channel.comments.push(index);
        true
    }

    pub fn response(&mut self, record: Blockette) -> bool {
        debug_assert!(record.is_response());
        for key in response_unit_keys(&record) {
            self.reference(34, key);
        }
        let index = self.records.len();
        let channel = match self.stations.last_mut().and_then(|s| s.channels.last_mut()) {
            Some(channel) => channel,
            None => return false,
        };
        self.records.push(record);
        channel.responses.push(index);
        true
    }

    /// Decode-path dispatch; enforces ownership and key uniqueness with
    /// errors located at `offset`.
    pub fn push(&mut self, record: Blockette, offset: usize) -> Result<(), FormatError> {
        let type_code = record.type_code();
        let stray = |kind| FormatError::new(kind, offset, type_code);
        match record {
            Blockette::VolumeIdentifier(_)
            | Blockette::StationIndex(_)
            | Blockette::TimeSpanIndex(_) => {
                self.control(record);
                Ok(())
            }
            Blockette::DataFormat(_)
            | Blockette::CommentDescription(_)
            | Blockette::GenericAbbreviation(_)
            | Blockette::UnitAbbreviation(_) => {
                let key = record.dictionary_key().unwrap_or(0);
                if self.dictionary(record) {
                    Ok(())
                } else {
                    Err(stray(FormatErrorKind::DuplicateKey { key }))
                }
            }
            Blockette::StationIdentifier(s) => {
                self.station(s);
                Ok(())
            }
            Blockette::StationComment(c) => {
                if self.station_comment(c) {
                    Ok(())
                } else {
                    Err(stray(FormatErrorKind::StrayRecord))
                }
            }
            Blockette::ChannelIdentifier(c) => {
                if self.channel(c) {
                    Ok(())
                } else {
                    Err(stray(FormatErrorKind::StrayRecord))
                }
            }
            Blockette::ChannelComment(c) => {
                if self.channel_comment(c) {
                    Ok(())
                } else {
                    Err(stray(FormatErrorKind::StrayRecord))
                }
            }
            other => {
                if self.response(other) {
                    Ok(())
                } else {
                    Err(stray(FormatErrorKind::StrayRecord))
                }
            }
        }
    }

    pub fn finish(self) -> Volume {
        Volume {
            records: self.records,
            stations: self.stations,
            dictionary: self.dictionary,
            referenced: self.referenced,
        }
    }

    fn reference(&mut self, blockette_type: u16, key: u16) {
        // key 0 is the conventional "no entry" value
        if key != 0 {
            self.referenced.insert((blockette_type, key));
        }
    }
}

fn response_unit_keys(record: &Blockette) -> Vec<u16> {
    match record {
        Blockette::PolesZeros(b) => vec![b.input_units_key, b.output_units_key],
        Blockette::Coefficients(b) => vec![b.input_units_key, b.output_units_key],
        Blockette::FirResponse(b) => vec![b.input_units_key, b.output_units_key],
        Blockette::Polynomial(b) => vec![b.input_units_key, b.output_units_key],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockette::{Gain, Polynomial};

    fn gain(stage: u8) -> Blockette {
        Blockette::Gain(Gain {
            stage,
            value: 1.0,
            frequency: 0.2,
            history: Vec::new(),
        })
    }

    fn polynomial(stage: u8) -> Blockette {
        Blockette::Polynomial(Polynomial {
            function_type: 'P',
            stage,
            input_units_key: 0,
            output_units_key: 0,
            approximation_type: 'M',
            frequency_unit: 'B',
            lower_frequency: 0.0,
            upper_frequency: 10.0,
            lower_bound: 0.0,
            upper_bound: 0.0,
            max_error: 0.0,
            coefficients: Vec::new(),
        })
    }

    fn station(code: &str) -> StationIdentifier {
        StationIdentifier {
            code: code.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            elevation: 0.0,
            channel_count: 1,
            comment_count: 0,
            site_name: String::new(),
            network_key: 0,
            word_order_32: "3210".to_string(),
            word_order_16: "10".to_string(),
            start: None,
            end: None,
            update_flag: 'N',
            network_code: "XX".to_string(),
        }
    }

    fn channel(code: &str) -> ChannelIdentifier {
        ChannelIdentifier {
            location: String::new(),
            code: code.to_string(),
            subchannel: 0,
            instrument_key: 0,
            optional_comment: String::new(),
            signal_units_key: 0,
            calibration_units_key: 0,
            latitude: 0.0,
            longitude: 0.0,
            elevation: 0.0,
            depth: 0.0,
            azimuth: 0.0,
            dip: 0.0,
            format_key: 0,
            record_length: 12,
            sample_rate: 20.0,
            clock_drift: 0.0,
            comment_count: 0,
            flags: "G".to_string(),
            start: None,
            end: None,
            update_flag: 'N',
        }
    }

    #[test]
    fn stage_zero_never_materializes() {
        let mut builder = VolumeBuilder::new();
        builder.station(station("TST"));
        assert!(builder.channel(channel("BHZ")));
        assert!(builder.response(gain(0)));
        assert!(builder.response(polynomial(1)));
        let volume = builder.finish();

        let stations: Vec<_> = volume.stations().collect();
        let channels = stations[0].channels();
        assert!(channels[0].response_stage(0).is_none());
        let stage_one = channels[0].response_stage(1).unwrap();
        assert_eq!(stage_one.len(), 1);
        assert_eq!(stage_one[0].type_code(), 62);
        assert_eq!(channels[0].response_stages().len(), 1);
    }

    #[test]
    fn stray_records_are_rejected() {
        let mut builder = VolumeBuilder::new();
        assert!(!builder.station_comment(StationComment {
            start: None,
            end: None,
            key: 1,
            level: 0,
        }));
        assert!(!builder.channel(channel("BHZ")));
        assert!(!builder.response(gain(1)));
    }
}
