//! Volume-level control records: the volume identifier and the station and
//! time-span indexes.

use crate::error::FormatError;
use crate::field::{fmt_alpha, fmt_int, push_time, push_variable, FieldReader, SeedTime};

/// Blockette 10: volume identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeIdentifier {
    pub version: String,
    /// Logical record length as a power-of-two exponent.
    pub record_length: u32,
    pub begin: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub volume_time: Option<SeedTime>,
    pub organization: String,
    pub label: String,
}

impl VolumeIdentifier {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(VolumeIdentifier {
            version: r.alpha(4)?,
            record_length: r.int(2)?,
            begin: r.time()?,
            end: r.time()?,
            volume_time: r.time()?,
            organization: r.variable(80)?,
            label: r.variable(80)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_alpha(&self.version, 4));
        out.push_str(&fmt_int(self.record_length, 2));
        push_time(out, &self.begin);
        push_time(out, &self.end);
        push_time(out, &self.volume_time);
        push_variable(out, &self.organization);
        push_variable(out, &self.label);
    }
}

/// Blockette 11: volume station header index.
#[derive(Debug, Clone, PartialEq)]
pub struct StationIndex {
    pub entries: Vec<StationIndexEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationIndexEntry {
    pub code: String,
    pub sequence: u32,
}

impl StationIndex {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let count = r.int(3)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(StationIndexEntry {
                code: r.alpha(5)?,
                sequence: r.int(6)?,
            });
        }
        Ok(StationIndex { entries })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(self.entries.len() as u32, 3));
        for entry in &self.entries {
            out.push_str(&fmt_alpha(&entry.code, 5));
            out.push_str(&fmt_int(entry.sequence, 6));
        }
    }
}

/// Blockette 12: volume time span index.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSpanIndex {
    pub spans: Vec<TimeSpanEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSpanEntry {
    pub begin: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub sequence: u32,
}

impl TimeSpanIndex {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let count = r.int(4)?;
        let mut spans = Vec::with_capacity(count as usize);
        for _ in 0..count {
            spans.push(TimeSpanEntry {
                begin: r.time()?,
                end: r.time()?,
                sequence: r.int(6)?,
            });
        }
        Ok(TimeSpanIndex { spans })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(self.spans.len() as u32, 4));
        for span in &self.spans {
            push_time(out, &span.begin);
            push_time(out, &span.end);
            out.push_str(&fmt_int(span.sequence, 6));
        }
    }
}
