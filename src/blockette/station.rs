//! Station-level records: station identity, channel identity, and the
//! comment records that reference the comment dictionary.

use crate::error::FormatError;
use crate::field::{
    fmt_alpha, fmt_decimal, fmt_exponential, fmt_int, push_time, push_variable, FieldReader,
    SeedTime,
};

/// Blockette 50: station identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StationIdentifier {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub channel_count: u16,
    pub comment_count: u16,
    pub site_name: String,
    /// Lookup key of the generic abbreviation describing the network.
    pub network_key: u16,
    pub word_order_32: String,
    pub word_order_16: String,
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub update_flag: char,
    pub network_code: String,
}

impl StationIdentifier {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(StationIdentifier {
            code: r.alpha(5)?,
            latitude: r.decimal(10)?,
            longitude: r.decimal(11)?,
            elevation: r.decimal(7)?,
            channel_count: r.int(4)? as u16,
            comment_count: r.int(3)? as u16,
            site_name: r.variable(60)?,
            network_key: r.int(3)? as u16,
            word_order_32: r.alpha(4)?,
            word_order_16: r.alpha(2)?,
            start: r.time()?,
            end: r.time()?,
            update_flag: r.flag()?,
            network_code: r.alpha(2)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_alpha(&self.code, 5));
        out.push_str(&fmt_decimal(self.latitude, 2, 6, true));
        out.push_str(&fmt_decimal(self.longitude, 3, 6, true));
        out.push_str(&fmt_decimal(self.elevation, 4, 1, true));
        out.push_str(&fmt_int(u32::from(self.channel_count), 4));
        out.push_str(&fmt_int(u32::from(self.comment_count), 3));
        push_variable(out, &self.site_name);
        out.push_str(&fmt_int(u32::from(self.network_key), 3));
        out.push_str(&fmt_alpha(&self.word_order_32, 4));
        out.push_str(&fmt_alpha(&self.word_order_16, 2));
        push_time(out, &self.start);
        push_time(out, &self.end);
        out.push(self.update_flag);
        out.push_str(&fmt_alpha(&self.network_code, 2));
    }
}

/// Blockette 51: station comment; the text itself lives in the comment
/// dictionary under `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct StationComment {
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub key: u16,
    pub level: u32,
}

impl StationComment {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(StationComment {
            start: r.time()?,
            end: r.time()?,
            key: r.int(4)? as u16,
            level: r.int(6)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        push_time(out, &self.start);
        push_time(out, &self.end);
        out.push_str(&fmt_int(u32::from(self.key), 4));
        out.push_str(&fmt_int(self.level, 6));
    }
}

/// Blockette 52: channel identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelIdentifier {
    pub location: String,
    pub code: String,
    pub subchannel: u16,
    pub instrument_key: u16,
    pub optional_comment: String,
    pub signal_units_key: u16,
    pub calibration_units_key: u16,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub depth: f64,
    pub azimuth: f64,
    pub dip: f64,
    pub format_key: u16,
    pub record_length: u32,
    pub sample_rate: f64,
    pub clock_drift: f64,
    pub comment_count: u16,
    pub flags: String,
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub update_flag: char,
}

impl ChannelIdentifier {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(ChannelIdentifier {
            location: r.alpha(2)?,
            code: r.alpha(3)?,
            subchannel: r.int(4)? as u16,
            instrument_key: r.int(3)? as u16,
            optional_comment: r.variable(30)?,
            signal_units_key: r.int(3)? as u16,
            calibration_units_key: r.int(3)? as u16,
            latitude: r.decimal(10)?,
            longitude: r.decimal(11)?,
            elevation: r.decimal(7)?,
            depth: r.decimal(5)?,
            azimuth: r.decimal(5)?,
            dip: r.decimal(5)?,
            format_key: r.int(4)? as u16,
            record_length: r.int(2)?,
            sample_rate: r.exponential(10)?,
            clock_drift: r.exponential(10)?,
            comment_count: r.int(4)? as u16,
            flags: r.variable(26)?,
            start: r.time()?,
            end: r.time()?,
            update_flag: r.flag()?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_alpha(&self.location, 2));
        out.push_str(&fmt_alpha(&self.code, 3));
        out.push_str(&fmt_int(u32::from(self.subchannel), 4));
        out.push_str(&fmt_int(u32::from(self.instrument_key), 3));
        push_variable(out, &self.optional_comment);
        out.push_str(&fmt_int(u32::from(self.signal_units_key), 3));
        out.push_str(&fmt_int(u32::from(self.calibration_units_key), 3));
        out.push_str(&fmt_decimal(self.latitude, 2, 6, true));
        out.push_str(&fmt_decimal(self.longitude, 3, 6, true));
        out.push_str(&fmt_decimal(self.elevation, 4, 1, true));
        out.push_str(&fmt_decimal(self.depth, 3, 1, false));
        out.push_str(&fmt_decimal(self.azimuth, 3, 1, false));
        out.push_str(&fmt_decimal(self.dip, 2, 1, true));
        out.push_str(&fmt_int(u32::from(self.format_key), 4));
        out.push_str(&fmt_int(self.record_length, 2));
        out.push_str(&fmt_exponential(self.sample_rate, 4, false));
        out.push_str(&fmt_exponential(self.clock_drift, 4, false));
        out.push_str(&fmt_int(u32::from(self.comment_count), 4));
        push_variable(out, &self.flags);
        push_time(out, &self.start);
        push_time(out, &self.end);
        out.push(self.update_flag);
    }
}

/// Blockette 59: channel comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelComment {
    pub start: Option<SeedTime>,
    pub end: Option<SeedTime>,
    pub key: u16,
    pub level: u32,
}

impl ChannelComment {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(ChannelComment {
            start: r.time()?,
            end: r.time()?,
            key: r.int(4)? as u16,
            level: r.int(6)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        push_time(out, &self.start);
        push_time(out, &self.end);
        out.push_str(&fmt_int(u32::from(self.key), 4));
        out.push_str(&fmt_int(self.level, 6));
    }
}
