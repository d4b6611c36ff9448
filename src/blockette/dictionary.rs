//! Dictionary records: shared descriptive text referenced from station and
//! channel records by an integer lookup key, unique per type per volume.

use crate::error::FormatError;
use crate::field::{fmt_int, push_variable, FieldReader};

/// Blockette 30: data format dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFormat {
    pub name: String,
    pub key: u16,
    pub family: u16,
    pub decoder_keys: Vec<String>,
}

impl DataFormat {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        let name = r.variable(50)?;
        let key = r.int(4)? as u16;
        let family = r.int(3)? as u16;
        let count = r.int(2)?;
        let mut decoder_keys = Vec::with_capacity(count as usize);
        for _ in 0..count {
            decoder_keys.push(r.variable(9999)?);
        }
        Ok(DataFormat {
            name,
            key,
            family,
            decoder_keys,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        push_variable(out, &self.name);
        out.push_str(&fmt_int(u32::from(self.key), 4));
        out.push_str(&fmt_int(u32::from(self.family), 3));
        out.push_str(&fmt_int(self.decoder_keys.len() as u32, 2));
        for key in &self.decoder_keys {
            push_variable(out, key);
        }
    }
}

/// Blockette 31: comment description. Maximum description width; longer
/// comment text spans several entries on consecutive keys.
pub const COMMENT_TEXT_WIDTH: usize = 70;

#[derive(Debug, Clone, PartialEq)]
pub struct CommentDescription {
    pub key: u16,
    pub class_code: char,
    pub description: String,
    pub units_key: u16,
}

impl CommentDescription {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(CommentDescription {
            key: r.int(4)? as u16,
            class_code: r.flag()?,
            description: r.variable(COMMENT_TEXT_WIDTH)?,
            units_key: r.int(3)? as u16,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(u32::from(self.key), 4));
        out.push(self.class_code);
        push_variable(out, &self.description);
        out.push_str(&fmt_int(u32::from(self.units_key), 3));
    }
}

/// Maximum description width for blockettes 33 and 34.
pub const ABBREVIATION_TEXT_WIDTH: usize = 50;

/// Blockette 33: generic abbreviation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericAbbreviation {
    pub key: u16,
    pub description: String,
}

impl GenericAbbreviation {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(GenericAbbreviation {
            key: r.int(3)? as u16,
            description: r.variable(ABBREVIATION_TEXT_WIDTH)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(u32::from(self.key), 3));
        push_variable(out, &self.description);
    }
}

/// Blockette 34: units abbreviation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitAbbreviation {
    pub key: u16,
    pub name: String,
    pub description: String,
}

impl UnitAbbreviation {
    pub fn decode(r: &mut FieldReader) -> Result<Self, FormatError> {
        Ok(UnitAbbreviation {
            key: r.int(3)? as u16,
            name: r.variable(20)?,
            description: r.variable(ABBREVIATION_TEXT_WIDTH)?,
        })
    }

    pub fn encode_body(&self, out: &mut String) {
        out.push_str(&fmt_int(u32::from(self.key), 3));
        push_variable(out, &self.name);
        push_variable(out, &self.description);
    }
}
