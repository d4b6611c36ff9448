//! The record codec: one typed struct per supported blockette, a shared
//! `Blockette` sum type, and strict decode/encode dispatch.
//!
//! Every record starts with a 3-digit type tag and a 4-digit total length
//! (header included). Decode refuses unknown types and records whose fields
//! do not span exactly the declared length; encode recomputes the length
//! from the body so `encode(decode(bytes)) == bytes` for every record that
//! decoded successfully.

mod control;
mod dictionary;
mod response;
mod station;

pub use control::{StationIndex, StationIndexEntry, TimeSpanEntry, TimeSpanIndex, VolumeIdentifier};
pub use dictionary::{
    CommentDescription, DataFormat, GenericAbbreviation, UnitAbbreviation,
    ABBREVIATION_TEXT_WIDTH, COMMENT_TEXT_WIDTH,
};
pub use response::{
    Coefficient, Coefficients, ComplexValue, Decimation, FirResponse, Gain, GainHistory,
    PolesZeros, Polynomial,
};
pub use station::{ChannelComment, ChannelIdentifier, StationComment, StationIdentifier};

use crate::error::{FormatError, FormatErrorKind};
use crate::field::{FieldReader, RECORD_HEADER_WIDTH};

#[derive(Debug, Clone, PartialEq)]
pub enum Blockette {
    VolumeIdentifier(VolumeIdentifier),
    StationIndex(StationIndex),
    TimeSpanIndex(TimeSpanIndex),
    DataFormat(DataFormat),
    CommentDescription(CommentDescription),
    GenericAbbreviation(GenericAbbreviation),
    UnitAbbreviation(UnitAbbreviation),
    StationIdentifier(StationIdentifier),
    StationComment(StationComment),
    ChannelIdentifier(ChannelIdentifier),
    PolesZeros(PolesZeros),
    Coefficients(Coefficients),
    Decimation(Decimation),
    Gain(Gain),
    ChannelComment(ChannelComment),
    FirResponse(FirResponse),
    Polynomial(Polynomial),
}

impl Blockette {
    pub fn type_code(&self) -> u16 {
        match self {
            Blockette::VolumeIdentifier(_) => 10,
            Blockette::StationIndex(_) => 11,
            Blockette::TimeSpanIndex(_) => 12,
            Blockette::DataFormat(_) => 30,
            Blockette::CommentDescription(_) => 31,
            Blockette::GenericAbbreviation(_) => 33,
            Blockette::UnitAbbreviation(_) => 34,
            Blockette::StationIdentifier(_) => 50,
            Blockette::StationComment(_) => 51,
            Blockette::ChannelIdentifier(_) => 52,
            Blockette::PolesZeros(_) => 53,
            Blockette::Coefficients(_) => 54,
            Blockette::Decimation(_) => 57,
            Blockette::Gain(_) => 58,
            Blockette::ChannelComment(_) => 59,
            Blockette::FirResponse(_) => 61,
            Blockette::Polynomial(_) => 62,
        }
    }

    /// Stage sequence number for the six response record kinds.
    pub fn stage(&self) -> Option<u8> {
        match self {
            Blockette::PolesZeros(b) => Some(b.stage),
            Blockette::Coefficients(b) => Some(b.stage),
            Blockette::Decimation(b) => Some(b.stage),
            Blockette::Gain(b) => Some(b.stage),
            Blockette::FirResponse(b) => Some(b.stage),
            Blockette::Polynomial(b) => Some(b.stage),
            _ => None,
        }
    }

    pub fn is_response(&self) -> bool {
        self.stage().is_some()
    }

    /// Lookup key carried by dictionary record kinds.
    pub fn dictionary_key(&self) -> Option<u16> {
        match self {
            Blockette::DataFormat(b) => Some(b.key),
            Blockette::CommentDescription(b) => Some(b.key),
            Blockette::GenericAbbreviation(b) => Some(b.key),
            Blockette::UnitAbbreviation(b) => Some(b.key),
            _ => None,
        }
    }

    /// Decodes the record starting at `offset`, returning it with its total
    /// encoded length.
    pub fn decode(input: &str, offset: usize) -> Result<(Blockette, usize), FormatError> {
        let rest = &input[offset..];
        if rest.len() < RECORD_HEADER_WIDTH {
            return Err(FormatError::truncated(
                offset,
                0,
                RECORD_HEADER_WIDTH,
                rest.len(),
            ));
        }
        let type_code: u16 = rest[..3]
            .parse()
            .map_err(|_| FormatError::bad_number(offset, 0, &rest[..3]))?;
        let length: usize = rest[3..7]
            .parse()
            .map_err(|_| FormatError::bad_number(offset + 3, type_code, &rest[3..7]))?;
        if length < RECORD_HEADER_WIDTH || rest.len() < length {
            return Err(FormatError::truncated(offset, type_code, length, rest.len()));
        }
        let body = &rest[RECORD_HEADER_WIDTH..length];
        let mut r = FieldReader::new(body, offset + RECORD_HEADER_WIDTH, type_code);
        let record = match type_code {
            10 => Blockette::VolumeIdentifier(VolumeIdentifier::decode(&mut r)?),
            11 => Blockette::StationIndex(StationIndex::decode(&mut r)?),
            12 => Blockette::TimeSpanIndex(TimeSpanIndex::decode(&mut r)?),
            30 => Blockette::DataFormat(DataFormat::decode(&mut r)?),
            31 => Blockette::CommentDescription(CommentDescription::decode(&mut r)?),
            33 => Blockette::GenericAbbreviation(GenericAbbreviation::decode(&mut r)?),
            34 => Blockette::UnitAbbreviation(UnitAbbreviation::decode(&mut r)?),
            50 => Blockette::StationIdentifier(StationIdentifier::decode(&mut r)?),
            51 => Blockette::StationComment(StationComment::decode(&mut r)?),
            52 => Blockette::ChannelIdentifier(ChannelIdentifier::decode(&mut r)?),
            53 => Blockette::PolesZeros(PolesZeros::decode(&mut r)?),
            54 => Blockette::Coefficients(Coefficients::decode(&mut r)?),
            57 => Blockette::Decimation(Decimation::decode(&mut r)?),
            58 => Blockette::Gain(Gain::decode(&mut r)?),
            59 => Blockette::ChannelComment(ChannelComment::decode(&mut r)?),
            61 => Blockette::FirResponse(FirResponse::decode(&mut r)?),
            62 => Blockette::Polynomial(Polynomial::decode(&mut r)?),
            _ => return Err(FormatError::unknown_type(offset, type_code)),
        };
        r.finish()?;
        Ok((record, length))
    }

    /// Encodes the record, header included.
    pub fn encode(&self) -> String {
        let mut body = String::new();
        match self {
            Blockette::VolumeIdentifier(b) => b.encode_body(&mut body),
            Blockette::StationIndex(b) => b.encode_body(&mut body),
            Blockette::TimeSpanIndex(b) => b.encode_body(&mut body),
            Blockette::DataFormat(b) => b.encode_body(&mut body),
            Blockette::CommentDescription(b) => b.encode_body(&mut body),
            Blockette::GenericAbbreviation(b) => b.encode_body(&mut body),
            Blockette::UnitAbbreviation(b) => b.encode_body(&mut body),
            Blockette::StationIdentifier(b) => b.encode_body(&mut body),
            Blockette::StationComment(b) => b.encode_body(&mut body),
            Blockette::ChannelIdentifier(b) => b.encode_body(&mut body),
            Blockette::PolesZeros(b) => b.encode_body(&mut body),
            Blockette::Coefficients(b) => b.encode_body(&mut body),
            Blockette::Decimation(b) => b.encode_body(&mut body),
            Blockette::Gain(b) => b.encode_body(&mut body),
            Blockette::ChannelComment(b) => b.encode_body(&mut body),
            Blockette::FirResponse(b) => b.encode_body(&mut body),
            Blockette::Polynomial(b) => b.encode_body(&mut body),
        }
        format!(
            "{:03}{:04}{}",
            self.type_code(),
            body.len() + RECORD_HEADER_WIDTH,
            body
        )
    }

    /// Checks that the encoded form fits its fixed-width fields: the
    /// 4-digit record length, and for dictionary records the lookup key
    /// (3 digits for types 33/34, 4 for types 30/31).
    pub fn check_encodable(&self, encoded_len: usize) -> Result<(), FormatError> {
        if encoded_len > 9999 {
            return Err(FormatError::new(
                FormatErrorKind::Oversize {
                    length: encoded_len,
                },
                0,
                self.type_code(),
            ));
        }
        if let Some(key) = self.dictionary_key() {
            let max = match self.type_code() {
                33 | 34 => 999,
                _ => 9999,
            };
            if key > max {
                return Err(FormatError::new(
                    FormatErrorKind::KeyOverflow { key, max },
                    0,
                    self.type_code(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(text: &str) -> Blockette {
        let (record, len) = Blockette::decode(text, 0).unwrap();
        assert_eq!(len, text.len());
        assert_eq!(record.encode(), text);
        record
    }

    #[test]
    fn decimation_left_inverse() {
        let record = round_trip("0570051046.4000E+040000200000+3.9062E-05+3.9062E-05");
        match record {
            Blockette::Decimation(d) => {
                assert_eq!(d.stage, 4);
                assert_eq!(d.factor, 2);
                assert_eq!(d.offset, 0);
            }
            other => panic!("expected decimation, got {:?}", other),
        }
    }

    #[test]
    fn station_identifier_left_inverse() {
        let record = round_trip(
            "0500134ANMO +34.945900-106.457199+1850.00005003Albuquerque, New Mexico, USA~\
             0013210101989,241,00:00:00.0000~1995,195,00:00:00.0000~NIU",
        );
        match record {
            Blockette::StationIdentifier(s) => {
                assert_eq!(s.code, "ANMO");
                assert_eq!(s.channel_count, 5);
                assert_eq!(s.comment_count, 3);
                assert_eq!(s.network_code, "IU");
                assert_eq!(s.start.unwrap().to_seed_string(), "1989,241,00:00:00.0000");
            }
            other => panic!("expected station identifier, got {:?}", other),
        }
    }

    #[test]
    fn generic_abbreviation_left_inverse() {
        let record = round_trip("0330055001(GSN) Global Seismograph Network (IRIS/USGS)~");
        match record {
            Blockette::GenericAbbreviation(a) => {
                assert_eq!(a.key, 1);
                assert!(a.description.starts_with("(GSN)"));
            }
            other => panic!("expected abbreviation, got {:?}", other),
        }
    }

    #[test]
    fn unknown_type_is_strict() {
        let err = Blockette::decode("9990008x", 0).unwrap_err();
        assert_eq!(err.blockette_type, 999);
        assert_eq!(err.offset, 0);
        assert!(matches!(err.kind, FormatErrorKind::UnknownType));
    }

    #[test]
    fn truncation_reports_offset() {
        let err = Blockette::decode("0570051046.4", 0).unwrap_err();
        assert_eq!(err.blockette_type, 57);
        assert!(matches!(err.kind, FormatErrorKind::Truncated { .. }));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        // declared one byte longer than the decimation fields span
        let err =
            Blockette::decode("0570052046.4000E+040000200000+3.9062E-05+3.9062E-05 ", 0)
                .unwrap_err();
        assert!(matches!(err.kind, FormatErrorKind::LengthMismatch { .. }));
    }
}
