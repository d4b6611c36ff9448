mod abbrev;
pub mod blockette;
pub mod convert;
pub mod document;
pub mod error;
pub mod field;
pub mod mapper;
pub mod volume;
pub mod xml;

pub use blockette::Blockette;
pub use convert::{decode_volume, encode_volume, parse_xml, seed_to_xml, xml_to_seed};
pub use document::{DocumentOptions, StationDocument};
pub use error::{ConvertError, FormatError, FormatErrorKind, XmlError};
pub use field::SeedTime;
pub use mapper::{to_document, to_volume};
pub use volume::{Volume, VolumeBuilder};
pub use xml::{read_document, write_document, SCHEMA_VERSION, STATIONXML_NAMESPACE};

#[cfg(test)]
mod tests;
