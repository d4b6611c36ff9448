//! Stream-level conversion entry points: whole-volume decode/encode plus
//! the two end-to-end directions the command line drives.

use std::io::{Read, Write};

use log::{debug, info};

use crate::blockette::Blockette;
use crate::document::{DocumentOptions, StationDocument};
use crate::error::{ConvertError, FormatError, FormatErrorKind};
use crate::mapper::{to_document, to_volume};
use crate::volume::{Volume, VolumeBuilder};
use crate::xml::{read_document, write_document};

/// Decodes a complete binary volume from `source`. Decoding is strict:
/// the first malformed record fails the whole call.
pub fn decode_volume<R: Read>(source: &mut R) -> Result<Volume, ConvertError> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    let input = match std::str::from_utf8(&bytes) {
        Ok(text) if text.is_ascii() => text,
        _ => {
            let offset = bytes.iter().position(|b| !b.is_ascii()).unwrap_or(0);
            return Err(FormatError::new(FormatErrorKind::NotAscii, offset, 0).into());
        }
    };

    let mut builder = VolumeBuilder::new();
    let mut offset = 0;
    while offset < input.len() {
        // logical record padding at the end of the stream
        if input[offset..].bytes().all(|b| b == b' ') {
            break;
        }
        let (record, length) = Blockette::decode(input, offset)?;
        debug!(
            "decoded blockette {:03} ({} bytes) at offset {}",
            record.type_code(),
            length,
            offset
        );
        builder.push(record, offset)?;
        offset += length;
    }
    let volume = builder.finish();
    info!(
        "decoded volume: {} records, {} stations",
        volume.len(),
        volume.station_count()
    );
    Ok(volume)
}

/// Encodes a volume to `sink` as a plain concatenation of records.
pub fn encode_volume<W: Write>(volume: &Volume, sink: &mut W) -> Result<(), ConvertError> {
    for record in volume.all() {
        let encoded = record.encode();
        record.check_encodable(encoded.len())?;
        sink.write_all(encoded.as_bytes())?;
    }
    Ok(())
}

/// Binary volume in, StationXML out.
pub fn seed_to_xml<R: Read, W: Write>(
    source: &mut R,
    sink: &mut W,
    options: &DocumentOptions,
) -> Result<(), ConvertError> {
    let volume = decode_volume(source)?;
    let document = to_document(&volume, options);
    write_document(&document, sink)?;
    Ok(())
}

/// StationXML in, binary volume out.
pub fn xml_to_seed<R: Read, W: Write>(source: &mut R, sink: &mut W) -> Result<(), ConvertError> {
    let mut text = String::new();
    source.read_to_string(&mut text)?;
    let document = parse_xml(&text)?;
    let volume = to_volume(&document);
    encode_volume(&volume, sink)
}

/// Parses a StationXML string into the document tree.
pub fn parse_xml(text: &str) -> Result<StationDocument, ConvertError> {
    let document = read_document(text)?;
    info!("parsed document: {} stations", document.station_count());
    Ok(document)
}
