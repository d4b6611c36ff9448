//! FDSN StationXML surface: maps the document tree to and from markup.
//!
//! Handles the subset of StationXML 1.1 this converter produces: network,
//! station, channel, comment, and the six response stage block kinds.
//! Unknown elements are skipped on read. Not a general StationXML binding.

mod read;
mod write;

pub use read::read_document;
pub use write::write_document;

pub const STATIONXML_NAMESPACE: &str = "http://www.fdsn.org/xml/station/1";
pub const SCHEMA_VERSION: &str = "1.1";

/// 1-based line/column of a byte offset, for parse diagnostics.
pub(crate) fn position(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let before = &input[..offset];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|i| offset - i)
        .unwrap_or(offset + 1);
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_one_based() {
        assert_eq!(position("abc", 0), (1, 1));
        assert_eq!(position("abc", 2), (1, 3));
        assert_eq!(position("a\nbc", 2), (2, 1));
        assert_eq!(position("a\nbc", 3), (2, 2));
    }
}
