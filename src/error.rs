use std::fmt;
use std::io;

/// Errors raised while decoding a binary record stream.
///
/// Always fatal to the decode call that produced it; carries the absolute
/// byte offset and the blockette type under decode (0 when the type field
/// itself could not be read).
#[derive(Debug)]
pub struct FormatError {
    pub offset: usize,
    pub blockette_type: u16,
    pub kind: FormatErrorKind,
}

#[derive(Debug)]
pub enum FormatErrorKind {
    /// The 3-digit type tag is not a supported blockette type
    UnknownType,
    /// The stream ended before the record's declared length
    Truncated { needed: usize, available: usize },
    /// A fixed-width numeric field did not parse
    BadNumber { text: String },
    /// A timestamp field did not parse
    BadTime { text: String },
    /// A variable-length field has no `~` terminator
    UnterminatedField,
    /// A variable-length field exceeds its allowed width
    FieldTooLong { max: usize, actual: usize },
    /// The record's fields did not consume exactly its declared length
    LengthMismatch { declared: usize, consumed: usize },
    /// The input contains a non-ASCII byte
    NotAscii,
    /// A station/channel/response record appeared before its owner
    StrayRecord,
    /// Two dictionary records of the same type share a lookup key
    DuplicateKey { key: u16 },
    /// An encoded record exceeds the 4-digit length field
    Oversize { length: usize },
    /// A dictionary lookup key exceeds its fixed-width field
    KeyOverflow { key: u16, max: u16 },
}

impl FormatError {
    pub fn new(kind: FormatErrorKind, offset: usize, blockette_type: u16) -> Self {
        FormatError {
            offset,
            blockette_type,
            kind,
        }
    }

    pub fn unknown_type(offset: usize, blockette_type: u16) -> Self {
        Self::new(FormatErrorKind::UnknownType, offset, blockette_type)
    }

    pub fn truncated(offset: usize, blockette_type: u16, needed: usize, available: usize) -> Self {
        Self::new(
            FormatErrorKind::Truncated { needed, available },
            offset,
            blockette_type,
        )
    }

    pub fn bad_number(offset: usize, blockette_type: u16, text: &str) -> Self {
        Self::new(
            FormatErrorKind::BadNumber {
                text: text.to_string(),
            },
            offset,
            blockette_type,
        )
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blockette {:03} at byte {}: ",
            self.blockette_type, self.offset
        )?;
        match &self.kind {
            FormatErrorKind::UnknownType => write!(f, "unknown blockette type"),
            FormatErrorKind::Truncated { needed, available } => {
                write!(f, "truncated record: need {} bytes, {} left", needed, available)
            }
            FormatErrorKind::BadNumber { text } => write!(f, "invalid numeric field {:?}", text),
            FormatErrorKind::BadTime { text } => write!(f, "invalid time field {:?}", text),
            FormatErrorKind::UnterminatedField => write!(f, "variable field missing '~'"),
            FormatErrorKind::FieldTooLong { max, actual } => {
                write!(f, "variable field of {} chars exceeds maximum {}", actual, max)
            }
            FormatErrorKind::LengthMismatch { declared, consumed } => write!(
                f,
                "record declares {} bytes but its fields span {}",
                declared, consumed
            ),
            FormatErrorKind::NotAscii => write!(f, "non-ASCII byte in record stream"),
            FormatErrorKind::StrayRecord => write!(f, "record appeared before its owning record"),
            FormatErrorKind::DuplicateKey { key } => {
                write!(f, "duplicate dictionary lookup key {}", key)
            }
            FormatErrorKind::Oversize { length } => {
                write!(f, "encoded record of {} bytes exceeds the length field", length)
            }
            FormatErrorKind::KeyOverflow { key, max } => {
                write!(f, "dictionary lookup key {} exceeds the field maximum {}", key, max)
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// A StationXML document that could not be parsed, with a 1-based
/// line/column position for user-facing diagnostics.
#[derive(Debug)]
pub struct XmlError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl XmlError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        XmlError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for XmlError {}

/// Umbrella error for the stream-level conversion entry points.
#[derive(Debug)]
pub enum ConvertError {
    Format(FormatError),
    Xml(XmlError),
    Io(io::Error),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Format(e) => write!(f, "{}", e),
            ConvertError::Xml(e) => write!(f, "{}", e),
            ConvertError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Format(e) => Some(e),
            ConvertError::Xml(e) => Some(e),
            ConvertError::Io(e) => Some(e),
        }
    }
}

impl From<FormatError> for ConvertError {
    fn from(e: FormatError) -> Self {
        ConvertError::Format(e)
    }
}

impl From<XmlError> for ConvertError {
    fn from(e: XmlError) -> Self {
        ConvertError::Xml(e)
    }
}

impl From<io::Error> for ConvertError {
    fn from(e: io::Error) -> Self {
        ConvertError::Io(e)
    }
}
