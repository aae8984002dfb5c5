use std::fmt;

use poi::InvalidDimension;

#[derive(Debug)]
pub enum FormatError {
    Io(std::io::Error),
    /// The source exists but holds no records, not even a header.
    Empty,
    Xml(String),
    Corrupt(String),
    InvalidDimension(i64),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io(err) => write!(f, "I/O error: {err}"),
            FormatError::Empty => write!(f, "File not readable or empty"),
            FormatError::Xml(msg) => write!(f, "XML error: {msg}"),
            FormatError::Corrupt(msg) => write!(f, "Corrupt POI source: {msg}"),
            FormatError::InvalidDimension(d) => write!(f, "Invalid dimension: {d}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        FormatError::Io(err)
    }
}

impl From<InvalidDimension> for FormatError {
    fn from(err: InvalidDimension) -> Self {
        FormatError::InvalidDimension(err.0)
    }
}
