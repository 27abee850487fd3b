use std::fmt;

/// Result type for kvadm-sheet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contract violations detected while building or rendering a sheet.
///
/// Data irregularities never surface here: a node returning garbage degrades to a
/// placeholder cell. These errors mean the calling code declared or invoked the sheet
/// incorrectly.
#[derive(Debug)]
pub enum Error {
    /// Two fields share the same key
    DuplicateFieldKey(String),

    /// `group_by` names a field that does not exist
    UnknownGroupBy(String),

    /// `order_by` names a field that does not exist
    UnknownOrderBy(String),

    /// A `from_source` entry is absent from the supplied source set
    MissingSource(String),

    /// A for-each or dynamic-field source is not listed in `from_source`
    UndeclaredSource(String),

    /// A dynamic field selector is not a valid regular expression
    InvalidSelector {
        pattern: String,
        source: regex::Error,
    },

    /// An alignment name that is not left, right or center
    UnknownAlignment(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateFieldKey(key) => write!(f, "Duplicate field key: '{}'", key),
            Error::UnknownGroupBy(key) => write!(f, "group_by references unknown field '{}'", key),
            Error::UnknownOrderBy(key) => write!(f, "order_by references unknown field '{}'", key),
            Error::MissingSource(name) => {
                write!(f, "Required source '{}' was not supplied", name)
            }
            Error::UndeclaredSource(name) => {
                write!(f, "Source '{}' is used but not listed in from_source", name)
            }
            Error::InvalidSelector { pattern, source } => {
                write!(f, "Invalid field selector '{}': {}", pattern, source)
            }
            Error::UnknownAlignment(name) => write!(f, "Unknown field alignment: '{}'", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidSelector { source, .. } => Some(source),
            _ => None,
        }
    }
}
