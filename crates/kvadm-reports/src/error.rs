use std::fmt;

/// Result type for kvadm-reports operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A report schema failed validation
    Sheet(kvadm_sheet::Error),

    /// No report with this name exists
    UnknownReport(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Sheet(err) => write!(f, "Report error: {}", err),
            Error::UnknownReport(name) => write!(f, "Unknown report: '{}'", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sheet(err) => Some(err),
            Error::UnknownReport(_) => None,
        }
    }
}

impl From<kvadm_sheet::Error> for Error {
    fn from(err: kvadm_sheet::Error) -> Self {
        Error::Sheet(err)
    }
}
