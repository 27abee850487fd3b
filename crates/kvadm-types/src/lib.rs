pub mod error;
pub mod source;
pub mod value;

pub use error::{Error, Result};
pub use source::{Snapshot, SourceSet};
pub use value::{ERROR_MARKER_KEY, SourceMap, SourceValue};
