// Report schemas
// Static sheet declarations for each admin view. Schemas are built on demand and never
// hold data; rendering goes through kvadm-sheet.

pub mod error;

// Shared fields
pub mod fields;

// Views
pub mod catalog;
pub mod info;
pub mod show;
pub mod summary;

// Latency table merge
pub mod latency;

pub use catalog::ReportKind;
pub use error::{Error, Result};
pub use latency::{HistogramData, HistogramEntry, LatencyTable, NodeLatency, merge_latency_tables};
pub use show::histograms_by_namespace;
