// Declarative report engine
// Sheets are static schemas; every render call evaluates, groups, aggregates and lays
// out a fresh table from the supplied source set. Nothing is cached across calls.

pub mod error;

// Schema
pub mod aggregate;
pub mod convert;
pub mod field;
pub mod format;
pub mod projector;
pub mod sheet;

// Evaluation
pub mod evaluate;
pub mod group;
pub mod record;
pub mod value;

// Output
pub mod render;

pub use aggregate::{Aggregator, AggregatorSelector, numeric_sum_selector};
pub use convert::Converter;
pub use error::{Error, Result};
pub use evaluate::{Column, EvalOptions, Evaluation, evaluate};
pub use field::{Align, Decl, DynamicFieldOrder, DynamicFields, Field, ProjectorKind, Subgroup};
pub use format::{Alert, Condition, Formatter};
pub use group::{Group, Table};
pub use projector::{FieldType, Projector};
pub use record::{Cell, EntryData, NO_ENTRY, Record};
pub use render::row::RowLayout;
pub use render::{RenderOptions, Rendered, TerminalSize, render};
pub use sheet::{ForEach, Sheet, SheetBuilder, SheetStyle};
pub use value::{Common, Value, common_from_source};
