use crate::value::{Common, Value};
use indexmap::IndexMap;
use serde::Serialize;

/// Text shown for a missing value, an error marker, or a missing aggregate.
pub const NO_ENTRY: &str = "--";

/// One evaluated cell: the raw projected value and its display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: Option<Value>,
    pub converted: String,
}

/// One evaluated row, keyed by field key, plus the entity it was projected from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub node: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub iteration_key: Vec<String>,
    cells: IndexMap<String, Cell>,
}

impl Record {
    pub fn new(node: impl Into<String>, iteration_key: Vec<String>) -> Self {
        Self {
            node: node.into(),
            iteration_key,
            cells: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.cells.get(key).and_then(|cell| cell.value.as_ref())
    }

    pub fn converted(&self, key: &str) -> &str {
        self.cells
            .get(key)
            .map(|cell| cell.converted.as_str())
            .unwrap_or(NO_ENTRY)
    }

    pub fn cell(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub(crate) fn set_value(&mut self, key: &str, value: Option<Value>) {
        self.cells.insert(
            key.to_string(),
            Cell {
                value,
                converted: String::new(),
            },
        );
    }

    pub(crate) fn set_converted(&mut self, key: &str, converted: String) {
        if let Some(cell) = self.cells.get_mut(key) {
            cell.converted = converted;
        }
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.cells.shift_remove(key);
    }
}

/// What converters and formatter conditions see for one cell: its value, every sibling
/// value of the same record, and the render call's common values.
#[derive(Debug, Clone, Copy)]
pub struct EntryData<'a> {
    pub value: &'a Value,
    pub record: &'a Record,
    pub common: &'a Common,
}
