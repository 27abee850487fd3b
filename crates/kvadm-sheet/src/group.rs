//! Grouping, ordering and per-group aggregation of evaluated records.

use crate::evaluate::{Column, Evaluation};
use crate::record::{Cell, EntryData, NO_ENTRY, Record};
use crate::sheet::Sheet;
use crate::value::{Common, Value, cmp_missing_last};
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Records sharing one group-by tuple, plus their aggregate cells.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: Vec<Option<Value>>,
    pub records: Vec<Record>,
    /// One cell per aggregating column; columns without an aggregator are absent
    pub aggregates: IndexMap<String, Cell>,
}

impl Group {
    /// Display text of the aggregate for `key`: blank when the column does not
    /// aggregate, the placeholder when nothing could be aggregated.
    pub fn aggregate_text(&self, key: &str) -> &str {
        self.aggregates
            .get(key)
            .map(|cell| cell.converted.as_str())
            .unwrap_or("")
    }

    pub fn aggregate(&self, key: &str) -> Option<&Value> {
        self.aggregates.get(key).and_then(|cell| cell.value.as_ref())
    }
}

/// The fully grouped result of one report evaluation.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<Column>,
    pub groups: Vec<Group>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
}

impl Table {
    pub fn build(sheet: &Sheet, evaluation: Evaluation, common: &Common, disable_aggregations: bool) -> Self {
        let Evaluation { columns, records } = evaluation;
        let group_by = sheet.group_by().to_vec();
        let order_by = sheet.order_by().to_vec();

        let mut groups = partition(records, &group_by);

        for group in &mut groups {
            group
                .records
                .sort_by(|a, b| compare_records(a, b, &order_by));
        }

        // An explicit order on a group key orders the groups themselves; otherwise
        // groups keep the order in which they were first seen.
        let group_order: Vec<usize> = order_by
            .iter()
            .filter_map(|key| group_by.iter().position(|g| g == key))
            .collect();
        if !group_order.is_empty() {
            groups.sort_by(|a, b| {
                group_order
                    .iter()
                    .map(|&idx| cmp_missing_last(a.key[idx].as_ref(), b.key[idx].as_ref()))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        if !disable_aggregations {
            for group in &mut groups {
                group.aggregates = aggregate_group(&columns, &group.records, common);
            }
        }

        debug!(groups = groups.len(), "grouped records");
        Table {
            columns,
            groups,
            group_by,
            order_by,
        }
    }

    pub fn has_aggregates(&self) -> bool {
        self.groups.iter().any(|g| !g.aggregates.is_empty())
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.field.hidden)
    }

    pub fn n_records(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    pub fn is_grouped_by(&self, key: &str) -> bool {
        self.group_by.iter().any(|k| k == key)
    }

    pub fn is_ordered_by(&self, key: &str) -> bool {
        self.order_by.iter().any(|k| k == key)
    }
}

fn partition(records: Vec<Record>, group_by: &[String]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for record in records {
        let key: Vec<Option<Value>> = group_by.iter().map(|k| record.get(k).cloned()).collect();
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.records.push(record),
            None => groups.push(Group {
                key,
                records: vec![record],
                aggregates: IndexMap::new(),
            }),
        }
    }
    groups
}

fn compare_records(a: &Record, b: &Record, order_by: &[String]) -> Ordering {
    order_by
        .iter()
        .map(|key| cmp_missing_last(a.get(key), b.get(key)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn aggregate_group(columns: &[Column], records: &[Record], common: &Common) -> IndexMap<String, Cell> {
    let empty = Record::new("", Vec::new());
    columns
        .iter()
        .filter_map(|column| {
            let field = &column.field;
            let aggregator = field.aggregator?;
            let value = aggregator.aggregate(records.iter().filter_map(|r| r.get(&field.key)));
            let converted = match &value {
                None => NO_ENTRY.to_string(),
                Some(value) => {
                    let edata = EntryData {
                        value,
                        record: &empty,
                        common,
                    };
                    match &field.converter {
                        Some(converter) => converter.convert(&edata),
                        None => value.to_string(),
                    }
                }
            };
            Some((field.key.clone(), Cell { value, converted }))
        })
        .collect()
}
