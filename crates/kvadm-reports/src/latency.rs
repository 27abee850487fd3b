//! Latency histograms as reported per node, and the merge of the two server
//! generations' tables into the shape `show latencies` renders.
//!
//! Newer servers answer a `latencies` query whose histograms may carry more columns
//! than the legacy `latency` query. Nodes that only speak the legacy query are folded
//! into the modern table: each gets a copy of the first modern entry with every value
//! blanked, and columns both schemas share are copied over. Columns only the modern
//! schema knows stay missing.

use indexmap::IndexMap;
use kvadm_types::{SourceMap, SourceValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Namespace slot used for histograms that only report a node-wide total.
pub const TOTAL: &str = "total";

/// One histogram: column names and one row of values per reporting interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramData {
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<SourceValue>>,
}

impl HistogramData {
    /// Same shape with every value missing.
    fn blanked(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|row| vec![SourceValue::Missing; row.len()])
                .collect(),
        }
    }

    /// Copy every column this table shares with `legacy`, row by row.
    fn fill_from(&mut self, legacy: &HistogramData) {
        for (col_idx, column) in self.columns.iter().enumerate() {
            let Some(legacy_idx) = legacy.columns.iter().position(|c| c == column) else {
                continue;
            };
            for (row_idx, row) in self.values.iter_mut().enumerate() {
                let value = legacy
                    .values
                    .get(row_idx)
                    .and_then(|legacy_row| legacy_row.get(legacy_idx))
                    .cloned()
                    .unwrap_or_default();
                if let Some(slot) = row.get_mut(col_idx) {
                    *slot = value;
                }
            }
        }
    }

    /// The most recent row as `column -> value`.
    fn latest(&self) -> SourceMap {
        let Some(row) = self.values.last() else {
            return SourceMap::new();
        };
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }
}

/// A node's entry for one histogram name (`read`, `write`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<HistogramData>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub namespace: IndexMap<String, HistogramData>,
}

impl HistogramEntry {
    fn blanked(&self) -> Self {
        Self {
            total: self.total.as_ref().map(HistogramData::blanked),
            namespace: self
                .namespace
                .iter()
                .map(|(ns, data)| (ns.clone(), data.blanked()))
                .collect(),
        }
    }
}

pub type NodeLatency = IndexMap<String, HistogramEntry>;

/// `node -> histogram name -> entry`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatencyTable {
    nodes: IndexMap<String, NodeLatency>,
}

impl LatencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: impl Into<String>, latency: NodeLatency) {
        self.nodes.insert(node.into(), latency);
    }

    pub fn get(&self, node: &str) -> Option<&NodeLatency> {
        self.nodes.get(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parse a snapshot source. Nodes that failed to answer, or answered with something
    /// that is not a latency table, are left out.
    pub fn from_source(per_node: &SourceMap) -> Self {
        let mut table = Self::new();
        for (node, value) in per_node {
            if value.present().is_none() {
                debug!(node = %node, "skipping node without latency data");
                continue;
            }
            match serde_json::from_value::<NodeLatency>(value.to_json()) {
                Ok(latency) => table.insert(node.clone(), latency),
                Err(err) => warn!(node = %node, error = %err, "skipping malformed latency table"),
            }
        }
        table
    }

    /// Flatten into the `histogram` source read by the latencies report:
    /// `node -> namespace -> histogram -> column -> value`, from each histogram's most
    /// recent row. Histograms without per-namespace data appear under [`TOTAL`].
    pub fn to_source_value(&self) -> SourceMap {
        self.nodes
            .iter()
            .map(|(node, histograms)| {
                let mut namespaces: IndexMap<String, SourceMap> = IndexMap::new();
                for (name, entry) in histograms {
                    if entry.namespace.is_empty() {
                        if let Some(total) = &entry.total {
                            namespaces
                                .entry(TOTAL.to_string())
                                .or_default()
                                .insert(name.clone(), total.latest().into());
                        }
                        continue;
                    }
                    for (ns, data) in &entry.namespace {
                        namespaces
                            .entry(ns.clone())
                            .or_default()
                            .insert(name.clone(), data.latest().into());
                    }
                }
                let namespaces: SourceMap = namespaces
                    .into_iter()
                    .map(|(ns, histograms)| (ns, histograms.into()))
                    .collect();
                (node.clone(), namespaces.into())
            })
            .collect()
    }
}

/// Fold `legacy` nodes into `latencies`. Either side being empty returns the other
/// unchanged. A legacy node already present in `latencies` is replaced.
pub fn merge_latency_tables(latencies: &LatencyTable, legacy: &LatencyTable) -> LatencyTable {
    if latencies.is_empty() {
        return legacy.clone();
    }
    if legacy.is_empty() {
        return latencies.clone();
    }

    let mut merged = latencies.clone();
    let Some(template) = latencies.nodes.values().find(|entry| !entry.is_empty()) else {
        warn!("no node reported modern latencies; keeping legacy tables as they are");
        for (node, latency) in &legacy.nodes {
            merged.insert(node.clone(), latency.clone());
        }
        return merged;
    };

    for (node, legacy_latency) in &legacy.nodes {
        let mut entry: NodeLatency = template
            .iter()
            .map(|(name, histogram)| (name.clone(), histogram.blanked()))
            .collect();

        for (name, histogram) in entry.iter_mut() {
            let Some(legacy_histogram) = legacy_latency.get(name) else {
                continue;
            };
            if let (Some(total), Some(legacy_total)) = (&mut histogram.total, &legacy_histogram.total) {
                total.fill_from(legacy_total);
            }
            for (ns, data) in histogram.namespace.iter_mut() {
                if let Some(legacy_data) = legacy_histogram.namespace.get(ns) {
                    data.fill_from(legacy_data);
                }
            }
        }
        merged.insert(node.clone(), entry);
    }
    debug!(nodes = merged.len(), legacy = legacy.len(), "merged latency tables");
    merged
}
