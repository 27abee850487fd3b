use crate::value::{SourceMap, SourceValue};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named per-node (or per-entity) mappings gathered for one report invocation.
///
/// Each source name maps entity id -> that entity's response. A node that failed to
/// answer carries `SourceValue::Error`, never an absent entry, so the failure stays
/// visible as a placeholder cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSet {
    sources: IndexMap<String, SourceMap>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, per_node: SourceMap) {
        self.sources.insert(name.into(), per_node);
    }

    pub fn with(mut self, name: impl Into<String>, per_node: SourceMap) -> Self {
        self.insert(name, per_node);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SourceMap> {
        self.sources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// A node's value in a source; `None` when absent or an error marker.
    pub fn node_value(&self, name: &str, node: &str) -> Option<&SourceValue> {
        self.sources
            .get(name)
            .and_then(|per_node| per_node.get(node))
            .and_then(SourceValue::present)
    }

    /// Union of entity ids across the named sources, in first-seen order.
    pub fn entities<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut seen = IndexSet::new();
        for name in names {
            if let Some(per_node) = self.sources.get(name.as_ref()) {
                for node in per_node.keys() {
                    seen.insert(node.clone());
                }
            }
        }
        seen.into_iter().collect()
    }
}

/// Serialized cluster state: the Source Set plus values shared by every record
/// (for example the principal node id) and the collection time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub common: SourceMap,

    pub sources: SourceSet,
}

impl Snapshot {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Snapshot("top level must be a JSON object".to_string()))?;

        match obj.get("sources") {
            None => return Err(Error::Snapshot("missing \"sources\" object".to_string())),
            Some(sources) if !sources.is_object() => {
                return Err(Error::Snapshot("\"sources\" must be an object".to_string()));
            }
            Some(sources) => {
                if let Some((name, _)) = sources
                    .as_object()
                    .into_iter()
                    .flatten()
                    .find(|(_, per_node)| !per_node.is_object())
                {
                    return Err(Error::Snapshot(format!(
                        "source \"{}\" must map node ids to values",
                        name
                    )));
                }
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_map;
    use tempfile::TempDir;

    #[test]
    fn test_entities_union_in_first_seen_order() {
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "n2" => "node2", "n1" => "node1" })
            .with("stats", source_map! { "n1" => source_map! {}, "n3" => SourceValue::error("down") });

        assert_eq!(sources.entities(&["prefixes", "stats"]), vec!["n2", "n1", "n3"]);
    }

    #[test]
    fn test_node_value_hides_error_marker() {
        let sources = SourceSet::new().with(
            "stats",
            source_map! { "n1" => SourceValue::error("timeout"), "n2" => source_map! { "x" => 5 } },
        );
        assert!(sources.node_value("stats", "n1").is_none());
        assert!(sources.node_value("stats", "n2").is_some());
        assert!(sources.node_value("missing", "n2").is_none());
    }

    #[test]
    fn test_snapshot_parse() {
        let snapshot = Snapshot::from_json_str(
            r#"{
                "timestamp": "2026-01-01T00:00:00Z",
                "common": {"principal": "A1"},
                "sources": {"stats": {"A1": {"x": 10}, "B2": {"$error": "timeout"}}}
            }"#,
        )
        .unwrap();

        assert!(snapshot.timestamp.is_some());
        assert_eq!(
            snapshot.common.get("principal"),
            Some(&SourceValue::Str("A1".to_string()))
        );
        assert!(snapshot.sources.node_value("stats", "B2").is_none());
        assert_eq!(
            snapshot
                .sources
                .node_value("stats", "A1")
                .and_then(|v| v.get("x"))
                .and_then(SourceValue::as_i64),
            Some(10)
        );
    }

    #[test]
    fn test_snapshot_rejects_bad_shapes() {
        assert!(matches!(Snapshot::from_json_str("[]"), Err(Error::Snapshot(_))));
        assert!(matches!(Snapshot::from_json_str("{}"), Err(Error::Snapshot(_))));
        assert!(matches!(
            Snapshot::from_json_str(r#"{"sources": {"stats": 3}}"#),
            Err(Error::Snapshot(_))
        ));
        assert!(matches!(Snapshot::from_json_str("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_snapshot_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("snapshot.json");

        let snapshot = Snapshot {
            timestamp: None,
            common: source_map! { "principal" => "A1" },
            sources: SourceSet::new().with("stats", source_map! { "A1" => SourceValue::error("x") }),
        };
        snapshot.save_to(&path)?;

        let loaded = Snapshot::load_from(&path)?;
        assert_eq!(loaded, snapshot);
        Ok(())
    }
}
