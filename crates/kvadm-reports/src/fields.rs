//! Fields shared by several reports.

use kvadm_sheet::{Condition, EntryData, Field, FieldType, Formatter, Projector, Value};

/// Common value holding the node id of the cluster principal.
pub const PRINCIPAL: &str = "principal";

/// Older servers report an unnamed cluster as the string "null".
fn named_cluster(args: &[Option<Value>]) -> Option<Value> {
    match args.first()? {
        Some(Value::Str(name)) if name == "null" => None,
        other => other.clone(),
    }
}

pub fn cluster() -> Field {
    Field::new(
        "Cluster",
        Projector::func(
            FieldType::String,
            named_cluster,
            vec![Projector::string("cluster_names", &[])],
        ),
    )
    .key("cluster_name")
}

fn is_principal() -> Condition {
    Condition::EqualsCommon {
        field: "Node ID".to_string(),
        common: PRINCIPAL.to_string(),
    }
}

/// The node's display name, highlighted on the principal. Needs [`hidden_node_id`]
/// (or another field keyed "Node ID") in the same sheet.
pub fn node() -> Field {
    Field::new("Node", Projector::string("prefixes", &[]))
        .formatter(Formatter::green_alert(is_principal()))
}

pub fn title_node() -> Field {
    Field::title_field("Node", Projector::string("prefixes", &[]))
}

pub fn hidden_node_id() -> Field {
    Field::new("Node ID", Projector::string("node_ids", &[])).hidden()
}

fn star_principal(edata: &EntryData<'_>) -> String {
    if edata.common.get(PRINCIPAL) == Some(edata.value) {
        format!("*{}", edata.value)
    } else {
        edata.value.to_string()
    }
}

pub fn visible_node_id() -> Field {
    Field::new("Node ID", Projector::string("node_ids", &[]))
        .converter(kvadm_sheet::Converter::Custom(star_principal))
        .formatter(Formatter::green_alert(is_principal()))
        .right()
}

/// The component of the iteration key at `index` of `source`.
pub fn iterated(title: &str, source: &str, index: usize) -> Field {
    Field::new(title, Projector::for_each_key(source, index))
}

pub fn namespace() -> Field {
    iterated("Namespace", "ns_stats", 0)
}

/// Empty lists read as missing.
pub fn non_empty(args: &[Option<Value>]) -> Option<Value> {
    match args.first()? {
        Some(Value::List(items)) if items.is_empty() => None,
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvadm_sheet::{Common, Record};

    #[test]
    fn test_named_cluster_drops_null() {
        assert_eq!(named_cluster(&[Some(Value::from("null"))]), None);
        assert_eq!(
            named_cluster(&[Some(Value::from("east"))]),
            Some(Value::from("east"))
        );
    }

    #[test]
    fn test_star_principal() {
        let record = Record::new("A", Vec::new());
        let mut common = Common::new();
        common.insert(PRINCIPAL.to_string(), Value::from("BB9"));
        let value = Value::from("BB9");
        let edata = EntryData {
            value: &value,
            record: &record,
            common: &common,
        };
        assert_eq!(star_principal(&edata), "*BB9");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&[Some(Value::List(Vec::new()))]), None);
        assert_eq!(non_empty(&[Some(Value::from(1))]), Some(Value::Int(1)));
    }
}
