//! `show` reports: configuration, histograms and security objects.

use crate::error::Result;
use crate::fields;
use indexmap::IndexMap;
use kvadm_sheet::{
    Aggregator, Converter, DynamicFieldOrder, DynamicFields, Field, FieldType, Projector,
    ProjectorKind, Sheet, SheetStyle, Subgroup, Value, decls, numeric_sum_selector,
};
use kvadm_types::{SourceMap, SourceSet};

/// Deciles of the distribution histogram, `10%` through `100%`.
pub fn distribution() -> Result<Sheet> {
    let mut columns = decls![fields::title_node()];
    for (idx, pct) in (10..=100).step_by(10).enumerate() {
        let index = idx.to_string();
        let projector = Projector::number("histogram", &[index.as_str()]);
        columns.push(Field::new(&format!("{}%", pct), projector).into());
    }
    Ok(Sheet::builder(columns)
        .from_source(&["prefixes", "histogram"])
        .order_by(&["Node"])
        .build()?)
}

pub fn object_size() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::title_node(),
        DynamicFields::new("histogram")
            .required()
            .order(DynamicFieldOrder::Source),
    ])
    .from_source(&["prefixes", "histogram"])
    .order_by(&["Node"])
    .build()?)
}

/// Split a `node -> namespace -> histogram` source into one source set per namespace,
/// each carrying that namespace's histograms as `histogram` next to `prefixes`.
pub fn histograms_by_namespace(sources: &SourceSet, source: &str) -> IndexMap<String, SourceSet> {
    let mut per_namespace: IndexMap<String, SourceMap> = IndexMap::new();
    for (node, value) in sources.get(source).into_iter().flatten() {
        let Some(namespaces) = value.as_map() else {
            continue;
        };
        for (namespace, histogram) in namespaces {
            per_namespace
                .entry(namespace.clone())
                .or_default()
                .insert(node.clone(), histogram.clone());
        }
    }

    per_namespace
        .into_iter()
        .map(|(namespace, histogram)| {
            let mut set = SourceSet::new().with("histogram", histogram);
            if let Some(prefixes) = sources.get("prefixes") {
                set.insert("prefixes", prefixes.clone());
            }
            (namespace, set)
        })
        .collect()
}

pub fn pmap() -> Result<Sheet> {
    let partitions = |title: &str, key: &str| {
        Field::new(title, Projector::number("pmap", &[key])).aggregator(Aggregator::Sum)
    };
    Ok(Sheet::builder(decls![
        fields::iterated("Namespace", "pmap", 0),
        fields::node(),
        fields::hidden_node_id(),
        Field::new("Cluster Key", Projector::number("pmap", &["cluster_key"])),
        Subgroup::new(
            "Partitions",
            vec![
                partitions("Primary", "master_partition_count"),
                partitions("Secondary", "prole_partition_count"),
                partitions("Unavailable", "unavailable_partitions"),
                partitions("Dead", "dead_partitions"),
            ],
        ),
    ])
    .from_source(&["prefixes", "node_ids", "pmap"])
    .for_each("pmap")
    .group_by(&["Namespace"])
    .order_by(&["Node"])
    .build()?)
}

pub fn config() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::node(),
        fields::hidden_node_id(),
        DynamicFields::new("config")
            .required()
            .order(DynamicFieldOrder::Ascending)
            .aggregator_selector(numeric_sum_selector),
    ])
    .from_source(&["prefixes", "config", "node_ids"])
    .order_by(&["Node"])
    .default_style(SheetStyle::Rows)
    .build()?)
}

pub fn config_xdr_namespace() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::node(),
        fields::hidden_node_id(),
        fields::iterated("Namespace", "xdr_namespace_config", 0),
        DynamicFields::new("xdr_namespace_config").required(),
    ])
    .from_source(&["prefixes", "xdr_namespace_config", "node_ids"])
    .for_each("xdr_namespace_config")
    .group_by(&["Namespace"])
    .order_by(&["Namespace", "Node"])
    .default_style(SheetStyle::Rows)
    .build()?)
}

/// Interval label column of a latency histogram.
const TIME_SPAN: &str = "Time Span";

fn latency_projector(key: &str) -> ProjectorKind {
    if key == TIME_SPAN {
        ProjectorKind::String
    } else {
        ProjectorKind::Float
    }
}

fn latency_aggregator(key: &str, _is_numeric: bool) -> Option<Aggregator> {
    (key != TIME_SPAN).then_some(Aggregator::Max)
}

pub fn latencies() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::iterated("Namespace", "histogram", 0),
        fields::iterated("Histogram", "histogram", 1),
        fields::title_node(),
        DynamicFields::new("histogram")
            .required()
            .projector_selector(latency_projector)
            .aggregator_selector(latency_aggregator),
    ])
    .from_source(&["prefixes", "histogram"])
    .for_each_nested("histogram", 2)
    .group_by(&["Namespace", "Histogram"])
    .order_by(&["Node"])
    .build()?)
}

fn map_entry(args: &[Option<Value>], key: &str) -> Option<Value> {
    args.first()?.as_ref()?.as_map()?.get(key).cloned()
}

fn quota(args: &[Option<Value>]) -> Option<Value> {
    map_entry(args, "quota")
}

fn single_record_tps(args: &[Option<Value>]) -> Option<Value> {
    map_entry(args, "single-record-tps")
}

fn scan_query_rps_limited(args: &[Option<Value>]) -> Option<Value> {
    map_entry(args, "scan-query-rps-limited")
}

fn scan_query_limitless(args: &[Option<Value>]) -> Option<Value> {
    map_entry(args, "scan-query-limitless")
}

/// Read or write limits of a user, pulled out of its `read-info`/`write-info` map.
fn user_limits(title: &str, info_key: &str) -> Subgroup {
    let prefix = title.to_ascii_lowercase();
    let limit = |name: &str, func: fn(&[Option<Value>]) -> Option<Value>| {
        Field::new(
            name,
            Projector::func(
                FieldType::Undefined,
                func,
                vec![Projector::identity("users", &[info_key])],
            ),
        )
        .key(&format!("{}_{}", prefix, name))
    };
    Subgroup::new(
        title,
        vec![
            limit("Quota", quota),
            limit("Single Record TPS", single_record_tps),
            limit("Scan/Query Limited RPS", scan_query_rps_limited),
            limit("Scan/Query Limitless", scan_query_limitless),
        ],
    )
}

fn comma_list(title: &str, source: &str, key: &str) -> Field {
    Field::new(
        title,
        Projector::func(
            FieldType::Undefined,
            fields::non_empty,
            vec![Projector::identity(source, &[key])],
        ),
    )
    .converter(Converter::ListToCommaSeparated)
    .right()
}

pub fn users() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::iterated("User", "users", 0),
        comma_list("Roles", "users", "roles"),
        Field::new("Connections", Projector::string("users", &["connections"])),
        user_limits("Read", "read-info"),
        user_limits("Write", "write-info"),
    ])
    .from_source(&["users"])
    .for_each("users")
    .order_by(&["User"])
    .build()?)
}

pub fn roles() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::iterated("Role", "roles", 0),
        comma_list("Privileges", "roles", "privileges"),
        comma_list("Allowlist", "roles", "whitelist"),
        Subgroup::new(
            "Quotas",
            vec![
                Field::new("Read", Projector::string("roles", &["read-quota"])).key("read_quota"),
                Field::new("Write", Projector::string("roles", &["write-quota"])).key("write_quota"),
            ],
        ),
    ])
    .from_source(&["roles"])
    .for_each("roles")
    .order_by(&["Role"])
    .build()?)
}

pub fn udfs() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::iterated("Filename", "udfs", 0),
        Field::new("Hash", Projector::string("udfs", &["hash"])),
        Field::new("Type", Projector::string("udfs", &["type"])),
    ])
    .from_source(&["udfs"])
    .for_each("udfs")
    .order_by(&["Filename"])
    .build()?)
}

/// Index definitions, one entity per index.
pub fn sindex() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        Field::new("Index Name", Projector::string("sindex", &["indexname"])),
        Field::new("Namespace", Projector::string("sindex", &["ns"])),
        Field::new("Set", Projector::string("sindex", &["set"])),
        Field::new("Bin", Projector::string("sindex", &["bins", "bin"])),
        Field::new("Bin Type", Projector::string("sindex", &["type"])),
        Field::new("Index Type", Projector::string("sindex", &["indextype"])),
        Field::new("State", Projector::string("sindex", &["state"])),
    ])
    .from_source(&["sindex"])
    .group_by(&["Namespace", "Set"])
    .order_by(&["Index Name", "Namespace", "Set"])
    .build()?)
}

pub fn mapping_to_ip() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        Field::new("Node ID", Projector::string("mapping", &["0"])),
        Field::new("IP", Projector::string("mapping", &["1"])),
    ])
    .from_source(&["mapping"])
    .order_by(&["Node ID"])
    .build()?)
}

pub fn mapping_to_id() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        Field::new("IP", Projector::string("mapping", &["1"])),
        Field::new("Node ID", Projector::string("mapping", &["0"])),
    ])
    .from_source(&["mapping"])
    .order_by(&["IP"])
    .build()?)
}

/// Per-node match counts of a log search.
pub fn grep_count() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        Field::title_field("Node", Projector::string("node_ids", &["node"])),
        DynamicFields::new("count_result").required(),
    ])
    .from_source(&["node_ids", "count_result"])
    .order_by(&["Node"])
    .default_style(SheetStyle::Rows)
    .build()?)
}
