//! Projection evaluator: turns a sheet and a source set into flat records.

use crate::error::{Error, Result};
use crate::field::{Align, Decl, DynamicFieldOrder, DynamicFields, Field, ProjectorKind};
use crate::projector::{Iteration, ProjectionContext};
use crate::record::{EntryData, NO_ENTRY, Record};
use crate::sheet::{ForEach, Sheet, check_keys_exist};
use crate::value::Common;
use indexmap::{IndexMap, IndexSet};
use kvadm_types::{SourceSet, SourceValue};
use regex::Regex;
use tracing::{debug, warn};

/// A renderable column: a declared or synthesized field and its subgroup title.
#[derive(Debug, Clone)]
pub struct Column {
    pub field: Field,
    pub subgroup: Option<String>,
}

/// Call-time knobs of the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions<'a> {
    pub common: &'a Common,
    /// Keep only dynamic fields whose name matches one of these
    pub selectors: &'a [Regex],
    /// Drop dynamic fields whose value is identical in every record
    pub dynamic_diff: bool,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub columns: Vec<Column>,
    pub records: Vec<Record>,
}

impl Evaluation {
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field.key == key)
    }
}

/// (node, iteration key) pairs, one per record to project.
type Entity = (String, Vec<String>);

pub fn evaluate(sheet: &Sheet, sources: &SourceSet, options: &EvalOptions<'_>) -> Result<Evaluation> {
    if let Some(missing) = sheet.from_source().iter().find(|name| !sources.contains(name)) {
        return Err(Error::MissingSource(missing.clone()));
    }

    let nodes = sources.entities(sheet.from_source());
    let entities: Vec<Entity> = match sheet.for_each() {
        Some(for_each) => iteration_keys(sources, for_each, &nodes)
            .into_iter()
            .flat_map(|key| nodes.iter().map(move |node| (node.clone(), key.clone())))
            .collect(),
        None => nodes.iter().map(|node| (node.clone(), Vec::new())).collect(),
    };

    let mut columns = expand_columns(sheet, sources, &entities, options);
    if sheet.has_dynamic_fields() {
        check_keys_exist(sheet.group_by(), sheet.order_by(), |key| {
            columns.iter().any(|c| c.field.key == key)
        })?;
    }

    let mut records: Vec<Record> = entities
        .iter()
        .map(|(node, key)| {
            let ctx = context(sources, sheet.for_each(), node, key);
            let mut record = Record::new(node.clone(), key.clone());
            for column in &columns {
                record.set_value(&column.field.key, column.field.projector.project(&ctx));
            }
            record
        })
        .collect();

    if let Some(filter) = sheet.where_filter() {
        records.retain(|record| filter(record));
    }

    for record in &mut records {
        convert_record(record, &columns, options.common);
    }

    // With a single record nothing can differ, so every dynamic field goes.
    if options.dynamic_diff {
        columns.retain(|column| {
            let key = column.field.key.as_str();
            let keep = !column.field.is_dynamic
                || records.windows(2).any(|pair| pair[0].get(key) != pair[1].get(key));
            if !keep {
                for record in &mut records {
                    record.remove(key);
                }
            }
            keep
        });
    }

    debug!(
        records = records.len(),
        columns = columns.len(),
        nodes = nodes.len(),
        "evaluated sheet"
    );
    Ok(Evaluation { columns, records })
}

fn context<'a>(
    sources: &'a SourceSet,
    for_each: Option<&'a ForEach>,
    node: &'a str,
    key: &'a [String],
) -> ProjectionContext<'a> {
    ProjectionContext {
        sources,
        node,
        iteration: for_each.map(|fe| Iteration {
            source: fe.source.as_str(),
            key,
        }),
    }
}

/// Union of iteration keys across every node. Any single node may be missing
/// entities the others report, so no node's key set is authoritative.
fn iteration_keys(sources: &SourceSet, for_each: &ForEach, nodes: &[String]) -> Vec<Vec<String>> {
    let mut keys = IndexSet::new();
    for node in nodes {
        if let Some(value) = sources.node_value(&for_each.source, node) {
            collect_keys(value, for_each.depth, &mut Vec::new(), &mut keys);
        }
    }
    keys.into_iter().collect()
}

fn collect_keys(
    value: &SourceValue,
    depth: usize,
    prefix: &mut Vec<String>,
    out: &mut IndexSet<Vec<String>>,
) {
    let Some(map) = value.as_map() else {
        return;
    };
    for (key, child) in map {
        prefix.push(key.clone());
        if depth <= 1 {
            out.insert(prefix.clone());
        } else {
            collect_keys(child, depth - 1, prefix, out);
        }
        prefix.pop();
    }
}

fn expand_columns(
    sheet: &Sheet,
    sources: &SourceSet,
    entities: &[Entity],
    options: &EvalOptions<'_>,
) -> Vec<Column> {
    let mut columns = Vec::new();
    for decl in sheet.decls() {
        match decl {
            Decl::Field(field) => columns.push(Column {
                field: field.clone(),
                subgroup: None,
            }),
            Decl::Subgroup(subgroup) => {
                columns.extend(subgroup.fields.iter().map(|field| Column {
                    field: field.clone(),
                    subgroup: Some(subgroup.title.clone()),
                }));
            }
            Decl::Dynamic(dynamic) => {
                for field in expand_dynamic(dynamic, sheet, sources, entities, options) {
                    if columns.iter().any(|c| c.field.key == field.key) {
                        warn!(key = %field.key, "dynamic field collides with a declared field, skipped");
                        continue;
                    }
                    columns.push(Column {
                        field,
                        subgroup: None,
                    });
                }
            }
        }
    }
    columns
}

#[derive(Debug)]
struct KeyStats {
    present: bool,
    numeric: bool,
    boolean: bool,
}

impl Default for KeyStats {
    fn default() -> Self {
        Self {
            present: false,
            numeric: true,
            boolean: true,
        }
    }
}

impl KeyStats {
    fn observe(&mut self, value: &SourceValue) {
        self.present = true;
        self.numeric &= value.is_numeric();
        self.boolean &= matches!(value, SourceValue::Bool(_));
    }

    fn is_numeric(&self) -> bool {
        self.present && self.numeric
    }

    fn inferred_kind(&self) -> ProjectorKind {
        if self.is_numeric() {
            ProjectorKind::Number
        } else if self.present && self.boolean {
            ProjectorKind::Boolean
        } else {
            ProjectorKind::String
        }
    }
}

fn expand_dynamic(
    dynamic: &DynamicFields,
    sheet: &Sheet,
    sources: &SourceSet,
    entities: &[Entity],
    options: &EvalOptions<'_>,
) -> Vec<Field> {
    let mut stats: IndexMap<String, KeyStats> = IndexMap::new();
    for (node, key) in entities {
        let ctx = context(sources, sheet.for_each(), node, key);
        let Some(map) = ctx.base(&dynamic.source).and_then(SourceValue::as_map) else {
            continue;
        };
        for (name, value) in map {
            let entry = stats.entry(name.clone()).or_default();
            if let Some(value) = value.present() {
                entry.observe(value);
            }
        }
    }

    if !options.selectors.is_empty() {
        stats.retain(|name, _| options.selectors.iter().any(|re| re.is_match(name)));
    }

    match dynamic.order {
        DynamicFieldOrder::Source => {}
        DynamicFieldOrder::Ascending => stats.sort_keys(),
        DynamicFieldOrder::Descending => stats.sort_by(|a, _, b, _| b.cmp(a)),
    }

    debug!(source = %dynamic.source, fields = stats.len(), "expanded dynamic fields");

    stats
        .into_iter()
        .map(|(name, stats)| {
            let kind = dynamic
                .projector_selector
                .map(|select| select(&name))
                .unwrap_or_else(|| stats.inferred_kind());
            let aggregator = dynamic
                .aggregator_selector
                .and_then(|select| select(&name, stats.is_numeric()));

            let mut field = Field::new(&name, kind.build(&dynamic.source, &name));
            field.aggregator = aggregator;
            field.is_dynamic = true;
            field.required = dynamic.required;
            if stats.is_numeric() {
                field.align = Align::Right;
            }
            field
        })
        .collect()
}

fn convert_record(record: &mut Record, columns: &[Column], common: &Common) {
    let converted = converted_cells(record, columns, common);
    for (key, text) in converted {
        record.set_converted(&key, text);
    }
}

fn converted_cells(record: &Record, columns: &[Column], common: &Common) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|column| {
            let field = &column.field;
            let text = match record.get(&field.key) {
                None => NO_ENTRY.to_string(),
                Some(value) => {
                    let edata = EntryData {
                        value,
                        record,
                        common,
                    };
                    match &field.converter {
                        Some(converter) => converter.convert(&edata),
                        None => value.to_string(),
                    }
                }
            };
            (field.key.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::numeric_sum_selector;
    use crate::decls;
    use crate::field::Subgroup;
    use crate::projector::Projector;
    use crate::value::Value;
    use kvadm_types::source_map;

    fn no_options(common: &Common) -> EvalOptions<'_> {
        EvalOptions {
            common,
            selectors: &[],
            dynamic_diff: false,
        }
    }

    fn namespace_sheet() -> Sheet {
        Sheet::builder(decls![
            Field::new("Namespace", Projector::for_each_key("ns_stats", 0)),
            Field::new("Node", Projector::string("prefixes", &[])),
            Field::new("Objects", Projector::number("ns_stats", &["master_objects", "master-objects"])),
        ])
        .from_source(&["prefixes", "ns_stats"])
        .for_each("ns_stats")
        .build()
        .unwrap()
    }

    #[test]
    fn test_for_each_unions_keys_across_nodes() {
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "X" => "node-x", "Y" => "node-y" })
            .with(
                "ns_stats",
                source_map! {
                    "X" => source_map! { "n1" => source_map! { "master_objects" => 1 }, "n2" => source_map! { "master_objects" => 2 } },
                    "Y" => source_map! { "n2" => source_map! { "master-objects" => 3 }, "n3" => source_map! { "master_objects" => 4 } },
                },
            );
        let common = Common::new();
        let eval = evaluate(&namespace_sheet(), &sources, &no_options(&common)).unwrap();

        let rows: Vec<(String, String, Option<Value>)> = eval
            .records
            .iter()
            .map(|r| {
                (
                    r.get("Namespace").unwrap().to_string(),
                    r.node.clone(),
                    r.get("Objects").cloned(),
                )
            })
            .collect();

        assert_eq!(
            rows,
            vec![
                ("n1".to_string(), "X".to_string(), Some(Value::Int(1))),
                ("n1".to_string(), "Y".to_string(), None),
                ("n2".to_string(), "X".to_string(), Some(Value::Int(2))),
                ("n2".to_string(), "Y".to_string(), Some(Value::Int(3))),
                ("n3".to_string(), "X".to_string(), None),
                ("n3".to_string(), "Y".to_string(), Some(Value::Int(4))),
            ]
        );
        assert_eq!(eval.records[1].converted("Objects"), NO_ENTRY);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let sources = SourceSet::new().with("prefixes", source_map! { "X" => "node-x" });
        let common = Common::new();
        let result = evaluate(&namespace_sheet(), &sources, &no_options(&common));
        assert!(matches!(result, Err(Error::MissingSource(name)) if name == "ns_stats"));
    }

    #[test]
    fn test_errored_node_keeps_its_row() {
        let sheet = Sheet::builder(decls![
            Field::new("Node", Projector::string("prefixes", &[])),
            Field::new("X", Projector::number("stats", &["x"])),
        ])
        .from_source(&["prefixes", "stats"])
        .build()
        .unwrap();
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "A" => "a", "B" => "b" })
            .with("stats", source_map! { "A" => SourceValue::error("down"), "B" => source_map! { "x" => 5 } });
        let common = Common::new();
        let eval = evaluate(&sheet, &sources, &no_options(&common)).unwrap();

        assert_eq!(eval.records.len(), 2);
        assert_eq!(eval.records[0].get("X"), None);
        assert_eq!(eval.records[0].converted("Node"), "a");
        assert_eq!(eval.records[1].get("X"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_where_filters_after_projection() {
        fn enabled(record: &Record) -> bool {
            record.get("Enabled").is_some_and(Value::is_truthy)
        }
        let sheet = Sheet::builder(decls![
            Field::new("Enabled", Projector::boolean("xdr_enable", &[])).hidden(),
            Field::new("Node", Projector::string("prefixes", &[])),
        ])
        .from_source(&["xdr_enable", "prefixes"])
        .where_(enabled)
        .build()
        .unwrap();
        let sources = SourceSet::new()
            .with("xdr_enable", source_map! { "A" => true, "B" => false })
            .with("prefixes", source_map! { "A" => "a", "B" => "b" });
        let common = Common::new();
        let eval = evaluate(&sheet, &sources, &no_options(&common)).unwrap();

        assert_eq!(eval.records.len(), 1);
        assert_eq!(eval.records[0].node, "A");
    }

    fn config_sheet() -> Sheet {
        Sheet::builder(decls![
            Field::title_field("Node", Projector::string("prefixes", &[])),
            DynamicFields::new("data")
                .order(DynamicFieldOrder::Ascending)
                .aggregator_selector(numeric_sum_selector),
        ])
        .from_source(&["prefixes", "data"])
        .build()
        .unwrap()
    }

    fn config_sources() -> SourceSet {
        SourceSet::new()
            .with("prefixes", source_map! { "A" => "a", "B" => "b" })
            .with(
                "data",
                source_map! {
                    "A" => source_map! { "threads" => "8", "mode" => "fast", "batch" => "100" },
                    "B" => source_map! { "threads" => "8", "mode" => "slow", "extra" => "x" },
                },
            )
    }

    #[test]
    fn test_dynamic_fields_expand_with_selectors_and_order() {
        let common = Common::new();
        let eval = evaluate(&config_sheet(), &config_sources(), &no_options(&common)).unwrap();
        let keys: Vec<&str> = eval.columns.iter().map(|c| c.field.key.as_str()).collect();
        assert_eq!(keys, vec!["Node", "batch", "extra", "mode", "threads"]);

        let threads = eval.column("threads").unwrap();
        assert!(threads.field.is_dynamic);
        assert_eq!(threads.field.aggregator, Some(crate::Aggregator::Sum));
        assert_eq!(eval.column("mode").unwrap().field.aggregator, None);

        let selectors = vec![Regex::new("^th").unwrap()];
        let options = EvalOptions { common: &common, selectors: &selectors, dynamic_diff: false };
        let eval = evaluate(&config_sheet(), &config_sources(), &options).unwrap();
        let keys: Vec<&str> = eval.columns.iter().map(|c| c.field.key.as_str()).collect();
        assert_eq!(keys, vec!["Node", "threads"]);
    }

    #[test]
    fn test_dynamic_diff_drops_identical_fields() {
        let common = Common::new();
        let options = EvalOptions { common: &common, selectors: &[], dynamic_diff: true };
        let eval = evaluate(&config_sheet(), &config_sources(), &options).unwrap();
        let keys: Vec<&str> = eval.columns.iter().map(|c| c.field.key.as_str()).collect();
        assert_eq!(keys, vec!["Node", "batch", "extra", "mode"]);
        assert!(eval.records[0].cell("threads").is_none());
    }

    #[test]
    fn test_dynamic_diff_on_single_node_keeps_static_fields_only() {
        let common = Common::new();
        let options = EvalOptions { common: &common, selectors: &[], dynamic_diff: true };
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "A" => "a" })
            .with("data", source_map! { "A" => source_map! { "threads" => "8", "mode" => "fast" } });
        let eval = evaluate(&config_sheet(), &sources, &options).unwrap();
        let keys: Vec<&str> = eval.columns.iter().map(|c| c.field.key.as_str()).collect();
        assert_eq!(keys, vec!["Node"]);
        assert_eq!(eval.records.len(), 1);
    }

    #[test]
    fn test_dynamic_order_by_checked_after_expansion() {
        let sheet = Sheet::builder(decls![
            Field::new("Node", Projector::string("prefixes", &[])),
            DynamicFields::new("data"),
        ])
        .from_source(&["prefixes", "data"])
        .order_by(&["not-a-param"])
        .build()
        .unwrap();
        let common = Common::new();
        let result = evaluate(&sheet, &config_sources(), &no_options(&common));
        assert!(matches!(result, Err(Error::UnknownOrderBy(_))));
    }

    #[test]
    fn test_subgroup_fields_are_flattened_with_titles() {
        let sheet = Sheet::builder(decls![
            Field::new("Node", Projector::string("prefixes", &[])),
            Subgroup::new(
                "Disk",
                vec![Field::new("Used", Projector::number("stats", &["used"])).key("disk_used")],
            ),
        ])
        .from_source(&["prefixes", "stats"])
        .build()
        .unwrap();
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "A" => "a" })
            .with("stats", source_map! { "A" => source_map! { "used" => 10 } });
        let common = Common::new();
        let eval = evaluate(&sheet, &sources, &no_options(&common)).unwrap();
        let disk = eval.column("disk_used").unwrap();
        assert_eq!(disk.subgroup.as_deref(), Some("Disk"));
        assert_eq!(eval.records[0].get("disk_used"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_converter_sees_sibling_values() {
        fn star_principal(edata: &EntryData<'_>) -> String {
            let is_principal = edata.common.get("principal") == Some(edata.value);
            if is_principal {
                format!("*{}", edata.value)
            } else {
                edata.value.to_string()
            }
        }
        let sheet = Sheet::builder(decls![
            Field::new("Node ID", Projector::string("node_ids", &[]))
                .converter(crate::Converter::Custom(star_principal)),
        ])
        .from_source(&["node_ids"])
        .build()
        .unwrap();
        let sources = SourceSet::new().with("node_ids", source_map! { "A" => "BB9", "B" => "CC1" });
        let mut common = Common::new();
        common.insert("principal".to_string(), Value::from("BB9"));
        let eval = evaluate(&sheet, &sources, &no_options(&common)).unwrap();
        assert_eq!(eval.records[0].converted("Node ID"), "*BB9");
        assert_eq!(eval.records[1].converted("Node ID"), "CC1");
    }
}
