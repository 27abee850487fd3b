use crate::args::{MappingBy, ShowCommand};
use crate::context::{ReportContext, ReportRequest};
use anyhow::Result;
use kvadm_reports::{LatencyTable, ReportKind, histograms_by_namespace, merge_latency_tables};
use kvadm_types::SourceSet;
use tracing::debug;

/// Latency tables from servers that report per-namespace histograms.
const LATENCIES_SOURCE: &str = "latencies";
/// Latency tables in the older single-table layout.
const LEGACY_LATENCY_SOURCE: &str = "latency";

pub fn handle(ctx: &ReportContext, command: ShowCommand) -> Result<()> {
    let sources = ctx.sources();
    let plain = ReportRequest::default();

    match command {
        ShowCommand::Config {
            diff,
            like,
            xdr_namespace,
        } => {
            let kind = if xdr_namespace {
                ReportKind::ShowConfigXdrNamespace
            } else {
                ReportKind::ShowConfig
            };
            let request = ReportRequest {
                dynamic_diff: diff,
                selectors: like,
                ..ReportRequest::default()
            };
            ctx.print(kind, sources, &request)
        }
        ShowCommand::Latencies { like } => {
            let merged = latency_sources(sources)?;
            let request = ReportRequest {
                selectors: like,
                ..ReportRequest::default()
            };
            ctx.print(ReportKind::ShowLatencies, &merged, &request)
        }
        ShowCommand::Distribution => per_namespace(ctx, ReportKind::ShowDistribution, "distribution"),
        ShowCommand::ObjectSize => per_namespace(ctx, ReportKind::ShowObjectSize, "object_size"),
        ShowCommand::Pmap => ctx.print(ReportKind::ShowPmap, sources, &plain),
        ShowCommand::Users => ctx.print(ReportKind::ShowUsers, sources, &plain),
        ShowCommand::Roles => ctx.print(ReportKind::ShowRoles, sources, &plain),
        ShowCommand::Udfs => ctx.print(ReportKind::ShowUdfs, sources, &plain),
        ShowCommand::Sindex => ctx.print(ReportKind::ShowSindex, sources, &plain),
        ShowCommand::Mapping { by } => {
            let kind = match by {
                MappingBy::Id => ReportKind::ShowMappingToIp,
                MappingBy::Ip => ReportKind::ShowMappingToId,
            };
            ctx.print(kind, sources, &plain)
        }
        ShowCommand::GrepCount => ctx.print(ReportKind::GrepCount, sources, &plain),
    }
}

/// One table per namespace found in the `node -> namespace -> histogram` source.
fn per_namespace(ctx: &ReportContext, kind: ReportKind, source: &str) -> Result<()> {
    let sources = ctx.sources();
    if !sources.contains(source) {
        return Err(kvadm_sheet::Error::MissingSource(source.to_string()).into());
    }

    let split = histograms_by_namespace(sources, source);
    debug!(report = kind.name(), namespaces = split.len(), "split histograms by namespace");
    for (namespace, namespace_sources) in &split {
        let request = ReportRequest {
            title: Some(format!("{} - {}", namespace, kind.title())),
            ..ReportRequest::default()
        };
        ctx.print(kind, namespace_sources, &request)?;
    }
    Ok(())
}

/// Build the source set of the latencies report from both table layouts.
fn latency_sources(sources: &SourceSet) -> Result<SourceSet> {
    if !sources.contains(LATENCIES_SOURCE) && !sources.contains(LEGACY_LATENCY_SOURCE) {
        return Err(kvadm_sheet::Error::MissingSource(LATENCIES_SOURCE.to_string()).into());
    }

    let latencies = load_table(sources, LATENCIES_SOURCE);
    let legacy = load_table(sources, LEGACY_LATENCY_SOURCE);
    let merged = merge_latency_tables(&latencies, &legacy);
    debug!(
        nodes = merged.len(),
        legacy_nodes = legacy.len(),
        "merged latency tables"
    );

    let mut set = SourceSet::new().with("histogram", merged.to_source_value());
    if let Some(prefixes) = sources.get("prefixes") {
        set.insert("prefixes", prefixes.clone());
    }
    Ok(set)
}

fn load_table(sources: &SourceSet, name: &str) -> LatencyTable {
    sources
        .get(name)
        .map(LatencyTable::from_source)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvadm_types::{SourceMap, source_map};
    use serde_json::json;

    fn latency_json(columns: serde_json::Value, row: serde_json::Value) -> SourceMap {
        let value = json!({
            "read": {
                "total": { "columns": columns, "values": [row] },
                "namespace": {}
            }
        });
        SourceMap::from_iter([(
            "A".to_string(),
            serde_json::from_value(value).unwrap(),
        )])
    }

    #[test]
    fn test_latency_sources_keep_good_nodes_beside_malformed_ones() {
        let mut legacy = latency_json(json!(["Time Span", "ops/sec"]), json!(["10:00->10:10", 80.0]));
        legacy.insert("B".to_string(), serde_json::from_value(json!({ "read": "garbage" })).unwrap());
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "A" => "node-a", "B" => "node-b" })
            .with(LEGACY_LATENCY_SOURCE, legacy);

        let merged = latency_sources(&sources).unwrap();
        let histogram = merged.get("histogram").unwrap();
        assert!(histogram.get("A").is_some());
        assert!(histogram.get("B").is_none());
    }

    #[test]
    fn test_latency_sources_require_a_table() {
        let sources = SourceSet::new().with("prefixes", source_map! { "A" => "node-a" });
        assert!(latency_sources(&sources).is_err());
    }

    #[test]
    fn test_latency_sources_flatten_legacy_only() {
        let sources = SourceSet::new()
            .with("prefixes", source_map! { "A" => "node-a" })
            .with(
                LEGACY_LATENCY_SOURCE,
                latency_json(json!(["Time Span", "ops/sec"]), json!(["10:00->10:10", 80.0])),
            );

        let merged = latency_sources(&sources).unwrap();
        assert!(merged.contains("prefixes"));
        let ops = merged
            .get("histogram")
            .and_then(|h| h.get("A"))
            .and_then(|node| node.get_path(&["total", "read", "ops/sec"]));
        assert_eq!(ops.and_then(|v| v.as_f64()), Some(80.0));
    }
}
