//! Cluster-wide namespace summary. The `ns_stats` source here is keyed by a single
//! cluster entity whose mapping holds one pre-aggregated entry per namespace.

use crate::error::Result;
use crate::fields;
use kvadm_sheet::{
    Condition, Converter, Field, FieldType, Formatter, Projector, Sheet, Subgroup, Value, decls,
};

fn join_factors(args: &[Option<Value>]) -> Option<Value> {
    match args.first()?.as_ref()? {
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Some(Value::Str(parts.join(",")))
        }
        other => Some(Value::Str(other.to_string())),
    }
}

pub fn namespace() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::namespace()
            .formatter(Formatter::red_alert(Condition::FieldTrue("active_migrations".to_string()))),
        Field::new("active_migrations", Projector::boolean("ns_stats", &["migrations_in_progress"]))
            .hidden(),
        Subgroup::new(
            "Devices",
            vec![
                Field::new("Total", Projector::number("ns_stats", &["devices_total"])).key("devices_total"),
                Field::new("Per-Node", Projector::number("ns_stats", &["devices_per_node"]))
                    .key("devices_per_node"),
            ],
        ),
        Subgroup::new(
            "Memory",
            vec![
                Field::new("Total", Projector::number("ns_stats", &["memory_total"]))
                    .key("memory_total")
                    .converter(Converter::Byte),
                Field::new("Used%", Projector::inverted_percent("ns_stats", &["memory_available_pct"]))
                    .key("memory_used_pct"),
                Field::new("Avail%", Projector::percent("ns_stats", &["memory_available_pct"]))
                    .key("memory_avail_pct"),
            ],
        ),
        Subgroup::new(
            "Disk",
            vec![
                Field::new("Total", Projector::number("ns_stats", &["disk_total"]))
                    .key("disk_total")
                    .converter(Converter::Byte),
                Field::new("Used%", Projector::percent("ns_stats", &["disk_used_pct"])).key("disk_used_pct"),
                Field::new("Avail%", Projector::percent("ns_stats", &["disk_available_pct"]))
                    .key("disk_avail_pct"),
            ],
        ),
        Field::new(
            "Replication Factors",
            Projector::func(
                FieldType::String,
                join_factors,
                vec![Projector::identity("ns_stats", &["repl_factor"])],
            ),
        )
        .right(),
        Field::new("Cache Read%", Projector::percent("ns_stats", &["cache_read_pct"])),
        Field::new("Master Objects", Projector::number("ns_stats", &["master_objects"]))
            .converter(Converter::ScientificUnits),
        Subgroup::new(
            "Usage (Unique-Data)",
            vec![
                Field::new("In-Memory", Projector::number("ns_stats", &["license_data_in_memory"]))
                    .converter(Converter::Byte),
                Field::new("On-Disk", Projector::number("ns_stats", &["license_data_on_disk"]))
                    .converter(Converter::Byte),
            ],
        ),
        Field::new("Compression Ratio", Projector::float("ns_stats", &["compression-ratio"])),
    ])
    .from_source(&["ns_stats"])
    .for_each("ns_stats")
    .group_by(&["Namespace"])
    .order_by(&["Namespace"])
    .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_factors() {
        let args = [Some(Value::List(vec![Value::Int(2), Value::Int(3)]))];
        assert_eq!(join_factors(&args), Some(Value::from("2,3")));
        assert_eq!(join_factors(&[Some(Value::Int(2))]), Some(Value::from("2")));
    }
}
