//! `info` reports: one row per node (or per node and entity).

use crate::error::Result;
use crate::fields;
use kvadm_sheet::{
    Aggregator, Condition, Converter, Field, FieldType, Formatter, Projector, Record, Sheet,
    Subgroup, Value, decls,
};

fn project_build(args: &[Option<Value>]) -> Option<Value> {
    let build = args.first()?.as_ref()?.to_string();
    let edition = args
        .get(1)
        .and_then(Option::as_ref)
        .map(|v| v.to_string().to_ascii_lowercase())
        .unwrap_or_default();

    let tagged = if edition.contains("community") {
        format!("C-{}", build)
    } else if edition.contains("enterprise") {
        format!("E-{}", build)
    } else {
        build
    };
    Some(Value::Str(tagged))
}

pub fn network() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::cluster(),
        fields::node(),
        fields::visible_node_id(),
        Field::new("IP", Projector::string("hosts", &[])),
        Field::new(
            "Build",
            Projector::func(
                FieldType::String,
                project_build,
                vec![
                    Projector::string("builds", &[]),
                    Projector::string("versions", &[]),
                ],
            ),
        ),
        Field::new("Migrations", Projector::number("stats", &["migrate_partitions_remaining"]))
            .converter(Converter::ScientificUnits),
        Subgroup::new(
            "Cluster",
            vec![
                Field::new("Size", Projector::number("stats", &["cluster_size"])).key("cluster_size"),
                Field::new("Key", Projector::string("stats", &["cluster_key"]))
                    .key("cluster_key")
                    .right(),
                Field::new("Integrity", Projector::boolean("stats", &["cluster_integrity"]))
                    .key("cluster_integrity")
                    .formatter(Formatter::red_alert(Condition::IsFalse)),
                Field::new("Principal", Projector::string("stats", &["paxos_principal"]))
                    .key("cluster_principal")
                    .right(),
            ],
        ),
        Field::new("Client Conns", Projector::number("stats", &["client_connections"])),
        Field::new("Uptime", Projector::number("stats", &["uptime"])).converter(Converter::Time),
    ])
    .from_source(&[
        "cluster_names",
        "prefixes",
        "node_ids",
        "hosts",
        "builds",
        "versions",
        "stats",
    ])
    .group_by(&["cluster_name"])
    .order_by(&["Node"])
    .build()?)
}

fn total_records(include_prole_tombstones: bool) -> Projector {
    let mut parts = vec![
        Projector::number("ns_stats", &["master_objects", "master-objects"]),
        Projector::number("ns_stats", &["master_tombstones"]),
        Projector::number("ns_stats", &["prole_objects", "prole-objects"]),
    ];
    if include_prole_tombstones {
        parts.push(Projector::number("ns_stats", &["prole_tombstones"]));
    }
    parts.push(Projector::number("ns_stats", &["non_replica_objects"]));
    parts.push(Projector::number("ns_stats", &["non_replica_tombstones"]));
    Projector::sum(parts)
}

fn summed(title: &str, key: &str, projector: Projector, converter: Converter) -> Field {
    Field::new(title, projector)
        .key(key)
        .converter(converter)
        .aggregator(Aggregator::Sum)
}

pub fn namespace_usage() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::cluster(),
        fields::namespace(),
        fields::node(),
        fields::hidden_node_id(),
        summed("Total Records", "Total Records", total_records(false), Converter::ScientificUnits),
        summed(
            "Expirations",
            "Expirations",
            Projector::number("ns_stats", &["expired_objects", "expired-objects"]),
            Converter::ScientificUnits,
        ),
        summed(
            "Evictions",
            "Evictions",
            Projector::number("ns_stats", &["evicted_objects", "evicted-objects"]),
            Converter::ScientificUnits,
        ),
        Field::new("Stop Writes", Projector::boolean("ns_stats", &["stop_writes", "stop-writes"]))
            .formatter(Formatter::red_alert(Condition::IsTrue)),
        Subgroup::new(
            "Disk",
            vec![
                summed(
                    "Used",
                    "disk_used",
                    Projector::number("ns_stats", &["device_used_bytes", "used-bytes-disk"]),
                    Converter::Byte,
                ),
                Field::new(
                    "Used%",
                    Projector::inverted_percent("ns_stats", &["device_free_pct", "free_pct_disk"]),
                )
                .key("disk_used_pct")
                .formatter(Formatter::yellow_alert(Condition::AtLeastField("disk_hwm_pct".to_string()))),
                Field::new("HWM%", Projector::number("ns_stats", &["high-water-disk-pct"])).key("disk_hwm_pct"),
                Field::new(
                    "Avail%",
                    Projector::number("ns_stats", &["device_available_pct", "available_pct"]),
                )
                .key("disk_avail_pct")
                .formatter(Formatter::red_alert(Condition::Below(10.0))),
            ],
        ),
        Subgroup::new(
            "Memory",
            vec![
                summed(
                    "Used",
                    "memory_used",
                    Projector::number("ns_stats", &["memory_used_bytes"]),
                    Converter::Byte,
                ),
                Field::new(
                    "Used%",
                    Projector::inverted_percent("ns_stats", &["memory_free_pct", "free_pct_memory"]),
                )
                .key("memory_used_pct")
                .formatter(Formatter::yellow_alert(Condition::AboveField("memory_hwm_pct".to_string()))),
                Field::new("HWM%", Projector::number("ns_stats", &["high-water-memory-pct"])).key("memory_hwm_pct"),
                Field::new("Stop%", Projector::number("ns_stats", &["stop-writes-pct"])).key("memory_stop_pct"),
            ],
        ),
        Subgroup::new(
            "Primary Index",
            vec![
                Field::new("Type", Projector::string("ns_stats", &["index-type"])).key("index_type"),
                summed(
                    "Used",
                    "index_used",
                    Projector::number("ns_stats", &["index_flash_used_bytes", "index_pmem_used_bytes"]),
                    Converter::Byte,
                ),
                Field::new(
                    "Used%",
                    Projector::percent("ns_stats", &["index_flash_used_pct", "index_pmem_used_pct"]),
                )
                .key("index_used_pct")
                .formatter(Formatter::yellow_alert(Condition::AtLeastField("index_hwm_pct".to_string()))),
                Field::new(
                    "HWM%",
                    Projector::number("ns_stats", &["index-type.mounts-high-water-pct"]),
                )
                .key("index_hwm_pct"),
            ],
        ),
    ])
    .from_source(&["cluster_names", "node_ids", "prefixes", "ns_stats"])
    .for_each("ns_stats")
    .group_by(&["cluster_name", "Namespace"])
    .order_by(&["Node"])
    .build()?)
}

pub fn namespace_object() -> Result<Sheet> {
    let scientific = Converter::ScientificUnits;
    Ok(Sheet::builder(decls![
        fields::cluster(),
        fields::namespace(),
        fields::node(),
        fields::hidden_node_id(),
        Field::new("Rack ID", Projector::number("ns_stats", &["rack-id"])),
        Field::new(
            "Repl Factor",
            Projector::number(
                "ns_stats",
                &["effective_replication_factor", "replication-factor", "repl-factor"],
            ),
        ),
        summed("Total Records", "Total Records", total_records(true), scientific),
        Subgroup::new(
            "Objects",
            vec![
                summed(
                    "Master",
                    "master_objects",
                    Projector::number("ns_stats", &["master_objects", "master-objects"]),
                    scientific,
                ),
                summed(
                    "Prole",
                    "prole_objects",
                    Projector::number("ns_stats", &["prole_objects", "prole-objects"]),
                    scientific,
                ),
                summed(
                    "Non-Replica",
                    "non_replica_objects",
                    Projector::number("ns_stats", &["non_replica_objects"]),
                    scientific,
                ),
            ],
        ),
        Subgroup::new(
            "Tombstones",
            vec![
                summed(
                    "Master",
                    "master_tombstones",
                    Projector::number("ns_stats", &["master_tombstones"]),
                    scientific,
                ),
                summed(
                    "Prole",
                    "prole_tombstones",
                    Projector::number("ns_stats", &["prole_tombstones"]),
                    scientific,
                ),
                summed(
                    "Non-Replica",
                    "non_replica_tombstones",
                    Projector::number("ns_stats", &["non_replica_tombstones"]),
                    scientific,
                ),
            ],
        ),
        Subgroup::new(
            "Pending Migrates",
            vec![
                summed(
                    "Tx",
                    "migrate_tx",
                    Projector::number(
                        "ns_stats",
                        &["migrate_tx_partitions_remaining", "migrate-tx-partitions-remaining"],
                    ),
                    scientific,
                ),
                summed(
                    "Rx",
                    "migrate_rx",
                    Projector::number(
                        "ns_stats",
                        &["migrate_rx_partitions_remaining", "migrate-rx-partitions-remaining"],
                    ),
                    scientific,
                ),
            ],
        ),
    ])
    .from_source(&["cluster_names", "node_ids", "prefixes", "ns_stats"])
    .for_each("ns_stats")
    .group_by(&["cluster_name", "Namespace"])
    .order_by(&["Node"])
    .build()?)
}

pub fn set() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::cluster(),
        fields::iterated("Namespace", "set_stats", 0),
        fields::iterated("Set", "set_stats", 1),
        fields::node(),
        fields::hidden_node_id(),
        Field::new("Set Delete", Projector::boolean("set_stats", &["deleting", "set-delete"])),
        summed(
            "Mem Used",
            "Mem Used",
            Projector::number("set_stats", &["memory_data_bytes", "n-bytes-memory"]),
            Converter::Byte,
        ),
        summed(
            "Disk Used",
            "Disk Used",
            Projector::number("set_stats", &["device_data_bytes"]),
            Converter::Byte,
        ),
        summed(
            "Objects",
            "Objects",
            Projector::number("set_stats", &["objects", "n_objects"]),
            Converter::ScientificUnits,
        ),
        Field::new("Stop Writes Count", Projector::number("set_stats", &["stop-writes-count"])),
        Field::new("Disable Eviction", Projector::boolean("set_stats", &["disable-eviction"])),
        Field::new("Set Enable XDR", Projector::string("set_stats", &["set-enable-xdr"])),
    ])
    .from_source(&["cluster_names", "node_ids", "prefixes", "set_stats"])
    .for_each_nested("set_stats", 2)
    .group_by(&["cluster_name", "Namespace", "Set"])
    .order_by(&["Node"])
    .build()?)
}

fn xdr_enabled(record: &Record) -> bool {
    record.get("XDR Enabled").is_some_and(Value::is_truthy)
}

fn xdr_enabled_field() -> Field {
    Field::new("XDR Enabled", Projector::boolean("xdr_enable", &[])).hidden()
}

fn project_free_dlog(args: &[Option<Value>]) -> Option<Value> {
    let text = args.first()?.as_ref()?.to_string();
    text.replace('%', "").trim().parse::<i64>().ok().map(Value::Int)
}

fn number_arg(args: &[Option<Value>], idx: usize) -> Option<f64> {
    args.get(idx)?.as_ref()?.as_f64()
}

/// Servers without a success counter report totals and failures instead.
fn project_shipped_success(args: &[Option<Value>]) -> Option<Value> {
    if let Some(Some(success)) = args.first() {
        return Some(success.clone());
    }
    let shipped = number_arg(args, 1)?;
    let client_errors = number_arg(args, 2)?;
    let server_errors = number_arg(args, 3)?;
    Some(Value::number(shipped - client_errors - server_errors))
}

fn project_shipped_errors(args: &[Option<Value>]) -> Option<Value> {
    if let Some(Some(errors)) = args.first() {
        return Some(errors.clone());
    }
    let client_errors = number_arg(args, 1)?;
    let server_errors = number_arg(args, 2)?;
    Some(Value::number(client_errors + server_errors))
}

/// XDR view of servers older than 5.0.
pub fn xdr_legacy() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        xdr_enabled_field(),
        fields::node(),
        fields::hidden_node_id(),
        Field::new("Build", Projector::string("builds", &[])),
        summed(
            "Data Shipped",
            "Data Shipped",
            Projector::number(
                "xdr_stats",
                &["xdr_ship_bytes", "esmt_bytes_shipped", "esmt-bytes-shipped"],
            ),
            Converter::Byte,
        ),
        Field::new(
            "Free DLog%",
            Projector::func(
                FieldType::Number,
                project_free_dlog,
                vec![Projector::string(
                    "xdr_stats",
                    &["dlog_free_pct", "free-dlog-pct", "free_dlog_pct"],
                )],
            ),
        ),
        Field::new(
            "Lag (sec)",
            Projector::number("xdr_stats", &["xdr_timelag", "timediff_lastship_cur_secs"]),
        )
        .converter(Converter::Time)
        .formatter(Formatter::red_alert(Condition::AtLeast(300.0))),
        Subgroup::new(
            "Records",
            vec![
                summed(
                    "Outstanding",
                    "Outstanding",
                    Projector::number(
                        "xdr_stats",
                        &["xdr_ship_outstanding_objects", "stat_recs_outstanding"],
                    ),
                    Converter::ScientificUnits,
                ),
                Field::new(
                    "Shipped Success",
                    Projector::func(
                        FieldType::Number,
                        project_shipped_success,
                        vec![
                            Projector::number("xdr_stats", &["xdr_ship_success", "stat_recs_shipped_ok"]),
                            Projector::number("xdr_stats", &["stat_recs_shipped", "stat-recs-shipped"]),
                            Projector::number("xdr_stats", &["err_ship_client", "error-ship-client"]),
                            Projector::number("xdr_stats", &["err_ship_server", "err-ship-server"]),
                        ],
                    ),
                )
                .aggregator(Aggregator::Sum),
                Field::new(
                    "Shipped Errors",
                    Projector::func(
                        FieldType::Number,
                        project_shipped_errors,
                        vec![
                            Projector::number("xdr_stats", &["stat_recs_ship_errors"]),
                            Projector::number(
                                "xdr_stats",
                                &["err_ship_client", "err-ship-client", "xdr_ship_source_error"],
                            ),
                            Projector::number(
                                "xdr_stats",
                                &["err_ship_server", "err-ship-server", "xdr_ship_destination_error"],
                            ),
                        ],
                    ),
                )
                .aggregator(Aggregator::Sum),
            ],
        ),
        Field::new("Throughput", Projector::number("xdr_stats", &["xdr_throughput", "cur_throughput"]))
            .aggregator(Aggregator::Sum),
        Field::new(
            "Avg Latency (ms)",
            Projector::number("xdr_stats", &["xdr_ship_latency_avg", "latency_avg_ship"]),
        ),
        Field::new("XDR Uptime", Projector::number("xdr_stats", &["xdr_uptime", "xdr-uptime"]))
            .converter(Converter::Time),
    ])
    .from_source(&["xdr_enable", "node_ids", "prefixes", "builds", "xdr_stats"])
    .where_(xdr_enabled)
    .order_by(&["Node"])
    .build()?)
}

pub fn xdr() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        xdr_enabled_field(),
        fields::node(),
        fields::hidden_node_id(),
        Field::new("Success", Projector::number("xdr_stats", &["success"])),
        Subgroup::new(
            "Retry",
            vec![
                Field::new("Connection Reset", Projector::number("xdr_stats", &["retry_conn_reset"])),
                Field::new("Destination", Projector::number("xdr_stats", &["retry_dest"])),
            ],
        ),
        Field::new("Recoveries Pending", Projector::number("xdr_stats", &["recoveries_pending"]))
            .aggregator(Aggregator::Sum),
        Field::new("Lag (hh:mm:ss)", Projector::number("xdr_stats", &["lag"])).converter(Converter::Time),
        Field::new("Avg Latency (ms)", Projector::number("xdr_stats", &["latency_ms"]))
            .aggregator(Aggregator::Max),
        Field::new("Throughput (rec/s)", Projector::number("xdr_stats", &["throughput"])),
    ])
    .from_source(&["xdr_enable", "node_ids", "prefixes", "xdr_stats"])
    .where_(xdr_enabled)
    .order_by(&["Node"])
    .build()?)
}

fn has_dc(record: &Record) -> bool {
    record.get("DC").is_some()
}

pub fn dc() -> Result<Sheet> {
    Ok(Sheet::builder(decls![
        fields::node(),
        fields::hidden_node_id(),
        Field::new("DC", Projector::string("dc_stats", &["dc-name", "DC_Name"])),
        Field::new("DC Type", Projector::string("dc_stats", &["dc-type"])),
        Field::new("DC Size", Projector::number("dc_stats", &["xdr_dc_size", "dc_size"])),
        Field::new("Namespaces", Projector::string("dc_stats", &["namespaces"])),
        Field::new(
            "Lag",
            Projector::number("dc_stats", &["xdr_dc_timelag", "xdr-dc-timelag", "dc_timelag"]),
        )
        .converter(Converter::Time),
        Field::new(
            "Records Shipped",
            Projector::number(
                "dc_stats",
                &[
                    "xdr_dc_remote_ship_ok",
                    "dc_remote_ship_ok",
                    "dc_recs_shipped_ok",
                    "dc_ship_success",
                ],
            ),
        ),
        Field::new(
            "Avg Latency (ms)",
            Projector::number(
                "dc_stats",
                &[
                    "latency_avg_ship_ema",
                    "dc_latency_avg_ship",
                    "dc_latency_avg_ship_ema",
                    "dc_ship_latency_avg",
                ],
            ),
        ),
        Field::new(
            "Status",
            Projector::number("dc_stats", &["xdr_dc_state", "xdr-dc-state", "dc_state"]),
        ),
    ])
    .from_source(&["node_ids", "prefixes", "dc_stats"])
    .for_each("dc_stats")
    .where_(has_dc)
    .group_by(&["DC", "Namespaces"])
    .order_by(&["Node"])
    .build()?)
}

pub fn sindex() -> Result<Sheet> {
    let scientific = Converter::ScientificUnits;
    Ok(Sheet::builder(decls![
        Field::new("Index Name", Projector::string("sindex_stats", &["indexname"])),
        Field::new("Namespace", Projector::string("sindex_stats", &["ns"])),
        Field::new("Set", Projector::string("sindex_stats", &["set"])),
        fields::node(),
        fields::hidden_node_id(),
        Field::new("Bins", Projector::number("sindex_stats", &["bins", "bin"])),
        Field::new("Num Bins", Projector::number("sindex_stats", &["num_bins"])),
        Field::new("Bin Type", Projector::string("sindex_stats", &["type"])),
        Field::new("State", Projector::string("sindex_stats", &["state"])),
        Field::new("Sync State", Projector::string("sindex_stats", &["sync_state"])),
        Field::new("Keys", Projector::number("sindex_stats", &["keys"])),
        summed(
            "Entries",
            "Entries",
            Projector::number("sindex_stats", &["entries", "objects"]),
            scientific,
        ),
        summed(
            "Memory Used",
            "Memory Used",
            Projector::number("sindex_stats", &["si_accounted_memory"]),
            Converter::Byte,
        ),
        Subgroup::new(
            "Queries",
            vec![
                summed("Requests", "query_reqs", Projector::number("sindex_stats", &["query_reqs"]), scientific),
                summed(
                    "Avg Num Recs",
                    "query_avg_rec_count",
                    Projector::number("sindex_stats", &["query_avg_rec_count"]),
                    scientific,
                ),
            ],
        ),
        Subgroup::new(
            "Updates",
            vec![
                summed(
                    "Writes",
                    "write_success",
                    Projector::number("sindex_stats", &["write_success", "stat_write_success"]),
                    scientific,
                ),
                summed(
                    "Deletes",
                    "delete_success",
                    Projector::number("sindex_stats", &["delete_success", "stat_delete_success"]),
                    scientific,
                ),
            ],
        ),
    ])
    .from_source(&["node_ids", "prefixes", "sindex_stats"])
    .for_each("sindex_stats")
    .group_by(&["Namespace", "Set"])
    .order_by(&["Index Name", "Node"])
    .build()?)
}
