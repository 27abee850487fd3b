use kvadm_sheet::{
    Aggregator, DynamicFields, Field, NO_ENTRY, Projector, RenderOptions, Sheet, SheetStyle,
    TerminalSize, decls, render,
};
use kvadm_types::{SourceSet, SourceValue, source_map};

fn options(style: SheetStyle) -> RenderOptions {
    RenderOptions {
        style: Some(style),
        terminal: TerminalSize {
            columns: 80,
            lines: 24,
        },
        ..RenderOptions::default()
    }
}

fn sum_sheet() -> Sheet {
    Sheet::builder(decls![
        Field::title_field("Node", Projector::string("prefixes", &[])),
        Field::new("X", Projector::number("stats", &["x"]))
            .aggregator(Aggregator::Sum)
            .right(),
    ])
    .from_source(&["prefixes", "stats"])
    .build()
    .unwrap()
}

fn sum_sources() -> SourceSet {
    SourceSet::new()
        .with("prefixes", source_map! { "A" => "node-a", "B" => "node-b" })
        .with(
            "stats",
            source_map! { "A" => source_map! { "x" => 10 }, "B" => source_map! { "x" => 20 } },
        )
}

#[test]
fn test_sum_scenario_columns() {
    let rendered = render(&sum_sheet(), "Stats", &sum_sources(), &options(SheetStyle::Columns))
        .unwrap()
        .unwrap();
    assert_eq!(rendered.n_rows, 2);
    insta::assert_snapshot!("sum_columns", rendered.text);
}

#[test]
fn test_sum_scenario_rows() {
    let rendered = render(&sum_sheet(), "Stats", &sum_sources(), &options(SheetStyle::Rows))
        .unwrap()
        .unwrap();
    let lines: Vec<&str> = rendered.text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "~~~~~~~~Stats~~~~~~~~",
            "Node|node-a|node-b|  ",
            "X   |    10|    20|30",
            "Number of rows: 2",
        ]
    );
}

#[test]
fn test_errored_node_renders_placeholder() {
    let sheet = Sheet::builder(decls![
        Field::new("X", Projector::number("stats", &["x"]))
            .aggregator(Aggregator::Sum)
            .right(),
    ])
    .from_source(&["stats"])
    .build()
    .unwrap();
    let sources = SourceSet::new().with(
        "stats",
        source_map! { "A" => SourceValue::error("connection refused"), "B" => source_map! { "x" => 5 } },
    );
    let rendered = render(&sheet, "Stats", &sources, &options(SheetStyle::Columns))
        .unwrap()
        .unwrap();
    let lines: Vec<&str> = rendered.text.lines().collect();
    assert_eq!(lines[1], " X");
    assert_eq!(lines[2], NO_ENTRY);
    assert_eq!(lines[3], " 5");
    assert_eq!(lines[4], " 5");
    assert_eq!(lines[5], "Number of rows: 2");
}

#[test]
fn test_no_visible_fields_renders_nothing() {
    let sheet = Sheet::builder(decls![
        Field::new("X", Projector::number("stats", &["x"])).hidden(),
    ])
    .from_source(&["stats"])
    .build()
    .unwrap();
    let sources = SourceSet::new().with("stats", source_map! { "A" => source_map! { "x" => 1 } });
    let rendered = render(&sheet, "Stats", &sources, &options(SheetStyle::Rows)).unwrap();
    assert!(rendered.is_none());
}

fn wide_sheet() -> Sheet {
    Sheet::builder(decls![
        Field::title_field("Node", Projector::string("prefixes", &[])),
        Field::new("Objects", Projector::number("stats", &["objects"])),
    ])
    .from_source(&["prefixes", "stats"])
    .build()
    .unwrap()
}

fn wide_sources(n: usize) -> SourceSet {
    let mut prefixes = kvadm_types::SourceMap::new();
    let mut stats = kvadm_types::SourceMap::new();
    for idx in 0..n {
        let node = format!("{:02}", idx);
        prefixes.insert(node.clone(), SourceValue::from(format!("node-{}", node)));
        stats.insert(node, SourceValue::from(source_map! { "objects" => idx as i64 }));
    }
    SourceSet::new().with("prefixes", prefixes).with("stats", stats)
}

#[test]
fn test_row_style_repeats_labels_across_the_line() {
    let mut opts = options(SheetStyle::Rows);
    opts.terminal.columns = 40;
    let rendered = render(&wide_sheet(), "Wide", &wide_sources(12), &opts)
        .unwrap()
        .unwrap();

    let objects_line = rendered
        .text
        .lines()
        .find(|line| line.starts_with("Objects"))
        .unwrap();
    assert_eq!(objects_line.matches("Objects").count(), 3);

    opts.title_repeat = false;
    let rendered = render(&wide_sheet(), "Wide", &wide_sources(12), &opts)
        .unwrap()
        .unwrap();
    let objects_line = rendered
        .text
        .lines()
        .find(|line| line.starts_with("Objects"))
        .unwrap();
    assert_eq!(objects_line.matches("Objects").count(), 1);
}

#[test]
fn test_row_style_repeats_title_rows_per_page() {
    let sheet = Sheet::builder(decls![
        Field::title_field("Node", Projector::string("prefixes", &[])),
        Field::new("A", Projector::number("stats", &["a"])),
        Field::new("B", Projector::number("stats", &["b"])),
        Field::new("C", Projector::number("stats", &["c"])),
    ])
    .from_source(&["prefixes", "stats"])
    .build()
    .unwrap();
    let sources = SourceSet::new()
        .with("prefixes", source_map! { "X" => "node-x" })
        .with("stats", source_map! { "X" => source_map! { "a" => 1, "b" => 2, "c" => 3 } });

    let mut opts = options(SheetStyle::Rows);
    opts.terminal.lines = 4;
    let rendered = render(&sheet, "Paged", &sources, &opts).unwrap().unwrap();
    let labels: Vec<&str> = rendered
        .text
        .lines()
        .skip(1)
        .filter_map(|line| line.split('|').next())
        .map(str::trim)
        .collect();
    assert_eq!(labels, vec!["Node", "A", "B", "Node", "C", "Number of rows: 5"]);
    assert_eq!(rendered.n_rows, 5);
}

#[test]
fn test_row_style_prunes_empty_dynamic_fields_per_group() {
    let sheet = Sheet::builder(decls![
        Field::new("Cluster", Projector::string("cluster", &[])),
        DynamicFields::new("data"),
    ])
    .from_source(&["cluster", "data"])
    .group_by(&["Cluster"])
    .build()
    .unwrap();
    let sources = SourceSet::new()
        .with("cluster", source_map! { "A" => "east", "B" => "west" })
        .with(
            "data",
            source_map! { "A" => source_map! { "p" => "1" }, "B" => source_map! { "q" => "2" } },
        );

    let rendered = render(&sheet, "Config", &sources, &options(SheetStyle::Rows))
        .unwrap()
        .unwrap();
    assert_eq!(rendered.n_rows, 4);
    assert!(rendered.text.lines().any(|line| !line.is_empty() && line.chars().all(|c| c == '-')));
}

#[test]
fn test_missing_required_source_fails() {
    let sources = SourceSet::new().with("prefixes", source_map! { "A" => "node-a" });
    let result = render(&sum_sheet(), "Stats", &sources, &options(SheetStyle::Columns));
    assert!(matches!(result, Err(kvadm_sheet::Error::MissingSource(name)) if name == "stats"));
}

#[test]
fn test_render_is_repeatable() {
    let opts = options(SheetStyle::Rows);
    let first = render(&sum_sheet(), "Stats", &sum_sources(), &opts).unwrap();
    let second = render(&sum_sheet(), "Stats", &sum_sources(), &opts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_description_is_wrapped_under_title() {
    let mut opts = options(SheetStyle::Columns);
    opts.description = Some("sum of x".to_string());
    let rendered = render(&sum_sheet(), "Stats", &sum_sources(), &opts)
        .unwrap()
        .unwrap();
    let lines: Vec<&str> = rendered.text.lines().collect();
    assert_eq!(lines[1], "sum of x");
    assert_eq!(lines[2], "Node  | X");
}
