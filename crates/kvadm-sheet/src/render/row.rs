//! Row-oriented layout: each visible field is a line, each record a column.

use super::style::Painter;
use super::{Body, RULE, RenderOptions, SEPARATOR, text_width};
use crate::evaluate::Column;
use crate::field::Align;
use crate::group::{Group, Table};
use crate::record::{EntryData, Record};
use crate::value::Common;
use std::collections::{BTreeSet, HashSet};
use tracing::trace;

/// Horizontal geometry of a row-style table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    pub title_width: usize,
    pub column_widths: Vec<usize>,
    /// Width reserved for the aggregate cell, one wider than its widest value
    pub aggregate_width: Option<usize>,
    /// Record positions in front of which the field label is printed
    pub title_indices: BTreeSet<usize>,
    /// The label is printed again in front of the aggregate cell
    pub title_before_aggregate: bool,
    pub n_repeats: usize,
    pub total_width: usize,
}

impl RowLayout {
    /// Walk the record columns left to right, starting after the label, and start a
    /// new label block whenever the next column would reach the terminal edge.
    pub fn compute(
        title_width: usize,
        column_widths: Vec<usize>,
        aggregate_width: Option<usize>,
        terminal_columns: usize,
        title_repeat: bool,
    ) -> Self {
        let sep = SEPARATOR.len();
        let title_incr = title_width + sep;
        let mut title_indices = BTreeSet::from([0]);
        let mut title_before_aggregate = false;
        let mut n_repeats = 1;

        if title_repeat {
            let mut cur_pos = title_incr;
            let mut need_column = true;

            for (idx, &width) in column_widths.iter().enumerate() {
                if need_column || cur_pos + width < terminal_columns {
                    cur_pos += width;
                    need_column = false;
                } else {
                    title_indices.insert(idx);
                    cur_pos = title_incr + width;
                    n_repeats += 1;
                }
            }

            if let Some(aggregate_width) = aggregate_width
                && cur_pos + aggregate_width >= terminal_columns
            {
                title_before_aggregate = true;
                n_repeats += 1;
            }
        }

        let total_width = n_repeats * title_incr
            + column_widths.iter().sum::<usize>()
            + column_widths.len().saturating_sub(1) * sep
            + aggregate_width.unwrap_or(0);

        Self {
            title_width,
            column_widths,
            aggregate_width,
            title_indices,
            title_before_aggregate,
            n_repeats,
            total_width,
        }
    }
}

pub(crate) fn render(table: &Table, options: &RenderOptions, painter: &Painter) -> Option<Body> {
    let visible: Vec<&Column> = table.visible_columns().collect();
    if visible.is_empty() {
        return None;
    }

    let layout = RowLayout::compute(
        visible.iter().map(|c| text_width(&c.field.title)).max().unwrap_or(0),
        column_widths(table, &visible),
        aggregate_width(table, &visible),
        options.terminal.columns,
        options.title_repeat,
    );

    let render_columns = if options.title_repeat {
        paginate(&visible, options.terminal.lines)
    } else {
        visible.clone()
    };

    let mut lines = Vec::new();
    let mut hidden_count = 0;
    let n_groups = table.groups.len();

    for (group_idx, group) in table.groups.iter().enumerate() {
        let hidden = empty_dynamic_fields(group, &visible);
        for column in &render_columns {
            if hidden.contains(column.field.key.as_str()) {
                hidden_count += 1;
                continue;
            }
            lines.push(field_line(table, group, column, &layout, &options.common, painter));
        }

        if n_groups > 1 && group_idx < n_groups - 1 {
            lines.push(RULE.to_string().repeat(layout.total_width));
        }
    }

    let n_rows = (render_columns.len() * n_groups).saturating_sub(hidden_count);
    trace!(hidden = hidden_count, repeats = layout.n_repeats, "row layout");
    Some(Body {
        width: layout.total_width,
        lines,
        n_rows,
    })
}

/// Width of each record position: widest converted value at that position over
/// every field and every group.
fn column_widths(table: &Table, visible: &[&Column]) -> Vec<usize> {
    let positions = table.groups.iter().map(|g| g.records.len()).max().unwrap_or(0);
    (0..positions)
        .map(|idx| {
            table
                .groups
                .iter()
                .filter_map(|group| group.records.get(idx))
                .flat_map(|record| visible.iter().map(move |c| text_width(record.converted(&c.field.key))))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn aggregate_width(table: &Table, visible: &[&Column]) -> Option<usize> {
    if !table.has_aggregates() {
        return None;
    }
    let widest = table
        .groups
        .iter()
        .flat_map(|group| visible.iter().map(move |c| text_width(group.aggregate_text(&c.field.key))))
        .max()
        .unwrap_or(0);
    Some(widest + 1)
}

/// Reinsert the title fields ahead of every page worth of other fields.
fn paginate<'a>(visible: &[&'a Column], terminal_lines: usize) -> Vec<&'a Column> {
    let (titles, others): (Vec<&Column>, Vec<&Column>) =
        visible.iter().copied().partition(|c| c.field.is_title);
    if others.is_empty() {
        return titles;
    }

    let page = terminal_lines.saturating_sub(2).max(1);
    let mut out = Vec::with_capacity(visible.len() + titles.len());
    for (idx, column) in others.into_iter().enumerate() {
        if idx % page == 0 {
            out.extend(titles.iter().copied());
        }
        out.push(column);
    }
    out
}

/// Optional dynamic fields with no value anywhere in the group.
fn empty_dynamic_fields<'a>(group: &Group, visible: &[&'a Column]) -> HashSet<&'a str> {
    visible
        .iter()
        .copied()
        .filter(|c| c.field.is_dynamic && !c.field.required)
        .filter(|c| group.records.iter().all(|r| r.get(&c.field.key).is_none()))
        .map(|c| c.field.key.as_str())
        .collect()
}

fn field_line(
    table: &Table,
    group: &Group,
    column: &Column,
    layout: &RowLayout,
    common: &Common,
    painter: &Painter,
) -> String {
    let field = &column.field;
    let label = painter.label(
        &Align::Left.pad(&field.title, layout.title_width),
        table.is_ordered_by(&field.key),
    );

    let mut cells = Vec::with_capacity(group.records.len() + layout.n_repeats + 1);
    for (idx, record) in group.records.iter().enumerate() {
        if layout.title_indices.contains(&idx) {
            cells.push(label.clone());
        }
        let width = layout.column_widths.get(idx).copied().unwrap_or(0);
        cells.push(styled_cell(column, record, width, common, painter));
    }

    if let Some(aggregate_width) = layout.aggregate_width {
        if layout.title_before_aggregate {
            cells.push(label.clone());
        }
        let text = field.align.pad(group.aggregate_text(&field.key), aggregate_width - 1);
        let cell = if group.aggregate(&field.key).is_some() {
            painter.aggregate(&text, table.is_grouped_by(&field.key))
        } else {
            text
        };
        cells.push(cell);
    }

    cells.join(SEPARATOR)
}

/// Align a record's converted value, then apply the first formatter whose condition holds.
pub(crate) fn styled_cell(
    column: &Column,
    record: &Record,
    width: usize,
    common: &Common,
    painter: &Painter,
) -> String {
    let field = &column.field;
    let text = field.align.pad(record.converted(&field.key), width);
    let Some(value) = record.get(&field.key) else {
        return text;
    };
    let edata = EntryData {
        value,
        record,
        common,
    };
    match field.formatters.iter().find(|f| f.condition.holds(&edata)) {
        Some(formatter) => painter.alert(&text, formatter.alert),
        None => text,
    }
}
