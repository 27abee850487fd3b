//! Column-oriented layout: fields across, records down.

use super::row::styled_cell;
use super::style::Painter;
use super::{Body, RULE, SEPARATOR, center, text_width};
use crate::evaluate::Column;
use crate::group::Table;
use crate::value::Common;

pub(crate) fn render(table: &Table, common: &Common, painter: &Painter) -> Option<Body> {
    let visible: Vec<&Column> = table.visible_columns().collect();
    if visible.is_empty() {
        return None;
    }

    let widths: Vec<usize> = visible.iter().map(|c| column_width(table, c)).collect();
    let width = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * SEPARATOR.len();
    let mut lines = Vec::new();

    if visible.iter().any(|c| c.subgroup.is_some()) {
        lines.push(subgroup_header(&visible, &widths));
    }

    let titles: Vec<String> = visible
        .iter()
        .zip(&widths)
        .map(|(c, &w)| painter.label(&c.field.align.pad(&c.field.title, w), table.is_ordered_by(&c.field.key)))
        .collect();
    lines.push(titles.join(SEPARATOR));

    let has_aggregates = table.has_aggregates();
    let n_groups = table.groups.len();
    for (group_idx, group) in table.groups.iter().enumerate() {
        for record in &group.records {
            let cells: Vec<String> = visible
                .iter()
                .zip(&widths)
                .map(|(c, &w)| styled_cell(c, record, w, common, painter))
                .collect();
            lines.push(cells.join(SEPARATOR));
        }

        if has_aggregates {
            let cells: Vec<String> = visible
                .iter()
                .zip(&widths)
                .map(|(c, &w)| {
                    let key = &c.field.key;
                    let text = c.field.align.pad(group.aggregate_text(key), w);
                    if group.aggregate(key).is_some() {
                        painter.aggregate(&text, table.is_grouped_by(key))
                    } else {
                        text
                    }
                })
                .collect();
            lines.push(cells.join(SEPARATOR));
        }

        if n_groups > 1 && group_idx < n_groups - 1 {
            lines.push(RULE.to_string().repeat(width));
        }
    }

    Some(Body {
        width,
        lines,
        n_rows: table.n_records(),
    })
}

fn column_width(table: &Table, column: &Column) -> usize {
    let key = &column.field.key;
    let values = table.groups.iter().flat_map(|group| {
        group
            .records
            .iter()
            .map(move |record| text_width(record.converted(key)))
            .chain(std::iter::once(text_width(group.aggregate_text(key))))
    });
    values
        .chain(std::iter::once(text_width(&column.field.title)))
        .max()
        .unwrap_or(0)
}

/// Subgroup titles centered over their member columns, blank above ungrouped ones.
fn subgroup_header(visible: &[&Column], widths: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut idx = 0;
    while idx < visible.len() {
        let subgroup = visible[idx].subgroup.as_deref();
        let mut end = idx + 1;
        while end < visible.len() && visible[end].subgroup.as_deref() == subgroup {
            end += 1;
        }

        let span = widths[idx..end].iter().sum::<usize>() + (end - idx - 1) * SEPARATOR.len();
        parts.push(match subgroup {
            Some(title) => center(title, span, '~'),
            None => " ".repeat(span),
        });
        idx = end;
    }
    parts.join(SEPARATOR)
}
