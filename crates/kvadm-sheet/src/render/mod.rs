//! Terminal rendering of grouped tables.
//!
//! Two layouts share one pipeline (evaluate, group, aggregate) and one frame (title
//! banner, optional description, row-count footer):
//!
//! - [`SheetStyle::Columns`]: fields across, records down.
//! - [`SheetStyle::Rows`]: one line per field, one column per record, with field
//!   labels reprinted wherever a line would overflow the terminal.

pub mod column;
pub mod row;
pub mod style;

use crate::error::{Error, Result};
use crate::evaluate::{EvalOptions, evaluate};
use crate::group::Table;
use crate::sheet::{Sheet, SheetStyle};
use crate::value::Common;
use chrono::{DateTime, Utc};
use kvadm_types::SourceSet;
use regex::Regex;
use style::Painter;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// Separator between cells on one line.
pub const SEPARATOR: &str = "|";
/// Fill character of the rule drawn between groups.
pub const RULE: char = '-';
const MIN_DESCRIPTION_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: usize,
    pub lines: usize,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self {
            columns: 80,
            lines: 24,
        }
    }
}

/// Call-time configuration of one render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Overrides the sheet's default style
    pub style: Option<SheetStyle>,
    pub title_repeat: bool,
    pub disable_aggregations: bool,
    pub dynamic_diff: bool,
    /// Regexes matched against dynamic field names
    pub selectors: Vec<String>,
    pub description: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub common: Common,
    pub terminal: TerminalSize,
    pub enable_color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: None,
            title_repeat: true,
            disable_aggregations: false,
            dynamic_diff: false,
            selectors: Vec::new(),
            description: None,
            timestamp: None,
            common: Common::new(),
            terminal: TerminalSize::default(),
            enable_color: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub n_rows: usize,
}

/// Lines produced by one layout, before framing.
#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub width: usize,
    pub lines: Vec<String>,
    pub n_rows: usize,
}

/// Evaluate `sheet` against `sources` and lay the result out as text. `Ok(None)` when
/// the sheet has no visible field.
pub fn render(
    sheet: &Sheet,
    title: &str,
    sources: &SourceSet,
    options: &RenderOptions,
) -> Result<Option<Rendered>> {
    let selectors = compile_selectors(&options.selectors)?;
    let evaluation = evaluate(
        sheet,
        sources,
        &EvalOptions {
            common: &options.common,
            selectors: &selectors,
            dynamic_diff: options.dynamic_diff,
        },
    )?;
    let table = Table::build(sheet, evaluation, &options.common, options.disable_aggregations);

    let style = options.style.unwrap_or(sheet.default_style());
    let painter = Painter::new(options.enable_color);
    let body = match style {
        SheetStyle::Rows => row::render(&table, options, &painter),
        SheetStyle::Columns => column::render(&table, &options.common, &painter),
    };

    let Some(body) = body else {
        debug!(title, "nothing visible to render");
        return Ok(None);
    };
    debug!(title, %style, rows = body.n_rows, width = body.width, "rendered sheet");
    Ok(Some(frame(title, body, options, &painter)))
}

fn compile_selectors(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| Error::InvalidSelector {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn frame(title: &str, body: Body, options: &RenderOptions, painter: &Painter) -> Rendered {
    let mut out = Vec::with_capacity(body.lines.len() + 3);
    out.push(painter.banner(&title_line(title, options.timestamp.as_ref(), body.width)));
    if let Some(description) = &options.description {
        out.extend(wrap(
            description,
            body.width.saturating_sub(10).max(MIN_DESCRIPTION_WIDTH),
        ));
    }
    out.extend(body.lines);
    out.push(format!("Number of rows: {}", body.n_rows));

    let mut text = out.join("\n");
    text.push('\n');
    Rendered {
        text,
        n_rows: body.n_rows,
    }
}

/// `~~~Title (timestamp)~~~` centered over `width` columns.
pub fn title_line(title: &str, timestamp: Option<&DateTime<Utc>>, width: usize) -> String {
    let text = match timestamp {
        Some(ts) => format!("{} ({})", title, ts.format("%Y-%m-%d %H:%M:%S UTC")),
        None => title.to_string(),
    };
    center(&text, width, '~')
}

/// `text` centered in `width` terminal columns, padded with `fill`. The extra cell of
/// an odd padding goes to the right.
pub(crate) fn center(text: &str, width: usize, fill: char) -> String {
    let len = text_width(text);
    if len >= width {
        return text.to_string();
    }
    let pad = width - len;
    let left = pad / 2;
    let fill = fill.to_string();
    format!("{}{}{}", fill.repeat(left), text, fill.repeat(pad - left))
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && text_width(&line) + 1 + text_width(word) > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Terminal columns taken by `text`: wide CJK characters count twice, combining marks
/// not at all.
pub(crate) fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_line_centers_with_tildes() {
        assert_eq!(title_line("Nodes", None, 11), "~~~Nodes~~~");
        assert_eq!(title_line("Too long", None, 3), "Too long");
    }

    #[test]
    fn test_title_line_with_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            title_line("Nodes", Some(&ts), 0),
            "Nodes (2026-01-02 03:04:05 UTC)"
        );
    }

    #[test]
    fn test_wide_characters_take_two_columns() {
        assert_eq!(text_width("node-a"), 6);
        assert_eq!(text_width("東京"), 4);
        assert_eq!(text_width("e\u{301}"), 1);
        assert_eq!(title_line("東京", None, 8), "~~東京~~");
        assert_eq!(center("ab", 5, ' '), " ab  ");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(
            wrap("shows the cluster network view", 12),
            vec!["shows the", "cluster", "network view"]
        );
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let result = compile_selectors(&["(unclosed".to_string()]);
        assert!(matches!(result, Err(Error::InvalidSelector { .. })));
    }
}
