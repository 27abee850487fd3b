use crate::config::Config;
use anyhow::{Context as _, Result};
use kvadm_reports::ReportKind;
use kvadm_sheet::{RenderOptions, TerminalSize, common_from_source, render};
use kvadm_types::{Snapshot, SourceSet};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Display settings resolved from flags, config and the terminal.
#[derive(Debug, Clone)]
pub struct Display {
    pub terminal: TerminalSize,
    pub enable_color: bool,
    pub title_repeat: bool,
    pub flip: bool,
    pub disable_aggregations: bool,
}

/// Everything a report handler needs: the loaded snapshot and how to draw.
pub struct ReportContext {
    pub snapshot: Snapshot,
    pub config: Config,
    pub display: Display,
}

/// Per-call knobs on top of the resolved display.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub title: Option<String>,
    pub dynamic_diff: bool,
    pub selectors: Vec<String>,
}

impl ReportContext {
    pub fn new(snapshot: Snapshot, config: Config, display: Display) -> Self {
        Self {
            snapshot,
            config,
            display,
        }
    }

    pub fn load(snapshot_path: &Path, config: Config, display: Display) -> Result<Self> {
        let snapshot = Snapshot::load_from(snapshot_path)
            .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
        debug!(
            path = %snapshot_path.display(),
            sources = snapshot.sources.names().count(),
            "loaded snapshot"
        );
        Ok(Self::new(snapshot, config, display))
    }

    pub fn sources(&self) -> &SourceSet {
        &self.snapshot.sources
    }

    pub fn render_options(&self, kind: ReportKind, request: &ReportRequest) -> Result<RenderOptions> {
        let default_style = kind.sheet()?.default_style();
        let style = self.config.report_style(kind.name()).unwrap_or(default_style);
        let style = if self.display.flip { style.flipped() } else { style };

        Ok(RenderOptions {
            style: Some(style),
            title_repeat: self.display.title_repeat,
            disable_aggregations: self.display.disable_aggregations,
            dynamic_diff: request.dynamic_diff,
            selectors: request.selectors.clone(),
            description: kind.description().map(str::to_string),
            timestamp: self.snapshot.timestamp,
            common: common_from_source(&self.snapshot.common),
            terminal: self.display.terminal,
            enable_color: self.display.enable_color,
        })
    }

    /// Render `kind` over `sources` as text; `None` when nothing is visible.
    pub fn render(
        &self,
        kind: ReportKind,
        sources: &SourceSet,
        request: &ReportRequest,
    ) -> Result<Option<String>> {
        let sheet = kind.sheet()?;
        let options = self.render_options(kind, request)?;
        let title = request.title.as_deref().unwrap_or(kind.title());
        let rendered = render(&sheet, title, sources, &options)?;
        Ok(rendered.map(|r| r.text))
    }

    /// Render and write to stdout.
    pub fn print(&self, kind: ReportKind, sources: &SourceSet, request: &ReportRequest) -> Result<()> {
        match self.render(kind, sources, request)? {
            Some(text) => write_stdout(&text),
            None => {
                debug!(report = kind.name(), "report has nothing to show");
                Ok(())
            }
        }
    }
}

pub fn write_stdout(text: &str) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
