use anyhow::{Context as _, Result};
use kvadm_sheet::SheetStyle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolve the data directory holding `config.toml` and `snapshot.json`:
/// 1. KVADM_HOME environment variable (with tilde expansion)
/// 2. ~/.kvadm
pub fn resolve_home() -> Result<PathBuf> {
    if let Ok(env_path) = std::env::var("KVADM_HOME") {
        return Ok(expand_tilde(&env_path));
    }
    dirs::home_dir()
        .map(|home| home.join(".kvadm"))
        .context("could not determine the kvadm home directory; set KVADM_HOME")
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

/// Serialized form of a report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleSetting {
    Rows,
    Columns,
}

impl From<StyleSetting> for SheetStyle {
    fn from(style: StyleSetting) -> Self {
        match style {
            StyleSetting::Rows => SheetStyle::Rows,
            StyleSetting::Columns => SheetStyle::Columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: ColorMode,
    pub title_repeat: bool,
    /// Used when the terminal size cannot be queried
    pub fallback_columns: usize,
    pub fallback_lines: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            title_repeat: true,
            fallback_columns: 80,
            fallback_lines: 24,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub style: Option<StyleSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,

    /// Per-report overrides keyed by report name (`show-config`, `info-network`, ...)
    #[serde(default)]
    pub reports: HashMap<String, ReportConfig>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn report_style(&self, report: &str) -> Option<SheetStyle> {
        self.reports
            .get(report)
            .and_then(|r| r.style)
            .map(SheetStyle::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.display.title_repeat);
        assert_eq!(config.display.fallback_columns, 80);
    }

    #[test]
    fn test_load_display_and_report_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[display]
color = "never"
title_repeat = false

[reports.show-config]
style = "columns"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.display.color, ColorMode::Never);
        assert!(!config.display.title_repeat);
        assert_eq!(config.display.fallback_lines, 24);
        assert_eq!(config.report_style("show-config"), Some(SheetStyle::Columns));
        assert_eq!(config.report_style("info-network"), None);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[display]\ncolor = \"sometimes\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/tmp/kvadm"), PathBuf::from("/tmp/kvadm"));
    }
}
