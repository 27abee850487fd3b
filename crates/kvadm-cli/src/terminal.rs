use crate::config::{ColorMode, DisplayConfig};
use is_terminal::IsTerminal;
use kvadm_sheet::TerminalSize;

/// Geometry to lay reports out for: explicit flags, then the live terminal, then the
/// configured fallback.
pub fn resolve_size(width: Option<usize>, height: Option<usize>, display: &DisplayConfig) -> TerminalSize {
    let detected = terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), terminal_size::Height(h))| (usize::from(w), usize::from(h)));
    pick_size(width, height, detected, display)
}

fn pick_size(
    width: Option<usize>,
    height: Option<usize>,
    detected: Option<(usize, usize)>,
    display: &DisplayConfig,
) -> TerminalSize {
    TerminalSize {
        columns: width
            .or(detected.map(|(w, _)| w))
            .unwrap_or(display.fallback_columns),
        lines: height
            .or(detected.map(|(_, h)| h))
            .unwrap_or(display.fallback_lines),
    }
}

pub fn enable_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_win_over_detected_size() {
        let display = DisplayConfig::default();
        let size = pick_size(Some(120), None, Some((200, 60)), &display);
        assert_eq!(size, TerminalSize { columns: 120, lines: 60 });
    }

    #[test]
    fn test_fallback_without_tty() {
        let display = DisplayConfig {
            fallback_columns: 100,
            fallback_lines: 30,
            ..DisplayConfig::default()
        };
        let size = pick_size(None, None, None, &display);
        assert_eq!(size, TerminalSize { columns: 100, lines: 30 });
    }

    #[test]
    fn test_explicit_color_modes() {
        assert!(enable_color(ColorMode::Always));
        assert!(!enable_color(ColorMode::Never));
    }
}
