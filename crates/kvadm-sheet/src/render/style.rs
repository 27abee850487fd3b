use crate::format::Alert;
use owo_colors::OwoColorize;

/// Applies terminal styling to already-padded cell text. With color disabled every
/// method returns its input unchanged, so widths never depend on escape codes.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    pub enable_color: bool,
}

impl Painter {
    pub fn new(enable_color: bool) -> Self {
        Self { enable_color }
    }

    /// Field label: bold, underlined when the report is ordered by the field.
    pub fn label(&self, text: &str, ordered: bool) -> String {
        match (self.enable_color, ordered) {
            (false, _) => text.to_string(),
            (true, false) => format!("{}", text.bold()),
            (true, true) => format!("{}", text.bold().underline()),
        }
    }

    /// Aggregate cell: blue, bold too when the report is grouped by the field.
    pub fn aggregate(&self, text: &str, grouped: bool) -> String {
        match (self.enable_color, grouped) {
            (false, _) => text.to_string(),
            (true, false) => format!("{}", text.blue()),
            (true, true) => format!("{}", text.blue().bold()),
        }
    }

    pub fn alert(&self, text: &str, alert: Alert) -> String {
        if !self.enable_color {
            return text.to_string();
        }
        match alert {
            Alert::Red => format!("{}", text.red().bold()),
            Alert::Yellow => format!("{}", text.yellow().bold()),
            Alert::Green => format!("{}", text.green().bold()),
            Alert::Bold => format!("{}", text.bold()),
        }
    }

    pub fn banner(&self, text: &str) -> String {
        if self.enable_color {
            format!("{}", text.bold())
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_painter_is_identity() {
        let painter = Painter::new(false);
        assert_eq!(painter.label("Node", true), "Node");
        assert_eq!(painter.aggregate("30", true), "30");
        assert_eq!(painter.alert("99", Alert::Red), "99");
    }

    #[test]
    fn test_color_painter_wraps_text() {
        let painter = Painter::new(true);
        let styled = painter.alert("99", Alert::Red);
        assert!(styled.contains("99"));
        assert!(styled.starts_with("\u{1b}["));
    }
}
