use crate::record::EntryData;
use crate::value::{Value, format_float};

pub type ConvertFn = fn(&EntryData<'_>) -> String;

/// Display transform applied to a present value after projection.
#[derive(Debug, Clone, Copy)]
pub enum Converter {
    /// Binary byte units: `1.500 KB`
    Byte,
    /// Decimal magnitude suffixes: `12.345 M`
    ScientificUnits,
    /// Seconds as `HH:MM:SS`, prefixed with days when needed
    Time,
    ListToCommaSeparated,
    Custom(ConvertFn),
}

impl Converter {
    pub fn convert(&self, edata: &EntryData<'_>) -> String {
        let value = edata.value;
        match self {
            Converter::Byte => value.as_f64().map(byte).unwrap_or_else(|| value.to_string()),
            Converter::ScientificUnits => value
                .as_f64()
                .map(scientific_units)
                .unwrap_or_else(|| value.to_string()),
            Converter::Time => value.as_f64().map(time).unwrap_or_else(|| value.to_string()),
            Converter::ListToCommaSeparated => match value {
                Value::List(items) => items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            },
            Converter::Custom(func) => func(edata),
        }
    }
}

const BYTE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
const SCIENTIFIC_UNITS: [&str; 7] = ["", "K", "M", "G", "T", "P", "E"];

fn scaled(value: f64, base: f64, units: &[&str]) -> (f64, usize) {
    let mut scaled = value.abs();
    let mut idx = 0;
    while scaled >= base && idx < units.len() - 1 {
        scaled /= base;
        idx += 1;
    }
    (scaled.copysign(value), idx)
}

pub fn byte(value: f64) -> String {
    let (scaled, idx) = scaled(value, 1024.0, &BYTE_UNITS);
    if idx == 0 {
        format!("{} {}", format_float(scaled), BYTE_UNITS[0])
    } else {
        format!("{:.3} {}", scaled, BYTE_UNITS[idx])
    }
}

pub fn scientific_units(value: f64) -> String {
    let (scaled, idx) = scaled(value, 1000.0, &SCIENTIFIC_UNITS);
    if idx == 0 {
        format_float(scaled)
    } else {
        format!("{:.3} {}", scaled, SCIENTIFIC_UNITS[idx])
    }
}

pub fn time(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return format_float(seconds);
    }
    let total = seconds as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;

    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::value::Common;

    #[test]
    fn test_byte() {
        assert_eq!(byte(512.0), "512 B");
        assert_eq!(byte(1536.0), "1.500 KB");
        assert_eq!(byte(3.0 * 1024.0 * 1024.0 * 1024.0), "3.000 GB");
    }

    #[test]
    fn test_scientific_units() {
        assert_eq!(scientific_units(999.0), "999");
        assert_eq!(scientific_units(12_345.0), "12.345 K");
        assert_eq!(scientific_units(-2_000_000.0), "-2.000 M");
    }

    #[test]
    fn test_time() {
        assert_eq!(time(59.0), "00:00:59");
        assert_eq!(time(3_661.0), "01:01:01");
        assert_eq!(time(90_061.0), "1d 01:01:01");
    }

    #[test]
    fn test_non_numeric_falls_back_to_display() {
        let record = Record::new("A", Vec::new());
        let common = Common::new();
        let value = Value::from("n/a");
        let edata = EntryData { value: &value, record: &record, common: &common };
        assert_eq!(Converter::Byte.convert(&edata), "n/a");
    }

    #[test]
    fn test_list_to_comma_separated() {
        let record = Record::new("A", Vec::new());
        let common = Common::new();
        let value = Value::List(vec![Value::from("read"), Value::from("sys-admin")]);
        let edata = EntryData { value: &value, record: &record, common: &common };
        assert_eq!(Converter::ListToCommaSeparated.convert(&edata), "read, sys-admin");
    }
}
