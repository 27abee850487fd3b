use indexmap::IndexMap;
use kvadm_types::{SourceMap, SourceValue};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A projected cell value. Absence is modelled as `Option<Value>` by every consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

/// Values shared by every record of one render call (e.g. the principal node id).
pub type Common = IndexMap<String, Value>;

impl Value {
    /// Convert a source leaf, dropping missing values and error markers.
    pub fn from_source(value: &SourceValue) -> Option<Value> {
        match value {
            SourceValue::Missing | SourceValue::Error(_) => None,
            SourceValue::Bool(b) => Some(Value::Bool(*b)),
            SourceValue::Int(i) => Some(Value::Int(*i)),
            SourceValue::Float(f) => Some(Value::Float(*f)),
            SourceValue::Str(s) => Some(Value::Str(s.clone())),
            SourceValue::List(items) => Some(Value::List(
                items.iter().filter_map(Value::from_source).collect(),
            )),
            SourceValue::Map(map) => Some(Value::Map(
                map.iter()
                    .filter_map(|(k, v)| Value::from_source(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Numbers are kept integral whenever they carry no fraction.
    pub fn number(f: f64) -> Value {
        if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
            Value::Int(f as i64)
        } else {
            Value::Float(f)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::List(_) => 3,
            Value::Map(_) => 4,
        }
    }

    /// Total order used for sorting: numbers compare numerically across int/float,
    /// values of different kinds order by kind.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Map(a), Value::Map(b)) => a.len().cmp(&b.len()),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

/// Compare optional values with missing ones sorting after every present value.
pub fn cmp_missing_last(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Convert the snapshot's common section into render-time values.
pub fn common_from_source(common: &SourceMap) -> Common {
    common
        .iter()
        .filter_map(|(k, v)| Value::from_source(v).map(|v| (k.clone(), v)))
        .collect()
}

pub(crate) fn format_float(f: f64) -> String {
    let text = format!("{:.2}", f);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_compare_across_kinds() {
        assert_eq!(Value::Int(2).total_cmp(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::Float(3.0).total_cmp(&Value::Int(3)), Ordering::Equal);
    }

    #[test]
    fn test_missing_sorts_last() {
        let one = Value::Int(1);
        assert_eq!(cmp_missing_last(None, Some(&one)), Ordering::Greater);
        assert_eq!(cmp_missing_last(Some(&one), None), Ordering::Less);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(3.10).to_string(), "3.1");
        assert_eq!(Value::Float(4.0).to_string(), "4");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(
            Value::List(vec![Value::from("read"), Value::from("write")]).to_string(),
            "read,write"
        );
    }

    #[test]
    fn test_number_keeps_integers_integral() {
        assert_eq!(Value::number(45.0), Value::Int(45));
        assert_eq!(Value::number(45.5), Value::Float(45.5));
    }

    #[test]
    fn test_from_source_drops_errors() {
        assert!(Value::from_source(&SourceValue::error("x")).is_none());
        assert_eq!(
            Value::from_source(&SourceValue::from("a")),
            Some(Value::Str("a".to_string()))
        );
    }
}
