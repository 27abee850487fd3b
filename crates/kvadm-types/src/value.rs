use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key of the single-entry object that marks a failed node response in snapshot JSON.
pub const ERROR_MARKER_KEY: &str = "$error";

/// Ordered mapping, preserving the order in which the server reported keys.
pub type SourceMap = IndexMap<String, SourceValue>;

/// One leaf (or subtree) of a node's response.
///
/// `Missing` and `Error` are both "no value" for every consumer; the error message is kept
/// only so it can be logged.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SourceValue {
    #[default]
    Missing,
    Error(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SourceValue>),
    Map(SourceMap),
}

impl SourceValue {
    pub fn error(message: impl Into<String>) -> Self {
        SourceValue::Error(message.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, SourceValue::Missing | SourceValue::Error(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SourceValue::Error(_))
    }

    /// `Some(self)` unless the value is missing or an error marker.
    pub fn present(&self) -> Option<&SourceValue> {
        if self.is_missing() { None } else { Some(self) }
    }

    /// Look up one step: a key of a mapping, or a numeric index into a list.
    pub fn get(&self, key: &str) -> Option<&SourceValue> {
        match self {
            SourceValue::Map(map) => map.get(key).and_then(SourceValue::present),
            SourceValue::List(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .and_then(SourceValue::present),
            _ => None,
        }
    }

    /// Walk several steps; any missing, errored or wrongly shaped step yields `None`.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&SourceValue> {
        path.iter()
            .try_fold(self, |value, key| value.get(key.as_ref()))
            .and_then(SourceValue::present)
    }

    pub fn as_map(&self) -> Option<&SourceMap> {
        match self {
            SourceValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SourceValue]> {
        match self {
            SourceValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SourceValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view. Info responses report most counters as strings, so numeric
    /// strings are parsed; floats only convert when they carry no fraction and fit in
    /// an `i64` (unsigned counters past `i64::MAX` arrive as floats and stay floats).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SourceValue::Int(i) => Some(*i),
            SourceValue::Float(f) if f.fract() == 0.0 && fits_i64(*f) => Some(*f as i64),
            SourceValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SourceValue::Int(i) => Some(*i as f64),
            SourceValue::Float(f) => Some(*f),
            SourceValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SourceValue::Bool(b) => Some(*b),
            SourceValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            },
            SourceValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// True for numbers and numeric strings.
    pub fn is_numeric(&self) -> bool {
        match self {
            SourceValue::Int(_) | SourceValue::Float(_) => true,
            SourceValue::Str(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SourceValue::Missing => serde_json::Value::Null,
            SourceValue::Error(msg) => {
                let mut obj = serde_json::Map::new();
                obj.insert(ERROR_MARKER_KEY.to_string(), serde_json::Value::String(msg.clone()));
                serde_json::Value::Object(obj)
            }
            SourceValue::Bool(b) => serde_json::Value::Bool(*b),
            SourceValue::Int(i) => serde_json::Value::from(*i),
            SourceValue::Float(f) => serde_json::Value::from(*f),
            SourceValue::Str(s) => serde_json::Value::String(s.clone()),
            SourceValue::List(items) => {
                serde_json::Value::Array(items.iter().map(SourceValue::to_json).collect())
            }
            SourceValue::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for SourceValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SourceValue::Missing,
            serde_json::Value::Bool(b) => SourceValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SourceValue::Int(i),
                None => n.as_f64().map(SourceValue::Float).unwrap_or_default(),
            },
            serde_json::Value::String(s) => SourceValue::Str(s),
            serde_json::Value::Array(items) => {
                SourceValue::List(items.into_iter().map(SourceValue::from).collect())
            }
            serde_json::Value::Object(mut obj) => {
                if obj.len() == 1
                    && let Some(marker) = obj.remove(ERROR_MARKER_KEY)
                {
                    return match marker {
                        serde_json::Value::String(msg) => SourceValue::Error(msg),
                        other => SourceValue::Error(other.to_string()),
                    };
                }
                SourceValue::Map(
                    obj.into_iter()
                        .map(|(k, v)| (k, SourceValue::from(v)))
                        .collect(),
                )
            }
        }
    }
}

impl From<bool> for SourceValue {
    fn from(b: bool) -> Self {
        SourceValue::Bool(b)
    }
}

impl From<i64> for SourceValue {
    fn from(i: i64) -> Self {
        SourceValue::Int(i)
    }
}

impl From<i32> for SourceValue {
    fn from(i: i32) -> Self {
        SourceValue::Int(i64::from(i))
    }
}

impl From<u64> for SourceValue {
    fn from(u: u64) -> Self {
        i64::try_from(u)
            .map(SourceValue::Int)
            .unwrap_or(SourceValue::Float(u as f64))
    }
}

impl From<f64> for SourceValue {
    fn from(f: f64) -> Self {
        SourceValue::Float(f)
    }
}

impl From<&str> for SourceValue {
    fn from(s: &str) -> Self {
        SourceValue::Str(s.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(s: String) -> Self {
        SourceValue::Str(s)
    }
}

impl From<SourceMap> for SourceValue {
    fn from(map: SourceMap) -> Self {
        SourceValue::Map(map)
    }
}

impl<T: Into<SourceValue>> From<Vec<T>> for SourceValue {
    fn from(items: Vec<T>) -> Self {
        SourceValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl Serialize for SourceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(SourceValue::from)
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn fits_i64(f: f64) -> bool {
    f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Build a `SourceMap` from literal pairs.
///
/// ```
/// use kvadm_types::{source_map, SourceValue};
/// let stats = source_map! { "cluster_size" => 3, "uptime" => "3600" };
/// assert_eq!(stats.get("cluster_size"), Some(&SourceValue::Int(3)));
/// ```
#[macro_export]
macro_rules! source_map {
    () => { $crate::SourceMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::SourceMap::new();
        $( map.insert(($key).to_string(), $crate::SourceValue::from($value)); )+
        map
    }};
}
