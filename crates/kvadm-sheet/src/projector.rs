//! Projectors extract one raw value for a record from the source set.
//!
//! Every leaf projector takes an ordered list of candidate keys and returns the first
//! present one, which is how a single field absorbs statistic renames across server
//! versions.

use crate::value::Value;
use kvadm_types::{SourceSet, SourceValue};
use tracing::trace;

/// Function applied by `Projector::Func` to its argument values.
pub type ProjectFn = fn(&[Option<Value>]) -> Option<Value>;

/// Output coercion for derived projectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Float,
    Boolean,
    Undefined,
}

/// How to read a value out of the source set.
#[derive(Debug, Clone)]
pub enum Projector {
    String { source: String, keys: Vec<String> },
    Number { source: String, keys: Vec<String> },
    Float { source: String, keys: Vec<String> },
    Boolean { source: String, keys: Vec<String> },
    Percent { source: String, keys: Vec<String>, invert: bool },
    Identity { source: String, keys: Vec<String> },
    /// One component of the key currently being iterated (namespace, set, user, ...)
    ForEachKey { source: String, index: usize },
    Sum(Vec<Projector>),
    Func {
        field_type: FieldType,
        func: ProjectFn,
        args: Vec<Projector>,
    },
}

fn owned_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl Projector {
    pub fn string(source: &str, keys: &[&str]) -> Self {
        Projector::String { source: source.to_string(), keys: owned_keys(keys) }
    }

    pub fn number(source: &str, keys: &[&str]) -> Self {
        Projector::Number { source: source.to_string(), keys: owned_keys(keys) }
    }

    pub fn float(source: &str, keys: &[&str]) -> Self {
        Projector::Float { source: source.to_string(), keys: owned_keys(keys) }
    }

    pub fn boolean(source: &str, keys: &[&str]) -> Self {
        Projector::Boolean { source: source.to_string(), keys: owned_keys(keys) }
    }

    pub fn percent(source: &str, keys: &[&str]) -> Self {
        Projector::Percent { source: source.to_string(), keys: owned_keys(keys), invert: false }
    }

    pub fn inverted_percent(source: &str, keys: &[&str]) -> Self {
        Projector::Percent { source: source.to_string(), keys: owned_keys(keys), invert: true }
    }

    pub fn identity(source: &str, keys: &[&str]) -> Self {
        Projector::Identity { source: source.to_string(), keys: owned_keys(keys) }
    }

    pub fn for_each_key(source: &str, index: usize) -> Self {
        Projector::ForEachKey { source: source.to_string(), index }
    }

    pub fn sum(projectors: Vec<Projector>) -> Self {
        Projector::Sum(projectors)
    }

    pub fn func(field_type: FieldType, func: ProjectFn, args: Vec<Projector>) -> Self {
        Projector::Func { field_type, func, args }
    }

    /// Source names this projector reads from.
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Projector::String { source, .. }
            | Projector::Number { source, .. }
            | Projector::Float { source, .. }
            | Projector::Boolean { source, .. }
            | Projector::Percent { source, .. }
            | Projector::Identity { source, .. }
            | Projector::ForEachKey { source, .. } => vec![source.as_str()],
            Projector::Sum(args) | Projector::Func { args, .. } => {
                args.iter().flat_map(Projector::sources).collect()
            }
        }
    }

    pub fn project(&self, ctx: &ProjectionContext<'_>) -> Option<Value> {
        match self {
            Projector::String { source, keys } => ctx.lookup(source, keys).and_then(as_string),
            Projector::Number { source, keys } => ctx.lookup(source, keys).and_then(as_number),
            Projector::Float { source, keys } => ctx
                .lookup(source, keys)
                .and_then(|v| v.as_f64())
                .map(Value::Float),
            Projector::Boolean { source, keys } => ctx
                .lookup(source, keys)
                .and_then(|v| v.as_bool())
                .map(Value::Bool),
            Projector::Percent { source, keys, invert } => {
                let pct = ctx.lookup(source, keys).and_then(as_percent)?;
                Some(Value::number(if *invert { 100.0 - pct } else { pct }))
            }
            Projector::Identity { source, keys } => {
                ctx.lookup(source, keys).and_then(Value::from_source)
            }
            Projector::ForEachKey { source, index } => ctx
                .iteration
                .as_ref()
                .filter(|it| it.source == source.as_str())
                .and_then(|it| it.key.get(*index))
                .map(|component| Value::Str(component.clone())),
            Projector::Sum(args) => {
                let values: Vec<Value> = args.iter().filter_map(|p| p.project(ctx)).collect();
                sum_values(values.iter())
            }
            Projector::Func { field_type, func, args } => {
                let values: Vec<Option<Value>> = args.iter().map(|p| p.project(ctx)).collect();
                if values.iter().all(Option::is_none) {
                    return None;
                }
                func(&values).and_then(|v| coerce(*field_type, v))
            }
        }
    }
}

/// Iteration state of a for-each sheet: which source is iterated and the current
/// composite key (one component per nesting level).
#[derive(Debug, Clone, Copy)]
pub struct Iteration<'a> {
    pub source: &'a str,
    pub key: &'a [String],
}

/// Everything a projector may read for one record.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub sources: &'a SourceSet,
    pub node: &'a str,
    pub iteration: Option<Iteration<'a>>,
}

impl<'a> ProjectionContext<'a> {
    /// The node's value in `source`, descended through the iteration key when `source`
    /// is the one being iterated.
    pub fn base(&self, source: &str) -> Option<&'a SourceValue> {
        let value = self.sources.node_value(source, self.node)?;
        match self.iteration {
            Some(it) if it.source == source => value.get_path(it.key),
            _ => Some(value),
        }
    }

    /// First present candidate key; with no candidates, the base value itself.
    pub fn lookup(&self, source: &str, keys: &[String]) -> Option<&'a SourceValue> {
        let base = self.base(source)?;
        if keys.is_empty() {
            return base.present();
        }
        keys.iter().find_map(|key| base.get(key))
    }
}

fn as_string(value: &SourceValue) -> Option<Value> {
    match value {
        SourceValue::Str(s) => Some(Value::Str(s.clone())),
        SourceValue::Int(_) | SourceValue::Float(_) | SourceValue::Bool(_) => {
            Value::from_source(value).map(|v| Value::Str(v.to_string()))
        }
        _ => {
            trace!(?value, "string projector got a non-scalar value");
            None
        }
    }
}

fn as_number(value: &SourceValue) -> Option<Value> {
    let number = value
        .as_i64()
        .map(Value::Int)
        .or_else(|| value.as_f64().map(Value::Float));
    if number.is_none() {
        trace!(?value, "number projector got a non-numeric value");
    }
    number
}

fn as_percent(value: &SourceValue) -> Option<f64> {
    match value {
        SourceValue::Str(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        other => other.as_f64(),
    }
}

fn coerce(field_type: FieldType, value: Value) -> Option<Value> {
    match field_type {
        FieldType::Undefined => Some(value),
        FieldType::String => match value {
            Value::Str(_) => Some(value),
            other => Some(Value::Str(other.to_string())),
        },
        FieldType::Number => match value {
            Value::Int(_) | Value::Float(_) => Some(value),
            Value::Str(s) => as_number(&SourceValue::Str(s)),
            _ => None,
        },
        FieldType::Float => match value {
            Value::Str(s) => s.trim().parse().ok().map(Value::Float),
            other => other.as_f64().map(Value::Float),
        },
        FieldType::Boolean => Some(Value::Bool(value.is_truthy())),
    }
}

/// Sum numeric values, staying integral while every addend is and the total fits in
/// an `i64`. `None` when nothing numeric was supplied.
pub(crate) fn sum_values<'v>(values: impl Iterator<Item = &'v Value>) -> Option<Value> {
    let mut int_total: Option<i64> = Some(0);
    let mut float_total: f64 = 0.0;
    let mut any = false;
    let mut is_float = false;

    for value in values {
        match value {
            Value::Int(i) => {
                int_total = int_total.and_then(|total| total.checked_add(*i));
                float_total += *i as f64;
                any = true;
            }
            Value::Float(f) => {
                float_total += f;
                is_float = true;
                any = true;
            }
            _ => {}
        }
    }

    match (any, is_float, int_total) {
        (false, _, _) => None,
        (true, false, Some(total)) => Some(Value::Int(total)),
        _ => Some(Value::Float(float_total)),
    }
}
