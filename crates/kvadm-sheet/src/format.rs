use crate::record::EntryData;
use crate::value::Value;

pub type ConditionFn = fn(&EntryData<'_>) -> bool;

/// Highlight applied to a cell when its condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    Red,
    Yellow,
    Green,
    Bold,
}

/// Predicate over a present cell value and its record.
#[derive(Debug, Clone)]
pub enum Condition {
    IsTrue,
    IsFalse,
    Above(f64),
    AtLeast(f64),
    Below(f64),
    /// Value is greater than the sibling field's value
    AboveField(String),
    /// Value is greater than or equal to the sibling field's value
    AtLeastField(String),
    /// The sibling field is truthy
    FieldTrue(String),
    /// The sibling field equals a common value
    EqualsCommon { field: String, common: String },
    Custom(ConditionFn),
}

fn numeric_pair(value: &Value, other: Option<&Value>) -> Option<(f64, f64)> {
    Some((value.as_f64()?, other?.as_f64()?))
}

impl Condition {
    pub fn holds(&self, edata: &EntryData<'_>) -> bool {
        let value = edata.value;
        match self {
            Condition::IsTrue => value.is_truthy(),
            Condition::IsFalse => !value.is_truthy(),
            Condition::Above(limit) => value.as_f64().is_some_and(|v| v > *limit),
            Condition::AtLeast(limit) => value.as_f64().is_some_and(|v| v >= *limit),
            Condition::Below(limit) => value.as_f64().is_some_and(|v| v < *limit),
            Condition::AboveField(key) => {
                numeric_pair(value, edata.record.get(key)).is_some_and(|(v, other)| v > other)
            }
            Condition::AtLeastField(key) => {
                numeric_pair(value, edata.record.get(key)).is_some_and(|(v, other)| v >= other)
            }
            Condition::FieldTrue(key) => edata.record.get(key).is_some_and(Value::is_truthy),
            Condition::EqualsCommon { field, common } => {
                match (edata.record.get(field), edata.common.get(common)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            Condition::Custom(func) => func(edata),
        }
    }
}

/// A conditional styler attached to a field.
#[derive(Debug, Clone)]
pub struct Formatter {
    pub condition: Condition,
    pub alert: Alert,
}

impl Formatter {
    pub fn red_alert(condition: Condition) -> Self {
        Self { condition, alert: Alert::Red }
    }

    pub fn yellow_alert(condition: Condition) -> Self {
        Self { condition, alert: Alert::Yellow }
    }

    pub fn green_alert(condition: Condition) -> Self {
        Self { condition, alert: Alert::Green }
    }

    pub fn bold(condition: Condition) -> Self {
        Self { condition, alert: Alert::Bold }
    }
}
