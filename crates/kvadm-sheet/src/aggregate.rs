use crate::projector::sum_values;
use crate::value::Value;

/// Per-group summary of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    Sum,
    Max,
    Min,
    /// Number of present values
    Count,
}

/// Chooses the aggregator of a dynamic field from its name and whether every
/// observed value was numeric.
pub type AggregatorSelector = fn(&str, bool) -> Option<Aggregator>;

impl Aggregator {
    /// Summarize the present values of a column. Yields `None` (never zero) when
    /// nothing applicable was present.
    pub fn aggregate<'v>(&self, values: impl IntoIterator<Item = &'v Value>) -> Option<Value> {
        let mut values = values.into_iter();
        match self {
            Aggregator::Sum => sum_values(values),
            Aggregator::Max => extreme(values, |candidate, best| candidate > best),
            Aggregator::Min => extreme(values, |candidate, best| candidate < best),
            Aggregator::Count => {
                let count = values.by_ref().count();
                (count > 0).then(|| Value::Int(count as i64))
            }
        }
    }
}

fn extreme<'v>(
    values: impl Iterator<Item = &'v Value>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<Value> {
    let mut best: Option<(f64, &Value)> = None;
    for value in values {
        let Some(number) = value.as_f64() else {
            continue;
        };
        match best {
            Some((current, _)) if !better(number, current) => {}
            _ => best = Some((number, value)),
        }
    }
    best.map(|(_, value)| value.clone())
}

/// Sum of numeric dynamic fields, nothing otherwise.
pub fn numeric_sum_selector(_key: &str, is_numeric: bool) -> Option<Aggregator> {
    is_numeric.then_some(Aggregator::Sum)
}
