//! Stock aggregates registered by `Registry::with_builtins`.
//!
//! Each is an ordinary `AggregateDef` triple; nothing here is special to
//! the aggregator. `linear_fit` is the end-to-end showcase: it consumes
//! `[x, y]` pair values and finalizes into `[slope, intercept]` by least
//! squares, the classic custom database aggregate.

use crate::definition::AggregateDef;
use crate::error::StepError;
use crate::value::Value;

pub fn all() -> Vec<AggregateDef> {
    vec![count(), sum(), min(), max(), collect(), linear_fit()]
}

pub fn count() -> AggregateDef {
    AggregateDef::new(
        "count",
        || Value::Int(0),
        |state, _value| match state {
            Value::Int(n) => Ok(Value::Int(n + 1)),
            other => Err(StepError::TypeMismatch {
                expected: "int state",
                actual: other.kind(),
            }),
        },
        Ok,
    )
}

pub fn sum() -> AggregateDef {
    AggregateDef::new(
        "sum",
        || Value::Int(0),
        |state, value| match (state, value) {
            (Value::Int(s), Value::Int(v)) => {
                s.checked_add(*v).map(Value::Int).ok_or(StepError::Overflow)
            }
            // int + float promotes the running state to float
            (Value::Int(s), Value::Float(v)) => Ok(Value::Float(s as f64 + v)),
            (Value::Float(s), Value::Int(v)) => Ok(Value::Float(s + *v as f64)),
            (Value::Float(s), Value::Float(v)) => Ok(Value::Float(s + v)),
            (_, other) => Err(StepError::TypeMismatch {
                expected: "int or float",
                actual: other.kind(),
            }),
        },
        Ok,
    )
}

pub fn min() -> AggregateDef {
    AggregateDef::new("min", hold_first, keep_smaller, unhold)
}

pub fn max() -> AggregateDef {
    AggregateDef::new("max", hold_first, keep_larger, unhold)
}

pub fn collect() -> AggregateDef {
    AggregateDef::new(
        "collect",
        || Value::List(Vec::new()),
        |state, value| match state {
            Value::List(mut items) => {
                items.push(value.clone());
                Ok(Value::List(items))
            }
            other => Err(bad_state(&other)),
        },
        Ok,
    )
}

pub fn linear_fit() -> AggregateDef {
    AggregateDef::new(
        "linear_fit",
        || Value::List(Vec::new()),
        |state, value| {
            // validate in step so the error surfaces at the offending row
            xy_pair(value)?;
            match state {
                Value::List(mut points) => {
                    points.push(value.clone());
                    Ok(Value::List(points))
                }
                other => Err(bad_state(&other)),
            }
        },
        |state| {
            let points = match state {
                Value::List(points) => points,
                other => return Err(bad_state(&other)),
            };

            let n = points.len() as f64;
            let mut sx = 0.0;
            let mut sy = 0.0;
            let mut sxx = 0.0;
            let mut sxy = 0.0;
            for point in &points {
                let (x, y) = xy_pair(point)?;
                sx += x;
                sy += y;
                sxx += x * x;
                sxy += x * y;
            }

            // zero when n < 2 or all x coincide
            let denom = n * sxx - sx * sx;
            if denom == 0.0 {
                return Err(StepError::DegenerateFit);
            }
            let slope = (n * sxy - sx * sy) / denom;
            let intercept = (sy - slope * sx) / n;
            Ok(Value::List(vec![
                Value::Float(slope),
                Value::Float(intercept),
            ]))
        },
    )
}

/// Min/max state: an at-most-one-element list wrapping the current best,
/// so the empty state is distinguishable from any held value.
fn hold_first() -> Value {
    Value::List(Vec::new())
}

fn keep_smaller(state: Value, value: &Value) -> Result<Value, StepError> {
    keep_if(state, value, |curr, new| new < curr)
}

fn keep_larger(state: Value, value: &Value) -> Result<Value, StepError> {
    keep_if(state, value, |curr, new| new > curr)
}

fn keep_if(
    state: Value,
    value: &Value,
    replace: fn(&Value, &Value) -> bool,
) -> Result<Value, StepError> {
    let mut held = match state {
        Value::List(held) => held,
        other => return Err(bad_state(&other)),
    };
    match held.first() {
        Some(curr) if !replace(curr, value) => {}
        _ => {
            held.clear();
            held.push(value.clone());
        }
    }
    Ok(Value::List(held))
}

fn unhold(state: Value) -> Result<Value, StepError> {
    let mut held = match state {
        Value::List(held) => held,
        other => return Err(bad_state(&other)),
    };
    held.pop().ok_or(StepError::Empty)
}

fn xy_pair(value: &Value) -> Result<(f64, f64), StepError> {
    if let Value::List(pair) = value {
        if let [x, y] = pair.as_slice() {
            return Ok((as_f64(x)?, as_f64(y)?));
        }
    }
    Err(StepError::TypeMismatch {
        expected: "[x, y] pair",
        actual: value.kind(),
    })
}

fn as_f64(value: &Value) -> Result<f64, StepError> {
    match value {
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        other => Err(StepError::TypeMismatch {
            expected: "int or float",
            actual: other.kind(),
        }),
    }
}

fn bad_state(state: &Value) -> StepError {
    StepError::TypeMismatch {
        expected: "list state",
        actual: state.kind(),
    }
}
