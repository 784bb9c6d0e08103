use crate::error::StepError;
use crate::value::Value;

pub type InitFn = fn() -> Value;
pub type StepFn = fn(Value, &Value) -> Result<Value, StepError>;
pub type FinalizeFn = fn(Value) -> Result<Value, StepError>;

/// A named aggregate: a fresh-state constructor, an order-sensitive step,
/// and a finalize that consumes the state exactly once.
///
/// The three functions are plain `fn` pointers over owned `Value` states,
/// so a definition cannot capture or share mutable state between the
/// groups it is folded over. Step must be pure; the aggregator threads the
/// state through by value.
pub struct AggregateDef {
    name: String,
    pub(crate) init: InitFn,
    pub(crate) step: StepFn,
    pub(crate) finalize: FinalizeFn,
}

impl AggregateDef {
    pub fn new(name: impl Into<String>, init: InitFn, step: StepFn, finalize: FinalizeFn) -> Self {
        Self {
            name: name.into(),
            init,
            step,
            finalize,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
