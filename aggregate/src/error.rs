use thiserror::Error;

use crate::value::Value;

/// Domain failure inside a step or finalize function.
#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("integer sum overflowed")]
    Overflow,

    #[error("linear fit needs at least two distinct x positions")]
    DegenerateFit,

    #[error("no values accumulated")]
    Empty,
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    /// `register` rejected the name; the earlier registration is untouched.
    #[error("aggregate `{0}` is already registered")]
    DuplicateName(String),

    #[error("unknown aggregate `{0}`")]
    UnknownAggregate(String),

    /// A step or finalize call failed. The whole run is abandoned, so a
    /// caller never sees results for the groups that happened to precede
    /// the failing one.
    #[error("aggregate `{name}` failed for group {group}: {source}")]
    Computation {
        name: String,
        group: Value,
        #[source]
        source: StepError,
    },
}
