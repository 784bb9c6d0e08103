use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use tracing::debug;

use crate::error::AggregateError;
use crate::registry::Registry;
use crate::value::Value;

/// One input row: which group it belongs to, where it sits inside that
/// group's fold order, and the value fed to the step function.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub group: Value,
    pub sort: Value,
    pub value: Value,
}

impl InputRow {
    pub fn new(group: impl Into<Value>, sort: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            group: group.into(),
            sort: sort.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub group: Value,
    pub value: Value,
}

/// Runs a named aggregate over a row sequence: partition by group key,
/// stable-sort each partition by sort key, fold the step function from a
/// fresh state, finalize once per group.
pub struct OrderedGroupedAggregator<'r> {
    registry: &'r Registry,
}

impl<'r> OrderedGroupedAggregator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Emits one `ResultRow` per distinct group key, in first-seen group
    /// order. Rows sharing a sort key keep their arrival order (SQL leaves
    /// that tie order undefined; here it is pinned to stable-input order).
    /// A step or finalize failure in any group abandons the whole call.
    pub fn run(&self, name: &str, rows: &[InputRow]) -> Result<Vec<ResultRow>, AggregateError> {
        let def = self.registry.lookup(name)?;

        let mut slots: HashMap<&Value, usize, FnvBuildHasher> = HashMap::default();
        let mut partitions: Vec<(Value, Vec<(&Value, &Value)>)> = Vec::new();
        for row in rows {
            let slot = *slots.entry(&row.group).or_insert_with(|| {
                partitions.push((row.group.clone(), Vec::new()));
                partitions.len() - 1
            });
            partitions[slot].1.push((&row.sort, &row.value));
        }

        debug!(
            aggregate = name,
            rows = rows.len(),
            groups = partitions.len(),
            "running ordered aggregate"
        );

        let mut results = Vec::with_capacity(partitions.len());
        for (group, mut partition) in partitions {
            // sort_by is stable, equal sort keys stay in arrival order
            partition.sort_by(|a, b| a.0.cmp(b.0));

            let fail = |source| AggregateError::Computation {
                name: name.to_owned(),
                group: group.clone(),
                source,
            };

            let mut state = (def.init)();
            for (_sort, value) in &partition {
                state = (def.step)(state, value).map_err(fail)?;
            }
            let value = (def.finalize)(state).map_err(fail)?;

            results.push(ResultRow { group, value });
        }

        Ok(results)
    }
}
