use fnv::FnvBuildHasher;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::builtins;
use crate::definition::AggregateDef;
use crate::error::AggregateError;

/// Name-keyed set of aggregate definitions.
///
/// A registry is built explicitly and passed to the aggregator; there is
/// no process-global instance. `register` takes `&mut self` and
/// `lookup` takes `&self`, so the borrow checker enforces the contract
/// that all registration finishes before execution starts, and a shared
/// `&Registry` is safe to run against from many threads at once.
#[derive(Default)]
pub struct Registry {
    defs: HashMap<String, AggregateDef, FnvBuildHasher>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in aggregates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for def in builtins::all() {
            registry
                .register(def)
                .expect("builtin aggregate names are distinct");
        }
        registry
    }

    pub fn register(&mut self, def: AggregateDef) -> Result<(), AggregateError> {
        match self.defs.entry(def.name().to_owned()) {
            Entry::Occupied(slot) => Err(AggregateError::DuplicateName(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(def);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&AggregateDef, AggregateError> {
        self.defs
            .get(name)
            .ok_or_else(|| AggregateError::UnknownAggregate(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }
}
