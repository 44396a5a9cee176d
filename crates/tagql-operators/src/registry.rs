//! Name-keyed aggregator factories consulted when a planner translates an
//! aggregate call such as `sum(v)`.
//!
//! A registry is immutable once built and cheap to clone; engines take one
//! at construction instead of reading process-wide state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tagql_core::{Error, Result};

use crate::aggregate::{AggregateSpec, AggregatorBox, Avg, Count, Max, Min, Sum};
use crate::expr::ValueReader;

pub type AggregatorFactory = Arc<dyn Fn(ValueReader) -> AggregatorBox + Send + Sync>;

#[derive(Clone, Default)]
pub struct AggregatorRegistry {
    factories: Arc<HashMap<String, AggregatorFactory>>,
}

impl AggregatorRegistry {
    pub fn builder() -> AggregatorRegistryBuilder {
        AggregatorRegistryBuilder::new()
    }

    /// count, sum, avg, min, max.
    pub fn with_builtins() -> Self {
        AggregatorRegistryBuilder::new().with_builtins().build()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn make(&self, name: &str, arg: ValueReader) -> Result<AggregatorBox> {
        let factory = self.factory(name)?;
        Ok(factory(arg))
    }

    /// A spec producing one output column `alias`, each instance reading `arg`.
    pub fn spec(&self, name: &str, alias: impl Into<String>, arg: ValueReader) -> Result<AggregateSpec> {
        let factory = self.factory(name)?;
        Ok(AggregateSpec::new(alias, move || factory(Arc::clone(&arg))))
    }

    fn factory(&self, name: &str) -> Result<AggregatorFactory> {
        self.factories
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::UnknownAggregate(name.to_string()))
    }
}

impl fmt::Debug for AggregatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct AggregatorRegistryBuilder {
    factories: HashMap<String, AggregatorFactory>,
}

impl AggregatorRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins(self) -> Self {
        self.register("count", |arg| Box::new(Count::new(arg)))
            .register("sum", |arg| Box::new(Sum::new(arg)))
            .register("avg", |arg| Box::new(Avg::new(arg)))
            .register("min", |arg| Box::new(Min::new(arg)))
            .register("max", |arg| Box::new(Max::new(arg)))
    }

    /// Registering an existing name replaces it.
    pub fn register<F>(mut self, name: impl AsRef<str>, factory: F) -> Self
    where
        F: Fn(ValueReader) -> AggregatorBox + Send + Sync + 'static,
    {
        self.factories
            .insert(name.as_ref().to_lowercase(), Arc::new(factory));
        self
    }

    pub fn build(self) -> AggregatorRegistry {
        AggregatorRegistry {
            factories: Arc::new(self.factories),
        }
    }
}
