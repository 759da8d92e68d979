use std::collections::BTreeMap;
use std::sync::Arc;

use algobench_core::BenchError;

use super::{Algorithm, Dijkstra, Factorial, Fibonacci, DIJKSTRA, FACTORIAL, FIBONACCI};

/// Builds a fresh algorithm instance for one run.
pub type AlgorithmFactory = Box<dyn Fn() -> Arc<dyn Algorithm> + Send + Sync>;

/// Name → factory map, populated once at startup and injected where needed.
#[derive(Default)]
pub struct AlgorithmRegistry {
    factories: BTreeMap<String, AlgorithmFactory>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in algorithm.
    pub fn builtin(max_graph_nodes: usize) -> Self {
        let mut registry = Self::new();
        registry.register(DIJKSTRA, move || Arc::new(Dijkstra::new(max_graph_nodes)));
        registry.register(FACTORIAL, || Arc::new(Factorial));
        registry.register(FIBONACCI, || Arc::new(Fibonacci));
        registry
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Algorithm> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Instantiate the algorithm registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Algorithm>, BenchError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| BenchError::NotImplemented(format!("algorithm '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
