use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use algobench_core::config::EvaluationConfig;
use algobench_core::BenchError;

use super::{
    CountEdges, CountNodes, DetectCycle, Evaluator, MemoryConsume, RunningTime, SetupTime,
    COUNT_EDGES, COUNT_NODES, DETECT_CYCLE, MEMORY_CONSUME, RUNNING_TIME, SETUP_TIME,
};

/// Builds a fresh evaluator instance for one run.
pub type EvaluatorFactory = Box<dyn Fn() -> Arc<dyn Evaluator> + Send + Sync>;

/// Criterion name → factory map.
#[derive(Default)]
pub struct EvaluationRegistry {
    factories: BTreeMap<String, EvaluatorFactory>,
}

impl EvaluationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin(config: &EvaluationConfig) -> Self {
        let sample_every = Duration::from_millis(config.memory_sample_interval_ms.max(1));
        let mut registry = Self::new();
        registry.register(RUNNING_TIME, || Arc::new(RunningTime));
        registry.register(MEMORY_CONSUME, move || Arc::new(MemoryConsume::new(sample_every)));
        registry.register(SETUP_TIME, || Arc::new(SetupTime));
        registry.register(COUNT_NODES, || Arc::new(CountNodes));
        registry.register(COUNT_EDGES, || Arc::new(CountEdges));
        registry.register(DETECT_CYCLE, || Arc::new(DetectCycle));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Evaluator> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Evaluator>, BenchError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| BenchError::NotImplemented(format!("criterion '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_catalog_criteria() {
        let registry = EvaluationRegistry::builtin(&EvaluationConfig::default());
        for name in [
            "Running Time",
            "Memory Consume",
            "Setup Time",
            "Count Nodes",
            "Count Edges",
            "Detect Cycle",
        ] {
            assert!(registry.contains(name), "missing {name}");
            assert_eq!(registry.get(name).unwrap().name(), name);
        }
        assert_eq!(registry.names().len(), 6);
    }

    #[test]
    fn unknown_criterion_is_not_implemented() {
        let registry = EvaluationRegistry::builtin(&EvaluationConfig::default());
        assert!(matches!(
            registry.get("Energy Use").err(),
            Some(BenchError::NotImplemented(_))
        ));
    }
}
