use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use algobench_core::{
    Algorithm, AlgorithmDetail, AlgorithmId, Criteria, CriteriaId, Execution, ExecutionId, Input,
    Page, Payload, PayloadWithInput, ResultId, ResultRecord, Status,
};

use crate::catalog::{builtin_catalog, Catalog};
use crate::error::StoreError;
use crate::report::aggregate;
use crate::store::{
    alias_matches, date_matches, BenchStore, ExecutionFilter, PageRequest, ReportGroup, ReportQuery,
    ReportRow,
};

#[derive(Debug, Clone)]
struct Binding {
    algorithm_id: AlgorithmId,
    criteria_id: CriteriaId,
    enabled: bool,
}

#[derive(Default)]
struct Tables {
    algorithms: BTreeMap<AlgorithmId, Algorithm>,
    inputs: Vec<Input>,
    criteria: BTreeMap<CriteriaId, Criteria>,
    bindings: Vec<Binding>,
    executions: HashMap<ExecutionId, Execution>,
    payloads: Vec<Payload>,
    results: Vec<ResultRecord>,
}

impl Tables {
    fn bound_criteria(&self, algorithm_id: AlgorithmId) -> Vec<Criteria> {
        // BTreeMap iteration gives criteria-id order.
        self.criteria
            .values()
            .filter(|c| c.enabled)
            .filter(|c| {
                self.bindings.iter().any(|b| {
                    b.enabled && b.algorithm_id == algorithm_id && b.criteria_id == c.criteria_id
                })
            })
            .cloned()
            .collect()
    }

    fn detail(&self, algorithm: &Algorithm) -> AlgorithmDetail {
        AlgorithmDetail {
            algorithm: algorithm.clone(),
            inputs: self
                .inputs
                .iter()
                .filter(|i| i.enabled && i.algorithm_id == algorithm.algorithm_id)
                .cloned()
                .collect(),
            criteria: self.bound_criteria(algorithm.algorithm_id),
        }
    }

    fn algorithm_enabled(&self, id: AlgorithmId) -> bool {
        self.algorithms.get(&id).is_some_and(|a| a.enabled)
    }
}

/// In-process store used by tests and by the CLI when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the built-in catalog.
    pub async fn seeded() -> Self {
        let store = Self::new();
        store.load_catalog(builtin_catalog()).await;
        store
    }

    pub async fn load_catalog(&self, catalog: Catalog) {
        for (algorithm, inputs) in catalog.algorithms {
            self.add_algorithm(algorithm, inputs).await;
        }
        for criteria in catalog.criteria {
            self.add_criteria(criteria).await;
        }
        for (algorithm_id, criteria_id) in catalog.bindings {
            self.bind(algorithm_id, criteria_id).await;
        }
    }

    pub async fn add_algorithm(&self, algorithm: Algorithm, inputs: Vec<Input>) {
        let mut t = self.tables.write().await;
        debug!(name = %algorithm.name, inputs = inputs.len(), "Adding algorithm");
        t.inputs.extend(inputs);
        t.algorithms.insert(algorithm.algorithm_id, algorithm);
    }

    pub async fn add_criteria(&self, criteria: Criteria) {
        let mut t = self.tables.write().await;
        t.criteria.insert(criteria.criteria_id, criteria);
    }

    pub async fn bind(&self, algorithm_id: AlgorithmId, criteria_id: CriteriaId) {
        let mut t = self.tables.write().await;
        t.bindings.push(Binding {
            algorithm_id,
            criteria_id,
            enabled: true,
        });
    }

    /// Soft-delete an algorithm; its executions disappear from active queries.
    pub async fn disable_algorithm(&self, id: AlgorithmId) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        let algorithm = t
            .algorithms
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Algorithm", id))?;
        algorithm.enabled = false;
        Ok(())
    }

    /// DONE result rows a report over `query` is built from.
    pub async fn report_rows(&self, query: &ReportQuery) -> Vec<ReportRow> {
        let t = self.tables.read().await;
        t.results
            .iter()
            .filter(|r| r.enabled && r.status == Status::Done && r.criteria_id == query.criteria_id)
            .filter_map(|r| {
                let exec = t.executions.get(&r.execution_id)?;
                if !exec.enabled
                    || exec.algorithm_id != query.algorithm_id
                    || !alias_matches(query.alias.as_deref(), exec.alias.as_deref())
                    || !date_matches(query.request_date, exec.created_at)
                {
                    return None;
                }
                let payload = t.payloads.iter().find(|p| {
                    p.enabled && p.execution_id == exec.execution_id && p.input_id == query.input_id
                })?;
                Some(ReportRow {
                    input_value: payload.input_value.clone(),
                    value: r.value.clone(),
                    unit: r.unit.clone(),
                })
            })
            .collect()
    }

    /// All results of an execution, including disabled ones.
    pub async fn all_results(&self, id: ExecutionId) -> Vec<ResultRecord> {
        let t = self.tables.read().await;
        t.results.iter().filter(|r| r.execution_id == id).cloned().collect()
    }

    /// Raw execution row, ignoring the enabled flag.
    pub async fn raw_execution(&self, id: ExecutionId) -> Option<Execution> {
        self.tables.read().await.executions.get(&id).cloned()
    }
}

#[async_trait]
impl BenchStore for MemoryStore {
    async fn list_algorithms(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AlgorithmDetail>, StoreError> {
        let t = self.tables.read().await;
        let needle = name.map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty());
        let mut matching: Vec<&Algorithm> = t
            .algorithms
            .values()
            .filter(|a| a.enabled)
            .filter(|a| needle.as_ref().map_or(true, |n| a.name.to_lowercase().contains(n)))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.algorithm_id.cmp(&a.algorithm_id))
        });

        let total_items = matching.len() as u64;
        let items = page
            .apply(matching)
            .into_iter()
            .map(|a| t.detail(a))
            .collect();
        Ok(Page { total_items, items })
    }

    async fn load_algorithm(&self, id: AlgorithmId) -> Result<Option<AlgorithmDetail>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.algorithms.get(&id).filter(|a| a.enabled).map(|a| t.detail(a)))
    }

    async fn criteria_for_algorithm(&self, id: AlgorithmId) -> Result<Vec<Criteria>, StoreError> {
        Ok(self.tables.read().await.bound_criteria(id))
    }

    async fn load_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.criteria.get(&id).filter(|c| c.enabled).cloned())
    }

    async fn create_execution(
        &self,
        execution: &Execution,
        payload: &[Payload],
    ) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        if !t.algorithms.contains_key(&execution.algorithm_id) {
            return Err(StoreError::not_found("Algorithm", execution.algorithm_id));
        }
        if t.executions.contains_key(&execution.execution_id) {
            return Err(StoreError::Other(format!(
                "execution {} already exists",
                execution.execution_id
            )));
        }
        t.executions.insert(execution.execution_id, execution.clone());
        t.payloads.extend(payload.iter().cloned());
        Ok(())
    }

    async fn load_execution(&self, id: ExecutionId) -> Result<Option<Execution>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.executions.get(&id).filter(|e| e.enabled).cloned())
    }

    async fn save_execution(&self, execution: &Execution) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        let row = t
            .executions
            .get_mut(&execution.execution_id)
            .ok_or_else(|| StoreError::not_found("Execution", execution.execution_id))?;
        row.status = execution.status;
        row.message = execution.message.clone();
        row.enabled = execution.enabled;
        row.updated_at = execution.updated_at;
        Ok(())
    }

    async fn list_executions(
        &self,
        filter: &ExecutionFilter,
        page: PageRequest,
    ) -> Result<Page<Execution>, StoreError> {
        let t = self.tables.read().await;
        let mut matching: Vec<Execution> = t
            .executions
            .values()
            .filter(|e| e.enabled && t.algorithm_enabled(e.algorithm_id))
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.execution_id.cmp(&a.execution_id))
        });

        Ok(Page {
            total_items: matching.len() as u64,
            items: page.apply(matching),
        })
    }

    async fn load_payload(&self, id: ExecutionId) -> Result<Vec<PayloadWithInput>, StoreError> {
        let t = self.tables.read().await;
        let rows = t
            .payloads
            .iter()
            .filter(|p| p.enabled && p.execution_id == id)
            .filter_map(|p| {
                t.inputs
                    .iter()
                    .find(|i| i.input_id == p.input_id)
                    .map(|i| PayloadWithInput {
                        payload: p.clone(),
                        input: i.clone(),
                    })
            })
            .collect();
        Ok(rows)
    }

    async fn insert_result(&self, result: &ResultRecord) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        if !t.executions.contains_key(&result.execution_id) {
            return Err(StoreError::not_found("Execution", result.execution_id));
        }
        t.results.push(result.clone());
        Ok(())
    }

    async fn save_result(&self, result: &ResultRecord) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        let row = t
            .results
            .iter_mut()
            .find(|r| r.result_id == result.result_id)
            .ok_or_else(|| StoreError::not_found("Result", result.result_id))?;
        row.value = result.value.clone();
        row.unit = result.unit.clone();
        row.status = result.status;
        row.message = result.message.clone();
        row.enabled = result.enabled;
        row.updated_at = result.updated_at;
        Ok(())
    }

    async fn load_result(&self, id: ResultId) -> Result<Option<ResultRecord>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.results.iter().find(|r| r.result_id == id && r.enabled).cloned())
    }

    async fn list_results(&self, id: ExecutionId) -> Result<Vec<ResultRecord>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.results
            .iter()
            .filter(|r| r.enabled && r.execution_id == id)
            .cloned()
            .collect())
    }

    async fn report_groups(
        &self,
        query: &ReportQuery,
        page: PageRequest,
    ) -> Result<Page<ReportGroup>, StoreError> {
        let groups = aggregate(&self.report_rows(query).await);
        Ok(Page {
            total_items: groups.len() as u64,
            items: page.apply(groups),
        })
    }
}
