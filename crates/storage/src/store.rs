//! Persistence port consumed by the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use algobench_core::{
    AlgorithmDetail, AlgorithmId, Criteria, CriteriaId, Execution, ExecutionId, InputId, Page,
    Payload, PayloadWithInput, ResultId, ResultRecord, Status,
};

use crate::error::StoreError;

/// Page request: zero-based `page` of `amount` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub amount: u32,
}

impl PageRequest {
    pub fn new(page: u32, amount: u32) -> Self {
        Self { page, amount }
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.amount as usize
    }

    /// Slice one page out of an already ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.amount as usize)
            .collect()
    }
}

/// Filters for listing executions. Empty lists mean "no constraint".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionFilter {
    #[serde(default)]
    pub execution_ids: Vec<ExecutionId>,
    #[serde(default)]
    pub algorithm_ids: Vec<AlgorithmId>,
    #[serde(default)]
    pub statuses: Vec<Status>,
    /// Case-insensitive substring of the alias.
    #[serde(default)]
    pub alias: Option<String>,
    /// Calendar day (UTC) the execution was created on.
    #[serde(default)]
    pub request_date: Option<NaiveDate>,
}

impl ExecutionFilter {
    pub fn matches(&self, execution: &Execution) -> bool {
        (self.execution_ids.is_empty() || self.execution_ids.contains(&execution.execution_id))
            && (self.algorithm_ids.is_empty() || self.algorithm_ids.contains(&execution.algorithm_id))
            && (self.statuses.is_empty() || self.statuses.contains(&execution.status))
            && alias_matches(self.alias.as_deref(), execution.alias.as_deref())
            && date_matches(self.request_date, execution.created_at)
    }
}

/// Selects the rows a report is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
    pub algorithm_id: AlgorithmId,
    pub criteria_id: CriteriaId,
    pub input_id: InputId,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub request_date: Option<NaiveDate>,
}

/// One DONE result joined to the payload value of the reported input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub input_value: String,
    pub value: Option<String>,
    pub unit: Option<String>,
}

/// Mean of the numeric results sharing one numeric input value and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub input: f64,
    pub average: f64,
    pub unit: Option<String>,
}

pub(crate) fn alias_matches(needle: Option<&str>, alias: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(needle) => alias
            .map(|a| a.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

pub(crate) fn date_matches(day: Option<NaiveDate>, at: DateTime<Utc>) -> bool {
    day.map_or(true, |d| at.date_naive() == d)
}

/// Start and end (exclusive) of a UTC calendar day.
pub(crate) fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}

/// Storage operations the benchmark pipeline depends on.
///
/// Every `load_*` and listing method sees enabled rows only. Each write is
/// committed on its own; `create_execution` is the one multi-row transaction.
#[async_trait]
pub trait BenchStore: Send + Sync {
    // ── Catalog ──────────────────────────────────────────────

    /// Enabled algorithms (optionally name-filtered), newest first.
    async fn list_algorithms(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AlgorithmDetail>, StoreError>;

    /// An enabled algorithm with its enabled inputs and bound criteria.
    async fn load_algorithm(&self, id: AlgorithmId) -> Result<Option<AlgorithmDetail>, StoreError>;

    /// Enabled criteria bound to the algorithm, ordered by criteria id.
    async fn criteria_for_algorithm(&self, id: AlgorithmId) -> Result<Vec<Criteria>, StoreError>;

    async fn load_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, StoreError>;

    // ── Executions ───────────────────────────────────────────

    /// Insert an execution and its payload rows atomically.
    async fn create_execution(
        &self,
        execution: &Execution,
        payload: &[Payload],
    ) -> Result<(), StoreError>;

    async fn load_execution(&self, id: ExecutionId) -> Result<Option<Execution>, StoreError>;

    /// Persist status, message, enabled flag and `updated_at`.
    async fn save_execution(&self, execution: &Execution) -> Result<(), StoreError>;

    /// Enabled executions of enabled algorithms, newest first.
    async fn list_executions(
        &self,
        filter: &ExecutionFilter,
        page: PageRequest,
    ) -> Result<Page<Execution>, StoreError>;

    /// Payload rows of an execution, each joined to its input definition.
    async fn load_payload(&self, id: ExecutionId) -> Result<Vec<PayloadWithInput>, StoreError>;

    // ── Results ──────────────────────────────────────────────

    async fn insert_result(&self, result: &ResultRecord) -> Result<(), StoreError>;

    /// Persist value, unit, status, message, enabled flag and `updated_at`.
    async fn save_result(&self, result: &ResultRecord) -> Result<(), StoreError>;

    async fn load_result(&self, id: ResultId) -> Result<Option<ResultRecord>, StoreError>;

    /// Enabled results of an execution in creation order.
    async fn list_results(&self, id: ExecutionId) -> Result<Vec<ResultRecord>, StoreError>;

    // ── Reports ──────────────────────────────────────────────

    /// DONE results grouped by numeric input value and unit, averaged,
    /// ordered by input then unit, and paginated by group. `total_items`
    /// counts every group. Non-numeric inputs or values are left out.
    async fn report_groups(
        &self,
        query: &ReportQuery,
        page: PageRequest,
    ) -> Result<Page<ReportGroup>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn page_request_slices() {
        let items: Vec<u32> = (0..45).collect();
        assert_eq!(PageRequest::new(0, 20).apply(items.clone()).len(), 20);
        assert_eq!(PageRequest::new(2, 20).apply(items.clone()), (40..45).collect::<Vec<_>>());
        assert!(PageRequest::new(3, 20).apply(items).is_empty());
    }

    #[test]
    fn filter_matches_alias_case_insensitively() {
        let mut exec = Execution::new(Uuid::new_v4(), "Nightly_Run".into());
        exec.set_done();
        let filter = ExecutionFilter {
            alias: Some("nightly".into()),
            statuses: vec![Status::Done, Status::Error],
            ..Default::default()
        };
        assert!(filter.matches(&exec));

        let other = ExecutionFilter {
            algorithm_ids: vec![Uuid::new_v4()],
            ..Default::default()
        };
        assert!(!other.matches(&exec));
    }

    #[test]
    fn request_date_matches_creation_day() {
        let exec = Execution::new(Uuid::new_v4(), "a".into());
        let today = exec.created_at.date_naive();
        assert!(date_matches(Some(today), exec.created_at));
        assert!(!date_matches(today.pred_opt(), exec.created_at));

        let (start, end) = day_bounds(today);
        assert!(start <= exec.created_at && exec.created_at < end);
    }
}
