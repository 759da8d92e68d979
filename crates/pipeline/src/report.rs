//! Averages DONE results per numeric input value for one algorithm/criterion/input.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use algobench_core::config::ReportConfig;
use algobench_core::{AlgorithmId, CriteriaId, InputId};
use algobench_storage::{BenchStore, PageRequest, ReportGroup, ReportQuery};

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub algorithm_id: AlgorithmId,
    pub criteria_id: CriteriaId,
    pub input_id: InputId,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub request_date: Option<NaiveDate>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub amount: Option<u32>,
}

/// One aggregated group. `average` is a decimal string like every stored value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub input_value: String,
    pub average: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_items: u64,
    pub report: Vec<ReportEntry>,
}

pub struct ReportAggregator {
    store: Arc<dyn BenchStore>,
    config: ReportConfig,
}

impl ReportAggregator {
    pub fn new(store: Arc<dyn BenchStore>, config: ReportConfig) -> Self {
        Self { store, config }
    }

    pub async fn get_report(&self, request: &ReportRequest) -> Result<Report, PipelineError> {
        let query = ReportQuery {
            algorithm_id: request.algorithm_id,
            criteria_id: request.criteria_id,
            input_id: request.input_id,
            alias: request.alias.clone(),
            request_date: request.request_date,
        };
        let page = PageRequest::new(request.page.unwrap_or(0), self.config.amount(request.amount));
        let groups = self.store.report_groups(&query, page).await?;
        debug!(
            algorithm_id = %request.algorithm_id,
            criteria_id = %request.criteria_id,
            groups = groups.total_items,
            "Report aggregated"
        );

        Ok(Report {
            total_items: groups.total_items,
            report: groups.items.into_iter().map(ReportEntry::from).collect(),
        })
    }
}

impl From<ReportGroup> for ReportEntry {
    fn from(group: ReportGroup) -> Self {
        Self {
            input_value: canonical_input(group.input),
            average: format!("{:.7}", group.average),
            unit: group.unit,
        }
    }
}

/// Render a grouped input the way it would be typed: integers without a
/// fraction, everything else in its shortest decimal form.
pub fn canonical_input(input: f64) -> String {
    if input.fract() == 0.0 && input.abs() < 1e15 {
        format!("{}", input as i64)
    } else {
        format!("{input}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_inputs_drop_the_fraction() {
        assert_eq!(canonical_input(5.0), "5");
        assert_eq!(canonical_input(-0.0), "0");
        assert_eq!(canonical_input(1200.0), "1200");
    }

    #[test]
    fn fractional_inputs_keep_their_digits() {
        assert_eq!(canonical_input(2.5), "2.5");
        assert_eq!(canonical_input(0.125), "0.125");
    }

    #[test]
    fn entry_formats_average_to_seven_places() {
        let entry = ReportEntry::from(ReportGroup {
            input: 5.0,
            average: 1.0 / 3.0,
            unit: Some("secs".into()),
        });
        assert_eq!(entry.input_value, "5");
        assert_eq!(entry.average, "0.3333333");
        assert_eq!(entry.unit.as_deref(), Some("secs"));
    }
}
