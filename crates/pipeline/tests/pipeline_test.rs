//! End-to-end runs and reports over the in-memory store.

use std::sync::Arc;

use algobench_compute::{
    Algorithm, AlgorithmRegistry, EvaluationContext, EvaluationError, EvaluationRegistry,
    Evaluator, Measurement,
};
use algobench_core::config::{EvaluationConfig, ReportConfig};
use algobench_core::{Execution, NewExecution, Payload, ResultRecord, Status, SubmittedInput};
use algobench_pipeline::{Orchestrator, ReportAggregator, ReportRequest, RunTask};
use algobench_queue::LocalQueue;
use algobench_storage::catalog::{
    COUNT_NODES_ID, DETECT_CYCLE_ID, DIJKSTRA_ID, EDGES_INPUT_ID, FACTORIAL_ID, FACTORIAL_INPUT_ID,
    NODES_INPUT_ID, RUNNING_TIME_ID,
};
use algobench_storage::{BenchStore, MemoryStore};

/// Stands in for process sampling, which is host dependent.
struct FixedMemory;

impl Evaluator for FixedMemory {
    fn name(&self) -> &str {
        "Memory Consume"
    }

    fn evaluate(
        &self,
        algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        algorithm.run(ctx.params)?;
        Ok(Measurement::new("2.0000000", Some("MiB")))
    }
}

async fn orchestrator(store: Arc<MemoryStore>) -> Orchestrator {
    let mut evaluations = EvaluationRegistry::builtin(&EvaluationConfig::default());
    evaluations.register("Memory Consume", || Arc::new(FixedMemory));
    Orchestrator::new(
        store,
        Arc::new(LocalQueue::new()),
        Arc::new(AlgorithmRegistry::builtin(50)),
        Arc::new(evaluations),
    )
}

// ── Runs ─────────────────────────────────────────────────────────

#[tokio::test]
async fn dijkstra_run_measures_generated_graph() {
    let store = Arc::new(MemoryStore::seeded().await);
    let orchestrator = orchestrator(store.clone()).await;

    let execution = orchestrator
        .create_execution(NewExecution {
            algorithm_id: DIJKSTRA_ID,
            alias: Some("graph_12".into()),
            inputs: vec![
                SubmittedInput {
                    input_id: NODES_INPUT_ID,
                    value: "12".into(),
                },
                SubmittedInput {
                    input_id: EDGES_INPUT_ID,
                    value: "30".into(),
                },
            ],
        })
        .await
        .unwrap();

    let outcome = RunTask::new(&orchestrator).run(execution.execution_id).await.unwrap();

    assert_eq!(outcome.execution.status, Status::Done);
    assert_eq!(outcome.results.len(), 6);
    assert_eq!(outcome.failed_results(), 0, "results: {:?}", outcome.results);

    let nodes = outcome.results.iter().find(|r| r.criteria_id == COUNT_NODES_ID).unwrap();
    assert_eq!(nodes.value.as_deref(), Some("12"));
    let cycle = outcome.results.iter().find(|r| r.criteria_id == DETECT_CYCLE_ID).unwrap();
    assert!(cycle.value.as_deref().unwrap_or_default().contains("ycle detected"));

    // Synthetic graph inputs are never persisted.
    let payload = store.load_payload(execution.execution_id).await.unwrap();
    assert_eq!(payload.len(), 2);
}

#[tokio::test]
async fn oversized_graph_marks_execution_error() {
    let store = Arc::new(MemoryStore::seeded().await);
    let orchestrator = orchestrator(store.clone()).await;

    let execution = orchestrator
        .create_execution(NewExecution {
            algorithm_id: DIJKSTRA_ID,
            alias: None,
            inputs: vec![
                SubmittedInput {
                    input_id: NODES_INPUT_ID,
                    value: "500".into(),
                },
                SubmittedInput {
                    input_id: EDGES_INPUT_ID,
                    value: "10".into(),
                },
            ],
        })
        .await
        .unwrap();

    let err = RunTask::new(&orchestrator).run(execution.execution_id).await.unwrap_err();
    assert!(!err.is_not_found());

    let stored = store.raw_execution(execution.execution_id).await.unwrap();
    assert_eq!(stored.status, Status::Error);
    assert!(stored.message.unwrap_or_default().contains("exceeds the limit"));
    assert!(store.all_results(execution.execution_id).await.is_empty());
}

fn factorial_of(value: &str) -> NewExecution {
    NewExecution {
        algorithm_id: FACTORIAL_ID,
        alias: None,
        inputs: vec![SubmittedInput {
            input_id: FACTORIAL_INPUT_ID,
            value: value.into(),
        }],
    }
}

#[tokio::test]
async fn huge_factorial_input_fails_results_not_the_worker() {
    let store = Arc::new(MemoryStore::seeded().await);
    let orchestrator = orchestrator(store.clone()).await;

    let execution = orchestrator.create_execution(factorial_of("10000000")).await.unwrap();
    assert_eq!(execution.status, Status::Queue);

    let outcome = RunTask::new(&orchestrator).run(execution.execution_id).await.unwrap();

    assert_eq!(outcome.execution.status, Status::Done);
    assert!(!outcome.results.is_empty());
    assert_eq!(outcome.failed_results(), outcome.results.len());
    assert!(outcome
        .results
        .iter()
        .all(|r| r.message.as_deref().unwrap_or_default().contains("10000000!")));
}

#[tokio::test]
async fn disabled_algorithm_marks_execution_error() {
    let store = Arc::new(MemoryStore::seeded().await);
    let orchestrator = orchestrator(store.clone()).await;

    let execution = orchestrator.create_execution(factorial_of("6")).await.unwrap();
    store.disable_algorithm(FACTORIAL_ID).await.unwrap();

    let err = RunTask::new(&orchestrator).run(execution.execution_id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_missing_execution());

    let stored = store.raw_execution(execution.execution_id).await.unwrap();
    assert_eq!(stored.status, Status::Error);
    assert!(stored.message.unwrap_or_default().contains("Algorithm not found"));
}

#[tokio::test]
async fn missing_execution_is_left_alone() {
    let store = Arc::new(MemoryStore::seeded().await);
    let orchestrator = orchestrator(store.clone()).await;

    let err = RunTask::new(&orchestrator).run(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_missing_execution());
}

// ── Reports ──────────────────────────────────────────────────────

/// Store a finished Factorial execution with one Running Time reading.
async fn seed_reading(store: &MemoryStore, alias: &str, input: &str, value: &str) {
    let mut execution = Execution::new(FACTORIAL_ID, alias.to_string());
    let payload = vec![Payload::new(execution.execution_id, FACTORIAL_INPUT_ID, input)];
    store.create_execution(&execution, &payload).await.unwrap();

    let mut result = ResultRecord::new(execution.execution_id, RUNNING_TIME_ID);
    store.insert_result(&result).await.unwrap();
    result.set_done(Some(value.into()), Some("secs".into()), None);
    store.save_result(&result).await.unwrap();

    execution.set_done();
    store.save_execution(&execution).await.unwrap();
}

fn report_request() -> ReportRequest {
    ReportRequest {
        algorithm_id: FACTORIAL_ID,
        criteria_id: RUNNING_TIME_ID,
        input_id: FACTORIAL_INPUT_ID,
        alias: None,
        request_date: None,
        page: None,
        amount: None,
    }
}

#[tokio::test]
async fn report_averages_per_input_in_ascending_order() {
    let store = Arc::new(MemoryStore::seeded().await);
    seed_reading(&store, "bench_a", "20", "0.3").await;
    seed_reading(&store, "bench_a", "5", "0.1").await;
    seed_reading(&store, "bench_b", "20", "0.5").await;
    seed_reading(&store, "bench_b", "10", "0.2").await;

    let aggregator = ReportAggregator::new(store.clone(), ReportConfig::default());
    let report = aggregator.get_report(&report_request()).await.unwrap();

    assert_eq!(report.total_items, 3);
    let rows: Vec<_> = report
        .report
        .iter()
        .map(|e| (e.input_value.as_str(), e.average.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![("5", "0.1000000"), ("10", "0.2000000"), ("20", "0.4000000")]
    );
    assert!(report.report.iter().all(|e| e.unit.as_deref() == Some("secs")));

    // Reading the report changes nothing.
    let again = aggregator.get_report(&report_request()).await.unwrap();
    assert_eq!(again, report);
}

#[tokio::test]
async fn report_pages_and_filters_by_alias() {
    let store = Arc::new(MemoryStore::seeded().await);
    for n in 1..=5 {
        seed_reading(&store, "paged", &n.to_string(), "1.0").await;
    }
    seed_reading(&store, "other", "6", "1.0").await;
    let aggregator = ReportAggregator::new(store.clone(), ReportConfig::default());

    let mut request = report_request();
    request.alias = Some("PAGED".into());
    request.page = Some(1);
    request.amount = Some(2);
    let report = aggregator.get_report(&request).await.unwrap();

    assert_eq!(report.total_items, 5);
    let inputs: Vec<_> = report.report.iter().map(|e| e.input_value.as_str()).collect();
    assert_eq!(inputs, vec!["3", "4"]);

    request.page = Some(9);
    let past_end = aggregator.get_report(&request).await.unwrap();
    assert_eq!(past_end.total_items, 5);
    assert!(past_end.report.is_empty());
}

#[tokio::test]
async fn report_ignores_results_that_are_not_done() {
    let store = Arc::new(MemoryStore::seeded().await);
    seed_reading(&store, "mixed", "3", "0.25").await;

    let execution = Execution::new(FACTORIAL_ID, "mixed".into());
    let payload = vec![Payload::new(execution.execution_id, FACTORIAL_INPUT_ID, "3")];
    store.create_execution(&execution, &payload).await.unwrap();
    let mut failed = ResultRecord::new(execution.execution_id, RUNNING_TIME_ID);
    store.insert_result(&failed).await.unwrap();
    failed.set_error("overflow");
    store.save_result(&failed).await.unwrap();

    let aggregator = ReportAggregator::new(store.clone(), ReportConfig::default());
    let report = aggregator.get_report(&report_request()).await.unwrap();

    assert_eq!(report.total_items, 1);
    assert_eq!(report.report[0].average, "0.2500000");
}

#[tokio::test]
async fn report_merges_spellings_of_the_same_input() {
    let store = Arc::new(MemoryStore::seeded().await);
    seed_reading(&store, "spelled", "5", "0.1").await;
    seed_reading(&store, "spelled", "05", "0.2").await;
    seed_reading(&store, "spelled", "+5", "0.3").await;

    let aggregator = ReportAggregator::new(store.clone(), ReportConfig::default());
    let report = aggregator.get_report(&report_request()).await.unwrap();

    assert_eq!(report.total_items, 1);
    assert_eq!(report.report[0].input_value, "5");
    assert_eq!(report.report[0].average, "0.2000000");
}
