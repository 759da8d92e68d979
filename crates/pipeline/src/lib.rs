//! Benchmark pipeline: payload validation, run orchestration, report
//! aggregation and the queue-driven worker.

pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod task;
pub mod validator;
pub mod worker;

pub use error::PipelineError;
pub use metrics::RunMetrics;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use report::{Report, ReportAggregator, ReportEntry, ReportRequest};
pub use task::RunTask;
pub use validator::{validate_payload, PayloadCheck};
pub use worker::Worker;
