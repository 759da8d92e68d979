use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use algobench_core::{Status, SubmittedInput};

/// Benchmark registered algorithms against their bound criteria.
///
/// Uses PostgreSQL when `PG_URL` or `PG_USERNAME` is set, otherwise an
/// in-memory store seeded with the built-in catalog (state lasts for one
/// invocation only).
#[derive(Parser, Debug)]
#[command(name = "algobench", version, about = "Algorithm benchmarking pipeline")]
pub struct CliArgs {
    /// Configuration profile (e.g. PROD); keys resolve as PROD_<KEY> first.
    #[arg(long, env = "ALGOBENCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Force the in-memory store even when Postgres is configured.
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List enabled algorithms with their inputs and criteria.
    Algorithms {
        /// Case-insensitive name substring.
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one algorithm.
    Algorithm { id: Uuid },

    /// Create an execution and enqueue it for a worker.
    Submit(SubmitArgs),

    /// Create an execution and process it in this process.
    Run(SubmitArgs),

    /// Process queued executions until Ctrl-C.
    Worker(WorkerArgs),

    /// List executions.
    Executions(ExecutionArgs),

    /// Show one execution with its payload and (once DONE) its results.
    Execution { id: Uuid },

    /// Soft-delete an execution.
    Disable { id: Uuid },

    /// Manually set an execution or result to WARNING or ERROR.
    Mark(MarkArgs),

    /// Average DONE results per input value.
    Report(ReportArgs),

    /// Print the resolved configuration without secrets.
    Config,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    /// Items per page.
    #[arg(long, default_value_t = 20)]
    pub amount: u32,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Algorithm to run.
    #[arg(long)]
    pub algorithm: Uuid,

    /// Free-form label; reduced to ASCII letters, digits and `_`.
    #[arg(long)]
    pub alias: Option<String>,

    /// Input value as `<input-id>=<value>`. Repeat for each input.
    #[arg(long = "input", value_parser = parse_input)]
    pub inputs: Vec<SubmittedInput>,
}

#[derive(Args, Debug)]
pub struct WorkerArgs {
    /// Sleep between empty polls (overrides WORKER_POLL_INTERVAL_MS).
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Messages claimed per poll (overrides WORKER_BATCH_SIZE).
    #[arg(long)]
    pub batch_size: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ExecutionArgs {
    #[arg(long = "id")]
    pub execution_ids: Vec<Uuid>,

    #[arg(long = "algorithm")]
    pub algorithm_ids: Vec<Uuid>,

    #[arg(long = "status")]
    pub statuses: Vec<Status>,

    #[arg(long)]
    pub alias: Option<String>,

    /// UTC calendar day, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarkStatus {
    Warning,
    Error,
}

#[derive(Args, Debug)]
pub struct MarkArgs {
    /// Execution id, or result id with `--result`.
    pub id: Uuid,

    #[arg(long, value_enum)]
    pub status: MarkStatus,

    #[arg(long)]
    pub message: String,

    /// Treat `id` as a result id.
    #[arg(long)]
    pub result: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[arg(long)]
    pub algorithm: Uuid,

    #[arg(long)]
    pub criteria: Uuid,

    #[arg(long)]
    pub input: Uuid,

    #[arg(long)]
    pub alias: Option<String>,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub page: Option<u32>,

    /// Groups per page (defaults to REPORT_DEFAULT_AMOUNT).
    #[arg(long)]
    pub amount: Option<u32>,
}

fn parse_input(raw: &str) -> Result<SubmittedInput, String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <input-id>=<value>, got '{raw}'"))?;
    let input_id = id
        .trim()
        .parse::<Uuid>()
        .map_err(|e| format!("invalid input id '{id}': {e}"))?;
    Ok(SubmittedInput {
        input_id,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_pairs_parse() {
        let parsed = parse_input("0192919b-2501-585f-1492-4f5d22c98267=12").unwrap();
        assert_eq!(parsed.value, "12");
        assert_eq!(parsed.input_id.to_string(), "0192919b-2501-585f-1492-4f5d22c98267");
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(parse_input("12").is_err());
        assert!(parse_input("not-a-uuid=12").is_err());
    }

    #[test]
    fn submit_command_collects_inputs() {
        let args = CliArgs::try_parse_from([
            "algobench",
            "run",
            "--algorithm",
            "0192919b-2501-2fea-a93d-5d5541c4002b",
            "--input",
            "0192919b-2501-585f-1492-4f5d22c98267=5",
        ])
        .unwrap();
        match args.command {
            Command::Run(submit) => {
                assert_eq!(submit.inputs.len(), 1);
                assert!(submit.alias.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn status_filters_parse_case_insensitively() {
        let args =
            CliArgs::try_parse_from(["algobench", "executions", "--status", "done", "--status", "ERROR"])
                .unwrap();
        match args.command {
            Command::Executions(filter) => {
                assert_eq!(filter.statuses, vec![Status::Done, Status::Error]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
