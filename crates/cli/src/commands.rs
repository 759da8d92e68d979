use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use algobench_core::{Config, NewExecution, Status};
use algobench_pipeline::{ReportRequest, RunTask, Worker};
use algobench_storage::{ExecutionFilter, PageRequest};

use crate::app::App;
use crate::cli::{Command, ExecutionArgs, MarkArgs, MarkStatus, ReportArgs, SubmitArgs, WorkerArgs};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_execution(args: SubmitArgs) -> NewExecution {
    NewExecution {
        algorithm_id: args.algorithm,
        alias: args.alias,
        inputs: args.inputs,
    }
}

pub async fn dispatch(app: &App, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Algorithms { name, page } => {
            let algorithms = app
                .orchestrator
                .list_algorithms(name.as_deref(), PageRequest::new(page.page, page.amount))
                .await?;
            print_json(&algorithms)
        }
        Command::Algorithm { id } => print_json(&app.orchestrator.get_algorithm(id).await?),
        Command::Submit(args) => {
            if app.backend == "memory" {
                warn!("In-memory queue: the execution is lost when this process exits");
            }
            let execution = app.orchestrator.submit(new_execution(args)).await?;
            print_json(&execution)
        }
        Command::Run(args) => run_inline(app, args).await,
        Command::Worker(args) => run_worker(app, config, args).await,
        Command::Executions(args) => list_executions(app, args).await,
        Command::Execution { id } => print_json(&app.orchestrator.get_execution(id).await?),
        Command::Disable { id } => {
            app.orchestrator.disable_execution(id).await?;
            print_json(&serde_json::json!({ "execution_id": id, "enabled": false }))
        }
        Command::Mark(args) => mark(app, args).await,
        Command::Report(args) => report(app, args).await,
        Command::Config => print_json(&config.redacted_summary()),
    }
}

/// Create an execution and process it without going through the queue.
async fn run_inline(app: &App, args: SubmitArgs) -> Result<()> {
    let execution = app.orchestrator.create_execution(new_execution(args)).await?;
    if execution.status != Status::Queue {
        // Rejected payload: nothing to run.
        return print_json(&execution);
    }

    let id = execution.execution_id;
    RunTask::new(&app.orchestrator)
        .run(id)
        .await
        .with_context(|| format!("execution {id} failed"))?;
    print_json(&app.orchestrator.get_execution(id).await?)
}

async fn run_worker(app: &App, config: &Config, args: WorkerArgs) -> Result<()> {
    let mut worker_config = config.worker.clone();
    if let Some(ms) = args.poll_interval_ms {
        worker_config.poll_interval_ms = ms;
    }
    if let Some(size) = args.batch_size {
        worker_config.batch_size = size;
    }

    match app.consumer.health_check().await {
        Ok(health) => info!(%health, "Queue reachable"),
        Err(e) => warn!(error = %e, "Queue health check failed"),
    }

    let worker = Worker::new(app.orchestrator.clone(), app.consumer.clone(), worker_config);
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the worker is not stopped by the drop.
                error!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    worker.run(rx).await;
    print_json(&worker.metrics())
}

async fn list_executions(app: &App, args: ExecutionArgs) -> Result<()> {
    let filter = ExecutionFilter {
        execution_ids: args.execution_ids,
        algorithm_ids: args.algorithm_ids,
        statuses: args.statuses,
        alias: args.alias,
        request_date: args.date,
    };
    let page = PageRequest::new(args.page.page, args.page.amount);
    print_json(&app.orchestrator.list_executions(&filter, page).await?)
}

async fn mark(app: &App, args: MarkArgs) -> Result<()> {
    let o = &app.orchestrator;
    match (args.result, args.status) {
        (false, MarkStatus::Warning) => print_json(&o.set_execution_warning(args.id, &args.message).await?),
        (false, MarkStatus::Error) => print_json(&o.set_execution_error(args.id, &args.message).await?),
        (true, MarkStatus::Warning) => print_json(&o.set_result_warning(args.id, &args.message).await?),
        (true, MarkStatus::Error) => print_json(&o.set_result_error(args.id, &args.message).await?),
    }
}

async fn report(app: &App, args: ReportArgs) -> Result<()> {
    let request = ReportRequest {
        algorithm_id: args.algorithm,
        criteria_id: args.criteria,
        input_id: args.input,
        alias: args.alias,
        request_date: args.date,
        page: args.page,
        amount: args.amount,
    };
    print_json(&app.reports.get_report(&request).await?)
}
