//! PostgreSQL implementation of [`BenchStore`].
//!
//! Enum-like columns (`status`, `input_type`) are stored as text and parsed
//! back through the core model types. Migrations live in the workspace
//! `migrations/` directory and run on connect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use algobench_core::config::PostgresConfig;
use algobench_core::{
    Algorithm, AlgorithmDetail, AlgorithmId, Criteria, CriteriaId, Execution, ExecutionId, Input,
    InputType, Page, Payload, PayloadWithInput, ResultId, ResultRecord, Status,
};

use crate::error::StoreError;
use crate::store::{
    day_bounds, BenchStore, ExecutionFilter, PageRequest, ReportGroup, ReportQuery,
};

// ── Row types ────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct AlgorithmRow {
    algorithm_id: Uuid,
    name: String,
    description: Option<String>,
    source: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AlgorithmRow> for Algorithm {
    fn from(r: AlgorithmRow) -> Self {
        Algorithm {
            algorithm_id: r.algorithm_id,
            name: r.name,
            description: r.description,
            source: r.source,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InputRow {
    input_id: Uuid,
    algorithm_id: Uuid,
    name: String,
    input_type: String,
    description: Option<String>,
    enabled: bool,
}

impl From<InputRow> for Input {
    fn from(r: InputRow) -> Self {
        Input {
            input_id: r.input_id,
            algorithm_id: r.algorithm_id,
            name: r.name,
            input_type: InputType::parse(&r.input_type),
            description: r.description,
            enabled: r.enabled,
        }
    }
}

#[derive(Debug, FromRow)]
struct CriteriaRow {
    criteria_id: Uuid,
    name: String,
    description: Option<String>,
    enabled: bool,
}

impl From<CriteriaRow> for Criteria {
    fn from(r: CriteriaRow) -> Self {
        Criteria {
            criteria_id: r.criteria_id,
            name: r.name,
            description: r.description,
            enabled: r.enabled,
        }
    }
}

#[derive(Debug, FromRow)]
struct ExecutionRow {
    execution_id: Uuid,
    algorithm_id: Uuid,
    alias: Option<String>,
    status: String,
    message: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExecutionRow> for Execution {
    type Error = StoreError;

    fn try_from(r: ExecutionRow) -> Result<Self, Self::Error> {
        Ok(Execution {
            execution_id: r.execution_id,
            algorithm_id: r.algorithm_id,
            alias: r.alias,
            status: r.status.parse::<Status>()?,
            message: r.message,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PayloadInputRow {
    payload_id: Uuid,
    execution_id: Uuid,
    input_id: Uuid,
    input_value: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    algorithm_id: Uuid,
    name: String,
    input_type: String,
    description: Option<String>,
    input_enabled: bool,
}

impl From<PayloadInputRow> for PayloadWithInput {
    fn from(r: PayloadInputRow) -> Self {
        PayloadWithInput {
            payload: Payload {
                payload_id: r.payload_id,
                execution_id: r.execution_id,
                input_id: r.input_id,
                input_value: r.input_value,
                enabled: r.enabled,
                created_at: r.created_at,
            },
            input: Input {
                input_id: r.input_id,
                algorithm_id: r.algorithm_id,
                name: r.name,
                input_type: InputType::parse(&r.input_type),
                description: r.description,
                enabled: r.input_enabled,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct ResultRow {
    result_id: Uuid,
    execution_id: Uuid,
    criteria_id: Uuid,
    value: Option<String>,
    unit: Option<String>,
    status: String,
    message: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for ResultRecord {
    type Error = StoreError;

    fn try_from(r: ResultRow) -> Result<Self, Self::Error> {
        Ok(ResultRecord {
            result_id: r.result_id,
            execution_id: r.execution_id,
            criteria_id: r.criteria_id,
            value: r.value,
            unit: r.unit,
            status: r.status.parse::<Status>()?,
            message: r.message,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReportGroupRow {
    input: f64,
    average: f64,
    unit: Option<String>,
}

const ALGORITHM_COLUMNS: &str =
    "algorithm_id, name, description, source, enabled, created_at, updated_at";
const EXECUTION_COLUMNS: &str =
    "e.execution_id, e.algorithm_id, e.alias, e.status, e.message, e.enabled, e.created_at, e.updated_at";
const RESULT_COLUMNS: &str =
    "result_id, execution_id, criteria_id, value, unit, status, message, enabled, created_at, updated_at";

// ── Store ────────────────────────────────────────────────────────────

/// Postgres-backed store. Cheap to clone; the pool is shared.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply pending migrations.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url())
            .await?;
        info!(host = %config.host, database = %config.database, "PostgreSQL connected");

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database migrations applied successfully");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn inputs_of(&self, id: AlgorithmId) -> Result<Vec<Input>, StoreError> {
        let rows = sqlx::query_as::<_, InputRow>(
            "SELECT input_id, algorithm_id, name, input_type, description, enabled
             FROM inputs
             WHERE algorithm_id = $1 AND enabled
             ORDER BY name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Input::from).collect())
    }

    async fn detail(&self, row: AlgorithmRow) -> Result<AlgorithmDetail, StoreError> {
        let inputs = self.inputs_of(row.algorithm_id).await?;
        let criteria = self.criteria_for_algorithm(row.algorithm_id).await?;
        Ok(AlgorithmDetail {
            algorithm: row.into(),
            inputs,
            criteria,
        })
    }
}

fn push_execution_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ExecutionFilter) {
    qb.push(" WHERE e.enabled AND a.enabled");
    if !filter.execution_ids.is_empty() {
        qb.push(" AND e.execution_id = ANY(")
            .push_bind(filter.execution_ids.clone())
            .push(")");
    }
    if !filter.algorithm_ids.is_empty() {
        qb.push(" AND e.algorithm_id = ANY(")
            .push_bind(filter.algorithm_ids.clone())
            .push(")");
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        qb.push(" AND e.status = ANY(").push_bind(statuses).push(")");
    }
    push_alias_and_day(qb, filter.alias.as_deref(), filter.request_date);
}

fn push_alias_and_day(
    qb: &mut QueryBuilder<'_, Postgres>,
    alias: Option<&str>,
    day: Option<chrono::NaiveDate>,
) {
    if let Some(alias) = alias.map(str::trim).filter(|a| !a.is_empty()) {
        qb.push(" AND lower(e.alias) LIKE ")
            .push_bind(format!("%{}%", alias.to_lowercase()));
    }
    if let Some(day) = day {
        let (start, end) = day_bounds(day);
        qb.push(" AND e.created_at >= ")
            .push_bind(start)
            .push(" AND e.created_at < ")
            .push_bind(end);
    }
}

/// Plain decimal numbers only; anything else (including `NaN`) is not cast.
const NUMERIC_PATTERN: &str = r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]{1,2})?\s*$";

/// `WITH readings AS (...)`: DONE results for the report, with input and
/// value cast to double precision (NULL when not numeric).
fn push_readings(qb: &mut QueryBuilder<'_, Postgres>, query: &ReportQuery) {
    qb.push(
        "WITH readings AS (
            SELECT CASE WHEN p.input_value ~ ",
    )
    .push_bind(NUMERIC_PATTERN)
    .push(
        " THEN CAST(p.input_value AS DOUBLE PRECISION) + 0.0 END AS input,
                   CASE WHEN r.value ~ ",
    )
    .push_bind(NUMERIC_PATTERN)
    .push(
        " THEN CAST(r.value AS DOUBLE PRECISION) END AS value,
                   r.unit
            FROM results r
            JOIN executions e ON e.execution_id = r.execution_id
            JOIN payloads p ON p.execution_id = e.execution_id AND p.enabled
            WHERE r.enabled AND e.enabled AND r.status = ",
    )
    .push_bind(Status::Done.as_str())
    .push(" AND r.criteria_id = ")
    .push_bind(query.criteria_id)
    .push(" AND e.algorithm_id = ")
    .push_bind(query.algorithm_id)
    .push(" AND p.input_id = ")
    .push_bind(query.input_id);
    push_alias_and_day(qb, query.alias.as_deref(), query.request_date);
    qb.push(")");
}

#[async_trait]
impl BenchStore for PgStore {
    async fn list_algorithms(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AlgorithmDetail>, StoreError> {
        let pattern = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| format!("%{}%", n.to_lowercase()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM algorithms
             WHERE enabled AND ($1::text IS NULL OR lower(name) LIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, AlgorithmRow>(&format!(
            "SELECT {ALGORITHM_COLUMNS} FROM algorithms
             WHERE enabled AND ($1::text IS NULL OR lower(name) LIKE $1)
             ORDER BY created_at DESC, algorithm_id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(page.amount as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.detail(row).await?);
        }
        Ok(Page {
            total_items: total.max(0) as u64,
            items,
        })
    }

    async fn load_algorithm(&self, id: AlgorithmId) -> Result<Option<AlgorithmDetail>, StoreError> {
        let row = sqlx::query_as::<_, AlgorithmRow>(&format!(
            "SELECT {ALGORITHM_COLUMNS} FROM algorithms WHERE algorithm_id = $1 AND enabled"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.detail(row).await?)),
            None => Ok(None),
        }
    }

    async fn criteria_for_algorithm(&self, id: AlgorithmId) -> Result<Vec<Criteria>, StoreError> {
        let rows = sqlx::query_as::<_, CriteriaRow>(
            "SELECT c.criteria_id, c.name, c.description, c.enabled
             FROM criteria c
             JOIN algorithm_criteria ac ON ac.criteria_id = c.criteria_id
             WHERE ac.algorithm_id = $1 AND ac.enabled AND c.enabled
             ORDER BY c.criteria_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Criteria::from).collect())
    }

    async fn load_criteria(&self, id: CriteriaId) -> Result<Option<Criteria>, StoreError> {
        let row = sqlx::query_as::<_, CriteriaRow>(
            "SELECT criteria_id, name, description, enabled
             FROM criteria WHERE criteria_id = $1 AND enabled",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Criteria::from))
    }

    async fn create_execution(
        &self,
        execution: &Execution,
        payload: &[Payload],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO executions
                (execution_id, algorithm_id, alias, status, message, enabled, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(execution.execution_id)
        .bind(execution.algorithm_id)
        .bind(&execution.alias)
        .bind(execution.status.as_str())
        .bind(&execution.message)
        .bind(execution.enabled)
        .bind(execution.created_at)
        .bind(execution.updated_at)
        .execute(&mut *tx)
        .await?;

        for row in payload {
            sqlx::query(
                "INSERT INTO payloads
                    (payload_id, execution_id, input_id, input_value, enabled, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(row.payload_id)
            .bind(row.execution_id)
            .bind(row.input_id)
            .bind(&row.input_value)
            .bind(row.enabled)
            .bind(row.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(execution_id = %execution.execution_id, payload = payload.len(), "Execution stored");
        Ok(())
    }

    async fn load_execution(&self, id: ExecutionId) -> Result<Option<Execution>, StoreError> {
        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            "SELECT {EXECUTION_COLUMNS} FROM executions e
             WHERE e.execution_id = $1 AND e.enabled"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Execution::try_from).transpose()
    }

    async fn save_execution(&self, execution: &Execution) -> Result<(), StoreError> {
        let done = sqlx::query(
            "UPDATE executions
             SET status = $2, message = $3, enabled = $4, updated_at = $5
             WHERE execution_id = $1",
        )
        .bind(execution.execution_id)
        .bind(execution.status.as_str())
        .bind(&execution.message)
        .bind(execution.enabled)
        .bind(execution.updated_at)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::not_found("Execution", execution.execution_id));
        }
        Ok(())
    }

    async fn list_executions(
        &self,
        filter: &ExecutionFilter,
        page: PageRequest,
    ) -> Result<Page<Execution>, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM executions e JOIN algorithms a ON a.algorithm_id = e.algorithm_id",
        );
        push_execution_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EXECUTION_COLUMNS} FROM executions e JOIN algorithms a ON a.algorithm_id = e.algorithm_id"
        ));
        push_execution_filters(&mut select, filter);
        select
            .push(" ORDER BY e.created_at DESC, e.execution_id DESC LIMIT ")
            .push_bind(page.amount as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows: Vec<ExecutionRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Execution::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            total_items: total.max(0) as u64,
            items,
        })
    }

    async fn load_payload(&self, id: ExecutionId) -> Result<Vec<PayloadWithInput>, StoreError> {
        let rows = sqlx::query_as::<_, PayloadInputRow>(
            "SELECT p.payload_id, p.execution_id, p.input_id, p.input_value, p.enabled, p.created_at,
                    i.algorithm_id, i.name, i.input_type, i.description, i.enabled AS input_enabled
             FROM payloads p
             JOIN inputs i ON i.input_id = p.input_id
             WHERE p.execution_id = $1 AND p.enabled
             ORDER BY p.created_at, p.payload_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PayloadWithInput::from).collect())
    }

    async fn insert_result(&self, result: &ResultRecord) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO results ({RESULT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(result.result_id)
        .bind(result.execution_id)
        .bind(result.criteria_id)
        .bind(&result.value)
        .bind(&result.unit)
        .bind(result.status.as_str())
        .bind(&result.message)
        .bind(result.enabled)
        .bind(result.created_at)
        .bind(result.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_result(&self, result: &ResultRecord) -> Result<(), StoreError> {
        let done = sqlx::query(
            "UPDATE results
             SET value = $2, unit = $3, status = $4, message = $5, enabled = $6, updated_at = $7
             WHERE result_id = $1",
        )
        .bind(result.result_id)
        .bind(&result.value)
        .bind(&result.unit)
        .bind(result.status.as_str())
        .bind(&result.message)
        .bind(result.enabled)
        .bind(result.updated_at)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::not_found("Result", result.result_id));
        }
        Ok(())
    }

    async fn load_result(&self, id: ResultId) -> Result<Option<ResultRecord>, StoreError> {
        let row = sqlx::query_as::<_, ResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE result_id = $1 AND enabled"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ResultRecord::try_from).transpose()
    }

    async fn list_results(&self, id: ExecutionId) -> Result<Vec<ResultRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results
             WHERE execution_id = $1 AND enabled
             ORDER BY created_at, result_id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ResultRecord::try_from).collect()
    }

    async fn report_groups(
        &self,
        query: &ReportQuery,
        page: PageRequest,
    ) -> Result<Page<ReportGroup>, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("");
        push_readings(&mut count, query);
        count.push(
            " SELECT COUNT(*) FROM (
                SELECT 1 FROM readings
                WHERE input IS NOT NULL AND value IS NOT NULL
                GROUP BY input, unit
             ) g",
        );
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("");
        push_readings(&mut qb, query);
        qb.push(
            " SELECT input, AVG(value) AS average, unit
             FROM readings
             WHERE input IS NOT NULL AND value IS NOT NULL
             GROUP BY input, unit
             ORDER BY input, unit COLLATE \"C\" NULLS FIRST
             LIMIT ",
        )
        .push_bind(i64::from(page.amount))
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);

        let rows: Vec<ReportGroupRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(criteria_id = %query.criteria_id, groups = total, "Report grouped");
        Ok(Page {
            total_items: total.max(0) as u64,
            items: rows
                .into_iter()
                .map(|r| ReportGroup {
                    input: r.input,
                    average: r.average,
                    unit: r.unit,
                })
                .collect(),
        })
    }
}
