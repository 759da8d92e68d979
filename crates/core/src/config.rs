use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub postgres: PostgresConfig,
    pub worker: WorkerConfig,
    pub evaluation: EvaluationConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ALGOBENCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ALGOBENCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            postgres: PostgresConfig::from_env_profiled(p),
            worker: WorkerConfig::from_env_profiled(p),
            evaluation: EvaluationConfig::from_env_profiled(p),
            report: ReportConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  postgres:    host={}, db={}, configured={}",
            self.postgres.host,
            self.postgres.database,
            self.postgres.is_configured()
        );
        tracing::info!(
            "  worker:      poll={}ms, batch={}, visibility={}s, max_attempts={}",
            self.worker.poll_interval_ms,
            self.worker.batch_size,
            self.worker.visibility_timeout_secs,
            self.worker.max_attempts
        );
        tracing::info!(
            "  evaluation:  memory_sample={}ms, max_graph_nodes={}",
            self.evaluation.memory_sample_interval_ms,
            self.evaluation.max_graph_nodes
        );
        tracing::info!(
            "  report:      default_amount={}, max_amount={}",
            self.report.default_amount,
            self.report.max_amount
        );
    }

    /// Return a redacted view safe to print (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "postgres": {
                "host": self.postgres.host,
                "port": self.postgres.port,
                "database": self.postgres.database,
                "configured": self.postgres.is_configured(),
            },
            "worker": {
                "poll_interval_ms": self.worker.poll_interval_ms,
                "batch_size": self.worker.batch_size,
                "visibility_timeout_secs": self.worker.visibility_timeout_secs,
                "max_attempts": self.worker.max_attempts,
            },
            "evaluation": {
                "memory_sample_interval_ms": self.evaluation.memory_sample_interval_ms,
                "max_graph_nodes": self.evaluation.max_graph_nodes,
            },
            "report": {
                "default_amount": self.report.default_amount,
                "max_amount": self.report.max_amount,
            },
        })
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full connection URL; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "PG_URL"),
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_parse(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "algobench"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_parse(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.username.is_some()
    }
}

// ── Worker ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Sleep between empty polls.
    pub poll_interval_ms: u64,
    /// Maximum messages claimed per poll.
    pub batch_size: u32,
    /// How long a claimed message stays hidden before another worker may retry it.
    pub visibility_timeout_secs: u64,
    /// Deliveries after which a message is dropped instead of retried.
    pub max_attempts: u32,
}

impl WorkerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            poll_interval_ms: profiled_env_parse(p, "WORKER_POLL_INTERVAL_MS", 500),
            batch_size: profiled_env_parse(p, "WORKER_BATCH_SIZE", 10),
            visibility_timeout_secs: profiled_env_parse(p, "WORKER_VISIBILITY_TIMEOUT_SECS", 300),
            max_attempts: profiled_env_parse(p, "WORKER_MAX_ATTEMPTS", 3),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            batch_size: 10,
            visibility_timeout_secs: 300,
            max_attempts: 3,
        }
    }
}

// ── Evaluation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub memory_sample_interval_ms: u64,
    /// Upper bound on generated graph size; setup rejects larger requests.
    pub max_graph_nodes: usize,
}

impl EvaluationConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            memory_sample_interval_ms: profiled_env_parse(p, "MEMORY_SAMPLE_INTERVAL_MS", 1),
            max_graph_nodes: profiled_env_parse(p, "MAX_GRAPH_NODES", 2000),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            memory_sample_interval_ms: 1,
            max_graph_nodes: 2000,
        }
    }
}

// ── Report ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub default_amount: u32,
    pub max_amount: u32,
}

impl ReportConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            default_amount: profiled_env_parse(p, "REPORT_DEFAULT_AMOUNT", 20),
            max_amount: profiled_env_parse(p, "REPORT_MAX_AMOUNT", 100),
        }
    }

    /// Resolve a requested page size: default when absent, clamped to `1..=max_amount`.
    pub fn amount(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_amount)
            .clamp(1, self.max_amount.max(1))
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_amount: 20,
            max_amount: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiled_key_wins_over_plain_key() {
        env::set_var("ALGOBENCH_TEST_CFG_KEY", "plain");
        env::set_var("STAGING_ALGOBENCH_TEST_CFG_KEY", "staged");
        assert_eq!(
            profiled_env_opt("STAGING", "ALGOBENCH_TEST_CFG_KEY").as_deref(),
            Some("staged")
        );
        assert_eq!(
            profiled_env_opt("", "ALGOBENCH_TEST_CFG_KEY").as_deref(),
            Some("plain")
        );
        assert_eq!(
            profiled_env_opt("OTHER", "ALGOBENCH_TEST_CFG_KEY").as_deref(),
            Some("plain")
        );
    }

    #[test]
    fn unparsable_numbers_fall_back_to_default() {
        env::set_var("ALGOBENCH_TEST_CFG_NUM", "lots");
        assert_eq!(profiled_env_parse("", "ALGOBENCH_TEST_CFG_NUM", 7u32), 7);
    }

    #[test]
    fn database_url_prefers_explicit_url() {
        let mut pg = PostgresConfig {
            url: None,
            host: "db".into(),
            port: 5433,
            database: "bench".into(),
            username: Some("bench".into()),
            password: Some("secret".into()),
            ssl_mode: "disable".into(),
            max_connections: 5,
        };
        assert_eq!(
            pg.database_url(),
            "postgres://bench:secret@db:5433/bench?sslmode=disable"
        );
        pg.url = Some("postgres://elsewhere/x".into());
        assert_eq!(pg.database_url(), "postgres://elsewhere/x");
    }

    #[test]
    fn report_amount_is_clamped() {
        let report = ReportConfig::default();
        assert_eq!(report.amount(None), 20);
        assert_eq!(report.amount(Some(0)), 1);
        assert_eq!(report.amount(Some(500)), 100);
        assert_eq!(report.amount(Some(35)), 35);
    }
}
