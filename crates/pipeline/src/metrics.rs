use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Run counters kept by the worker loop, keyed by algorithm name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    /// Runs that reached DONE.
    pub runs_completed: HashMap<String, u64>,
    /// Runs that ended in ERROR at the execution level.
    pub runs_failed: u64,
    /// Average wall-clock run duration.
    pub avg_run_duration: HashMap<String, Duration>,
    /// When each algorithm last finished a run.
    pub last_run: HashMap<String, DateTime<Utc>>,
    /// Messages dropped without running (unparsable or over the attempt limit).
    pub messages_dropped: u64,
}

impl RunMetrics {
    /// Record a run that reached DONE.
    pub fn record_run(&mut self, algorithm: &str, duration: Duration) {
        *self.runs_completed.entry(algorithm.to_string()).or_default() += 1;
        self.last_run.insert(algorithm.to_string(), Utc::now());

        let count = self.runs_completed[algorithm];
        let prev_avg = self
            .avg_run_duration
            .get(algorithm)
            .copied()
            .unwrap_or_default();

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let new_avg = if count == 1 {
            duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };

        self.avg_run_duration.insert(algorithm.to_string(), new_avg);
    }

    /// Record a run that failed before reaching DONE.
    pub fn record_failure(&mut self) {
        self.runs_failed += 1;
    }

    pub fn record_dropped(&mut self) {
        self.messages_dropped += 1;
    }

    pub fn total_runs(&self) -> u64 {
        self.runs_completed.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_single_run() {
        let mut m = RunMetrics::default();
        m.record_run("Factorial", Duration::from_millis(100));

        assert_eq!(m.runs_completed["Factorial"], 1);
        assert!(m.last_run.contains_key("Factorial"));
        assert_eq!(m.runs_failed, 0);
        assert_eq!(m.avg_run_duration["Factorial"], Duration::from_millis(100));
    }

    #[test]
    fn record_multiple_runs_averages() {
        let mut m = RunMetrics::default();
        m.record_run("Dijkstra", Duration::from_millis(100));
        m.record_run("Dijkstra", Duration::from_millis(200));
        m.record_failure();

        assert_eq!(m.runs_completed["Dijkstra"], 2);
        assert_eq!(m.runs_failed, 1);
        let avg = m.avg_run_duration["Dijkstra"].as_millis();
        assert!((140..=160).contains(&avg), "expected ~150ms, got {}ms", avg);
        assert_eq!(m.total_runs(), 2);
    }
}
