use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::warn;

use super::{format_decimal, EvaluationContext, Evaluator, Measurement, MEMORY_CONSUME};
use crate::algorithms::Algorithm;
use crate::error::EvaluationError;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Peak resident memory of this process while the algorithm runs.
pub struct MemoryConsume {
    interval: Duration,
}

impl MemoryConsume {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for MemoryConsume {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Evaluator for MemoryConsume {
    fn name(&self) -> &str {
        MEMORY_CONSUME
    }

    fn evaluate(
        &self,
        algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError> {
        let sampler = MemorySampler::start(self.interval)?;
        let outcome = algorithm.run(ctx.params);
        let peak = sampler.finish()?;
        outcome?;
        Ok(Measurement::new(
            format_decimal(peak as f64 / BYTES_PER_MIB),
            Some("MiB"),
        ))
    }
}

fn resident_bytes(sys: &mut System, pid: Pid) -> Option<u64> {
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|p| p.memory())
}

/// Background thread polling this process's resident set size.
struct MemorySampler {
    stop: Arc<AtomicBool>,
    peak: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
    pid: Pid,
}

impl MemorySampler {
    fn start(interval: Duration) -> Result<Self, EvaluationError> {
        let pid = sysinfo::get_current_pid().map_err(|e| EvaluationError::Sampler(e.to_string()))?;
        let mut sys = System::new();
        let baseline = resident_bytes(&mut sys, pid)
            .ok_or_else(|| EvaluationError::Sampler(format!("process {pid} not visible")))?;

        let stop = Arc::new(AtomicBool::new(false));
        let peak = Arc::new(AtomicU64::new(baseline));

        let handle = {
            let stop = Arc::clone(&stop);
            let peak = Arc::clone(&peak);
            thread::Builder::new()
                .name("memory-sampler".into())
                .spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        if let Some(bytes) = resident_bytes(&mut sys, pid) {
                            peak.fetch_max(bytes, Ordering::AcqRel);
                        }
                        thread::sleep(interval);
                    }
                })
                .map_err(|e| EvaluationError::Sampler(e.to_string()))?
        };

        Ok(Self {
            stop,
            peak,
            handle: Some(handle),
            pid,
        })
    }

    /// Stop sampling and return the peak in bytes, including a final reading.
    fn finish(mut self) -> Result<u64, EvaluationError> {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| EvaluationError::Sampler("sampler thread panicked".into()))?;
        }
        let mut sys = System::new();
        if let Some(bytes) = resident_bytes(&mut sys, self.pid) {
            self.peak.fetch_max(bytes, Ordering::AcqRel);
        }
        Ok(self.peak.load(Ordering::Acquire))
    }
}

impl Drop for MemorySampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("memory sampler thread panicked");
            }
        }
    }
}
