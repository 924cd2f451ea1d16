use std::time::Instant;

use tracing::{debug, warn};

use crate::error::AiError;
use crate::job::AiJob;

/// Executor for AI jobs.
///
/// This is intentionally minimal and runtime agnostic: the default `run`
/// executes in-process and records how long the job took.
pub trait AiScheduler: Send + Sync + 'static {
    fn run<J: AiJob>(&self, job: J) -> Result<J::Output, AiError> {
        let kind = job.kind();
        let started = Instant::now();
        let out = job.run();
        let elapsed_us = started.elapsed().as_micros() as u64;

        match &out {
            Ok(_) => debug!(job = kind, elapsed_us, "ai job finished"),
            Err(e) => warn!(job = kind, elapsed_us, error = %e, "ai job failed"),
        }
        out
    }
}

/// Simple synchronous scheduler that runs jobs immediately on the caller's thread.
#[derive(Debug, Default, Copy, Clone)]
pub struct LocalAiScheduler;

impl LocalAiScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl AiScheduler for LocalAiScheduler {}
