use crate::error::AiError;

/// A self-contained AI inference unit.
///
/// Jobs own an immutable input snapshot provided by the caller (API/services).
/// Running a job must not mutate shared state, so the same job can be run
/// repeatedly or from several threads and give the same answer.
pub trait AiJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    /// Stable job kind used in logs (e.g. `inventory.redistribution`).
    fn kind(&self) -> &'static str;

    /// The input snapshot the job will run on.
    fn input(&self) -> &Self::Input;

    /// Execute the job.
    fn run(&self) -> Result<Self::Output, AiError>;
}
