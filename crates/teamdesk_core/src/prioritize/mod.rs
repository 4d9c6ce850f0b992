//! Task prioritization pipeline.
//!
//! # Responsibility
//! - Build a prioritization request, call the generation service once, and
//!   validate its answer into typed `PrioritizedTask` values.
//!
//! # Invariants
//! - Stateless between calls; nothing is persisted here.
//! - An empty filtered task set never reaches the generation service.
//! - Logs carry counts and durations only, never task text.

pub mod generation;
pub mod openai;
pub mod request;
pub mod response;

use crate::model::prioritized::PrioritizedTask;
use crate::model::task::Task;
use crate::model::user::User;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub use generation::{parse_http_error, GenerationError, GenerationResult, GenerationService};
pub use openai::OpenAiCompatibleGenerator;
pub use request::{
    response_schema, EmployeeBrief, PrioritizationRequest, PRIORITIZATION_INSTRUCTIONS,
};
pub use response::{validate_payload, validate_response, InvalidResponseError};

pub type PrioritizeResult<T> = Result<T, PrioritizeError>;

/// Failure of one prioritization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrioritizeError {
    Generation(GenerationError),
    InvalidResponse(InvalidResponseError),
}

impl PrioritizeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Generation(_) => "generation_failed",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl Display for PrioritizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation(err) => write!(f, "{err}"),
            Self::InvalidResponse(err) => write!(f, "AI response rejected: {err}"),
        }
    }
}

impl Error for PrioritizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Generation(err) => Some(err),
            Self::InvalidResponse(err) => Some(err),
        }
    }
}

impl From<GenerationError> for PrioritizeError {
    fn from(value: GenerationError) -> Self {
        Self::Generation(value)
    }
}

impl From<InvalidResponseError> for PrioritizeError {
    fn from(value: InvalidResponseError) -> Self {
        Self::InvalidResponse(value)
    }
}

/// Entry point of the prioritization flow.
#[derive(Clone)]
pub struct Prioritizer {
    generator: Arc<dyn GenerationService>,
}

impl Prioritizer {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self { generator }
    }

    /// Suggests new priorities for the open tasks in `tasks`.
    pub async fn prioritize(
        &self,
        tasks: &[Task],
        employees: &[User],
    ) -> PrioritizeResult<Vec<PrioritizedTask>> {
        self.run(PrioritizationRequest::build(tasks, employees)).await
    }

    /// Same as `prioritize`, with an explicit "now" for deadline proximity.
    pub async fn prioritize_at(
        &self,
        tasks: &[Task],
        employees: &[User],
        reference_time: i64,
    ) -> PrioritizeResult<Vec<PrioritizedTask>> {
        self.run(PrioritizationRequest::build(tasks, employees).with_reference_time(reference_time))
            .await
    }

    async fn run(&self, request: PrioritizationRequest) -> PrioritizeResult<Vec<PrioritizedTask>> {
        if request.is_empty() {
            info!("event=prioritize module=prioritize status=skipped reason=no_open_tasks");
            return Ok(Vec::new());
        }

        let started_at = Instant::now();
        info!(
            "event=prioritize module=prioritize status=start provider={} tasks={} employees={}",
            self.generator.name(),
            request.tasks.len(),
            request.employees.len()
        );

        let outcome = match self.generator.generate(&request).await {
            Ok(raw) => validate_response(&raw, &request.tasks).map_err(PrioritizeError::from),
            Err(err) => Err(PrioritizeError::from(err)),
        };

        let duration_ms = started_at.elapsed().as_millis();
        match &outcome {
            Ok(prioritized) => info!(
                "event=prioritize module=prioritize status=ok duration_ms={} returned={}",
                duration_ms,
                prioritized.len()
            ),
            Err(err) => error!(
                "event=prioritize module=prioritize status=error duration_ms={} error_code={}",
                duration_ms,
                err.code()
            ),
        }
        outcome
    }
}
