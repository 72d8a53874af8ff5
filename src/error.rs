use axum::http::StatusCode;
use thiserror::Error;

/// Error taxonomy for orchestrator operations. Every failure is surfaced to
/// the caller; nothing is swallowed or retried here. State-changing
/// operations that fail leave no partial mutation and emit no event.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Malformed or out-of-range input (blank identity fields, bad paging).
    #[error("{0}")]
    Validation(String),

    /// Emergency publish is not allowed in the target environment.
    #[error("{0}")]
    Policy(String),

    /// A referenced release, namespace or branch does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation's prior-state assumption no longer holds, e.g. the
    /// rollback target is already abandoned. The caller may retry with
    /// refreshed state.
    #[error("{0}")]
    Conflict(String),

    /// Repository/storage failure, propagated as-is.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrchestratorError::Validation(_) | OrchestratorError::Policy(_) => {
                StatusCode::BAD_REQUEST
            }
            OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::Conflict(_) => StatusCode::CONFLICT,
            OrchestratorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
