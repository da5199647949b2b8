//! Error types for the intake core.

use uuid::Uuid;

use crate::steps::StepTag;

/// Top-level error type for the intake core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    AntiAutomation(#[from] AntiAutomationError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Machine-readable reason attached to a single field violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Required,
    InvalidFormat,
    TooLong,
    OutOfRange,
    /// Email domain belongs to a known disposable-email provider.
    DisposableEmail,
    NotAccepted,
}

/// A single violated field constraint.
///
/// Validation collects every violation in a payload, not just the first.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: ViolationCode,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code,
            message: message.into(),
        }
    }
}

/// Field-level schema violations.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{} field constraint(s) violated", .0.len())]
    Fields(Vec<FieldViolation>),
}

impl ValidationError {
    /// The collected violations (empty only for a malformed construction).
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Fields(v) => v,
        }
    }

    /// Whether any violation carries the given code.
    pub fn has_code(&self, code: ViolationCode) -> bool {
        self.violations().iter().any(|v| v.code == code)
    }
}

/// Anti-automation rejections.
///
/// Both variants render the same generic message so a rejection does not
/// reveal which heuristic fired. The concrete reason stays in `Debug` and
/// the debug log.
#[derive(Debug, thiserror::Error)]
pub enum AntiAutomationError {
    #[error("Submission could not be processed")]
    HoneypotTripped,

    #[error("Submission could not be processed")]
    TimestampOutOfWindow,
}

/// Session/state-machine failures, each distinct and user-actionable.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Session {id} not found")]
    SessionNotFound { id: Uuid },

    #[error("Template {id} not found")]
    TemplateNotFound { id: Uuid },

    #[error("Session {session_id} does not belong to organization {organization_id}")]
    OrganizationMismatch {
        session_id: Uuid,
        organization_id: Uuid,
    },

    #[error("Session {id} expected step {expected}, got {got}")]
    OutOfOrderStep {
        id: Uuid,
        expected: StepTag,
        got: StepTag,
    },

    #[error("Session {id} has remaining steps before submission (next: {next})")]
    NotReadyForSubmission { id: Uuid, next: StepTag },

    #[error("Session {id} is already completed")]
    AlreadyCompleted { id: Uuid },

    #[error("Session {id} is not completed (status: {status})")]
    NotCompleted { id: Uuid, status: String },

    #[error("Session {id} is already converted")]
    AlreadyConverted { id: Uuid },
}

/// Record-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures internal to a conversion attempt.
///
/// Caught at the top of `ConversionEngine::convert` and flattened into the
/// returned result's error list; callers never see these as exceptions.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("No email found in form data; customer creation requires one")]
    MissingEmail,

    #[error("No active administrative user available to own the quote")]
    NoQuoteCreator,

    #[error("Malformed conversion settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for the intake core.
pub type Result<T> = std::result::Result<T, Error>;
