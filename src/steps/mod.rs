//! Step payloads and their validation.
//!
//! Each stage of the intake flow is a tagged payload sharing a common
//! envelope. The registry owns one validator per tag; the guard screens every
//! payload for automated submissions before any field validation runs.

pub mod guard;
pub mod model;
pub mod schema;

pub use guard::AntiAutomationGuard;
pub use model::{EmailCapture, ProfileKind, StepPayload, StepTag, Submission};
pub use schema::StepSchemaRegistry;
