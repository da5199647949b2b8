//! Intake sessions — one per in-progress or completed flow.
//!
//! The session accumulates validated step data into its form tree and tracks
//! which step is expected next. The state machine is the only writer; a
//! rejected transition leaves the session untouched.

pub mod machine;
pub mod model;

pub use machine::SessionStateMachine;
pub use model::{ConversionRecord, Session, SessionStatus};
