//! Session data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StateError;
use crate::steps::StepTag;

/// Lifecycle status of an intake session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Abandoned => "ABANDONED",
        };
        write!(f, "{s}")
    }
}

/// Conversion outcome recorded on the session.
///
/// Holding all markers in one optional record keeps them all-unset or
/// all-set; [`Session::mark_converted`] sets it exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub converted_at: DateTime<Utc>,
    /// Set when the customer half of the mapping ran.
    pub customer_id: Option<Uuid>,
    /// Set when the quote half of the mapping ran.
    pub quote_id: Option<Uuid>,
}

/// One intake flow, from email capture to completion and conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// The organization-owned template this session was started from.
    pub template_id: Uuid,
    /// Next tagged step the machine will accept. `None` once `REVIEW` is
    /// done and the final submission is awaited.
    pub current_step: Option<StepTag>,
    /// Accumulated form data, merged step by step.
    pub form_data: Value,
    pub status: SessionStatus,
    pub conversion: Option<ConversionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session seeded with the captured email.
    pub fn new(template_id: Uuid, email: String) -> Self {
        let now = Utc::now();
        let mut form_data = Map::new();
        form_data.insert("email".to_string(), Value::String(email));
        Self {
            id: Uuid::new_v4(),
            template_id,
            current_step: Some(StepTag::first()),
            form_data: Value::Object(form_data),
            status: SessionStatus::InProgress,
            conversion: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether all tagged steps are done and only the final submission
    /// remains.
    pub fn is_awaiting_submission(&self) -> bool {
        self.status == SessionStatus::InProgress && self.current_step.is_none()
    }

    /// Shallow-merge validated step data into the top level of the form
    /// tree. A reused key overwrites the earlier value; distinct keys
    /// accumulate.
    pub fn merge_step_data(&mut self, data: &Value) {
        let Some(incoming) = data.as_object() else {
            return;
        };
        if !self.form_data.is_object() {
            self.form_data = Value::Object(Map::new());
        }
        let tree = self
            .form_data
            .as_object_mut()
            .expect("form_data coerced to object above");
        for (key, value) in incoming {
            tree.insert(key.clone(), value.clone());
        }
    }

    /// Record the conversion outcome. Refuses a second call; the marker is
    /// immutable once set.
    pub fn mark_converted(
        &mut self,
        customer_id: Option<Uuid>,
        quote_id: Option<Uuid>,
    ) -> Result<(), StateError> {
        if self.conversion.is_some() {
            return Err(StateError::AlreadyConverted { id: self.id });
        }
        self.conversion = Some(ConversionRecord {
            converted_at: Utc::now(),
            customer_id,
            quote_id,
        });
        self.updated_at = Utc::now();
        Ok(())
    }
}
