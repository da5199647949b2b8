//! SessionStateMachine — validates step payloads and advances sessions.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::IntakeConfig;
use crate::error::{Error, Result, StateError};
use crate::form::path;
use crate::session::model::{Session, SessionStatus};
use crate::steps::{
    AntiAutomationGuard, EmailCapture, ProfileKind, StepPayload, StepSchemaRegistry, StepTag,
    Submission,
};
use crate::store::RecordStore;

/// Owns the ordered step sequence: screens payloads, validates them against
/// the step schemas, merges accepted data into the session, and persists the
/// advanced session.
///
/// A rejected transition persists nothing, so the stored session is
/// unchanged.
pub struct SessionStateMachine {
    store: Arc<dyn RecordStore>,
    registry: StepSchemaRegistry,
    guard: AntiAutomationGuard,
}

impl SessionStateMachine {
    pub fn new(store: Arc<dyn RecordStore>, config: &IntakeConfig) -> Self {
        Self {
            store,
            registry: StepSchemaRegistry::new(config),
            guard: AntiAutomationGuard::new(config.timestamp_window),
        }
    }

    /// Create a session from the initial email-capture payload.
    pub async fn begin(&self, template_id: uuid::Uuid, capture: EmailCapture) -> Result<Session> {
        self.guard.check(&capture.website, capture.timestamp)?;
        let email = self.registry.validate_email_capture(&capture)?;

        let session = Session::new(template_id, email);
        self.store.insert_session(&session).await?;
        info!(session_id = %session.id, "intake session created");
        Ok(session)
    }

    /// Accept a tagged step payload and advance the session.
    ///
    /// The payload's tag must match the session's expected next step; no
    /// skipping and no going back. Validated data is shallow-merged into the
    /// form tree before the step pointer advances.
    pub async fn advance(&self, session_id: uuid::Uuid, payload: StepPayload) -> Result<Session> {
        let mut session = self.load(session_id).await?;
        self.ensure_in_progress(&session)?;

        let expected = match session.current_step {
            Some(step) => step,
            None => {
                // All tagged steps done; only the final submission remains.
                return Err(Error::State(StateError::OutOfOrderStep {
                    id: session.id,
                    expected: StepTag::Review,
                    got: payload.step,
                }));
            }
        };
        if payload.step != expected {
            debug!(
                session_id = %session.id,
                expected = %expected,
                got = %payload.step,
                "out-of-order step rejected"
            );
            return Err(Error::State(StateError::OutOfOrderStep {
                id: session.id,
                expected,
                got: payload.step,
            }));
        }

        self.guard.check(&payload.website, payload.client_timestamp)?;
        let validated =
            self.registry
                .validate_step(payload.step, &payload.data, self.profile_kind(&session))?;

        session.merge_step_data(&validated);
        session.current_step = expected.next();
        session.updated_at = chrono::Utc::now();
        self.store.update_session(&session).await?;
        debug!(session_id = %session.id, step = %expected, "step accepted");
        Ok(session)
    }

    /// Accept the final submission and complete the session.
    ///
    /// Both consents must be explicitly true. Only legal once every tagged
    /// step has been accepted.
    pub async fn submit(&self, session_id: uuid::Uuid, submission: Submission) -> Result<Session> {
        let mut session = self.load(session_id).await?;
        self.ensure_in_progress(&session)?;
        if let Some(next) = session.current_step {
            return Err(Error::State(StateError::NotReadyForSubmission {
                id: session.id,
                next,
            }));
        }

        self.registry.validate_submission(&submission)?;

        if let Some(consent) = submission.marketing_consent {
            path::set(
                &mut session.form_data,
                "marketingConsent",
                Value::Bool(consent),
            );
        }
        session.status = SessionStatus::Completed;
        session.updated_at = chrono::Utc::now();
        self.store.update_session(&session).await?;
        info!(session_id = %session.id, "intake session completed");
        Ok(session)
    }

    /// Mark an in-progress session abandoned. Completed sessions cannot be
    /// abandoned.
    pub async fn abandon(&self, session_id: uuid::Uuid) -> Result<Session> {
        let mut session = self.load(session_id).await?;
        self.ensure_in_progress(&session)?;
        session.status = SessionStatus::Abandoned;
        session.updated_at = chrono::Utc::now();
        self.store.update_session(&session).await?;
        Ok(session)
    }

    async fn load(&self, session_id: uuid::Uuid) -> Result<Session> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or(Error::State(StateError::SessionNotFound { id: session_id }))
    }

    fn ensure_in_progress(&self, session: &Session) -> Result<()> {
        match session.status {
            SessionStatus::InProgress => Ok(()),
            SessionStatus::Completed => Err(Error::State(StateError::AlreadyCompleted {
                id: session.id,
            })),
            SessionStatus::Abandoned => Err(Error::State(StateError::NotCompleted {
                id: session.id,
                status: session.status.to_string(),
            })),
        }
    }

    /// The profile shape recorded at the `PROFILE_TYPE` step, if any.
    fn profile_kind(&self, session: &Session) -> Option<ProfileKind> {
        path::get_str(&session.form_data, "profileType").and_then(ProfileKind::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    use crate::error::{AntiAutomationError, ValidationError};
    use crate::store::MemoryStore;

    fn machine(store: Arc<MemoryStore>) -> SessionStateMachine {
        SessionStateMachine::new(store, &IntakeConfig::default())
    }

    fn capture() -> EmailCapture {
        EmailCapture {
            email: "lee@example.com".to_string(),
            website: String::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    fn step(tag: StepTag, data: Value) -> StepPayload {
        StepPayload {
            step: tag,
            data,
            website: String::new(),
            client_timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    fn consent() -> Submission {
        Submission {
            privacy_policy_accepted: true,
            terms_accepted: true,
            marketing_consent: Some(true),
        }
    }

    async fn run_all_steps(machine: &SessionStateMachine, session_id: Uuid) {
        let steps = [
            (StepTag::ProfileType, json!({"profileType": "RESIDENTIAL"})),
            (
                StepTag::ProfileDetails,
                json!({"firstName": "Lee", "lastName": "Chan", "phone": "902-555-0188"}),
            ),
            (StepTag::ServiceCategory, json!({"serviceType": "Plumbing"})),
            (
                StepTag::ServiceDetails,
                json!({"description": "Leaky faucet", "urgency": "HIGH"}),
            ),
            (StepTag::AdditionalInfo, json!({"notes": "side door"})),
            (StepTag::Review, json!({"confirmed": true})),
        ];
        for (tag, data) in steps {
            machine.advance(session_id, step(tag, data)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn full_flow_completes_with_union_of_fields() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());

        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();
        run_all_steps(&machine, session.id).await;

        let session = machine.submit(session.id, consent()).await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);

        let tree = &session.form_data;
        for key in [
            "email",
            "profileType",
            "firstName",
            "lastName",
            "phone",
            "serviceType",
            "description",
            "urgency",
            "notes",
            "confirmed",
            "marketingConsent",
        ] {
            assert!(tree.get(key).is_some(), "{key} missing from form tree");
        }

        // Persisted copy matches.
        let stored = store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn out_of_order_step_rejected_and_state_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        let err = machine
            .advance(session.id, step(StepTag::ServiceCategory, json!({"serviceType": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::OutOfOrderStep { expected: StepTag::ProfileType, .. })
        ));

        let stored = store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_step, Some(StepTag::ProfileType));
        assert!(stored.form_data.get("serviceType").is_none());
    }

    #[tokio::test]
    async fn resubmitting_an_accepted_step_is_out_of_order() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        let payload = step(StepTag::ProfileType, json!({"profileType": "RESIDENTIAL"}));
        machine.advance(session.id, payload.clone()).await.unwrap();
        let err = machine.advance(session.id, payload).await.unwrap_err();
        assert!(matches!(err, Error::State(StateError::OutOfOrderStep { .. })));
    }

    #[tokio::test]
    async fn honeypot_rejects_otherwise_valid_payload() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        let mut payload = step(StepTag::ProfileType, json!({"profileType": "RESIDENTIAL"}));
        payload.website = "https://spam.example".to_string();
        let err = machine.advance(session.id, payload).await.unwrap_err();
        assert!(matches!(
            err,
            Error::AntiAutomation(AntiAutomationError::HoneypotTripped)
        ));

        let stored = store.get_session(session.id).await.unwrap().unwrap();
        assert!(stored.form_data.get("profileType").is_none());
    }

    #[tokio::test]
    async fn stale_timestamp_rejected_distinctly_from_field_validation() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        let mut payload = step(StepTag::ProfileType, json!({"profileType": "RESIDENTIAL"}));
        payload.client_timestamp -= 6 * 60 * 1000;
        let err = machine.advance(session.id, payload).await.unwrap_err();
        assert!(matches!(
            err,
            Error::AntiAutomation(AntiAutomationError::TimestampOutOfWindow)
        ));
    }

    #[tokio::test]
    async fn field_violations_reported_as_validation_failures() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        let err = machine
            .advance(session.id, step(StepTag::ProfileType, json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Fields(_))));
    }

    #[tokio::test]
    async fn submit_before_review_rejected() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        let err = machine.submit(session.id, consent()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::NotReadyForSubmission { next: StepTag::ProfileType, .. })
        ));
    }

    #[tokio::test]
    async fn submit_requires_both_consents() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store.clone());
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();
        run_all_steps(&machine, session.id).await;

        let err = machine
            .submit(
                session.id,
                Submission {
                    privacy_policy_accepted: true,
                    terms_accepted: false,
                    marketing_consent: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let stored = store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::InProgress);
    }

    #[tokio::test]
    async fn completed_session_rejects_further_steps() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();
        run_all_steps(&machine, session.id).await;
        machine.submit(session.id, consent()).await.unwrap();

        let err = machine
            .advance(session.id, step(StepTag::Review, json!({"confirmed": true})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::State(StateError::AlreadyCompleted { .. })));
    }

    #[tokio::test]
    async fn commercial_branch_uses_recorded_profile_type() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();

        machine
            .advance(session.id, step(StepTag::ProfileType, json!({"profileType": "COMMERCIAL"})))
            .await
            .unwrap();

        // Residential-shaped details are now invalid: businessName required.
        let err = machine
            .advance(
                session.id,
                step(
                    StepTag::ProfileDetails,
                    json!({"firstName": "Lee", "lastName": "Chan", "phone": "902-555-0188"}),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        machine
            .advance(
                session.id,
                step(
                    StepTag::ProfileDetails,
                    json!({"businessName": "Acme Plumbing", "phone": "902-555-0188"}),
                ),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn abandon_only_from_in_progress() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let session = machine.begin(Uuid::new_v4(), capture()).await.unwrap();
        run_all_steps(&machine, session.id).await;
        machine.submit(session.id, consent()).await.unwrap();

        let err = machine.abandon(session.id).await.unwrap_err();
        assert!(matches!(err, Error::State(StateError::AlreadyCompleted { .. })));
    }

    #[tokio::test]
    async fn unknown_session_is_a_distinct_failure() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let err = machine
            .advance(Uuid::new_v4(), step(StepTag::ProfileType, json!({"profileType": "RESIDENTIAL"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::State(StateError::SessionNotFound { .. })));
    }

    #[tokio::test]
    async fn disposable_email_blocks_session_creation() {
        let store = Arc::new(MemoryStore::new());
        let machine = machine(store);
        let err = machine
            .begin(
                Uuid::new_v4(),
                EmailCapture {
                    email: "bot@GUERRILLAMAIL.com".to_string(),
                    website: String::new(),
                    timestamp: chrono::Utc::now().timestamp_millis(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
