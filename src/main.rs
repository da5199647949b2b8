use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use intake_flow::config::IntakeConfig;
use intake_flow::convert::{ConversionEngine, Template, User, UserRole};
use intake_flow::session::SessionStateMachine;
use intake_flow::steps::{EmailCapture, StepPayload, StepTag, Submission};
use intake_flow::store::{MemoryStore, RecordStore};

/// Demo: drive one residential intake flow end to end against the in-memory
/// store, then convert it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    eprintln!("📋 Intake Flow v{}", env!("CARGO_PKG_VERSION"));

    let config = IntakeConfig::default();
    let store = Arc::new(MemoryStore::new());
    let organization_id = Uuid::new_v4();

    // Seed what the external system would own: a template with both mapping
    // tables enabled, and an admin to attribute quotes to.
    let template = Template {
        id: Uuid::new_v4(),
        organization_id,
        name: "service-request".to_string(),
        conversion_settings: Some(json!({
            "customerMapping": {},
            "quoteMapping": {}
        })),
        conversion_count: 0,
    };
    let template_id = template.id;
    store.add_template(template).await;
    store
        .add_user(User {
            id: Uuid::new_v4(),
            organization_id,
            email: "dispatch@example.com".to_string(),
            role: UserRole::Admin,
            active: true,
        })
        .await;

    let machine = SessionStateMachine::new(store.clone(), &config);
    let engine = ConversionEngine::new(store.clone(), &config);

    let now_ms = || chrono::Utc::now().timestamp_millis();
    let session = machine
        .begin(
            template_id,
            EmailCapture {
                email: "lee.chan@example.com".to_string(),
                website: String::new(),
                timestamp: now_ms(),
            },
        )
        .await?;
    eprintln!("   Session {} created", session.id);

    let steps = [
        (StepTag::ProfileType, json!({"profileType": "RESIDENTIAL"})),
        (
            StepTag::ProfileDetails,
            json!({
                "firstName": "Lee",
                "lastName": "Chan",
                "phone": "(902) 555-0188",
                "postalCode": "b3h 4r2"
            }),
        ),
        (StepTag::ServiceCategory, json!({"serviceType": "Plumbing"})),
        (
            StepTag::ServiceDetails,
            json!({
                "description": "Burst pipe in the basement",
                "urgency": "EMERGENCY",
                "estimatedBudget": 800
            }),
        ),
        (StepTag::AdditionalInfo, json!({"notes": "Use the side door"})),
        (StepTag::Review, json!({"confirmed": true})),
    ];
    for (step, data) in steps {
        machine
            .advance(
                session.id,
                StepPayload {
                    step,
                    data,
                    website: String::new(),
                    client_timestamp: now_ms(),
                },
            )
            .await?;
        eprintln!("   Step {step} accepted");
    }

    machine
        .submit(
            session.id,
            Submission {
                privacy_policy_accepted: true,
                terms_accepted: true,
                marketing_consent: Some(false),
            },
        )
        .await?;
    eprintln!("   Session completed");

    let result = engine.convert(organization_id, session.id).await?;
    eprintln!(
        "   Converted: customer {:?}, quote {:?}",
        result.customer_id, result.quote_id
    );

    if let Some(id) = result.customer_id {
        if let Some(customer) = store.get_customer(id).await {
            eprintln!("   {} ({:?}, {:?})", customer.number, customer.tier, customer.status);
        }
    }
    if let Some(id) = result.quote_id {
        if let Some(quote) = store.get_quote(id).await {
            eprintln!("   {} — {}", quote.number, quote.description);
        }
    }

    // Second convert returns the same identifiers without new records.
    let again = engine.convert(organization_id, session.id).await?;
    assert_eq!(again.customer_id, result.customer_id);
    eprintln!("   Re-convert returned cached ids (idempotent)");

    // Keep the demo honest about store state.
    let stored = store
        .get_session(session.id)
        .await?
        .expect("session persisted");
    eprintln!("   Session status: {}", stored.status);
    Ok(())
}
