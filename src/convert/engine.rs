//! ConversionEngine — turns a completed session into domain records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IntakeConfig;
use crate::convert::model::{
    Business, Customer, CustomerParty, CustomerStatus, CustomerTier, Person, Quote, QuoteStatus,
    Template, customer_number, quote_number,
};
use crate::convert::settings::{ConversionSettings, lookup, lookup_str};
use crate::error::{ConversionError, Error, Result, StateError};
use crate::form::Transform;
use crate::session::model::{Session, SessionStatus};
use crate::store::RecordStore;

/// Outcome of a conversion attempt.
///
/// Conversion failures land in `errors` with `success: false`; callers never
/// need exception handling to process the outcome.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<Uuid>,
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ConversionResult {
    fn succeeded(customer_id: Option<Uuid>, quote_id: Option<Uuid>) -> Self {
        Self {
            customer_id,
            quote_id,
            success: true,
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<String>) -> Self {
        Self {
            customer_id: None,
            quote_id: None,
            success: false,
            errors,
        }
    }
}

/// Converts completed sessions into a customer profile and a service quote,
/// per the owning template's mapping configuration.
pub struct ConversionEngine {
    store: Arc<dyn RecordStore>,
    quote_validity: chrono::Duration,
}

impl ConversionEngine {
    pub fn new(store: Arc<dyn RecordStore>, config: &IntakeConfig) -> Self {
        Self {
            store,
            quote_validity: chrono::Duration::days(config.quote_validity_days),
        }
    }

    /// Convert a completed session.
    ///
    /// State preconditions surface as errors, checked in order: the session
    /// must exist, its owning template must belong to the calling
    /// organization, and the session must be completed. An already-converted
    /// session short-circuits idempotently with the recorded identifiers.
    /// Failures inside the conversion itself are caught here and returned as
    /// an unsuccessful result with the session untouched, so a retry starts
    /// from scratch.
    pub async fn convert(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> Result<ConversionResult> {
        let mut session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(Error::State(StateError::SessionNotFound { id: session_id }))?;
        let template = self
            .store
            .get_template(session.template_id)
            .await?
            .ok_or(Error::State(StateError::TemplateNotFound {
                id: session.template_id,
            }))?;
        if template.organization_id != organization_id {
            return Err(Error::State(StateError::OrganizationMismatch {
                session_id,
                organization_id,
            }));
        }

        if let Some(record) = &session.conversion {
            debug!(session_id = %session.id, "session already converted; returning recorded ids");
            return Ok(ConversionResult::succeeded(
                record.customer_id,
                record.quote_id,
            ));
        }

        if session.status != SessionStatus::Completed {
            return Err(Error::State(StateError::NotCompleted {
                id: session.id,
                status: session.status.to_string(),
            }));
        }

        match self.run(organization_id, &session, &template).await {
            Ok((customer_id, quote_id)) => {
                session
                    .mark_converted(customer_id, quote_id)
                    .map_err(Error::State)?;
                self.store.update_session(&session).await?;
                self.store
                    .increment_template_conversions(template.id)
                    .await?;
                info!(
                    session_id = %session.id,
                    customer_id = ?customer_id,
                    quote_id = ?quote_id,
                    "session converted"
                );
                Ok(ConversionResult::succeeded(customer_id, quote_id))
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "conversion attempt failed");
                Ok(ConversionResult::failed(vec![e.to_string()]))
            }
        }
    }

    async fn run(
        &self,
        organization_id: Uuid,
        session: &Session,
        template: &Template,
    ) -> std::result::Result<(Option<Uuid>, Option<Uuid>), ConversionError> {
        let settings = ConversionSettings::from_raw(template.conversion_settings.as_ref())?;
        let tree = &session.form_data;

        let customer_id = match &settings.customer_mapping {
            Some(mapping) => Some(
                self.create_or_reuse_customer(organization_id, tree, mapping)
                    .await?,
            ),
            None => None,
        };

        let quote_id = match (&settings.quote_mapping, customer_id) {
            (Some(mapping), Some(customer_id)) => Some(
                self.create_quote(organization_id, tree, mapping, customer_id)
                    .await?,
            ),
            _ => None,
        };

        Ok((customer_id, quote_id))
    }

    /// Extract the mapped contact fields and create a customer, reusing an
    /// existing one when the email already belongs to a non-deleted customer
    /// in the organization.
    async fn create_or_reuse_customer(
        &self,
        organization_id: Uuid,
        tree: &Value,
        mapping: &HashMap<String, String>,
    ) -> std::result::Result<Uuid, ConversionError> {
        let email = match lookup(mapping, tree, "email").map(|v| Transform::Lowercase.apply(v)) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(ConversionError::MissingEmail),
        };

        if let Some(existing) = self
            .store
            .find_customer_by_email(organization_id, &email)
            .await?
        {
            debug!(customer_id = %existing.id, "reusing existing customer for email");
            return Ok(existing.id);
        }

        let first_name = lookup_str(mapping, tree, "firstName");
        let last_name = lookup_str(mapping, tree, "lastName");
        let phone = lookup_str(mapping, tree, "phone").map(str::to_string);
        let business_name = lookup_str(mapping, tree, "businessName");
        let profile_type = lookup_str(mapping, tree, "profileType");

        let commercial = profile_type == Some("COMMERCIAL") || business_name.is_some();
        let now = Utc::now();

        let (party, tier) = if commercial {
            let business = Business {
                id: Uuid::new_v4(),
                organization_id,
                name: business_name.unwrap_or("Unknown").to_string(),
                email: Some(email.clone()),
                phone,
                created_at: now,
            };
            self.store.insert_business(&business).await?;
            (CustomerParty::Business(business.id), CustomerTier::Commercial)
        } else {
            // Partial data still yields a quotable customer; names fall back
            // to placeholders instead of failing.
            let person = Person {
                id: Uuid::new_v4(),
                organization_id,
                first_name: first_name.unwrap_or("Unknown").to_string(),
                last_name: last_name.unwrap_or("Customer").to_string(),
                email: Some(email.clone()),
                phone,
                created_at: now,
            };
            self.store.insert_person(&person).await?;
            (CustomerParty::Person(person.id), CustomerTier::Personal)
        };

        let sequence = self.store.next_customer_sequence(organization_id).await?;
        let customer = Customer {
            id: Uuid::new_v4(),
            organization_id,
            number: customer_number(sequence),
            tier,
            status: CustomerStatus::Prospect,
            party,
            deleted_at: None,
            created_at: now,
        };
        self.store.insert_customer(&customer).await?;
        Ok(customer.id)
    }

    /// Extract the mapped quote fields and create a draft quote attributed
    /// to an active administrative user.
    async fn create_quote(
        &self,
        organization_id: Uuid,
        tree: &Value,
        mapping: &HashMap<String, String>,
        customer_id: Uuid,
    ) -> std::result::Result<Uuid, ConversionError> {
        let service_type = lookup_str(mapping, tree, "serviceType");
        let urgency = lookup_str(mapping, tree, "urgency");
        let description = lookup_str(mapping, tree, "description")
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "{} - {}",
                    service_type.unwrap_or("Service"),
                    urgency.unwrap_or("STANDARD")
                )
            });

        // Coerce whatever the form carried for the budget into display text;
        // the Null sentinel from a failed coercion simply drops the line.
        let budget = lookup(mapping, tree, "estimatedBudget")
            .map(|v| Transform::ToString.apply(v))
            .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
            .filter(|s| !s.is_empty());
        let mut note_lines = Vec::new();
        if let Some(service_type) = service_type {
            note_lines.push(format!("Service type: {service_type}"));
        }
        if let Some(urgency) = urgency {
            note_lines.push(format!("Urgency: {urgency}"));
        }
        if let Some(budget) = budget {
            note_lines.push(format!("Estimated budget: {budget}"));
        }
        let notes = (!note_lines.is_empty()).then(|| note_lines.join("\n"));

        let creator = self
            .store
            .find_quote_creator(organization_id)
            .await?
            .ok_or(ConversionError::NoQuoteCreator)?;

        let now = Utc::now();
        let sequence = self.store.next_quote_sequence(organization_id).await?;
        let quote = Quote {
            id: Uuid::new_v4(),
            organization_id,
            number: quote_number(sequence),
            customer_id,
            created_by: creator.id,
            status: QuoteStatus::Draft,
            valid_until: now + self.quote_validity,
            subtotal: dec!(0),
            tax: dec!(0),
            total: dec!(0),
            description,
            notes,
            form_snapshot: tree.clone(),
            created_at: now,
        };
        self.store.insert_quote(&quote).await?;
        Ok(quote.id)
    }
}
