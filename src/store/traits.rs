//! `RecordStore` trait — single async interface for all persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::convert::model::{Business, Customer, Person, Quote, Template, User};
use crate::error::StoreError;
use crate::session::model::Session;

/// Backend-agnostic record store covering sessions, templates, and the
/// domain records conversion creates.
///
/// Sequence allocation is atomic per organization: two concurrent calls to
/// `next_customer_sequence` never return the same value.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ── Sessions ────────────────────────────────────────────────────

    /// Insert a new session.
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Get a session by ID.
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Replace a session's stored state.
    async fn update_session(&self, session: &Session) -> Result<(), StoreError>;

    // ── Templates ───────────────────────────────────────────────────

    /// Get an intake template by ID.
    async fn get_template(&self, id: Uuid) -> Result<Option<Template>, StoreError>;

    /// Bump a template's conversion counter.
    async fn increment_template_conversions(&self, id: Uuid) -> Result<(), StoreError>;

    // ── Customers ───────────────────────────────────────────────────

    /// Find a non-soft-deleted customer in the organization whose contact
    /// email matches (case-insensitive).
    async fn find_customer_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, StoreError>;

    /// Allocate the next customer sequence number for the organization.
    async fn next_customer_sequence(&self, organization_id: Uuid) -> Result<u64, StoreError>;

    /// Insert a new person contact.
    async fn insert_person(&self, person: &Person) -> Result<(), StoreError>;

    /// Insert a new business contact.
    async fn insert_business(&self, business: &Business) -> Result<(), StoreError>;

    /// Insert a new customer.
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError>;

    // ── Quotes ──────────────────────────────────────────────────────

    /// Allocate the next quote sequence number for the organization.
    async fn next_quote_sequence(&self, organization_id: Uuid) -> Result<u64, StoreError>;

    /// Insert a new quote.
    async fn insert_quote(&self, quote: &Quote) -> Result<(), StoreError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Find any active user with an administrative role in the
    /// organization, for quote attribution.
    async fn find_quote_creator(&self, organization_id: Uuid) -> Result<Option<User>, StoreError>;
}
