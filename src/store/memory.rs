//! In-memory `RecordStore` backend.
//!
//! The storage engine proper is an external collaborator; this backend
//! exists so the state machine and the conversion engine can be exercised
//! without one. Used by the test suites and the demo binary.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::convert::model::{Business, Customer, CustomerParty, Person, Quote, Template, User};
use crate::error::StoreError;
use crate::session::model::Session;
use crate::store::traits::RecordStore;

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, Session>,
    templates: HashMap<Uuid, Template>,
    customers: HashMap<Uuid, Customer>,
    persons: HashMap<Uuid, Person>,
    businesses: HashMap<Uuid, Business>,
    quotes: HashMap<Uuid, Quote>,
    users: Vec<User>,
    customer_sequences: HashMap<Uuid, u64>,
    quote_sequences: HashMap<Uuid, u64>,
}

impl Inner {
    /// Contact email of a customer, resolved through its backing record.
    fn contact_email(&self, customer: &Customer) -> Option<&str> {
        match customer.party {
            CustomerParty::Person(id) => self.persons.get(&id)?.email.as_deref(),
            CustomerParty::Business(id) => self.businesses.get(&id)?.email.as_deref(),
        }
    }
}

/// In-memory record store over a single `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding and inspection helpers (not part of the trait) ──────

    /// Register a template.
    pub async fn add_template(&self, template: Template) {
        self.inner.write().await.templates.insert(template.id, template);
    }

    /// Register a user.
    pub async fn add_user(&self, user: User) {
        self.inner.write().await.users.push(user);
    }

    /// Create a person-backed customer directly, for dedup scenarios.
    /// Returns the customer id.
    pub async fn add_customer_with_person(
        &self,
        organization_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Uuid {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let person = Person {
            id: Uuid::new_v4(),
            organization_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: Some(email.to_lowercase()),
            phone: None,
            created_at: now,
        };
        let sequence = inner
            .customer_sequences
            .entry(organization_id)
            .and_modify(|s| *s += 1)
            .or_insert(1);
        let customer = Customer {
            id: Uuid::new_v4(),
            organization_id,
            number: crate::convert::model::customer_number(*sequence),
            tier: crate::convert::model::CustomerTier::Personal,
            status: crate::convert::model::CustomerStatus::Prospect,
            party: CustomerParty::Person(person.id),
            deleted_at: None,
            created_at: now,
        };
        let id = customer.id;
        inner.persons.insert(person.id, person);
        inner.customers.insert(customer.id, customer);
        id
    }

    /// Soft-delete a customer.
    pub async fn soft_delete_customer(&self, id: Uuid) {
        if let Some(customer) = self.inner.write().await.customers.get_mut(&id) {
            customer.deleted_at = Some(Utc::now());
        }
    }

    pub async fn get_customer(&self, id: Uuid) -> Option<Customer> {
        self.inner.read().await.customers.get(&id).cloned()
    }

    pub async fn get_person(&self, id: Uuid) -> Option<Person> {
        self.inner.read().await.persons.get(&id).cloned()
    }

    pub async fn get_business(&self, id: Uuid) -> Option<Business> {
        self.inner.read().await.businesses.get(&id).cloned()
    }

    pub async fn get_quote(&self, id: Uuid) -> Option<Quote> {
        self.inner.read().await.quotes.get(&id).cloned()
    }

    pub async fn customer_count(&self) -> usize {
        self.inner.read().await.customers.len()
    }

    pub async fn person_count(&self) -> usize {
        self.inner.read().await.persons.len()
    }

    pub async fn quote_count(&self) -> usize {
        self.inner.read().await.quotes.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.contains_key(&session.id) {
            return Err(StoreError::Constraint(format!(
                "session {} already exists",
                session.id
            )));
        }
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.read().await.sessions.get(&id).cloned())
    }

    async fn update_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.sessions.contains_key(&session.id) {
            return Err(StoreError::NotFound {
                entity: "session".to_string(),
                id: session.id.to_string(),
            });
        }
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<Template>, StoreError> {
        Ok(self.inner.read().await.templates.get(&id).cloned())
    }

    async fn increment_template_conversions(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.templates.get_mut(&id) {
            Some(template) => {
                template.conversion_count += 1;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "template".to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn find_customer_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let inner = self.inner.read().await;
        let needle = email.to_lowercase();
        let found = inner
            .customers
            .values()
            .filter(|c| c.organization_id == organization_id && c.deleted_at.is_none())
            .find(|c| {
                inner
                    .contact_email(c)
                    .is_some_and(|e| e.to_lowercase() == needle)
            })
            .cloned();
        Ok(found)
    }

    async fn next_customer_sequence(&self, organization_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let sequence = inner
            .customer_sequences
            .entry(organization_id)
            .and_modify(|s| *s += 1)
            .or_insert(1);
        Ok(*sequence)
    }

    async fn insert_person(&self, person: &Person) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .persons
            .insert(person.id, person.clone());
        Ok(())
    }

    async fn insert_business(&self, business: &Business) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .businesses
            .insert(business.id, business.clone());
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn next_quote_sequence(&self, organization_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let sequence = inner
            .quote_sequences
            .entry(organization_id)
            .and_modify(|s| *s += 1)
            .or_insert(1);
        Ok(*sequence)
    }

    async fn insert_quote(&self, quote: &Quote) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .quotes
            .insert(quote.id, quote.clone());
        Ok(())
    }

    async fn find_quote_creator(&self, organization_id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.organization_id == organization_id && u.active && u.role.is_administrative())
            .cloned())
    }
}
