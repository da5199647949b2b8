//! Domain records created by conversion.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Customer tier, decided by the commercial/residential branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerTier {
    Personal,
    Commercial,
}

/// Customer lifecycle status. Converted sessions always produce prospects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Prospect,
    Active,
    Inactive,
}

/// The record backing a customer. Exactly one of a person or a business,
/// never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CustomerParty {
    Person(Uuid),
    Business(Uuid),
}

/// A customer profile created (or reused) by conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Sequence-numbered identifier, `CUST-NNNNNN`.
    pub number: String,
    pub tier: CustomerTier,
    pub status: CustomerStatus,
    pub party: CustomerParty,
    /// Soft-delete marker; deleted customers are invisible to dedup.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A person contact backing a residential customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A business contact backing a commercial customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Quote lifecycle status. Conversion always creates drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Expired,
}

/// A service quote created by conversion.
///
/// Totals are zero at creation; pricing happens elsewhere. The raw form tree
/// is snapshotted verbatim for audit and debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Sequence-numbered identifier, `Q-NNNNNN`.
    pub number: String,
    pub customer_id: Uuid,
    /// Resolved by role at conversion time, never supplied by the caller.
    pub created_by: Uuid,
    pub status: QuoteStatus,
    pub valid_until: DateTime<Utc>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub form_snapshot: Value,
    pub created_at: DateTime<Utc>,
}

/// Organization user role. Quotes are attributed to administrative users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Owner,
    Admin,
    Member,
}

impl UserRole {
    /// Whether this role can own converted quotes.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

/// An organization user, resolved as the quote creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
}

/// An organization-owned intake template: the form sessions are started
/// from, carrying the conversion mapping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    /// Raw conversion settings as persisted; parsed at conversion time.
    pub conversion_settings: Option<Value>,
    /// How many sessions of this template have been converted.
    pub conversion_count: u64,
}

/// Format the Nth customer number for an organization, `CUST-NNNNNN`.
pub fn customer_number(sequence: u64) -> String {
    format!("CUST-{sequence:06}")
}

/// Format the Nth quote number for an organization, `Q-NNNNNN`.
pub fn quote_number(sequence: u64) -> String {
    format!("Q-{sequence:06}")
}
