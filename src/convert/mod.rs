//! Conversion of completed sessions into durable domain records.
//!
//! A completed session's form tree, combined with the owning template's
//! mapping configuration, produces a customer profile and a service quote.
//! Conversion is idempotent for prior successes and non-throwing at its
//! boundary.

pub mod engine;
pub mod model;
pub mod settings;

pub use engine::{ConversionEngine, ConversionResult};
pub use model::{
    Business, Customer, CustomerParty, CustomerStatus, CustomerTier, Person, Quote, QuoteStatus,
    Template, User, UserRole, customer_number, quote_number,
};
pub use settings::ConversionSettings;
