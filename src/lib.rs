//! Intake Flow — multi-step intake form core.
//!
//! A client submits form data across an ordered sequence of steps; the
//! [`session::SessionStateMachine`] validates and accumulates it into a
//! session, and the [`convert::ConversionEngine`] turns a completed session
//! into a customer profile and a draft service quote.

pub mod config;
pub mod convert;
pub mod error;
pub mod form;
pub mod session;
pub mod steps;
pub mod store;
