//! Form data utilities — dot-path access and named value transforms over the
//! open-ended form tree.
//!
//! The accumulated form data is an arbitrarily nested `serde_json::Value`.
//! Everything that walks it goes through [`path`], which treats absence as a
//! first-class outcome rather than an error.

pub mod path;
pub mod transform;

pub use transform::Transform;
