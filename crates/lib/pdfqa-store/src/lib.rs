//! Document and answer models for pdfqa.
//!
//! This crate defines the records shared by the document store, the answering
//! engine, and the HTTP layer, plus the naming constants they agree on.

pub mod models;
pub mod schema;

pub use models::*;
