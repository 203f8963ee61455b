//! Core services for pdfqa.
//!
//! This crate owns the ingestion pipeline for uploaded documents (raw-byte
//! persistence, PDF text extraction, the in-memory record index), the
//! answering engine with its pluggable strategies, and the control plane that
//! ties the two together for the request layer.

pub mod answer;
pub mod control;
pub mod parsers;
pub mod store;
