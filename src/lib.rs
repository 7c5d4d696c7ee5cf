//! Analytics Agent Backend
//!
//! A request-response glue layer for natural-language questions over
//! uploaded tabular data:
//! - Validates and parses CSV uploads into in-memory tables
//! - Binds one provider-backed analysis agent to one table per request
//! - Classifies provider faults into stable user-facing messages
//! - Serves a fixed JSON contract over HTTP
//!
//! REQUEST FLOW:
//! Received → Validated → Loaded → Sessioned → Answered | Rejected | Failed

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod table;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{classify_fault, FaultClassifier, ProviderFault};
