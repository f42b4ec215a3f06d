//! Audit Layer
//!
//! Append-only decision trail:
//! - Hash-chained records of every question, result and participant outcome
//! - Prefix / time / status filters
//! - JSON and JSON-lines export

pub mod export;
pub mod filter;
pub mod log;
pub mod record;

pub use export::ExportFormat;
pub use filter::AuditFilter;
pub use log::{AuditLog, ChainVerification};
pub use record::AuditRecord;
