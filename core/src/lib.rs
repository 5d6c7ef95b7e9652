//! commission-core — the commission distribution & partner-ledger engine.
//!
//! One closed sale, its configuration, and the active bonus rules go in;
//! an auditable, immutable-once-computed set of distribution rows and
//! partner commission records comes out. Payment and collection statuses
//! are the only fields that mutate afterwards.

pub mod calculator;
pub mod config;
pub mod error;
pub mod partner;
pub mod rules;
pub mod sale;
pub mod status;
pub mod store;
pub mod types;
