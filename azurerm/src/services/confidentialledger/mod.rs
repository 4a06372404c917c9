//! Azure Confidential Ledger.

pub mod client;
pub mod parse;

mod ledger_resource;

pub use client::ConfidentialLedgerClient;
pub use ledger_resource::ConfidentialLedgerResource;
