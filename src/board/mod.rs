//! Ledger-authoritative task board reconciliation.
//!
//! The board renders tasks whose truth lives in an append-only ledger. This
//! module derives display state from ledger records, tracks operator actions
//! until the ledger confirms or rejects them, replaces the task collection
//! wholesale on every refresh, and keeps provisional operator edits only until
//! the ledger becomes authoritative. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Configuration in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
