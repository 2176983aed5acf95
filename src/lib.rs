//! Ledgerboard: reconciliation core for a ledger-backed task board.
//!
//! This crate keeps an operator console consistent with an append-only task
//! ledger. The ledger is the only source of truth; the console derives what it
//! shows from ledger records, confirms operator actions only through ledger
//! events, and never lets stale or provisional state outlive the next
//! authoritative snapshot.
//!
//! # Architecture
//!
//! Ledgerboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for snapshots, events, storage and
//!   notifications
//! - **Adapters**: Concrete implementations of ports (memory, file, channels)
//!
//! # Modules
//!
//! - [`board`]: Derivation, action tracking, reconciliation, overrides and
//!   board placement
//! - [`logging`]: Tracing subscriber setup

pub mod board;
pub mod logging;
