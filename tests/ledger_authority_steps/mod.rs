//! Step definitions for ledger authority scenarios.

mod given;
mod then;
mod when;
pub mod world;
