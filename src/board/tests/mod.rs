//! Unit tests for the board module.
//!
//! Tests are organised by component, covering the worked scenarios from the
//! board's behaviour contract plus error and edge cases.

mod console_tests;
mod fixtures;
