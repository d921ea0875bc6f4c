//! # quadlify-common
//!
//! Shared error types, diagnostics, configuration, and constants used across
//! the quadlify workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives every other crate builds upon.

pub mod config;
pub mod constants;
pub mod diagnostic;
pub mod error;
pub mod types;
