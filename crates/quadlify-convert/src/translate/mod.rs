//! Field translators: one pure function per Compose concern.
//!
//! Each translator reads a normalized service field and the project-wide
//! [`crate::variables::Bindings`]; none of them touch shared state.

pub mod environment;
pub mod healthcheck;
pub mod labels;
pub mod networks;
pub mod ports;
pub mod process;
pub mod restart;
pub mod volumes;
