//! # quadlify-compose
//!
//! The Compose side of the conversion.
//!
//! Handles:
//! - **Parser**: loading a Compose document into the canonical model, with
//!   per-service structural validation.
//! - **Lexer**: `${VAR:-default}` interpolation expressions, built on `nom`.
//! - **Model**: one canonical shape per Compose field.
//! - **Graph**: the `depends_on` graph, its direct edges and its cycles.

pub mod graph;
pub mod model;
pub mod normalize;
pub mod parser;

pub use model::{ComposeProject, ComposeService};
pub use parser::lexer::{Fragment, Modifier, Template, VariableRef};
