//! # quadlify-convert
//!
//! The transformation engine: a Compose tree in, a quadlet project out.
//!
//! Handles:
//! - **Variables**: interpolations and shared host paths hoisted into
//!   `let` bindings.
//! - **Dependencies**: `After=`/`Requires=` from `depends_on`, with cycle
//!   detection.
//! - **Translation**: one function per Compose concern.
//! - **Assembly**: the fixed pipeline tying them together.
//!
//! The engine never performs I/O.

pub mod assemble;
pub mod dependency;
pub mod naming;
pub mod translate;
pub mod variables;

use quadlify_common::config::ConvertOptions;
use quadlify_common::error::Result;
use quadlify_compose::parser;
use serde_yaml::Value;

pub use assemble::Conversion;
pub use naming::{LastSegmentNamer, VariableNamer};

/// Converts a parsed Compose document.
///
/// `options.project_name` is used when the document has no `name`.
///
/// # Errors
///
/// Returns an error if the options are invalid, or the document is empty,
/// malformed at the top level, has no services, or no project name.
pub fn convert(document: &Value, options: &ConvertOptions) -> Result<Conversion> {
    convert_with(document, options, &LastSegmentNamer)
}

/// Converts a parsed Compose document, naming hoisted host paths with
/// `namer`.
///
/// # Errors
///
/// Same as [`convert`].
pub fn convert_with(
    document: &Value,
    options: &ConvertOptions,
    namer: &dyn VariableNamer,
) -> Result<Conversion> {
    options.validate()?;
    let loaded = parser::load_value(document, options.project_name.as_deref())?;
    Ok(assemble::assemble(loaded, options, namer))
}

/// Converts Compose YAML text.
///
/// # Errors
///
/// Same as [`convert`], plus YAML syntax errors.
pub fn convert_str(input: &str, options: &ConvertOptions) -> Result<Conversion> {
    let document: Value = serde_yaml::from_str(input)?;
    convert(&document, options)
}
