//! Structural checks on the raw document before deserialization.
//!
//! Document-level checks return fatal errors. Service-level checks return a
//! message that the loader records against the service.

use quadlify_common::error::{QuadlifyError, Result};
use serde_yaml::{Mapping, Value};

/// Returns the top-level mapping of the document.
///
/// # Errors
///
/// Returns an error if the document is empty or not a mapping.
pub fn document_root(document: &Value) -> Result<&Mapping> {
    match document {
        Value::Null => Err(QuadlifyError::EmptyDocument),
        Value::Mapping(root) if root.is_empty() => Err(QuadlifyError::EmptyDocument),
        Value::Mapping(root) => Ok(root),
        other => Err(QuadlifyError::InvalidDocument {
            message: format!("top level must be a mapping, got {}", kind(other)),
        }),
    }
}

/// Returns the `services` section.
///
/// # Errors
///
/// Returns an error if the section is missing, not a mapping, or empty.
pub fn services_section(root: &Mapping) -> Result<&Mapping> {
    match root.get("services") {
        Some(Value::Mapping(services)) if !services.is_empty() => Ok(services),
        Some(Value::Mapping(_) | Value::Null) | None => Err(QuadlifyError::InvalidDocument {
            message: "no services defined".into(),
        }),
        Some(other) => Err(QuadlifyError::InvalidDocument {
            message: format!("`services` must be a mapping, got {}", kind(other)),
        }),
    }
}

/// Checks one service definition.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn check_service(name: &str, value: &Value) -> std::result::Result<(), String> {
    check_service_name(name)?;
    let Some(definition) = value.as_mapping() else {
        return Err(format!("definition must be a mapping, got {}", kind(value)));
    };
    match definition.get("image") {
        Some(Value::String(image)) if image.trim().is_empty() => Err("`image` is empty".into()),
        Some(Value::String(_)) => Ok(()),
        Some(other) => Err(format!("`image` must be a string, got {}", kind(other))),
        None if definition.contains_key("build") => {
            Err("no `image`; services built from source cannot be converted".into())
        }
        None => Err("no `image`".into()),
    }
}

fn check_service_name(name: &str) -> std::result::Result<(), String> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(format!("invalid service name \"{name}\""))
    }
}

/// Lower-cases a project name and drops characters a project name may not
/// contain.
#[must_use]
pub fn normalize_project_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .skip_while(|c| !c.is_ascii_alphanumeric())
        .collect()
}

/// Returns a mapping key as a string, if it is a scalar.
#[must_use]
pub fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
