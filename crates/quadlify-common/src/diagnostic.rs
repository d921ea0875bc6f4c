//! Problems and advisories collected during a conversion.
//!
//! Neither aborts the conversion. A [`Problem`] means a service was excluded
//! or emitted incomplete; an [`Advisory`] means something was left for the
//! operator to finish by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A per-service conversion problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Service the problem is reported against.
    pub service: String,
    /// Classification of the problem.
    pub kind: ProblemKind,
}

/// Classification of conversion problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProblemKind {
    /// The service definition is malformed; the service is excluded.
    Structural {
        /// What is wrong with the definition.
        message: String,
    },
    /// A `depends_on` entry names a service that is not converted.
    UnresolvedDependency {
        /// The missing dependency.
        dependency: String,
    },
    /// The service is part of a dependency cycle; its ordering is omitted.
    DependencyCycle {
        /// Every service in the cycle, in document order.
        members: Vec<String>,
    },
}

impl Problem {
    /// Creates a structural problem.
    pub fn structural(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            kind: ProblemKind::Structural {
                message: message.into(),
            },
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProblemKind::Structural { message } => {
                write!(f, "service \"{}\" skipped: {message}", self.service)
            }
            ProblemKind::UnresolvedDependency { dependency } => write!(
                f,
                "service \"{}\" depends on undefined service \"{dependency}\"",
                self.service
            ),
            ProblemKind::DependencyCycle { members } => write!(
                f,
                "service \"{}\" is in a dependency cycle: {}",
                self.service,
                members.join(" -> ")
            ),
        }
    }
}

/// A notice that part of a service was not converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Compose field the notice is about.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl Advisory {
    /// Creates an advisory.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates the advisory for a field with no quadlet equivalent.
    pub fn unsupported(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("`{field}` is not converted; migrate it by hand");
        Self { field, message }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_problem_names_service() {
        let problem = Problem::structural("web", "no image");
        assert!(matches!(problem.kind, ProblemKind::Structural { .. }));
        assert_eq!(problem.to_string(), "service \"web\" skipped: no image");
    }

    #[test]
    fn cycle_problem_lists_members() {
        let problem = Problem {
            service: "x".into(),
            kind: ProblemKind::DependencyCycle {
                members: vec!["x".into(), "y".into()],
            },
        };
        assert!(problem.to_string().contains("x -> y"));
    }

    #[test]
    fn unsupported_advisory_names_field() {
        let advisory = Advisory::unsupported("profiles");
        assert_eq!(advisory.field, "profiles");
        assert!(advisory.to_string().starts_with("profiles: `profiles`"));
    }
}
