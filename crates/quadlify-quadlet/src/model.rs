//! Target model: what `virtualisation.quadlet` should contain.
//!
//! Built once per conversion and handed to the renderer unchanged.

use indexmap::IndexMap;
use quadlify_common::diagnostic::{Advisory, Problem};
use quadlify_common::types::UnitName;
use serde::Serialize;

use crate::text::Text;

/// A converted project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuadletProject {
    /// Project name.
    pub name: String,
    /// `let` bindings, in declaration order.
    pub variables: VariableTable,
    /// Networks keyed by name.
    pub networks: IndexMap<String, QuadletNetwork>,
    /// Containers keyed by service name, in document order.
    pub containers: IndexMap<String, QuadletContainer>,
}

/// Ordered `let` bindings with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableTable {
    entries: IndexMap<String, Variable>,
}

/// One `let` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    /// Bound value.
    pub value: Text,
    /// Why the binding exists.
    pub origin: VariableOrigin,
}

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariableOrigin {
    /// A `${NAME}` reference in the source.
    Interpolation {
        /// The source gave a default; otherwise the value is a placeholder.
        has_default: bool,
    },
    /// The synthesized per-project stack directory.
    StackPath,
    /// A host path mounted more than once.
    HostPath,
}

/// A network to define or reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuadletNetwork {
    /// Defined by this project.
    Managed {
        /// Network driver.
        driver: String,
    },
    /// Created elsewhere; referenced by name.
    External {
        /// Name of the existing network.
        name: String,
    },
}

/// One container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuadletContainer {
    /// Image reference.
    pub image: Text,
    /// `publishPorts` entries.
    pub publish_ports: Vec<Text>,
    /// `volumes` entries.
    pub volumes: Vec<Text>,
    /// Environment files, as secret expressions.
    pub environment_files: Vec<EnvironmentFile>,
    /// Inline environment.
    pub environments: IndexMap<String, Text>,
    /// Health check, when one is configured.
    pub health: Option<HealthCheck>,
    /// Network keys the container joins.
    pub networks: Vec<String>,
    /// Labels in order.
    pub labels: IndexMap<String, Text>,
    /// `exec` (arguments to the entrypoint).
    pub exec: Option<Text>,
    /// Entrypoint override.
    pub entrypoint: Option<Text>,
    /// User to run as.
    pub user: Option<Text>,
    /// Working directory.
    pub working_dir: Option<Text>,
    /// Restart policy.
    pub restart: Option<RestartPolicy>,
    /// Unit ordering on other containers.
    pub ordering: UnitOrdering,
    /// Parts of the source that were not converted.
    pub advisories: Vec<Advisory>,
    /// Non-fatal problems attached to this container.
    pub problems: Vec<Problem>,
}

/// An environment file backed by a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentFile {
    /// Path the source referenced.
    pub source: String,
    /// Expression evaluating to the secret's path.
    pub secret: String,
}

/// Health check settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    /// Shell command line, or a JSON argument array.
    pub command: Text,
    /// Interval between checks.
    pub interval: Option<String>,
    /// Timeout of one check.
    pub timeout: Option<String>,
    /// Failures before unhealthy.
    pub retries: Option<u32>,
    /// Grace period after start.
    pub start_period: Option<String>,
}

/// Restart policy of the generated service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Restart whatever the exit status.
    Always,
}

/// `After=` and `Requires=` on other container units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitOrdering {
    /// Units to start after.
    pub after: Vec<UnitName>,
    /// Units required.
    pub requires: Vec<UnitName>,
    /// Source `depends_on` conditions, keyed by dependency.
    pub conditions: IndexMap<String, String>,
}

impl VariableTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding unless the name is taken.
    ///
    /// Returns false, leaving the table unchanged, if `name` already exists.
    pub fn insert(&mut self, name: impl Into<String>, variable: Variable) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        let _ = self.entries.insert(name, variable);
        true
    }

    /// Returns a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries.get(name)
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the first binding whose value equals `value`.
    #[must_use]
    pub fn find_by_value(&self, value: &Text) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, variable)| &variable.value == value)
            .map(|(name, _)| name.as_str())
    }

    /// Iterates over bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UnitOrdering {
    /// Returns true if no ordering directive is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.after.is_empty() && self.requires.is_empty()
    }
}
