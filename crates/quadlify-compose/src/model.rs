//! Canonical Compose model.
//!
//! Every field has exactly one shape here, whatever form the document used.
//! The model is built once by [`crate::parser`] and never mutated afterwards.

use indexmap::IndexMap;
use quadlify_common::diagnostic::Advisory;

use crate::parser::lexer::Template;

/// A loaded Compose project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    /// Project name: the document's `name` or the supplied fallback.
    pub name: String,
    /// Services that passed structural validation, in document order.
    pub services: IndexMap<String, ComposeService>,
    /// Top-level network declarations, in document order.
    pub networks: IndexMap<String, NetworkSpec>,
    /// Top-level named volume declarations.
    pub volumes: Vec<String>,
    /// Services excluded by a structural problem, in document order.
    pub rejected: Vec<String>,
}

/// One normalized service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeService {
    /// Service name.
    pub name: String,
    /// Image reference.
    pub image: Template,
    /// Published ports.
    pub ports: Vec<PortSpec>,
    /// Volume mounts.
    pub volumes: Vec<VolumeSpec>,
    /// Inline environment; `None` values inherit from the host.
    pub environment: IndexMap<String, Option<Template>>,
    /// Environment file paths.
    pub env_files: Vec<String>,
    /// Dependencies in declaration order.
    pub depends_on: Vec<Dependency>,
    /// Health check, when declared.
    pub healthcheck: Option<HealthCheckSpec>,
    /// Networks; `None` when the service does not list any.
    pub networks: Option<Vec<String>>,
    /// Labels in declaration order.
    pub labels: IndexMap<String, Template>,
    /// Restart policy string.
    pub restart: Option<String>,
    /// Command override.
    pub command: Option<CommandSpec>,
    /// Entrypoint override.
    pub entrypoint: Option<CommandSpec>,
    /// User to run as.
    pub user: Option<Template>,
    /// Working directory.
    pub working_dir: Option<Template>,
    /// Parts of the definition that are not converted.
    pub advisories: Vec<Advisory>,
}

/// A published port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Host address to bind, if given.
    pub host_ip: Option<Template>,
    /// Host port or range; `None` lets the runtime pick one.
    pub published: Option<Template>,
    /// Container port or range.
    pub target: Template,
    /// Protocol suffix (`tcp`, `udp`).
    pub protocol: Option<String>,
}

/// A volume mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSpec {
    /// A host path mounted into the container.
    Bind {
        /// Host path, possibly interpolated.
        source: Template,
        /// Container path.
        target: Template,
        /// Mount options (`ro`, `z`, ...).
        options: Vec<String>,
    },
    /// A named volume.
    Named {
        /// Volume name.
        name: String,
        /// Container path.
        target: Template,
        /// Mount options.
        options: Vec<String>,
    },
    /// An anonymous volume: a container path only.
    Anonymous {
        /// Container path.
        target: Template,
    },
}

/// A `depends_on` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Service depended upon.
    pub service: String,
    /// Condition from the long syntax, kept as metadata.
    pub condition: Option<String>,
}

/// A health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSpec {
    /// What the check runs.
    pub test: HealthTest,
    /// Interval between checks.
    pub interval: Option<String>,
    /// Timeout of one check.
    pub timeout: Option<String>,
    /// Failures before unhealthy.
    pub retries: Option<u32>,
    /// Grace period after start.
    pub start_period: Option<String>,
}

/// The command of a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthTest {
    /// No test given: the image's own check applies.
    Inherit,
    /// `["NONE"]` or `disable: true`.
    Disabled,
    /// A shell command line.
    Shell(Template),
    /// An argument vector.
    Exec(Vec<Template>),
}

/// A command or entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Shell form.
    Shell(Template),
    /// Exec form.
    Exec(Vec<Template>),
}

/// A top-level network declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Declared driver.
    pub driver: Option<String>,
    /// Created outside the project.
    pub external: bool,
    /// Actual network name, if different from the key.
    pub name: Option<String>,
}

impl ComposeProject {
    /// Returns true if `name` is a service, converted or rejected.
    #[must_use]
    pub fn defines(&self, name: &str) -> bool {
        self.services.contains_key(name) || self.rejected.iter().any(|r| r == name)
    }
}

impl VolumeSpec {
    /// Returns the container path.
    #[must_use]
    pub const fn target(&self) -> &Template {
        match self {
            Self::Bind { target, .. } | Self::Named { target, .. } | Self::Anonymous { target } => {
                target
            }
        }
    }
}
