//! Raw shapes of a Compose document, as written by users.
//!
//! Fields that Compose accepts in several forms are untagged enums here;
//! [`crate::normalize`] turns each into one canonical shape.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

/// A YAML scalar that Compose accepts in place of a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// `true` / `false`.
    Bool(bool),
    /// An integer such as a port number.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
}

impl Scalar {
    /// Returns the scalar in its string form.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::String(s) => s,
        }
    }
}

/// One entry under `services`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDecl {
    /// Image reference.
    pub image: Option<String>,
    /// Build context (not converted).
    pub build: Option<Value>,
    /// Command override.
    pub command: Option<CommandDecl>,
    /// Entrypoint override.
    pub entrypoint: Option<CommandDecl>,
    /// Inline environment.
    pub environment: Option<EnvironmentDecl>,
    /// Environment files.
    pub env_file: Option<EnvFileDecl>,
    /// Published ports.
    pub ports: Option<Vec<PortDecl>>,
    /// Volume mounts.
    pub volumes: Option<Vec<VolumeDecl>>,
    /// Network memberships.
    pub networks: Option<NetworksDecl>,
    /// Service dependencies.
    pub depends_on: Option<DependsOnDecl>,
    /// Health check.
    pub healthcheck: Option<HealthcheckDecl>,
    /// Container labels.
    pub labels: Option<LabelsDecl>,
    /// Restart policy.
    pub restart: Option<String>,
    /// User to run as.
    pub user: Option<Scalar>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Profiles (not converted).
    pub profiles: Option<Vec<String>>,
    /// Secrets (not converted).
    pub secrets: Option<Value>,
    /// Configs (not converted).
    pub configs: Option<Value>,
    /// Every other key.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Command or entrypoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandDecl {
    /// Shell form: `"npm start"`.
    Shell(String),
    /// Exec form: `["npm", "start"]`.
    Exec(Vec<String>),
}

/// Inline environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentDecl {
    /// `["KEY=value", "KEY"]`.
    List(Vec<String>),
    /// `{ KEY: value }`; a null value inherits from the host.
    Map(IndexMap<String, Option<Scalar>>),
}

/// Environment file references.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvFileDecl {
    /// A single path.
    Single(String),
    /// A list of paths or `{ path, required }` entries.
    Multiple(Vec<EnvFileEntry>),
}

/// One element of an `env_file` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvFileEntry {
    /// A path.
    Path(String),
    /// Long syntax.
    Long {
        /// File path.
        path: String,
    },
}

/// A published port.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortDecl {
    /// `"8080:80/tcp"` or `80`.
    Short(Scalar),
    /// Long syntax.
    Long(PortLong),
}

/// Long port syntax.
#[derive(Debug, Clone, Deserialize)]
pub struct PortLong {
    /// Container port.
    pub target: Scalar,
    /// Host port or range.
    pub published: Option<Scalar>,
    /// Host address to bind.
    pub host_ip: Option<String>,
    /// `tcp` or `udp`.
    pub protocol: Option<String>,
}

/// A volume mount.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VolumeDecl {
    /// `"source:target:mode"`.
    Short(String),
    /// Long syntax.
    Long(VolumeLong),
}

/// Long volume syntax.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeLong {
    /// `bind`, `volume`, `tmpfs`, ...
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Host path or volume name.
    pub source: Option<String>,
    /// Path in the container.
    pub target: String,
    /// Mount read-only.
    pub read_only: Option<bool>,
    /// Bind-specific options.
    pub bind: Option<BindOptions>,
}

/// Bind mount options of the long volume syntax.
#[derive(Debug, Clone, Deserialize)]
pub struct BindOptions {
    /// `z` or `Z`.
    pub selinux: Option<String>,
}

/// Network memberships.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NetworksDecl {
    /// `[front, back]`.
    List(Vec<String>),
    /// `{ front: { aliases: [...] } }`.
    Map(IndexMap<String, Option<Value>>),
}

/// Service dependencies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependsOnDecl {
    /// `[db, cache]`.
    List(Vec<String>),
    /// `{ db: { condition: service_healthy } }`.
    Map(IndexMap<String, Option<DependsOnCondition>>),
}

/// Long `depends_on` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DependsOnCondition {
    /// `service_started`, `service_healthy`, ...
    pub condition: Option<String>,
}

/// Health check.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthcheckDecl {
    /// Test command.
    pub test: Option<HealthTestDecl>,
    /// Interval between checks.
    pub interval: Option<String>,
    /// Timeout of one check.
    pub timeout: Option<String>,
    /// Failures before unhealthy.
    pub retries: Option<u32>,
    /// Grace period after start.
    pub start_period: Option<String>,
    /// Disable the image's check.
    pub disable: Option<bool>,
}

/// Health check test.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HealthTestDecl {
    /// Shell string.
    Shell(String),
    /// `["CMD", ...]`, `["CMD-SHELL", "..."]` or `["NONE"]`.
    List(Vec<String>),
}

/// Labels.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LabelsDecl {
    /// `["key=value"]`.
    List(Vec<String>),
    /// `{ key: value }`.
    Map(IndexMap<String, Option<Scalar>>),
}

/// Top-level network declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkDecl {
    /// Network driver.
    pub driver: Option<String>,
    /// Network created outside the project.
    pub external: Option<ExternalDecl>,
    /// Actual network name, if different from the key.
    pub name: Option<String>,
}

/// The `external` flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExternalDecl {
    /// `external: true`.
    Flag(bool),
    /// Legacy `external: { name: ... }`.
    Named {
        /// External network name.
        name: String,
    },
}
