//! Conversion options.
//!
//! Every field has a default from [`crate::constants`]; a YAML file only
//! needs to name the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{QuadlifyError, Result};

/// Options that steer the Compose to quadlet conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Project name used when the document has no `name`.
    pub project_name: Option<String>,
    /// Parent directory of the synthesized stack path.
    pub stack_root: String,
    /// Address published ports bind to when the source gives none.
    pub bind_address: String,
    /// SELinux relabel option appended to bind mounts.
    pub selinux_label: String,
    /// Host path prefixes that are never relabeled.
    pub relabel_exempt_prefixes: Vec<String>,
    /// Update-monitoring label; `None` disables it.
    pub monitor_label: Option<MonitorLabel>,
    /// Expression template for environment-file secrets.
    pub env_file_secret: String,
    /// Driver for generated networks that declare none.
    pub default_network_driver: String,
}

/// The label appended to containers for update monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLabel {
    /// Label key.
    pub key: String,
    /// Tag pattern stored as the label value.
    pub pattern: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            project_name: None,
            stack_root: constants::DEFAULT_STACK_ROOT.into(),
            bind_address: constants::LOOPBACK_BIND_ADDRESS.into(),
            selinux_label: constants::SELINUX_SHARED_LABEL.into(),
            relabel_exempt_prefixes: constants::RELABEL_EXEMPT_PREFIXES
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
            monitor_label: Some(MonitorLabel::default()),
            env_file_secret: constants::ENV_FILE_SECRET_TEMPLATE.into(),
            default_network_driver: constants::DEFAULT_NETWORK_DRIVER.into(),
        }
    }
}

impl Default for MonitorLabel {
    fn default() -> Self {
        Self {
            key: constants::MONITOR_LABEL_KEY.into(),
            pattern: constants::MONITOR_LABEL_PATTERN.into(),
        }
    }
}

impl ConvertOptions {
    /// Loads options from a YAML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// holds an invalid value.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading converter options");
        let content = std::fs::read_to_string(path).map_err(|e| QuadlifyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let options: Self = serde_yaml::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks values that would produce a broken conversion.
    ///
    /// # Errors
    ///
    /// Returns [`QuadlifyError::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !self.stack_root.starts_with('/') {
            return Err(QuadlifyError::Config {
                message: format!("stack_root must be absolute, got \"{}\"", self.stack_root),
            });
        }
        if self.bind_address.is_empty() {
            return Err(QuadlifyError::Config {
                message: "bind_address must not be empty".into(),
            });
        }
        if !self.env_file_secret.contains("{name}") {
            return Err(QuadlifyError::Config {
                message: "env_file_secret must contain a {name} placeholder".into(),
            });
        }
        Ok(())
    }

    /// Returns the stack path for a project: `<stack_root>/<project>`.
    #[must_use]
    pub fn stack_path(&self, project: &str) -> String {
        format!("{}/{project}", self.stack_root.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ConvertOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.bind_address, "127.0.0.1");
        assert_eq!(options.selinux_label, "z");
    }

    #[test]
    fn stack_path_joins_root_and_project() {
        let options = ConvertOptions {
            stack_root: "/srv/stacks/".into(),
            ..ConvertOptions::default()
        };
        assert_eq!(options.stack_path("immich"), "/srv/stacks/immich");
    }

    #[test]
    fn load_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "bind_address: 10.0.0.1\nmonitor_label: null").expect("write");

        let options = ConvertOptions::load(file.path()).expect("should load");
        assert_eq!(options.bind_address, "10.0.0.1");
        assert!(options.monitor_label.is_none());
        assert_eq!(options.stack_root, "/etc/stacks");
    }

    #[test]
    fn load_rejects_relative_stack_root() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "stack_root: stacks").expect("write");

        let err = ConvertOptions::load(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("stack_root"), "got: {msg}");
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = ConvertOptions::load(Path::new("/nonexistent/quadlify.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/quadlify.yaml"));
    }
}
