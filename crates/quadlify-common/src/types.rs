//! Domain primitive types used across the quadlify workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::UNIT_SUFFIX;

/// Name of the systemd unit generated for a container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitName(String);

impl UnitName {
    /// Returns the unit name quadlet generates for a container.
    #[must_use]
    pub fn for_container(container: &str) -> Self {
        Self(format!("{container}{UNIT_SUFFIX}"))
    }

    /// Returns the container the unit was generated for.
    #[must_use]
    pub fn container(&self) -> &str {
        self.0.strip_suffix(UNIT_SUFFIX).unwrap_or(&self.0)
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
