//! Conversion defaults and naming conventions.

/// Parent directory of synthesized stack paths (`<root>/<project>`).
pub const DEFAULT_STACK_ROOT: &str = "/etc/stacks";

/// Name of the binding that holds the stack path.
pub const STACK_PATH_VARIABLE: &str = "STACK_PATH";

/// Address published ports bind to when the source gives none.
pub const LOOPBACK_BIND_ADDRESS: &str = "127.0.0.1";

/// SELinux relabel option injected on bind mounts (shared label).
pub const SELINUX_SHARED_LABEL: &str = "z";

/// Mount options that suppress SELinux relabel injection.
pub const RELABEL_SUPPRESSING_OPTIONS: &[&str] = &["z", "Z", "ro"];

/// Host path prefixes that are never relabeled.
pub const RELABEL_EXEMPT_PREFIXES: &[&str] = &["/dev", "/proc", "/sys", "/run", "/var/run"];

/// Label key watched by the update monitor.
pub const MONITOR_LABEL_KEY: &str = "wud.tag.include";

/// Tag pattern the update monitor matches against.
pub const MONITOR_LABEL_PATTERN: &str = r"^v\d+\.\d+\.\d+$";

/// Expression template for environment-file secrets; `{name}` is replaced.
pub const ENV_FILE_SECRET_TEMPLATE: &str = "config.sops.secrets.{name}.path";

/// Driver used for generated networks.
pub const DEFAULT_NETWORK_DRIVER: &str = "bridge";

/// Compose's implicit network name.
pub const COMPOSE_DEFAULT_NETWORK: &str = "default";

/// Suffix systemd gives to the unit generated for a container.
pub const UNIT_SUFFIX: &str = ".service";

/// Compose file names tried, in order, when no file is given.
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];
