//! CLI command definitions and dispatch.

pub mod convert;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use quadlify_common::config::ConvertOptions;
use quadlify_common::constants::DEFAULT_COMPOSE_FILES;
use quadlify_convert::Conversion;

/// quadlify — convert Compose files to quadlet-nix modules.
#[derive(Parser, Debug)]
#[command(name = "quadlify", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a Compose file to a quadlet-nix module.
    Convert(convert::ConvertArgs),
    /// Show variables, networks, ordering and problems without rendering.
    Plan(plan::PlanArgs),
}

/// Input selection and conversion settings shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Compose file; defaults to the first of compose.yaml, compose.yml,
    /// docker-compose.yaml, docker-compose.yml in the current directory.
    pub file: Option<PathBuf>,

    /// Project name used when the file has no top-level `name`.
    #[arg(short = 'n', long = "name", env = "QUADLIFY_PROJECT")]
    pub project_name: Option<String>,

    /// YAML file with conversion options.
    #[arg(long, env = "QUADLIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Parent directory of the stack path (`<stack-root>/<project>`).
    #[arg(long)]
    pub stack_root: Option<String>,

    /// Address published ports bind to when the file gives none.
    #[arg(long)]
    pub bind_address: Option<String>,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Convert(args) => convert::execute(args),
        Command::Plan(args) => plan::execute(args),
    }
}

/// Reads the input file and converts it.
///
/// # Errors
///
/// Returns an error if no input file is found, the options are invalid,
/// or the document cannot be converted.
pub fn load(input: &InputArgs) -> anyhow::Result<(PathBuf, Conversion)> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let path = resolve_compose_file(input.file.as_deref(), &cwd)?;
    let options = options(input, &path)?;

    tracing::info!(path = %path.display(), "converting compose file");
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let conversion = quadlify_convert::convert_str(&content, &options)
        .with_context(|| format!("cannot convert {}", path.display()))?;
    Ok((path, conversion))
}

/// Returns `file` if given, else the first default Compose file in `dir`.
///
/// # Errors
///
/// Returns an error if the given file does not exist or no default file is
/// found.
pub fn resolve_compose_file(file: Option<&Path>, dir: &Path) -> anyhow::Result<PathBuf> {
    if let Some(file) = file {
        if !file.exists() {
            anyhow::bail!("file not found: {}", file.display());
        }
        return Ok(file.to_path_buf());
    }
    DEFAULT_COMPOSE_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
        .with_context(|| {
            format!(
                "no compose file given and none of {} found in {}",
                DEFAULT_COMPOSE_FILES.join(", "),
                dir.display()
            )
        })
}

/// Builds conversion options: the config file first, then flags.
fn options(input: &InputArgs, path: &Path) -> anyhow::Result<ConvertOptions> {
    let mut options = match &input.config {
        Some(config) => ConvertOptions::load(config)?,
        None => ConvertOptions::default(),
    };
    if let Some(name) = &input.project_name {
        options.project_name = Some(name.clone());
    }
    if options.project_name.is_none() {
        options.project_name = directory_name(path);
    }
    if let Some(root) = &input.stack_root {
        options.stack_root.clone_from(root);
    }
    if let Some(address) = &input.bind_address {
        options.bind_address.clone_from(address);
    }
    Ok(options)
}

/// Name of the directory holding `path`.
fn directory_name(path: &Path) -> Option<String> {
    let absolute = std::fs::canonicalize(path).ok()?;
    absolute
        .parent()?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.yml");
        let err = resolve_compose_file(Some(missing.as_path()), dir.path()).unwrap_err();
        assert!(err.to_string().contains("file not found"), "got: {err}");
    }

    #[test]
    fn default_files_are_tried_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}").expect("write");
        std::fs::write(dir.path().join("compose.yml"), "services: {}").expect("write");

        let found = resolve_compose_file(None, dir.path()).expect("should find");
        assert_eq!(found, dir.path().join("compose.yml"));
    }

    #[test]
    fn missing_default_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_compose_file(None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("compose.yaml"), "got: {err}");
    }

    #[test]
    fn project_name_falls_back_to_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stack = dir.path().join("immich");
        std::fs::create_dir(&stack).expect("mkdir");
        let file = stack.join("compose.yaml");
        std::fs::write(&file, "services: {}").expect("write");

        let options = options(&InputArgs::default(), &file).expect("options");
        assert_eq!(options.project_name.as_deref(), Some("immich"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("quadlify.yaml");
        std::fs::write(&config, "bind_address: 10.0.0.1\nstack_root: /srv/stacks").expect("write");
        let input = InputArgs {
            config: Some(config),
            bind_address: Some("192.168.1.5".into()),
            project_name: Some("media".into()),
            ..InputArgs::default()
        };

        let options = options(&input, &dir.path().join("compose.yaml")).expect("options");
        assert_eq!(options.bind_address, "192.168.1.5");
        assert_eq!(options.stack_root, "/srv/stacks");
        assert_eq!(options.project_name.as_deref(), Some("media"));
    }
}
