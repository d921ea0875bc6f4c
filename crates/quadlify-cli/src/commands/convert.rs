//! `quadlify convert` — Convert a Compose file to a quadlet-nix module.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use quadlify_convert::Conversion;
use quadlify_quadlet::render_nix;

use super::InputArgs;
use crate::output;

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input file and conversion settings.
    #[command(flatten)]
    pub input: InputArgs,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Nix)]
    pub format: Format,

    /// Fail without writing output if any problem was found.
    #[arg(long)]
    pub strict: bool,
}

/// Output formats of `convert`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A NixOS module for quadlet-nix.
    Nix,
    /// The converted project and its problems as JSON.
    Json,
}

/// Executes the `convert` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, converted, or written, or
/// if `--strict` is set and problems were found.
pub fn execute(args: ConvertArgs) -> anyhow::Result<()> {
    let (path, conversion) = super::load(&args.input)?;

    let mut stderr = std::io::stderr().lock();
    output::write_problems(&mut stderr, &conversion)?;
    if args.strict && conversion.has_problems() {
        anyhow::bail!(
            "{} in {}",
            output::count(conversion.problems.len(), "problem", "problems"),
            path.display()
        );
    }

    let rendered = render(&conversion, args.format)?;
    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &rendered)
            .with_context(|| format!("cannot write {}", out_path.display()))?;
        writeln!(stderr, "Converted {} -> {}", path.display(), out_path.display())?;
        writeln!(stderr, "{}", output::summary(&conversion))?;
    } else {
        std::io::stdout().lock().write_all(rendered.as_bytes())?;
    }

    Ok(())
}

/// Renders a conversion in the requested format.
fn render(conversion: &Conversion, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Nix => Ok(render_nix(&conversion.project)),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(conversion)?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use quadlify_common::config::ConvertOptions;

    use super::*;

    fn convert(yaml: &str) -> Conversion {
        let options = ConvertOptions {
            project_name: Some("demo".into()),
            ..ConvertOptions::default()
        };
        quadlify_convert::convert_str(yaml, &options).expect("should convert")
    }

    #[test]
    fn nix_output_is_a_module() {
        let rendered = render(&convert("services:\n  app:\n    image: x"), Format::Nix)
            .expect("render");
        assert!(rendered.starts_with("{ config, ... }:"), "got:\n{rendered}");
        assert!(rendered.contains("containers"));
    }

    #[test]
    fn json_output_carries_problems() {
        let conversion = convert("services:\n  app:\n    image: x\n    depends_on: [ghost]");
        let rendered = render(&conversion, Format::Json).expect("render");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["project"]["name"], "demo");
        assert_eq!(value["problems"][0]["service"], "app");
        assert_eq!(value["problems"][0]["kind"]["type"], "unresolved_dependency");
    }

    #[test]
    fn strict_mode_rejects_problems() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("compose.yaml");
        std::fs::write(
            &file,
            "name: demo\nservices:\n  app:\n    image: x\n    depends_on: [ghost]",
        )
        .expect("write");
        let out = dir.path().join("out.nix");
        let args = ConvertArgs {
            input: InputArgs {
                file: Some(file),
                ..InputArgs::default()
            },
            output: Some(out.clone()),
            format: Format::Nix,
            strict: true,
        };

        let err = execute(args).unwrap_err();
        assert!(err.to_string().contains("1 problem"), "got: {err}");
        assert!(!out.exists());
    }

    #[test]
    fn output_file_is_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("compose.yaml");
        std::fs::write(&file, "name: demo\nservices:\n  app:\n    image: x").expect("write");
        let out = dir.path().join("demo.nix");
        let args = ConvertArgs {
            input: InputArgs {
                file: Some(file),
                ..InputArgs::default()
            },
            output: Some(out.clone()),
            format: Format::Nix,
            strict: false,
        };

        execute(args).expect("should convert");
        let written = std::fs::read_to_string(out).expect("read");
        assert!(written.contains("app = {"), "got:\n{written}");
    }
}
