//! `quadlify plan` — Show what a conversion would produce.

use std::io::{self, Write};

use clap::Args;
use quadlify_compose::graph::DependencyGraph;
use quadlify_convert::Conversion;
use quadlify_quadlet::QuadletNetwork;
use quadlify_quadlet::model::VariableOrigin;

use super::InputArgs;
use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input file and conversion settings.
    #[command(flatten)]
    pub input: InputArgs,
}

/// Executes the `plan` command.
///
/// Converts the Compose file, rebuilds the unit ordering as a graph and
/// prints bindings, networks, start order, advisories and problems.
///
/// # Errors
///
/// Returns an error if the file cannot be read or converted.
pub fn execute(args: PlanArgs) -> anyhow::Result<()> {
    let (path, conversion) = super::load(&args.input)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Plan for: {}", path.display())?;
    write_plan(&mut stdout, &conversion)?;
    Ok(())
}

/// Writes the plan body for a conversion.
fn write_plan(out: &mut impl Write, conversion: &Conversion) -> io::Result<()> {
    let project = &conversion.project;
    writeln!(out, "{}", "\u{2550}".repeat(40))?;
    writeln!(out, "{}", output::summary(conversion))?;

    if !project.variables.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Variables:")?;
        for (name, variable) in project.variables.iter() {
            let origin = match variable.origin {
                VariableOrigin::Interpolation { has_default: true } => "default",
                VariableOrigin::Interpolation { has_default: false } => "placeholder",
                VariableOrigin::StackPath => "stack path",
                VariableOrigin::HostPath => "shared host path",
            };
            writeln!(out, "    {name} = \"{}\" ({origin})", variable.value)?;
        }
    }

    if !project.networks.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Networks:")?;
        for (key, network) in &project.networks {
            match network {
                QuadletNetwork::Managed { driver } => writeln!(out, "    + {key} ({driver})")?,
                QuadletNetwork::External { name } => {
                    writeln!(out, "    = {key} (external \"{name}\")")?;
                }
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "  Start order:")?;
    match start_order(conversion) {
        Ok(order) => {
            for (position, name) in order.iter().enumerate() {
                let after: Vec<&str> = project
                    .containers
                    .get(name.as_str())
                    .map(|c| c.ordering.after.iter().map(|unit| unit.container()).collect())
                    .unwrap_or_default();
                if after.is_empty() {
                    writeln!(out, "    {}. {name}", position + 1)?;
                } else {
                    writeln!(out, "    {}. {name} (after {})", position + 1, after.join(", "))?;
                }
            }
        }
        Err(e) => writeln!(out, "    unavailable: {e}")?,
    }

    let advised: Vec<_> = project
        .containers
        .iter()
        .filter(|(_, c)| !c.advisories.is_empty())
        .collect();
    if !advised.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Not converted:")?;
        for (name, container) in advised {
            for advisory in &container.advisories {
                writeln!(out, "    {name}: {advisory}")?;
            }
        }
    }

    if conversion.has_problems() {
        writeln!(out)?;
        output::write_problems(out, conversion)?;
    }
    Ok(())
}

/// Start order implied by the generated `After=` lists.
fn start_order(conversion: &Conversion) -> quadlify_common::error::Result<Vec<String>> {
    let mut graph = DependencyGraph::new();
    for name in conversion.project.containers.keys() {
        let _ = graph.add_service(name);
    }
    for (name, container) in &conversion.project.containers {
        let dependent = graph.add_service(name);
        for unit in &container.ordering.after {
            if let Some(dependency) = graph.node(unit.container()) {
                graph.add_dependency(dependent, dependency);
            }
        }
    }
    graph.start_order()
}
