//! `quadlet-nix` rendering.
//!
//! Produces a NixOS module that sets `virtualisation.quadlet`. Bindings go
//! in a `let` block; containers reference them through `${NAME}`
//! antiquotations, so every literal is escaped before it is quoted.

use std::borrow::Cow;

use crate::model::{QuadletContainer, QuadletNetwork, QuadletProject, RestartPolicy};
use crate::text::{Segment, Text};

const INDENT: &str = "  ";

const NIX_KEYWORDS: &[&str] = &[
    "assert", "else", "if", "in", "inherit", "let", "or", "rec", "then", "with",
];

/// Renders a project as a `quadlet-nix` NixOS module.
#[must_use]
pub fn render_nix(project: &QuadletProject) -> String {
    tracing::debug!(
        project = %project.name,
        containers = project.containers.len(),
        variables = project.variables.len(),
        "rendering quadlet-nix module"
    );
    let mut w = NixWriter::default();
    w.line("{ config, ... }:");
    w.blank();
    w.open("{");
    w.line("virtualisation.quadlet =");
    w.depth += 1;

    w.open("let");
    w.line("inherit (config.virtualisation.quadlet) networks;");
    for (name, variable) in project.variables.iter() {
        w.line(&format!("{} = {};", attr_name(name), nix_text(&variable.value)));
    }
    w.close("in");

    w.open("{");
    for (name, network) in &project.networks {
        if let QuadletNetwork::Managed { driver } = network {
            w.line(&format!(
                "networks.{}.networkConfig.driver = {};",
                attr_name(name),
                nix_string(driver)
            ));
        }
    }
    w.open("containers = {");
    for (index, (name, container)) in project.containers.iter().enumerate() {
        if index > 0 {
            w.blank();
        }
        render_container(&mut w, project, name, container);
    }
    w.close("};");
    w.close("};");

    w.depth -= 1;
    w.close("}");
    w.out
}

fn render_container(w: &mut NixWriter, project: &QuadletProject, name: &str, c: &QuadletContainer) {
    w.open(&format!("{} = {{", attr_name(name)));
    for advisory in &c.advisories {
        w.comment(&format!("not converted: {advisory}"));
    }
    for problem in &c.problems {
        w.comment(&format!("problem: {problem}"));
    }

    w.open("containerConfig = {");
    w.line(&format!("image = {};", nix_text(&c.image)));
    w.list("publishPorts", c.publish_ports.iter().map(nix_text));
    w.list("volumes", c.volumes.iter().map(nix_text));
    w.list(
        "environmentFiles",
        c.environment_files
            .iter()
            .map(|file| format!("{} # {}", file.secret, file.source)),
    );
    if !c.environments.is_empty() {
        w.open("environments = {");
        for (key, value) in &c.environments {
            w.line(&format!("{} = {};", attr_name(key), nix_text(value)));
        }
        w.close("};");
    }
    if let Some(health) = &c.health {
        w.line(&format!("healthCmd = {};", nix_text(&health.command)));
        w.optional("healthInterval", health.interval.as_deref());
        w.optional("healthTimeout", health.timeout.as_deref());
        if let Some(retries) = health.retries {
            w.line(&format!("healthRetries = {retries};"));
        }
        w.optional("healthStartPeriod", health.start_period.as_deref());
    }
    w.list(
        "networks",
        c.networks.iter().map(|key| match project.networks.get(key) {
            Some(QuadletNetwork::External { name }) => nix_string(name),
            _ => format!("networks.{}.ref", attr_name(key)),
        }),
    );
    w.list(
        "labels",
        c.labels.iter().map(|(key, value)| {
            let mut label = Text::literal(format!("{key}="));
            label.append(value);
            nix_text(&label)
        }),
    );
    w.optional_text("exec", c.exec.as_ref());
    w.optional_text("entrypoint", c.entrypoint.as_ref());
    w.optional_text("user", c.user.as_ref());
    w.optional_text("workingDir", c.working_dir.as_ref());
    w.close("};");

    if let Some(RestartPolicy::Always) = c.restart {
        w.line("serviceConfig.Restart = \"always\";");
    }

    if !c.ordering.is_empty() {
        w.open("unitConfig = {");
        for (dependency, condition) in &c.ordering.conditions {
            w.comment(&format!("depends_on {dependency}: {condition}"));
        }
        w.list(
            "After",
            c.ordering.after.iter().map(|unit| nix_string(unit.as_str())),
        );
        w.list(
            "Requires",
            c.ordering.requires.iter().map(|unit| nix_string(unit.as_str())),
        );
        w.close("};");
    }

    w.close("};");
}

#[derive(Default)]
struct NixWriter {
    out: String,
    depth: usize,
}

impl NixWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn comment(&mut self, text: &str) {
        for line in text.lines() {
            self.line(&format!("# {line}"));
        }
    }

    fn optional(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.line(&format!("{key} = {};", nix_string(value)));
        }
    }

    fn optional_text(&mut self, key: &str, value: Option<&Text>) {
        if let Some(value) = value {
            self.line(&format!("{key} = {};", nix_text(value)));
        }
    }

    fn list(&mut self, key: &str, items: impl Iterator<Item = String>) {
        let items: Vec<String> = items.collect();
        if items.is_empty() {
            return;
        }
        self.open(&format!("{key} = ["));
        for item in &items {
            self.line(item);
        }
        self.close("];");
    }
}

/// Returns `name` as a Nix attribute name, quoted when it is not a plain
/// identifier.
#[must_use]
pub fn attr_name(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\''))
        && !NIX_KEYWORDS.contains(&name);
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(nix_string(name))
    }
}

/// Quotes a literal string.
#[must_use]
pub fn nix_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    escape_into(&mut out, value);
    out.push('"');
    out
}

/// Quotes a text, turning binding references into antiquotations.
#[must_use]
pub fn nix_text(text: &Text) -> String {
    let mut out = String::from('"');
    for segment in text.segments() {
        match segment {
            Segment::Literal(literal) => escape_into(&mut out, literal),
            Segment::Variable(name) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
    }
    out.push('"');
    out
}

fn escape_into(out: &mut String, value: &str) {
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            other => out.push(other),
        }
    }
}
