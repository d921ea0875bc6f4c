//! Variable extraction: the `let` bindings of the generated module.
//!
//! Runs once over the whole project before any service is translated.
//! Interpolations are hoisted first, then bind-mount host paths are matched
//! against the stack path, existing bindings, and each other. The resulting
//! [`Bindings`] are project-wide: a given source value is replaced the same
//! way in every service.

use indexmap::IndexMap;
use quadlify_common::config::ConvertOptions;
use quadlify_common::constants::STACK_PATH_VARIABLE;
use quadlify_common::diagnostic::Advisory;
use quadlify_compose::model::{CommandSpec, HealthTest, VolumeSpec};
use quadlify_compose::{ComposeProject, ComposeService, Fragment, Modifier, Template, VariableRef};
use quadlify_quadlet::model::{Variable, VariableOrigin};
use quadlify_quadlet::{Text, VariableTable};

use crate::naming::{VariableNamer, unique_name};

/// The variable table plus the host-path replacements derived from it.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    table: VariableTable,
    host_paths: IndexMap<String, Text>,
}

impl Bindings {
    /// Returns the variable table.
    #[must_use]
    pub const fn table(&self) -> &VariableTable {
        &self.table
    }

    /// Consumes the bindings, returning the variable table.
    #[must_use]
    pub fn into_table(self) -> VariableTable {
        self.table
    }

    /// Replaces every hoisted interpolation with a binding reference.
    ///
    /// References that were not hoisted, and every `${VAR:+alt}`, are kept
    /// as literal text.
    #[must_use]
    pub fn substitute(&self, template: &Template) -> Text {
        let mut text = Text::new();
        for fragment in template.fragments() {
            match fragment {
                Fragment::Literal(literal) => text.push_str(literal),
                Fragment::Variable(var)
                    if !matches!(var.modifier, Modifier::Alternate(_))
                        && self.table.contains(&var.name) =>
                {
                    text.push_variable(var.name.clone());
                }
                Fragment::Variable(var) => text.push_str(&var.to_string()),
            }
        }
        text
    }

    /// Returns the replacement for a bind-mount source.
    #[must_use]
    pub fn bind_source(&self, source: &Template) -> Text {
        source
            .as_literal()
            .and_then(|path| self.host_paths.get(path))
            .cloned()
            .unwrap_or_else(|| self.substitute(source))
    }
}

/// Builds the bindings for a project.
#[must_use]
pub fn extract(
    project: &ComposeProject,
    options: &ConvertOptions,
    namer: &dyn VariableNamer,
) -> Bindings {
    let mut extractor = Extractor {
        bindings: Bindings::default(),
        stack_path: options.stack_path(&project.name),
        stack_variable: None,
    };
    for service in project.services.values() {
        for template in hoisted_fields(service) {
            for var in template.variables() {
                extractor.hoist_interpolation(var);
            }
        }
    }
    extractor.hoist_host_paths(project, namer);

    tracing::info!(
        project = %project.name,
        variables = extractor.bindings.table.len(),
        host_paths = extractor.bindings.host_paths.len(),
        "variables extracted"
    );
    extractor.bindings
}

/// Advisories for `${VAR:+alt}` references, which have no binding form.
#[must_use]
pub fn alternate_advisories(service: &ComposeService) -> Vec<Advisory> {
    hoisted_fields(service)
        .into_iter()
        .flat_map(Template::variables)
        .filter(|var| matches!(var.modifier, Modifier::Alternate(_)))
        .map(|var| {
            Advisory::new(
                "interpolation",
                format!("`{var}` is kept verbatim; set the value by hand"),
            )
        })
        .collect()
}

/// Fields scanned for interpolations, in the order they are translated.
fn hoisted_fields(service: &ComposeService) -> Vec<&Template> {
    let mut fields = vec![&service.image];
    for port in &service.ports {
        fields.extend(port.host_ip.iter());
        fields.extend(port.published.iter());
        fields.push(&port.target);
    }
    for volume in &service.volumes {
        if let VolumeSpec::Bind { source, .. } = volume {
            fields.push(source);
        }
        fields.push(volume.target());
    }
    fields.extend(service.environment.values().flatten());
    if let Some(check) = &service.healthcheck {
        match &check.test {
            HealthTest::Shell(line) => fields.push(line),
            HealthTest::Exec(args) => fields.extend(args.iter()),
            HealthTest::Inherit | HealthTest::Disabled => {}
        }
    }
    fields.extend(service.labels.values());
    for spec in [&service.command, &service.entrypoint].into_iter().flatten() {
        match spec {
            CommandSpec::Shell(line) => fields.push(line),
            CommandSpec::Exec(args) => fields.extend(args.iter()),
        }
    }
    fields.extend(service.user.iter());
    fields.extend(service.working_dir.iter());
    fields
}

struct Extractor {
    bindings: Bindings,
    stack_path: String,
    stack_variable: Option<String>,
}

impl Extractor {
    fn hoist_interpolation(&mut self, var: &VariableRef) {
        let default = match &var.modifier {
            Modifier::Alternate(_) => return,
            Modifier::Default(default) => Some(default),
            Modifier::Plain | Modifier::Required(_) => None,
        };
        for inner in default.iter().flat_map(|d| d.variables()) {
            self.hoist_interpolation(inner);
        }
        let value = default.map(|d| self.bindings.substitute(d));
        let table = &mut self.bindings.table;
        if let Some(existing) = table.get(&var.name) {
            if let Some(value) = value {
                if existing.value != value {
                    tracing::warn!(
                        variable = %var.name,
                        kept = %existing.value,
                        ignored = %value,
                        "conflicting defaults; keeping the first"
                    );
                }
            }
            return;
        }
        let has_default = value.is_some();
        let value = value.unwrap_or_else(|| Text::literal(var.name.to_lowercase()));
        tracing::debug!(variable = %var.name, value = %value, "hoisting interpolation");
        let _ = table.insert(
            var.name.clone(),
            Variable {
                value,
                origin: VariableOrigin::Interpolation { has_default },
            },
        );
    }

    fn hoist_host_paths(&mut self, project: &ComposeProject, namer: &dyn VariableNamer) {
        let sources: Vec<&str> = project
            .services
            .values()
            .flat_map(|service| service.volumes.iter())
            .filter_map(|volume| match volume {
                VolumeSpec::Bind { source, .. } => source.as_literal(),
                _ => None,
            })
            .collect();

        let mut uses: IndexMap<&str, usize> = IndexMap::new();
        for source in &sources {
            *uses.entry(normalize_path(source)).or_default() += 1;
        }

        for source in sources {
            if self.bindings.host_paths.contains_key(source) {
                continue;
            }
            let count = uses.get(normalize_path(source)).copied().unwrap_or_default();
            if let Some(replacement) = self.replacement(source, count, namer) {
                tracing::debug!(path = source, replacement = %replacement, "host path bound");
                let _ = self
                    .bindings
                    .host_paths
                    .insert(source.to_owned(), replacement);
            }
        }
    }

    fn replacement(&mut self, source: &str, uses: usize, namer: &dyn VariableNamer) -> Option<Text> {
        if let Some(relative) = relative_suffix(source) {
            return Some(self.under_stack_path(relative));
        }
        if !source.starts_with('/') {
            return None;
        }
        let path = normalize_path(source);
        if let Some(suffix) = strip_dir_prefix(path, &self.stack_path) {
            return Some(self.under_stack_path(suffix));
        }
        let literal = Text::literal(path);
        if let Some(name) = self.bindings.table.find_by_value(&literal) {
            return Some(Text::variable(name));
        }
        if uses < 2 {
            return None;
        }
        let name = unique_name(&self.bindings.table, &namer.name_for(path));
        let _ = self.bindings.table.insert(
            name.clone(),
            Variable {
                value: literal,
                origin: VariableOrigin::HostPath,
            },
        );
        Some(Text::variable(name))
    }

    /// Returns `${STACK_PATH}` followed by `/suffix` when the suffix is non-empty.
    fn under_stack_path(&mut self, suffix: &str) -> Text {
        let name = self.stack_variable();
        let mut text = Text::variable(name);
        if !suffix.is_empty() {
            text.push_str("/");
            text.push_str(suffix);
        }
        text
    }

    fn stack_variable(&mut self) -> String {
        if let Some(name) = &self.stack_variable {
            return name.clone();
        }
        let value = Text::literal(self.stack_path.clone());
        let name = match self.bindings.table.get(STACK_PATH_VARIABLE) {
            Some(existing) if existing.value == value => STACK_PATH_VARIABLE.to_owned(),
            _ => {
                let name = unique_name(&self.bindings.table, STACK_PATH_VARIABLE);
                let _ = self.bindings.table.insert(
                    name.clone(),
                    Variable {
                        value,
                        origin: VariableOrigin::StackPath,
                    },
                );
                name
            }
        };
        self.stack_variable = Some(name.clone());
        name
    }
}

/// Strips trailing slashes, keeping `/` itself.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Returns the part of `path` under `dir`, or `None` if it is elsewhere.
fn strip_dir_prefix<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(dir)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Returns the stack-relative form of `./x`, `.` and `../x` sources.
fn relative_suffix(source: &str) -> Option<&str> {
    let source = normalize_path(source);
    if source == "." {
        return Some("");
    }
    if let Some(rest) = source.strip_prefix("./") {
        return Some(rest.trim_start_matches('/'));
    }
    if source == ".." || source.starts_with("../") {
        return Some(source);
    }
    None
}
