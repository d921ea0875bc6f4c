//! Project assembly: extraction, translation, then dependency resolution.

use indexmap::IndexMap;
use quadlify_common::config::ConvertOptions;
use quadlify_common::diagnostic::Problem;
use quadlify_compose::parser::LoadedProject;
use quadlify_compose::{ComposeProject, ComposeService};
use quadlify_quadlet::{QuadletContainer, QuadletProject};
use serde::Serialize;

use crate::dependency;
use crate::naming::VariableNamer;
use crate::translate::{environment, healthcheck, labels, networks, ports, process, restart, volumes};
use crate::variables::{self, Bindings};

/// The result of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// The converted project.
    pub project: QuadletProject,
    /// Every problem found, rejected services first.
    pub problems: Vec<Problem>,
}

impl Conversion {
    /// Returns true if any problem was found.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    /// Number of advisories across all containers.
    #[must_use]
    pub fn advisory_count(&self) -> usize {
        self.project
            .containers
            .values()
            .map(|c| c.advisories.len())
            .sum()
    }
}

/// Assembles the target project from a loaded Compose project.
///
/// A problem in one service never prevents the others from converting.
#[must_use]
pub fn assemble(
    loaded: LoadedProject,
    options: &ConvertOptions,
    namer: &dyn VariableNamer,
) -> Conversion {
    let LoadedProject {
        project,
        mut problems,
    } = loaded;

    let bindings = variables::extract(&project, options, namer);

    let mut containers = IndexMap::with_capacity(project.services.len());
    for (name, service) in &project.services {
        tracing::debug!(service = %name, "translating service");
        let container = translate_service(service, &project, &bindings, options);
        let _ = containers.insert(name.clone(), container);
    }

    let mut resolution = dependency::resolve(&project);
    for (name, container) in &mut containers {
        container.ordering = resolution.orderings.shift_remove(name).unwrap_or_default();
        container.problems = resolution
            .problems
            .iter()
            .filter(|p| p.service == *name)
            .cloned()
            .collect();
    }

    let networks = networks::project_networks(
        containers.values().flat_map(|c| c.networks.iter()),
        &project,
        &options.default_network_driver,
    );
    problems.extend(resolution.problems);

    tracing::info!(
        project = %project.name,
        containers = containers.len(),
        networks = networks.len(),
        problems = problems.len(),
        "project assembled"
    );

    Conversion {
        project: QuadletProject {
            name: project.name,
            variables: bindings.into_table(),
            networks,
            containers,
        },
        problems,
    }
}

fn translate_service(
    service: &ComposeService,
    project: &ComposeProject,
    bindings: &Bindings,
    options: &ConvertOptions,
) -> QuadletContainer {
    let mut advisories = service.advisories.clone();
    let networks = networks::service_networks(service.networks.as_deref(), project, &mut advisories);
    advisories.extend(variables::alternate_advisories(service));

    QuadletContainer {
        image: bindings.substitute(&service.image),
        publish_ports: service
            .ports
            .iter()
            .map(|port| ports::publish_port(port, bindings, &options.bind_address))
            .collect(),
        volumes: service
            .volumes
            .iter()
            .map(|volume| volumes::volume(volume, bindings, options))
            .collect(),
        environment_files: environment::environment_files(
            &service.name,
            &service.env_files,
            &options.env_file_secret,
        ),
        environments: environment::environments(&service.environment, bindings),
        health: service
            .healthcheck
            .as_ref()
            .and_then(|check| healthcheck::health_check(check, bindings)),
        networks,
        labels: labels::labels(
            &service.labels,
            &service.image,
            bindings,
            options.monitor_label.as_ref(),
        ),
        exec: service
            .command
            .as_ref()
            .map(|command| process::exec(command, bindings)),
        entrypoint: service
            .entrypoint
            .as_ref()
            .map(|entrypoint| process::entrypoint(entrypoint, bindings)),
        user: service.user.as_ref().map(|user| bindings.substitute(user)),
        working_dir: service
            .working_dir
            .as_ref()
            .map(|dir| bindings.substitute(dir)),
        restart: restart::restart_policy(service.restart.as_deref()),
        advisories,
        ..QuadletContainer::default()
    }
}
