//! Startup ordering from `depends_on`.
//!
//! Only direct predecessors and cycle membership are computed. A service
//! in a cycle gets no ordering at all; its dependents keep theirs.

use indexmap::IndexMap;
use quadlify_common::diagnostic::{Problem, ProblemKind};
use quadlify_common::types::UnitName;
use quadlify_compose::ComposeProject;
use quadlify_compose::graph::DependencyGraph;
use quadlify_quadlet::model::UnitOrdering;

/// Per-service ordering and the problems found building it.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Ordering for every converted service, in document order.
    pub orderings: IndexMap<String, UnitOrdering>,
    /// Reference and cycle problems.
    pub problems: Vec<Problem>,
}

/// Resolves `depends_on` for every converted service.
#[must_use]
pub fn resolve(project: &ComposeProject) -> Resolution {
    let mut graph = DependencyGraph::new();
    for name in project.services.keys() {
        let _ = graph.add_service(name);
    }

    let mut problems = Vec::new();
    for (name, service) in &project.services {
        let dependent = graph.add_service(name);
        for dependency in &service.depends_on {
            match graph.node(&dependency.service) {
                Some(node) => graph.add_dependency(dependent, node),
                None => {
                    tracing::warn!(
                        service = %name,
                        dependency = %dependency.service,
                        excluded = project.defines(&dependency.service),
                        "dependency dropped"
                    );
                    problems.push(Problem {
                        service: name.clone(),
                        kind: ProblemKind::UnresolvedDependency {
                            dependency: dependency.service.clone(),
                        },
                    });
                }
            }
        }
    }

    let cycles = graph.cycles();
    for members in &cycles {
        tracing::warn!(members = ?members, "dependency cycle");
        problems.extend(members.iter().map(|member| Problem {
            service: member.clone(),
            kind: ProblemKind::DependencyCycle {
                members: members.clone(),
            },
        }));
    }

    let mut orderings = IndexMap::with_capacity(project.services.len());
    for (name, service) in &project.services {
        if cycles.iter().any(|members| members.contains(name)) {
            let _ = orderings.insert(name.clone(), UnitOrdering::default());
            continue;
        }
        let units: Vec<UnitName> = graph
            .direct_dependencies(name)
            .into_iter()
            .map(UnitName::for_container)
            .collect();
        let conditions = service
            .depends_on
            .iter()
            .filter(|d| project.services.contains_key(&d.service))
            .filter_map(|d| Some((d.service.clone(), d.condition.clone()?)))
            .collect();
        tracing::debug!(service = %name, after = units.len(), "ordering resolved");
        let _ = orderings.insert(
            name.clone(),
            UnitOrdering {
                after: units.clone(),
                requires: units,
                conditions,
            },
        );
    }

    Resolution {
        orderings,
        problems,
    }
}
