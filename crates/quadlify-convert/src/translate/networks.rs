//! `networks`, at service and project level.

use indexmap::IndexMap;
use quadlify_common::constants::COMPOSE_DEFAULT_NETWORK;
use quadlify_common::diagnostic::Advisory;
use quadlify_compose::ComposeProject;
use quadlify_compose::model::NetworkSpec;
use quadlify_quadlet::QuadletNetwork;

/// Returns the network keys a service joins.
///
/// A service that names no networks joins the project network, and
/// Compose's `default` network is the project network. Networks the
/// document does not declare are flagged.
#[must_use]
pub fn service_networks(
    networks: Option<&[String]>,
    project: &ComposeProject,
    advisories: &mut Vec<Advisory>,
) -> Vec<String> {
    let Some(networks) = networks else {
        return vec![project.name.clone()];
    };
    let mut keys: Vec<String> = Vec::with_capacity(networks.len());
    for name in networks {
        let key = if name == COMPOSE_DEFAULT_NETWORK {
            project.name.clone()
        } else {
            if !project.networks.contains_key(name) && *name != project.name {
                advisories.push(Advisory::new(
                    "networks",
                    format!("network `{name}` is not declared under top-level `networks`"),
                ));
            }
            name.clone()
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Builds one network per distinct key, in order of first use.
#[must_use]
pub fn project_networks<'a>(
    used: impl IntoIterator<Item = &'a String>,
    project: &ComposeProject,
    default_driver: &str,
) -> IndexMap<String, QuadletNetwork> {
    let mut networks = IndexMap::new();
    for key in used {
        if networks.contains_key(key) {
            continue;
        }
        let declared = project.networks.get(key).or_else(|| {
            (*key == project.name)
                .then(|| project.networks.get(COMPOSE_DEFAULT_NETWORK))
                .flatten()
        });
        let network = quadlet_network(key, declared, default_driver);
        tracing::debug!(network = %key, ?network, "network defined");
        let _ = networks.insert(key.clone(), network);
    }
    networks
}

fn quadlet_network(key: &str, declared: Option<&NetworkSpec>, default_driver: &str) -> QuadletNetwork {
    match declared {
        Some(spec) if spec.external => QuadletNetwork::External {
            name: spec.name.clone().unwrap_or_else(|| key.to_owned()),
        },
        Some(spec) => QuadletNetwork::Managed {
            driver: spec.driver.clone().unwrap_or_else(|| default_driver.to_owned()),
        },
        None => QuadletNetwork::Managed {
            driver: default_driver.to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use quadlify_compose::parser::parse_compose;

    use super::*;

    fn project(yaml: &str) -> ComposeProject {
        parse_compose(yaml, Some("demo")).expect("should load").project
    }

    #[test]
    fn unspecified_networks_join_project_network() {
        let project = project("services:\n  a:\n    image: x");
        let mut advisories = Vec::new();
        assert_eq!(service_networks(None, &project, &mut advisories), vec!["demo"]);
        assert!(advisories.is_empty());
    }

    #[test]
    fn default_maps_to_project_network() {
        let project = project("services:\n  a:\n    image: x\nnetworks:\n  back:");
        let mut advisories = Vec::new();
        let names = vec!["default".to_owned(), "back".to_owned(), "demo".to_owned()];
        let keys = service_networks(Some(names.as_slice()), &project, &mut advisories);
        assert_eq!(keys, vec!["demo", "back"]);
        assert!(advisories.is_empty());
    }

    #[test]
    fn undeclared_network_is_flagged() {
        let project = project("services:\n  a:\n    image: x");
        let mut advisories = Vec::new();
        let names = vec!["ghost".to_owned()];
        let _ = service_networks(Some(names.as_slice()), &project, &mut advisories);
        assert_eq!(advisories.len(), 1);
    }

    #[test]
    fn explicit_empty_list_joins_nothing() {
        let project = project("services:\n  a:\n    image: x");
        let mut advisories = Vec::new();
        assert!(service_networks(Some(&[]), &project, &mut advisories).is_empty());
    }

    #[test]
    fn one_network_per_key_with_declared_settings() {
        let project = project(
            "services:\n  a:\n    image: x\nnetworks:\n  default:\n    driver: macvlan\n  proxy:\n    external: true\n    name: traefik_proxy",
        );
        let used = ["demo".to_owned(), "proxy".to_owned(), "demo".to_owned()];
        let networks = project_networks(&used, &project, "bridge");
        assert_eq!(networks.len(), 2);
        assert_eq!(
            networks["demo"],
            QuadletNetwork::Managed {
                driver: "macvlan".into()
            }
        );
        assert_eq!(
            networks["proxy"],
            QuadletNetwork::External {
                name: "traefik_proxy".into()
            }
        );
    }
}
