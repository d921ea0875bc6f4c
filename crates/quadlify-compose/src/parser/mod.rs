//! Compose document loader.
//!
//! Turns YAML text, or an already-parsed `serde_yaml::Value` tree, into a
//! [`ComposeProject`] through three phases: document checks, per-service
//! deserialization into the raw [`ast`] shapes, and normalization.
//!
//! Only document-level failures are fatal. A malformed service is recorded
//! as a [`Problem`] and left out of the project.

pub mod ast;
pub mod lexer;
pub mod validator;

use indexmap::IndexMap;
use quadlify_common::diagnostic::{Advisory, Problem};
use quadlify_common::error::{QuadlifyError, Result};
use serde_yaml::{Mapping, Value};

use self::ast::{ExternalDecl, NetworkDecl, ServiceDecl};
use crate::model::{ComposeProject, ComposeService, NetworkSpec, VolumeSpec};
use crate::normalize::normalize_service;

/// A loaded project together with the services it had to reject.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// The project.
    pub project: ComposeProject,
    /// Structural problems, one per rejected service.
    pub problems: Vec<Problem>,
}

/// Parses Compose YAML text.
///
/// `fallback_name` is used when the document has no top-level `name`.
///
/// # Errors
///
/// Returns an error if the text is not YAML, the document is empty or not a
/// mapping, it has no services, or no project name is available.
pub fn parse_compose(input: &str, fallback_name: Option<&str>) -> Result<LoadedProject> {
    let document: Value = serde_yaml::from_str(input)?;
    load_value(&document, fallback_name)
}

/// Loads a project from a parsed YAML tree.
///
/// # Errors
///
/// Same as [`parse_compose`], minus YAML syntax errors.
pub fn load_value(document: &Value, fallback_name: Option<&str>) -> Result<LoadedProject> {
    let root = validator::document_root(document)?;
    let name = project_name(root, fallback_name)?;
    let services = validator::services_section(root)?;
    tracing::info!(project = %name, services = services.len(), "loading compose project");

    let mut project = ComposeProject {
        name,
        services: IndexMap::with_capacity(services.len()),
        networks: networks(root)?,
        volumes: volume_names(root),
        rejected: Vec::new(),
    };
    let mut problems = Vec::new();

    for (key, value) in services {
        let Some(service_name) = validator::key_string(key) else {
            return Err(QuadlifyError::InvalidDocument {
                message: format!("service key {key:?} is not a scalar"),
            });
        };
        match load_service(&service_name, value) {
            Ok(mut service) => {
                flag_undeclared_volumes(&mut service, &project.volumes);
                tracing::debug!(service = %service_name, "service loaded");
                let _ = project.services.insert(service_name, service);
            }
            Err(message) => {
                tracing::warn!(service = %service_name, %message, "service rejected");
                problems.push(Problem::structural(&service_name, message));
                project.rejected.push(service_name);
            }
        }
    }

    Ok(LoadedProject { project, problems })
}

fn load_service(name: &str, value: &Value) -> std::result::Result<ComposeService, String> {
    validator::check_service(name, value)?;
    let decl: ServiceDecl = serde_yaml::from_value(value.clone()).map_err(|e| e.to_string())?;
    normalize_service(name, decl).map_err(|e| e.to_string())
}

fn project_name(root: &Mapping, fallback: Option<&str>) -> Result<String> {
    let declared = match root.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.as_str()),
        Some(other) => {
            return Err(QuadlifyError::InvalidDocument {
                message: format!("`name` must be a string, got {other:?}"),
            });
        }
    };
    declared
        .or(fallback)
        .map(validator::normalize_project_name)
        .filter(|name| !name.is_empty())
        .ok_or(QuadlifyError::MissingProjectName)
}

fn networks(root: &Mapping) -> Result<IndexMap<String, NetworkSpec>> {
    let Some(section) = root.get("networks").and_then(Value::as_mapping) else {
        return Ok(IndexMap::new());
    };
    let mut networks = IndexMap::with_capacity(section.len());
    for (key, value) in section {
        let Some(name) = validator::key_string(key) else {
            continue;
        };
        let decl: NetworkDecl = if value.is_null() {
            NetworkDecl::default()
        } else {
            serde_yaml::from_value(value.clone()).map_err(|e| QuadlifyError::InvalidDocument {
                message: format!("network \"{name}\": {e}"),
            })?
        };
        let (external, external_name) = match decl.external {
            Some(ExternalDecl::Flag(flag)) => (flag, None),
            Some(ExternalDecl::Named { name }) => (true, Some(name)),
            None => (false, None),
        };
        let spec = NetworkSpec {
            driver: decl.driver,
            external,
            name: decl.name.or(external_name),
        };
        let _ = networks.insert(name, spec);
    }
    Ok(networks)
}

fn volume_names(root: &Mapping) -> Vec<String> {
    root.get("volumes")
        .and_then(Value::as_mapping)
        .map(|section| section.keys().filter_map(validator::key_string).collect())
        .unwrap_or_default()
}

fn flag_undeclared_volumes(service: &mut ComposeService, declared: &[String]) {
    let undeclared: Vec<String> = service
        .volumes
        .iter()
        .filter_map(|volume| match volume {
            VolumeSpec::Named { name, .. } if !declared.contains(name) => Some(name.clone()),
            _ => None,
        })
        .collect();
    for name in undeclared {
        service.advisories.push(Advisory::new(
            "volumes",
            format!("named volume `{name}` is not declared under top-level `volumes`"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quadlify_common::diagnostic::ProblemKind;

    use super::*;
    use crate::model::HealthTest;
    use crate::parser::lexer::Template;

    fn load(input: &str) -> LoadedProject {
        parse_compose(input, Some("fallback")).expect("should load")
    }

    #[test]
    fn document_name_wins_over_fallback() {
        let loaded = load("name: immich\nservices:\n  web:\n    image: nginx");
        assert_eq!(loaded.project.name, "immich");
    }

    #[test]
    fn fallback_name_is_normalized() {
        let loaded = parse_compose("services:\n  web:\n    image: nginx", Some("My App"))
            .expect("should load");
        assert_eq!(loaded.project.name, "myapp");
    }

    #[test]
    fn missing_name_is_fatal() {
        let err = parse_compose("services:\n  web:\n    image: nginx", None).unwrap_err();
        assert!(matches!(err, QuadlifyError::MissingProjectName), "got: {err}");
    }

    #[test]
    fn empty_document_is_fatal() {
        let err = parse_compose("", Some("p")).unwrap_err();
        assert!(matches!(err, QuadlifyError::EmptyDocument), "got: {err}");
    }

    #[test]
    fn non_mapping_document_is_fatal() {
        let err = parse_compose("- a\n- b", Some("p")).unwrap_err();
        assert!(matches!(err, QuadlifyError::InvalidDocument { .. }), "got: {err}");
    }

    #[test]
    fn document_without_services_is_fatal() {
        let err = parse_compose("networks: {}", Some("p")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("services"), "got: {msg}");
    }

    #[test]
    fn yaml_syntax_error_is_fatal() {
        let err = parse_compose("services: [unclosed", Some("p")).unwrap_err();
        assert!(matches!(err, QuadlifyError::Yaml { .. }), "got: {err}");
    }

    #[test]
    fn services_keep_document_order() {
        let loaded = load("services:\n  zeta:\n    image: z\n  alpha:\n    image: a\n  mid:\n    image: m");
        let names: Vec<&String> = loaded.project.services.keys().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn malformed_service_is_rejected_not_fatal() {
        let loaded = load(
            "services:\n  good:\n    image: nginx\n  noimage:\n    restart: always\n  badports:\n    image: x\n    ports: {a: b}",
        );
        assert_eq!(loaded.project.services.len(), 1);
        assert_eq!(loaded.project.rejected, vec!["noimage", "badports"]);
        assert_eq!(loaded.problems.len(), 2);
        assert!(
            loaded
                .problems
                .iter()
                .all(|p| matches!(p.kind, ProblemKind::Structural { .. }))
        );
        assert!(loaded.project.defines("noimage"));
    }

    #[test]
    fn unterminated_interpolation_rejects_service() {
        let loaded = load("services:\n  web:\n    image: \"nginx:${TAG\"");
        assert_eq!(loaded.problems.len(), 1);
        assert!(matches!(
            &loaded.problems[0].kind,
            ProblemKind::Structural { message } if message.contains("image")
        ));
    }

    #[test]
    fn top_level_networks_are_read() {
        let loaded = load(
            "services:\n  web:\n    image: x\nnetworks:\n  front:\n    driver: macvlan\n  proxy:\n    external: true\n  plain:",
        );
        let networks = &loaded.project.networks;
        assert_eq!(networks["front"].driver.as_deref(), Some("macvlan"));
        assert!(networks["proxy"].external);
        assert_eq!(networks["plain"], NetworkSpec::default());
    }

    #[test]
    fn undeclared_named_volume_gets_advisory() {
        let loaded = load(
            "services:\n  db:\n    image: postgres\n    volumes:\n      - pgdata:/var/lib/postgresql/data\n      - cache:/cache\nvolumes:\n  pgdata:",
        );
        let db = &loaded.project.services["db"];
        let flagged: Vec<&Advisory> = db.advisories.iter().filter(|a| a.field == "volumes").collect();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].message.contains("cache"), "got: {}", flagged[0]);
    }

    #[test]
    fn realistic_service_loads() {
        let loaded = load(
            r#"
name: immich
services:
  server:
    image: ghcr.io/immich-app/immich-server:${IMMICH_VERSION:-v1.106.4}
    ports:
      - "2283:2283"
    volumes:
      - ${UPLOAD_LOCATION}:/usr/src/app/upload
      - /etc/localtime:/etc/localtime:ro
    env_file:
      - .env
    depends_on:
      - redis
      - database
    restart: always
    healthcheck:
      test: ["CMD-SHELL", "curl -f http://localhost:2283/api/server/ping"]
      interval: 30s
  redis:
    image: redis:6.2
  database:
    image: postgres:14
"#,
        );
        let server = &loaded.project.services["server"];
        assert_eq!(
            server.image.to_string(),
            "ghcr.io/immich-app/immich-server:${IMMICH_VERSION:-v1.106.4}"
        );
        assert_eq!(server.ports[0].published, Some(Template::literal("2283")));
        assert_eq!(server.env_files, vec![".env"]);
        let deps: Vec<&str> = server.depends_on.iter().map(|d| d.service.as_str()).collect();
        assert_eq!(deps, vec!["redis", "database"]);
        assert!(matches!(
            server.healthcheck.as_ref().map(|h| &h.test),
            Some(HealthTest::Shell(_))
        ));
        assert!(loaded.problems.is_empty());
    }

    #[test]
    fn load_value_accepts_parsed_tree() {
        let tree: Value =
            serde_yaml::from_str("services:\n  web:\n    image: nginx").expect("yaml");
        let loaded = load_value(&tree, Some("tree")).expect("should load");
        assert_eq!(loaded.project.name, "tree");
        assert!(loaded.project.services.contains_key("web"));
    }
}
