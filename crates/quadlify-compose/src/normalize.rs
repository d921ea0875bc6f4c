//! Per-field adapters from the raw document shapes to the canonical model.
//!
//! Each Compose field that accepts several forms is normalized here, once,
//! so translators never branch on the shape the user happened to write.

use indexmap::IndexMap;
use quadlify_common::diagnostic::Advisory;
use thiserror::Error;

use crate::model::{
    CommandSpec, ComposeService, Dependency, HealthCheckSpec, HealthTest, PortSpec, VolumeSpec,
};
use crate::parser::ast::{
    CommandDecl, DependsOnDecl, EnvFileDecl, EnvFileEntry, EnvironmentDecl, HealthTestDecl,
    HealthcheckDecl, LabelsDecl, NetworksDecl, PortDecl, PortLong, Scalar, ServiceDecl, VolumeDecl,
    VolumeLong,
};
use crate::parser::lexer::{Fragment, InterpolationError, Template};

/// A field whose value cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {message}")]
pub struct FieldError {
    /// Compose field name.
    pub field: &'static str,
    /// What is wrong with the value.
    pub message: String,
}

type FieldResult<T> = Result<T, FieldError>;

fn field_error(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}

fn template(field: &'static str, raw: &str) -> FieldResult<Template> {
    Template::parse(raw).map_err(|e: InterpolationError| field_error(field, e.to_string()))
}

/// Normalizes one service declaration.
///
/// The caller has already checked that `image` is present.
///
/// # Errors
///
/// Returns the first field that cannot be normalized.
pub fn normalize_service(name: &str, decl: ServiceDecl) -> FieldResult<ComposeService> {
    let mut advisories = unsupported_fields(&decl);

    let image = template("image", decl.image.as_deref().unwrap_or_default())?;
    let ports = decl
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(port)
        .collect::<FieldResult<Vec<_>>>()?;
    let volumes = volumes(decl.volumes.unwrap_or_default(), &mut advisories)?;
    let environment = match decl.environment {
        Some(env) => environment(env, &mut advisories)?,
        None => IndexMap::new(),
    };
    let labels = match decl.labels {
        Some(labels) => self::labels(labels)?,
        None => IndexMap::new(),
    };
    let networks = decl.networks.map(|n| networks(n, &mut advisories));
    let healthcheck = decl.healthcheck.map(healthcheck).transpose()?;
    if matches!(
        healthcheck,
        Some(HealthCheckSpec {
            test: HealthTest::Inherit,
            ..
        })
    ) {
        advisories.push(Advisory::new(
            "healthcheck",
            "no `test` given; the image's own check applies and the timing fields are dropped",
        ));
    }

    Ok(ComposeService {
        name: name.to_owned(),
        image,
        ports,
        volumes,
        environment,
        env_files: decl.env_file.map(env_files).unwrap_or_default(),
        depends_on: decl.depends_on.map(depends_on).unwrap_or_default(),
        healthcheck,
        networks,
        labels,
        restart: decl.restart,
        command: decl.command.map(|c| command("command", c)).transpose()?,
        entrypoint: decl.entrypoint.map(|c| command("entrypoint", c)).transpose()?,
        user: decl
            .user
            .map(|user| template("user", &user.into_string()))
            .transpose()?,
        working_dir: decl
            .working_dir
            .map(|dir| template("working_dir", &dir))
            .transpose()?,
        advisories,
    })
}

fn unsupported_fields(decl: &ServiceDecl) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if decl.build.is_some() {
        advisories.push(Advisory::new(
            "build",
            "build contexts are not converted; build and push the image, then reference it in `image`",
        ));
    }
    if decl.profiles.is_some() {
        advisories.push(Advisory::new(
            "profiles",
            "profiles are not converted; the container is always defined",
        ));
    }
    if decl.secrets.is_some() {
        advisories.push(Advisory::new(
            "secrets",
            "secrets are not converted; provide them through the host's secret store",
        ));
    }
    if decl.configs.is_some() {
        advisories.push(Advisory::new(
            "configs",
            "configs are not converted; mount the files as volumes instead",
        ));
    }
    advisories.extend(
        decl.extra
            .keys()
            .filter(|key| !key.starts_with("x-"))
            .map(Advisory::unsupported),
    );
    advisories
}

/// Normalizes one `ports` entry.
///
/// # Errors
///
/// Returns an error if the entry is not `[[HOST_IP:]HOST:]CONTAINER[/PROTO]`.
pub fn port(decl: PortDecl) -> FieldResult<PortSpec> {
    match decl {
        PortDecl::Short(scalar) => parse_short_port(&template("ports", &scalar.into_string())?),
        PortDecl::Long(long) => long_port(long),
    }
}

fn parse_short_port(spec: &Template) -> FieldResult<PortSpec> {
    let (body, protocol) = match spec.split_suffix('/') {
        Some((body, proto)) if !proto.is_empty() => (body, Some(proto)),
        Some(_) => return Err(field_error("ports", format!("empty protocol in \"{spec}\""))),
        None => (spec.clone(), None),
    };

    let mut parts = body.split_top_level(':');
    let target = parts.pop().unwrap_or_default();
    if target.is_empty() {
        return Err(field_error("ports", format!("no container port in \"{spec}\"")));
    }
    let non_empty = |t: Template| if t.is_empty() { None } else { Some(t) };
    let (host_ip, published) = match parts.len() {
        0 => (None, None),
        1 => (None, non_empty(parts.remove(0))),
        2 => {
            let published = non_empty(parts.remove(1));
            (non_empty(parts.remove(0)), published)
        }
        _ => {
            return Err(field_error(
                "ports",
                format!("expected [[HOST_IP:]HOST:]CONTAINER, got \"{spec}\""),
            ));
        }
    };

    Ok(PortSpec {
        host_ip,
        published,
        target,
        protocol,
    })
}

fn long_port(long: PortLong) -> FieldResult<PortSpec> {
    let target = template("ports", &long.target.into_string())?;
    let published = long
        .published
        .map(|p| template("ports", &p.into_string()))
        .transpose()?;
    let host_ip = long
        .host_ip
        .map(|ip| template("ports", &ip))
        .transpose()?;
    Ok(PortSpec {
        host_ip,
        published,
        target,
        protocol: long.protocol,
    })
}

fn volumes(decls: Vec<VolumeDecl>, advisories: &mut Vec<Advisory>) -> FieldResult<Vec<VolumeSpec>> {
    let mut specs = Vec::with_capacity(decls.len());
    for decl in decls {
        let spec = match decl {
            VolumeDecl::Short(raw) => Some(short_volume(&raw)?),
            VolumeDecl::Long(long) => long_volume(long, advisories)?,
        };
        specs.extend(spec);
    }
    Ok(specs)
}

fn short_volume(raw: &str) -> FieldResult<VolumeSpec> {
    let spec = template("volumes", raw)?;
    let mut parts = spec.split_top_level(':').into_iter();
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(target), None, None, None) => Ok(VolumeSpec::Anonymous { target }),
        (Some(source), Some(target), mode, None) => {
            let options = match mode {
                Some(mode) => mount_options(&mode, raw)?,
                None => Vec::new(),
            };
            classify_source(source, target, options, raw)
        }
        _ => Err(field_error(
            "volumes",
            format!("expected SOURCE:TARGET[:MODE], got \"{raw}\""),
        )),
    }
}

fn mount_options(mode: &Template, raw: &str) -> FieldResult<Vec<String>> {
    let Some(mode) = mode.as_literal() else {
        return Err(field_error(
            "volumes",
            format!("mount options must not be interpolated in \"{raw}\""),
        ));
    };
    Ok(mode
        .split(',')
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Host paths start with `/`, `.`, `~` or a variable; anything else names a volume.
fn classify_source(
    source: Template,
    target: Template,
    options: Vec<String>,
    raw: &str,
) -> FieldResult<VolumeSpec> {
    let is_path = match source.fragments().first() {
        Some(Fragment::Variable(_)) => true,
        Some(Fragment::Literal(text)) => text.starts_with(['/', '.', '~']),
        None => return Err(field_error("volumes", format!("empty source in \"{raw}\""))),
    };
    if is_path {
        return Ok(VolumeSpec::Bind {
            source,
            target,
            options,
        });
    }
    match source.as_literal() {
        Some(name) => Ok(VolumeSpec::Named {
            name: name.to_owned(),
            target,
            options,
        }),
        None => Err(field_error(
            "volumes",
            format!("volume names must not be interpolated in \"{raw}\""),
        )),
    }
}

fn long_volume(long: VolumeLong, advisories: &mut Vec<Advisory>) -> FieldResult<Option<VolumeSpec>> {
    let target = template("volumes", &long.target)?;
    let mut options = Vec::new();
    if long.read_only == Some(true) {
        options.push("ro".to_owned());
    }
    if let Some(label) = long.bind.and_then(|b| b.selinux) {
        options.push(label);
    }

    match (long.kind.as_deref(), long.source) {
        (Some("bind"), Some(source)) => Ok(Some(VolumeSpec::Bind {
            source: template("volumes", &source)?,
            target,
            options,
        })),
        (Some("volume") | None, Some(name)) => Ok(Some(VolumeSpec::Named {
            name,
            target,
            options,
        })),
        (Some("volume") | None, None) => Ok(Some(VolumeSpec::Anonymous { target })),
        (Some("bind"), None) => Err(field_error(
            "volumes",
            format!("bind mount of \"{}\" has no source", long.target),
        )),
        (Some(kind), _) => {
            advisories.push(Advisory::new(
                "volumes",
                format!("{kind} mount on \"{}\" is not converted", long.target),
            ));
            Ok(None)
        }
    }
}

fn environment(
    decl: EnvironmentDecl,
    advisories: &mut Vec<Advisory>,
) -> FieldResult<IndexMap<String, Option<Template>>> {
    let entries: Vec<(String, Option<String>)> = match decl {
        EnvironmentDecl::List(items) => items
            .into_iter()
            .map(|item| match item.split_once('=') {
                Some((key, value)) => (key.to_owned(), Some(value.to_owned())),
                None => (item, None),
            })
            .collect(),
        EnvironmentDecl::Map(map) => map
            .into_iter()
            .map(|(key, value)| (key, value.map(Scalar::into_string)))
            .collect(),
    };

    let mut environment = IndexMap::with_capacity(entries.len());
    for (key, value) in entries {
        if key.is_empty() {
            return Err(field_error("environment", "empty variable name"));
        }
        let value = match value {
            Some(raw) => Some(template("environment", &raw)?),
            None => {
                advisories.push(Advisory::new(
                    "environment",
                    format!("`{key}` has no value and would be inherited from the host; it is not converted"),
                ));
                None
            }
        };
        let _ = environment.insert(key, value);
    }
    Ok(environment)
}

fn env_files(decl: EnvFileDecl) -> Vec<String> {
    match decl {
        EnvFileDecl::Single(path) => vec![path],
        EnvFileDecl::Multiple(entries) => entries
            .into_iter()
            .map(|entry| match entry {
                EnvFileEntry::Path(path) | EnvFileEntry::Long { path } => path,
            })
            .collect(),
    }
}

fn depends_on(decl: DependsOnDecl) -> Vec<Dependency> {
    match decl {
        DependsOnDecl::List(names) => names
            .into_iter()
            .map(|service| Dependency {
                service,
                condition: None,
            })
            .collect(),
        DependsOnDecl::Map(map) => map
            .into_iter()
            .map(|(service, long)| Dependency {
                service,
                condition: Some(
                    long.and_then(|l| l.condition)
                        .unwrap_or_else(|| "service_started".to_owned()),
                ),
            })
            .collect(),
    }
}

fn healthcheck(decl: HealthcheckDecl) -> FieldResult<HealthCheckSpec> {
    let shell = |line: &str| template("healthcheck", line).map(HealthTest::Shell);
    let exec = |args: Vec<String>| {
        args.iter()
            .map(|arg| template("healthcheck", arg))
            .collect::<FieldResult<Vec<_>>>()
            .map(HealthTest::Exec)
    };
    let test = if decl.disable == Some(true) {
        HealthTest::Disabled
    } else {
        match decl.test {
            None => HealthTest::Inherit,
            Some(HealthTestDecl::Shell(line)) => shell(&line)?,
            Some(HealthTestDecl::List(mut items)) => {
                let head = items.first().cloned();
                match head.as_deref() {
                    None => HealthTest::Inherit,
                    Some("NONE") => HealthTest::Disabled,
                    Some("CMD-SHELL") => shell(&items.split_off(1).join(" "))?,
                    Some("CMD") => exec(items.split_off(1))?,
                    Some(_) => exec(items)?,
                }
            }
        }
    };
    Ok(HealthCheckSpec {
        test,
        interval: decl.interval,
        timeout: decl.timeout,
        retries: decl.retries,
        start_period: decl.start_period,
    })
}

fn networks(decl: NetworksDecl, advisories: &mut Vec<Advisory>) -> Vec<String> {
    match decl {
        NetworksDecl::List(names) => names,
        NetworksDecl::Map(map) => map
            .into_iter()
            .map(|(name, settings)| {
                let configured = settings
                    .as_ref()
                    .and_then(serde_yaml::Value::as_mapping)
                    .is_some_and(|m| !m.is_empty());
                if configured {
                    advisories.push(Advisory::new(
                        "networks",
                        format!("settings of network `{name}` (aliases, addresses) are not converted"),
                    ));
                }
                name
            })
            .collect(),
    }
}

fn labels(decl: LabelsDecl) -> FieldResult<IndexMap<String, Template>> {
    let entries: Vec<(String, String)> = match decl {
        LabelsDecl::List(items) => items
            .into_iter()
            .map(|item| match item.split_once('=') {
                Some((key, value)) => (key.to_owned(), value.to_owned()),
                None => (item, String::new()),
            })
            .collect(),
        LabelsDecl::Map(map) => map
            .into_iter()
            .map(|(key, value)| {
                let value = value
                    .map(Scalar::into_string)
                    .unwrap_or_default();
                (key, value)
            })
            .collect(),
    };

    let mut labels = IndexMap::with_capacity(entries.len());
    for (key, value) in entries {
        let _ = labels.insert(key, template("labels", &value)?);
    }
    Ok(labels)
}

fn command(field: &'static str, decl: CommandDecl) -> FieldResult<CommandSpec> {
    match decl {
        CommandDecl::Shell(line) => template(field, &line).map(CommandSpec::Shell),
        CommandDecl::Exec(args) => args
            .iter()
            .map(|arg| template(field, arg))
            .collect::<FieldResult<Vec<_>>>()
            .map(CommandSpec::Exec),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn decl(yaml: &str) -> ServiceDecl {
        serde_yaml::from_str(yaml).expect("should deserialize")
    }

    fn normalize(yaml: &str) -> ComposeService {
        normalize_service("svc", decl(yaml)).expect("should normalize")
    }

    fn short_port(raw: &str) -> PortSpec {
        port(PortDecl::Short(Scalar::String(raw.into()))).expect("should parse port")
    }

    #[test]
    fn port_with_host_and_protocol() {
        let spec = short_port("8080:80/udp");
        assert_eq!(spec.host_ip, None);
        assert_eq!(spec.published, Some(Template::literal("8080")));
        assert_eq!(spec.target, Template::literal("80"));
        assert_eq!(spec.protocol.as_deref(), Some("udp"));
    }

    #[test]
    fn port_with_bind_address() {
        let spec = short_port("0.0.0.0:443:8443");
        assert_eq!(spec.host_ip, Some(Template::literal("0.0.0.0")));
        assert_eq!(spec.published, Some(Template::literal("443")));
    }

    #[test]
    fn port_with_ipv6_bind_address() {
        let spec = short_port("[::1]:5432:5432");
        assert_eq!(spec.host_ip, Some(Template::literal("[::1]")));
    }

    #[test]
    fn port_numeric_is_container_only() {
        let spec = port(PortDecl::Short(Scalar::Integer(80))).expect("should parse");
        assert_eq!(spec.published, None);
        assert_eq!(spec.target, Template::literal("80"));
    }

    #[test]
    fn port_with_too_many_parts_fails() {
        let err = port(PortDecl::Short(Scalar::String("1:2:3:4".into()))).unwrap_err();
        assert_eq!(err.field, "ports");
    }

    #[test]
    fn volume_classification() {
        let service = normalize(
            "image: x\nvolumes:\n  - /srv/data:/data\n  - ./conf:/conf:ro\n  - ${UPLOAD}:/up\n  - pgdata:/var/lib/postgresql\n  - /cache",
        );
        assert!(matches!(service.volumes[0], VolumeSpec::Bind { .. }));
        assert!(
            matches!(&service.volumes[1], VolumeSpec::Bind { options, .. } if options == &["ro"])
        );
        assert!(matches!(service.volumes[2], VolumeSpec::Bind { .. }));
        assert!(matches!(&service.volumes[3], VolumeSpec::Named { name, .. } if name == "pgdata"));
        assert!(matches!(service.volumes[4], VolumeSpec::Anonymous { .. }));
    }

    #[test]
    fn long_volume_forms() {
        let service = normalize(
            "image: x\nvolumes:\n  - type: bind\n    source: /srv\n    target: /srv\n    read_only: true\n  - type: tmpfs\n    target: /tmp",
        );
        assert_eq!(service.volumes.len(), 1);
        assert!(
            matches!(&service.volumes[0], VolumeSpec::Bind { options, .. } if options == &["ro"])
        );
        assert!(service.advisories.iter().any(|a| a.message.contains("tmpfs")));
    }

    #[test]
    fn environment_list_and_host_passthrough() {
        let service = normalize("image: x\nenvironment: [\"A=1=2\", B]");
        assert_eq!(service.environment["A"], Some(Template::literal("1=2")));
        assert_eq!(service.environment["B"], None);
        assert!(service.advisories.iter().any(|a| a.field == "environment"));
    }

    #[test]
    fn depends_on_map_records_condition() {
        let service = normalize("image: x\ndepends_on:\n  db:\n    condition: service_healthy\n  cache:");
        assert_eq!(
            service.depends_on,
            vec![
                Dependency {
                    service: "db".into(),
                    condition: Some("service_healthy".into()),
                },
                Dependency {
                    service: "cache".into(),
                    condition: Some("service_started".into()),
                },
            ]
        );
    }

    #[test]
    fn healthcheck_test_forms() {
        let cmd = normalize("image: x\nhealthcheck:\n  test: [\"CMD\", \"pg_isready\", \"-U\", \"pg\"]");
        assert_eq!(
            cmd.healthcheck.map(|h| h.test),
            Some(HealthTest::Exec(vec![
                Template::literal("pg_isready"),
                Template::literal("-U"),
                Template::literal("pg"),
            ]))
        );

        let shell = normalize("image: x\nhealthcheck:\n  test: [\"CMD-SHELL\", \"curl -f localhost\"]");
        assert_eq!(
            shell.healthcheck.map(|h| h.test),
            Some(HealthTest::Shell(Template::literal("curl -f localhost")))
        );

        let none = normalize("image: x\nhealthcheck:\n  test: [\"NONE\"]");
        assert_eq!(none.healthcheck.map(|h| h.test), Some(HealthTest::Disabled));

        let disabled = normalize("image: x\nhealthcheck:\n  disable: true\n  test: true-cmd");
        assert_eq!(disabled.healthcheck.map(|h| h.test), Some(HealthTest::Disabled));
    }

    #[test]
    fn networks_absent_versus_listed() {
        assert_eq!(normalize("image: x").networks, None);
        let listed = normalize("image: x\nnetworks:\n  front:\n  back:\n    aliases: [b]");
        assert_eq!(listed.networks, Some(vec!["front".into(), "back".into()]));
        assert!(listed.advisories.iter().any(|a| a.field == "networks"));
    }

    #[test]
    fn labels_list_and_map() {
        let list = normalize("image: x\nlabels: [\"a=1\", flag]");
        assert_eq!(list.labels["a"], Template::literal("1"));
        assert_eq!(list.labels["flag"], Template::literal(""));

        let map = normalize("image: x\nlabels:\n  traefik.enable: true");
        assert_eq!(map.labels["traefik.enable"], Template::literal("true"));
    }

    #[test]
    fn unsupported_fields_become_advisories() {
        let service = normalize(
            "image: x\nbuild: .\nprofiles: [debug]\nsecrets: [token]\nconfigs: [cfg]\ncap_add: [NET_ADMIN]\nx-meta: 1",
        );
        let fields: Vec<&str> = service.advisories.iter().map(|a| a.field.as_str()).collect();
        assert_eq!(fields, vec!["build", "profiles", "secrets", "configs", "cap_add"]);
    }

    #[test]
    fn process_fields_are_interpolated() {
        let service = normalize(
            "image: x\ncommand: [\"postgres\", \"-c\", \"x=$${HOME}\"]\nuser: ${PUID:-1000}\nworking_dir: /srv/${APP}\nhealthcheck:\n  test: pg_isready --dbname=${DB_NAME}",
        );
        let Some(CommandSpec::Exec(args)) = &service.command else {
            panic!("expected exec form");
        };
        assert_eq!(args[2].as_literal(), Some("x=${HOME}"));
        assert_eq!(service.user.as_ref().map(ToString::to_string).as_deref(), Some("${PUID:-1000}"));
        assert!(service.working_dir.as_ref().is_some_and(|dir| dir.variables().count() == 1));
        let Some(HealthTest::Shell(line)) = service.healthcheck.map(|h| h.test) else {
            panic!("expected shell form");
        };
        assert_eq!(line.variables().map(|v| v.name.as_str()).collect::<Vec<_>>(), vec!["DB_NAME"]);
    }

    #[test]
    fn malformed_command_interpolation_is_rejected() {
        let err = normalize_service("svc", decl("image: x\ncommand: echo ${BROKEN")).unwrap_err();
        assert_eq!(err.field, "command");
    }

    #[test]
    fn malformed_interpolation_names_field() {
        let err = normalize_service("svc", decl("image: \"app:${TAG\"")).unwrap_err();
        assert_eq!(err.field, "image");
    }
}
