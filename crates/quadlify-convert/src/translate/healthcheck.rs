//! `healthcheck` → `healthCmd` and its timing settings.

use quadlify_compose::model::{HealthCheckSpec, HealthTest};
use quadlify_quadlet::model::HealthCheck;

use super::process::json_array;
use crate::variables::Bindings;

/// Translates a health check. Disabled checks and checks without a test
/// produce no section.
///
/// Exec-form tests become a JSON argument array, which podman runs without
/// a shell; shell-form tests are passed as a command line.
#[must_use]
pub fn health_check(spec: &HealthCheckSpec, bindings: &Bindings) -> Option<HealthCheck> {
    let command = match &spec.test {
        HealthTest::Inherit | HealthTest::Disabled => return None,
        HealthTest::Shell(line) if line.as_literal().is_some_and(|l| l.trim().is_empty()) => {
            return None;
        }
        HealthTest::Shell(line) => bindings.substitute(line),
        HealthTest::Exec(args) if args.is_empty() => return None,
        HealthTest::Exec(args) => {
            json_array(&args.iter().map(|a| bindings.substitute(a)).collect::<Vec<_>>())
        }
    };
    Some(HealthCheck {
        command,
        interval: spec.interval.clone(),
        timeout: spec.timeout.clone(),
        retries: spec.retries,
        start_period: spec.start_period.clone(),
    })
}

#[cfg(test)]
mod tests {
    use quadlify_compose::Template;
    use quadlify_compose::parser::parse_compose;

    use super::*;
    use crate::variables;

    fn spec(test: HealthTest) -> HealthCheckSpec {
        HealthCheckSpec {
            test,
            interval: Some("30s".into()),
            timeout: Some("10s".into()),
            retries: Some(5),
            start_period: Some("1m".into()),
        }
    }

    #[test]
    fn shell_test_maps_one_to_one() {
        let check = health_check(
            &spec(HealthTest::Shell(Template::literal("redis-cli ping"))),
            &Bindings::default(),
        )
        .expect("should translate");
        assert_eq!(check.command.to_string(), "redis-cli ping");
        assert_eq!(check.interval.as_deref(), Some("30s"));
        assert_eq!(check.timeout.as_deref(), Some("10s"));
        assert_eq!(check.retries, Some(5));
        assert_eq!(check.start_period.as_deref(), Some("1m"));
    }

    #[test]
    fn exec_test_becomes_json_array() {
        let test = HealthTest::Exec(vec![
            Template::literal("pg_isready"),
            Template::literal("-U"),
            Template::literal("postgres"),
        ]);
        let check = health_check(&spec(test), &Bindings::default()).expect("should translate");
        assert_eq!(check.command.to_string(), r#"["pg_isready","-U","postgres"]"#);
    }

    #[test]
    fn interpolated_test_uses_bindings() {
        let loaded = parse_compose(
            "services:\n  db:\n    image: pg\n    environment:\n      POSTGRES_DB: ${DB_NAME:-immich}\n    healthcheck:\n      test: pg_isready --dbname=${DB_NAME}",
            Some("demo"),
        )
        .expect("should load");
        let bindings = variables::extract(
            &loaded.project,
            &quadlify_common::config::ConvertOptions::default(),
            &crate::LastSegmentNamer,
        );
        let healthcheck = loaded.project.services["db"]
            .healthcheck
            .as_ref()
            .expect("declared");
        let check = health_check(healthcheck, &bindings).expect("should translate");
        assert_eq!(check.command.variables().collect::<Vec<_>>(), vec!["DB_NAME"]);
        assert_eq!(check.command.to_string(), "pg_isready --dbname=${DB_NAME}");
    }

    #[test]
    fn disabled_and_inherited_checks_produce_nothing() {
        let bindings = Bindings::default();
        assert!(health_check(&spec(HealthTest::Disabled), &bindings).is_none());
        assert!(health_check(&spec(HealthTest::Inherit), &bindings).is_none());
        assert!(health_check(&spec(HealthTest::Exec(Vec::new())), &bindings).is_none());
    }
}
