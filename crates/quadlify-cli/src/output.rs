//! Formatted output helpers for CLI commands.
//!
//! Keeps the problem report and summary lines identical across `convert`
//! and `plan`.

use std::io::{self, Write};

use quadlify_convert::Conversion;

/// Returns `"1 service"` or `"3 services"`.
#[must_use]
pub fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// One-line summary of a conversion.
#[must_use]
pub fn summary(conversion: &Conversion) -> String {
    let project = &conversion.project;
    format!(
        "{}: {}, {}, {}, {}, {}",
        project.name,
        count(project.containers.len(), "container", "containers"),
        count(project.networks.len(), "network", "networks"),
        count(project.variables.len(), "variable", "variables"),
        count(conversion.advisory_count(), "advisory", "advisories"),
        count(conversion.problems.len(), "problem", "problems"),
    )
}

/// Writes every problem, one per line, prefixed with `problem:`.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_problems(out: &mut impl Write, conversion: &Conversion) -> io::Result<()> {
    for problem in &conversion.problems {
        writeln!(out, "problem: {problem}")?;
    }
    Ok(())
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
    fn count_pluralizes() {
        assert_eq!(count(1, "network", "networks"), "1 network");
        assert_eq!(count(0, "network", "networks"), "0 networks");
        assert_eq!(count(2, "advisory", "advisories"), "2 advisories");
    }

    #[test]
    fn summary_counts_everything() {
        let conversion = convert(
            "services:\n  a:\n    image: x\n    profiles: [debug]\n  b:\n    image: y\n    depends_on: [ghost]",
        );
        assert_eq!(
            summary(&conversion),
            "demo: 2 containers, 1 network, 0 variables, 1 advisory, 1 problem"
        );
    }

    #[test]
    fn problems_are_prefixed() {
        let conversion = convert("services:\n  a:\n    image: x\n    depends_on: [ghost]");
        let mut out = Vec::new();
        write_problems(&mut out, &conversion).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "problem: service \"a\" depends on undefined service \"ghost\"\n"
        );
    }
}
