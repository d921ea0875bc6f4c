//! `command`, `entrypoint`, `user` and `working_dir`.

use quadlify_compose::model::CommandSpec;
use quadlify_quadlet::{Segment, Text};

use crate::variables::Bindings;

/// Translates `command` into `exec`: a command line whose arguments are
/// quoted the way systemd splits them.
#[must_use]
pub fn exec(command: &CommandSpec, bindings: &Bindings) -> Text {
    match command {
        CommandSpec::Shell(line) => bindings.substitute(line),
        CommandSpec::Exec(args) => {
            let mut line = Text::new();
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    line.push_str(" ");
                }
                line.append(&quote_arg(&bindings.substitute(arg)));
            }
            line
        }
    }
}

/// Translates `entrypoint`. A multi-argument exec form becomes a JSON
/// array, which podman accepts for `--entrypoint`.
#[must_use]
pub fn entrypoint(entrypoint: &CommandSpec, bindings: &Bindings) -> Text {
    match entrypoint {
        CommandSpec::Shell(line) => bindings.substitute(line),
        CommandSpec::Exec(args) => match args.as_slice() {
            [single] => bindings.substitute(single),
            _ => json_array(&args.iter().map(|a| bindings.substitute(a)).collect::<Vec<_>>()),
        },
    }
}

/// Builds a JSON string array whose elements may reference bindings.
#[must_use]
pub fn json_array(args: &[Text]) -> Text {
    let mut out = Text::literal("[");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(",");
        }
        out.push_str("\"");
        for segment in arg.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(&json_escape(text)),
                Segment::Variable(name) => out.push_variable(name.clone()),
            }
        }
        out.push_str("\"");
    }
    out.push_str("]");
    out
}

fn json_escape(text: &str) -> String {
    let quoted = serde_json::Value::from(text).to_string();
    quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map_or_else(|| quoted.clone(), str::to_owned)
}

fn quote_arg(arg: &Text) -> Text {
    let plain = !arg.is_empty()
        && arg.segments().iter().all(|segment| match segment {
            Segment::Literal(text) => !text
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\')),
            Segment::Variable(_) => true,
        });
    if plain {
        return arg.clone();
    }
    let mut quoted = Text::literal("\"");
    for segment in arg.segments() {
        match segment {
            Segment::Literal(text) => {
                quoted.push_str(&text.replace('\\', "\\\\").replace('"', "\\\""));
            }
            Segment::Variable(name) => quoted.push_variable(name.clone()),
        }
    }
    quoted.push_str("\"");
    quoted
}
