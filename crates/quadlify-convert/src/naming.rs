//! Names for bindings hoisted from host paths.

use quadlify_quadlet::VariableTable;

/// Chooses a binding name for a host path used more than once.
pub trait VariableNamer {
    /// Returns a candidate name for `path`. Collisions are resolved by the
    /// caller.
    fn name_for(&self, path: &str) -> String;
}

/// Names a path after its last segment: `/srv/media` becomes `MEDIA`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastSegmentNamer;

impl VariableNamer for LastSegmentNamer {
    fn name_for(&self, path: &str) -> String {
        let segment = path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        let name: String = segment
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        match name.chars().next() {
            None => "ROOT_PATH".to_owned(),
            Some(c) if c.is_ascii_digit() => format!("PATH_{name}"),
            Some(_) => name,
        }
    }
}

/// Returns `base`, or `base_2`, `base_3`, ... if taken.
#[must_use]
pub fn unique_name(table: &VariableTable, base: &str) -> String {
    if !table.contains(base) {
        return base.to_owned();
    }
    (2_usize..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !table.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}
