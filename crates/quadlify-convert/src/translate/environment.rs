//! `env_file` and `environment`.

use indexmap::IndexMap;
use quadlify_compose::Template;
use quadlify_quadlet::Text;
use quadlify_quadlet::model::EnvironmentFile;
use quadlify_quadlet::render::attr_name;

use crate::variables::Bindings;

/// Points every environment file at a secret named after the service.
///
/// The first file uses `<service>_env`; further files are numbered
/// `<service>_env_2`, `<service>_env_3`, ...
#[must_use]
pub fn environment_files(service: &str, files: &[String], template: &str) -> Vec<EnvironmentFile> {
    files
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let secret_name = match index {
                0 => format!("{service}_env"),
                n => format!("{service}_env_{}", n + 1),
            };
            EnvironmentFile {
                source: source.clone(),
                secret: template.replace("{name}", &attr_name(&secret_name)),
            }
        })
        .collect()
}

/// Translates inline environment entries. Entries without a value are
/// skipped; the loader has already flagged them.
#[must_use]
pub fn environments(
    environment: &IndexMap<String, Option<Template>>,
    bindings: &Bindings,
) -> IndexMap<String, Text> {
    environment
        .iter()
        .filter_map(|(key, value)| Some((key.clone(), bindings.substitute(value.as_ref()?))))
        .collect()
}
