//! `labels`, plus the update-monitoring label.

use indexmap::IndexMap;
use quadlify_common::config::MonitorLabel;
use quadlify_compose::{Fragment, Template};
use quadlify_quadlet::Text;

use crate::variables::Bindings;

/// Translates labels and appends the monitoring label when the image
/// follows a versioned tag.
#[must_use]
pub fn labels(
    labels: &IndexMap<String, Template>,
    image: &Template,
    bindings: &Bindings,
    monitor: Option<&MonitorLabel>,
) -> IndexMap<String, Text> {
    let mut translated: IndexMap<String, Text> = labels
        .iter()
        .map(|(key, value)| (key.clone(), bindings.substitute(value)))
        .collect();
    if let Some(monitor) = monitor {
        if !translated.contains_key(&monitor.key) && tracks_versions(image) {
            let _ = translated.insert(monitor.key.clone(), Text::literal(monitor.pattern.as_str()));
        }
    }
    translated
}

/// Returns true unless the image pins `latest`, no tag, a digest, or a tag
/// without a digit.
///
/// Variables resolve to their defaults. A variable without one is assumed to
/// hold a version when it appears in the tag.
#[must_use]
pub fn tracks_versions(image: &Template) -> bool {
    let mut reference = String::new();
    let mut unresolved = Vec::new();
    for fragment in image.fragments() {
        match fragment {
            Fragment::Literal(text) => reference.push_str(text),
            Fragment::Variable(var) => {
                match var.default_value().and_then(Template::resolve_defaults) {
                    Some(value) => reference.push_str(&value),
                    None => unresolved.push(reference.len()),
                }
            }
        }
    }
    if reference.contains('@') {
        return false;
    }
    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    let Some(colon) = reference[name_start..].find(':').map(|i| name_start + i) else {
        return false;
    };
    if unresolved.iter().any(|&at| at > colon) {
        return true;
    }
    let tag = &reference[colon + 1..];
    tag != "latest" && tag.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(image: &str, user: &[(&str, &str)]) -> IndexMap<String, Text> {
        let user = user
            .iter()
            .map(|(k, v)| ((*k).to_owned(), Template::literal(*v)))
            .collect();
        let image = Template::parse(image).expect("parse");
        labels(&user, &image, &Bindings::default(), Some(&MonitorLabel::default()))
    }

    #[test]
    fn versioned_image_gets_monitor_label() {
        let labels = translate("ghcr.io/immich-app/immich-server:${IMMICH_VERSION:-v1.106.4}", &[]);
        assert_eq!(labels["wud.tag.include"].to_string(), r"^v\d+\.\d+\.\d+$");
    }

    #[test]
    fn unversioned_images_are_skipped() {
        for image in ["nginx", "nginx:latest", "redis:alpine", "pg@sha256:abc1", "localhost:5000/app"] {
            assert!(translate(image, &[]).is_empty(), "{image}");
        }
    }

    #[test]
    fn variable_tag_without_default_is_versioned() {
        for image in ["app:${APP_VERSION}", "${REGISTRY}/app:${TAG}", "app:v${MAJOR}"] {
            assert!(tracks_versions(&Template::parse(image).expect("parse")), "{image}");
            assert!(translate(image, &[]).contains_key("wud.tag.include"), "{image}");
        }
    }

    #[test]
    fn variable_outside_the_tag_is_not_a_version() {
        for image in ["app:${TAG:-latest}", "${IMAGE}", "${REGISTRY:-ghcr.io}/app"] {
            assert!(!tracks_versions(&Template::parse(image).expect("parse")), "{image}");
        }
    }

    #[test]
    fn user_label_wins() {
        let labels = translate("app:1.0", &[("wud.tag.include", "^1\\.")]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["wud.tag.include"].to_string(), "^1\\.");
    }

    #[test]
    fn user_labels_keep_order() {
        let labels = translate("app:2.1", &[("b", "1"), ("a", "2")]);
        let keys: Vec<&String> = labels.keys().collect();
        assert_eq!(keys, vec!["b", "a", "wud.tag.include"]);
    }

    #[test]
    fn disabled_monitor_adds_nothing() {
        let image = Template::literal("app:1.0");
        let labels = labels(&IndexMap::new(), &image, &Bindings::default(), None);
        assert!(labels.is_empty());
    }
}
