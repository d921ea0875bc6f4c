//! `volumes` → `volumes`, with SELinux relabeling of bind mounts.

use quadlify_common::config::ConvertOptions;
use quadlify_common::constants::RELABEL_SUPPRESSING_OPTIONS;
use quadlify_compose::Template;
use quadlify_compose::model::VolumeSpec;
use quadlify_quadlet::Text;

use crate::variables::Bindings;

/// Translates one mount.
///
/// Bind mounts get the relabel option unless they already carry `z`, `Z`
/// or `ro`, or their source is a system path. Translating an already
/// relabeled mount leaves it unchanged.
#[must_use]
pub fn volume(spec: &VolumeSpec, bindings: &Bindings, options: &ConvertOptions) -> Text {
    match spec {
        VolumeSpec::Bind {
            source,
            target,
            options: mount_options,
        } => {
            let mut mount_options = mount_options.clone();
            if needs_relabel(source, &mount_options, options) {
                mount_options.push(options.selinux_label.clone());
            }
            mount(bindings.bind_source(source), target, &mount_options, bindings)
        }
        VolumeSpec::Named {
            name,
            target,
            options: mount_options,
        } => mount(Text::literal(name.as_str()), target, mount_options, bindings),
        VolumeSpec::Anonymous { target } => bindings.substitute(target),
    }
}

fn mount(source: Text, target: &Template, mount_options: &[String], bindings: &Bindings) -> Text {
    let mut text = source;
    text.push_str(":");
    text.append(&bindings.substitute(target));
    if !mount_options.is_empty() {
        text.push_str(":");
        text.push_str(&mount_options.join(","));
    }
    text
}

fn needs_relabel(source: &Template, mount_options: &[String], options: &ConvertOptions) -> bool {
    let suppressed = mount_options.iter().any(|o| {
        RELABEL_SUPPRESSING_OPTIONS.contains(&o.as_str()) || *o == options.selinux_label
    });
    if suppressed || options.selinux_label.is_empty() {
        return false;
    }
    let Some(path) = source.as_literal() else {
        return true;
    };
    !options
        .relabel_exempt_prefixes
        .iter()
        .any(|prefix| is_under(path, prefix))
}

fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
