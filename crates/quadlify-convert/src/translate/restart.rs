//! `restart` → `serviceConfig.Restart`.

use quadlify_quadlet::model::RestartPolicy;

/// Any Compose restart policy except `no` restarts always.
#[must_use]
pub fn restart_policy(restart: Option<&str>) -> Option<RestartPolicy> {
    match restart.map(str::trim) {
        None | Some("" | "no") => None,
        Some(_) => Some(RestartPolicy::Always),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_policy_but_no_maps_to_always() {
        for policy in ["always", "unless-stopped", "on-failure", "on-failure:3"] {
            assert_eq!(restart_policy(Some(policy)), Some(RestartPolicy::Always), "{policy}");
        }
        assert_eq!(restart_policy(Some("no")), None);
        assert_eq!(restart_policy(None), None);
    }
}
