//! Permissions the controller needs. Enforcement happens in the API server;
//! this table only renders the grant.

use crate::types::API_GROUP;
use k8s_openapi::api::rbac::v1::{ClusterRole, PolicyRule};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub const DEFAULT_ROLE_NAME: &str = "cronjob-controller";

const FULL: &[&str] = &["get", "list", "watch", "create", "update", "patch", "delete"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub group: &'static str,
    pub resource: &'static str,
    pub verbs: &'static [&'static str],
}

pub const PERMISSIONS: &[Permission] = &[
    Permission {
        group: API_GROUP,
        resource: "cronjobs",
        verbs: FULL,
    },
    Permission {
        group: API_GROUP,
        resource: "cronjobs/status",
        verbs: &["get", "update", "patch"],
    },
    Permission {
        group: API_GROUP,
        resource: "cronjobs/finalizers",
        verbs: &["update"],
    },
    Permission {
        group: "batch",
        resource: "jobs",
        verbs: FULL,
    },
    Permission {
        group: "batch",
        resource: "jobs/status",
        verbs: &["get"],
    },
];

/// Whether the grant covers `verb` on `group`/`resource`.
pub fn allows(group: &str, resource: &str, verb: &str) -> bool {
    PERMISSIONS
        .iter()
        .any(|p| p.group == group && p.resource == resource && p.verbs.contains(&verb))
}

impl Permission {
    fn to_rule(self) -> PolicyRule {
        PolicyRule {
            api_groups: Some(vec![self.group.to_string()]),
            resources: Some(vec![self.resource.to_string()]),
            verbs: self.verbs.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }
}

pub fn cluster_role(name: &str) -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        rules: Some(PERMISSIONS.iter().map(|p| p.to_rule()).collect()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_reads_are_granted() {
        assert!(allows(API_GROUP, "cronjobs", "get"));
        assert!(allows("batch", "jobs", "list"));
        assert!(allows("batch", "jobs/status", "get"));
    }

    #[test]
    fn narrow_subresources() {
        assert!(allows(API_GROUP, "cronjobs/status", "patch"));
        assert!(!allows(API_GROUP, "cronjobs/status", "delete"));
        assert!(allows(API_GROUP, "cronjobs/finalizers", "update"));
        assert!(!allows(API_GROUP, "cronjobs/finalizers", "get"));
        assert!(!allows("batch", "jobs/status", "update"));
        assert!(!allows("", "pods", "get"));
    }

    #[test]
    fn cluster_role_has_one_rule_per_permission() {
        let role = cluster_role(DEFAULT_ROLE_NAME);
        assert_eq!(role.metadata.name.as_deref(), Some(DEFAULT_ROLE_NAME));
        let rules = role.rules.unwrap();
        assert_eq!(rules.len(), PERMISSIONS.len());
        assert_eq!(rules[3].api_groups, Some(vec!["batch".to_string()]));
        assert_eq!(rules[3].verbs.len(), 7);
    }
}
