use crate::error::{CronJobError, Result};
use kube::{Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of a namespaced object. This is the whole reconciliation request:
/// it carries no object data, so the reconciler always reads fresh state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key for a namespaced object. Cluster-scoped objects are rejected.
    pub fn from_resource<K: Resource>(obj: &K) -> Result<Self> {
        let name = obj.name_any();
        match obj.namespace() {
            Some(ns) => Ok(Self::new(ns, name)),
            None => Err(CronJobError::MissingNamespace(name)),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for NamespacedName {
    type Err = CronJobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(ns, name))
            }
            _ => Err(CronJobError::InvalidKey(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::Job;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn display_and_parse() {
        let key = NamespacedName::new("default", "nightly");
        assert_eq!(key.to_string(), "default/nightly");
        let parsed: NamespacedName = "default/nightly".parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "nightly", "/nightly", "default/", "a/b/c"] {
            assert!(
                bad.parse::<NamespacedName>().is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn from_resource_requires_namespace() {
        let mut job = Job {
            metadata: ObjectMeta {
                name: Some("nightly-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            NamespacedName::from_resource(&job),
            Err(CronJobError::MissingNamespace(_))
        ));

        job.metadata.namespace = Some("batch".to_string());
        let key = NamespacedName::from_resource(&job).unwrap();
        assert_eq!(key, NamespacedName::new("batch", "nightly-1"));
    }
}
