use cronjob_core::{CronJob, CronJobError, CronJobStore, NamespacedName, Result};
use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, ListParams};
use kube::Client;

/// [`CronJobStore`] backed by the Kubernetes API server.
///
/// Every call goes to the API server; nothing is served from a local cache.
/// `kube::Client` is cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl CronJobStore for KubeStore {
    async fn get_cron_job(&self, key: &NamespacedName) -> Result<CronJob> {
        let api: Api<CronJob> = Api::namespaced(self.client.clone(), &key.namespace);
        api.get(&key.name)
            .await
            .map_err(|e| not_found_or(e, "CronJob", key))
    }

    async fn list_jobs(&self, namespace: &str) -> Result<Vec<Job>> {
        let api: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}

/// Map an HTTP 404 to [`CronJobError::NotFound`]; keep every other error intact.
pub(crate) fn not_found_or(err: kube::Error, kind: &'static str, key: &NamespacedName) -> CronJobError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => CronJobError::NotFound {
            kind,
            key: key.to_string(),
        },
        other => CronJobError::Kube(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("cronjobs.batch.tutorial.kubebuilder.io: {reason}"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn maps_404_to_not_found() {
        let key = NamespacedName::new("default", "missing");
        let err = not_found_or(api_error(404, "NotFound"), "CronJob", &key);
        assert!(matches!(err, CronJobError::NotFound { kind: "CronJob", .. }));
        assert_eq!(err.to_string(), "CronJob not found: default/missing");
    }

    #[test]
    fn keeps_other_api_errors() {
        let key = NamespacedName::new("default", "nightly");
        for code in [401, 403, 409, 500, 503] {
            let err = not_found_or(api_error(code, "Other"), "CronJob", &key);
            assert!(!err.is_not_found());
            assert!(matches!(err, CronJobError::Kube(kube::Error::Api(ref r)) if r.code == code));
        }
    }
}
