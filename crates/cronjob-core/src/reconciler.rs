//! The CronJob reconciler.
//!
//! `reconcile` is called for a [`NamespacedName`] whenever the CronJob or one
//! of its jobs may have changed. Delivery is at-least-once, so every pass
//! starts from a fresh read and must be safe to repeat.

use crate::clock::Clock;
use crate::error::{ignore_not_found, CronJobError, Result};
use crate::key::NamespacedName;
use crate::marker::ChildIndex;
use crate::store::CronJobStore;
use crate::types::CronJob;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Outcome / Observation
// ---------------------------------------------------------------------------

/// What the caller should do after a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do until the next change notification.
    Done,
    /// Run again after the given delay even without a notification.
    RequeueAfter(Duration),
}

impl Outcome {
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Outcome::Done => None,
            Outcome::RequeueAfter(d) => Some(*d),
        }
    }
}

/// State read during one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub cron_job: CronJob,
    pub children: ChildIndex,
    pub observed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler<S, C> {
    store: S,
    clock: C,
    request_timeout: Duration,
}

impl<S: CronJobStore, C: Clock> Reconciler<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Bring the CronJob addressed by `key` closer to its desired state.
    ///
    /// A CronJob that no longer exists yields [`Outcome::Done`] with no error:
    /// it was deleted after the notification was queued, and retrying cannot
    /// bring it back. Any other failure is returned as-is so the caller can
    /// back off and retry.
    pub async fn reconcile(&self, key: &NamespacedName) -> Result<Outcome> {
        let observation = self.observe(key).await?;
        Ok(self.converge(key, observation.as_ref()))
    }

    /// Decide the outcome for state read by [`Reconciler::observe`].
    ///
    /// Convergence only reads for now; nothing here writes to the cluster.
    pub fn converge(&self, key: &NamespacedName, observation: Option<&Observation>) -> Outcome {
        let Some(observation) = observation else {
            debug!(cronjob = %key, "cronjob not found, nothing to do");
            return Outcome::Done;
        };

        info!(
            cronjob = %key,
            children = observation.children.len(),
            unmarked = observation.children.unmarked(),
            last_scheduled = ?observation.children.most_recent(),
            suspended = observation.cron_job.spec.is_suspended(),
            "reconciled"
        );
        Outcome::Done
    }

    /// Read the CronJob and its children. `Ok(None)` when the CronJob is gone.
    pub async fn observe(&self, key: &NamespacedName) -> Result<Option<Observation>> {
        let fetched = self.bounded(key, self.store.get_cron_job(key)).await;
        let Some(cron_job) = ignore_not_found(fetched)? else {
            return Ok(None);
        };

        // TODO: read children from an owner-indexed reflector store once the
        // convergence step creates jobs; this lists the whole namespace per pass.
        let jobs = self
            .bounded(key, self.store.list_jobs(&key.namespace))
            .await?;
        let children = ChildIndex::build(&cron_job, &jobs);

        Ok(Some(Observation {
            cron_job,
            children,
            observed_at: self.clock.now(),
        }))
    }

    async fn bounded<T>(
        &self,
        key: &NamespacedName,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CronJobError::Timeout {
                key: key.to_string(),
                after: self.request_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::store::MemoryStore;
    use crate::types::CronJobSpec;
    use chrono::TimeZone;
    use kube::core::ErrorResponse;

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn nightly() -> CronJob {
        let mut cj = CronJob::new(
            "nightly",
            CronJobSpec {
                schedule: "0 0 * * *".to_string(),
                starting_deadline_seconds: None,
                concurrency_policy: Default::default(),
                suspend: None,
                job_template: Default::default(),
                successful_jobs_history_limit: None,
                failed_jobs_history_limit: None,
            },
        );
        cj.metadata.namespace = Some("default".to_string());
        cj.metadata.uid = Some("uid-nightly".to_string());
        cj
    }

    fn reconciler() -> Reconciler<MemoryStore, FakeClock> {
        Reconciler::new(MemoryStore::new(), FakeClock::new(new_year()))
    }

    #[tokio::test]
    async fn missing_resource_is_done() {
        let r = reconciler();
        let outcome = r
            .reconcile(&NamespacedName::new("default", "missing"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(outcome.requeue_after(), None);
    }

    #[tokio::test]
    async fn other_errors_propagate() {
        let r = reconciler();
        r.store().put_cron_job(nightly()).unwrap();
        r.store()
            .fail_next(CronJobError::Kube(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "cronjobs is forbidden".to_string(),
                reason: "Forbidden".to_string(),
                code: 403,
            })));
        let err = r
            .reconcile(&NamespacedName::new("default", "nightly"))
            .await
            .unwrap_err();
        assert!(matches!(err, CronJobError::Kube(kube::Error::Api(ref resp)) if resp.code == 403));
    }

    #[tokio::test]
    async fn observe_stamps_clock_time() {
        let r = reconciler();
        r.store().put_cron_job(nightly()).unwrap();
        let obs = r
            .observe(&NamespacedName::new("default", "nightly"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(obs.observed_at, new_year());
        assert!(obs.children.is_empty());
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let r = reconciler().with_request_timeout(Duration::from_millis(20));
        r.store().put_cron_job(nightly()).unwrap();
        r.store().set_latency(Some(Duration::from_millis(500)));
        let err = r
            .reconcile(&NamespacedName::new("default", "nightly"))
            .await
            .unwrap_err();
        assert!(matches!(err, CronJobError::Timeout { .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn dropped_pass_leaves_store_usable() {
        let r = reconciler();
        r.store().put_cron_job(nightly()).unwrap();
        r.store().set_latency(Some(Duration::from_millis(500)));
        let key = NamespacedName::new("default", "nightly");

        let cut_short =
            tokio::time::timeout(Duration::from_millis(20), r.reconcile(&key)).await;
        assert!(cut_short.is_err());
        assert_eq!(r.store().fetches(), 1);

        r.store().set_latency(None);
        assert_eq!(r.reconcile(&key).await.unwrap(), Outcome::Done);
        assert_eq!(r.store().fetches(), 2);
        assert_eq!(r.store().peek_cron_job(&key), Some(nightly()));
    }

    #[tokio::test]
    async fn converge_uses_the_given_observation() {
        let r = reconciler();
        r.store().put_cron_job(nightly()).unwrap();
        let key = NamespacedName::new("default", "nightly");

        let obs = r.observe(&key).await.unwrap();
        assert_eq!(r.converge(&key, obs.as_ref()), Outcome::Done);
        assert_eq!(r.converge(&key, None), Outcome::Done);
        assert_eq!(r.store().fetches(), 1);
    }

    #[test]
    fn requeue_after_exposes_delay() {
        let o = Outcome::RequeueAfter(Duration::from_secs(9));
        assert_eq!(o.requeue_after(), Some(Duration::from_secs(9)));
    }
}
