//! Read access to cluster state.
//!
//! The store is shared process-wide and used concurrently by every
//! reconciliation; implementations must not hand out cached objects as if they
//! were fresh. Absence is always reported as [`CronJobError::NotFound`].

use crate::error::{CronJobError, Result};
use crate::key::NamespacedName;
use crate::types::CronJob;
use k8s_openapi::api::batch::v1::Job;
use kube::ResourceExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait CronJobStore: Send + Sync {
    /// Fetch one CronJob.
    fn get_cron_job(&self, key: &NamespacedName) -> impl Future<Output = Result<CronJob>> + Send;

    /// All jobs in `namespace`. Ownership filtering is left to the caller.
    fn list_jobs(&self, namespace: &str) -> impl Future<Output = Result<Vec<Job>>> + Send;
}

impl<S: CronJobStore> CronJobStore for Arc<S> {
    fn get_cron_job(&self, key: &NamespacedName) -> impl Future<Output = Result<CronJob>> + Send {
        (**self).get_cron_job(key)
    }

    fn list_jobs(&self, namespace: &str) -> impl Future<Output = Result<Vec<Job>>> + Send {
        (**self).list_jobs(namespace)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Objects are cloned out on every read, so a caller can
/// never observe a value it did not fetch itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cron_jobs: Mutex<HashMap<NamespacedName, CronJob>>,
    jobs: Mutex<HashMap<NamespacedName, Job>>,
    fail_next: Mutex<Option<CronJobError>>,
    latency: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a CronJob. Objects without a namespace are rejected.
    pub fn put_cron_job(&self, cron_job: CronJob) -> Result<()> {
        let key = NamespacedName::from_resource(&cron_job)?;
        lock(&self.cron_jobs).insert(key, cron_job);
        Ok(())
    }

    pub fn remove_cron_job(&self, key: &NamespacedName) -> Option<CronJob> {
        lock(&self.cron_jobs).remove(key)
    }

    pub fn put_job(&self, job: Job) -> Result<()> {
        let key = NamespacedName::from_resource(&job)?;
        lock(&self.jobs).insert(key, job);
        Ok(())
    }

    /// Direct read that bypasses fetch accounting and failure injection.
    pub fn peek_cron_job(&self, key: &NamespacedName) -> Option<CronJob> {
        lock(&self.cron_jobs).get(key).cloned()
    }

    pub fn job_count(&self) -> usize {
        lock(&self.jobs).len()
    }

    /// Make the next store call fail with `err`.
    pub fn fail_next(&self, err: CronJobError) {
        *lock(&self.fail_next) = Some(err);
    }

    /// Delay every store call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Number of CronJob fetches served so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        let latency = *lock(&self.latency);
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        match lock(&self.fail_next).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl CronJobStore for MemoryStore {
    async fn get_cron_job(&self, key: &NamespacedName) -> Result<CronJob> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        lock(&self.cron_jobs)
            .get(key)
            .cloned()
            .ok_or_else(|| CronJobError::NotFound {
                kind: "CronJob",
                key: key.to_string(),
            })
    }

    async fn list_jobs(&self, namespace: &str) -> Result<Vec<Job>> {
        self.enter().await?;
        let mut jobs: Vec<Job> = lock(&self.jobs)
            .values()
            .filter(|j| j.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.name_any());
        Ok(jobs)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
