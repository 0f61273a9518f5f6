//! Wires the reconciler into kube-runtime.
//!
//! The runtime watches CronJobs and the Jobs they own, and calls
//! [`reconcile`] at least once per change, never concurrently for the same
//! object. The object it hands over is only used for its name: the
//! reconciler fetches fresh state itself.

use crate::kube_store::KubeStore;
use cronjob_core::backoff::Backoff;
use cronjob_core::config::ControllerConfig;
use cronjob_core::{
    Clock, CronJob, CronJobError, CronJobStore, NamespacedName, Outcome, Reconciler, SystemClock,
};
use futures::StreamExt;
use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, ListParams};
use kube::runtime::controller::{self, Action, Controller};
use kube::runtime::reflector::{Lookup, ObjectRef};
use kube::runtime::watcher;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Shared by every reconciliation.
pub struct Context<S, C> {
    pub reconciler: Reconciler<S, C>,
    pub backoff: Backoff,
}

impl<S: CronJobStore, C: Clock> Context<S, C> {
    pub fn new(store: S, clock: C, config: &ControllerConfig) -> Self {
        Self {
            reconciler: Reconciler::new(store, clock).with_request_timeout(config.request_timeout()),
            backoff: Backoff::new(config.backoff.base(), config.backoff.max()),
        }
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

pub fn to_action(outcome: Outcome) -> Action {
    match outcome {
        Outcome::Done => Action::await_change(),
        Outcome::RequeueAfter(d) => Action::requeue(d),
    }
}

pub async fn reconcile<S: CronJobStore, C: Clock>(
    obj: Arc<CronJob>,
    ctx: Arc<Context<S, C>>,
) -> Result<Action, CronJobError> {
    let key = NamespacedName::from_resource(obj.as_ref())?;
    let outcome = ctx.reconciler.reconcile(&key).await?;
    ctx.backoff.reset(&key);
    Ok(to_action(outcome))
}

pub fn error_policy<S: CronJobStore, C: Clock>(
    obj: Arc<CronJob>,
    err: &CronJobError,
    ctx: Arc<Context<S, C>>,
) -> Action {
    match NamespacedName::from_resource(obj.as_ref()) {
        Ok(key) => {
            let delay = ctx.backoff.next_delay(&key);
            warn!(cronjob = %key, retry_in = ?delay, "reconcile failed: {err}");
            Action::requeue(delay)
        }
        Err(_) => {
            // without a key there is nothing to track attempts against
            warn!("reconcile failed for unaddressable object: {err}");
            Action::await_change()
        }
    }
}

/// Drop the retry history of an object the runtime could no longer find.
///
/// A requeued object that was deleted in the meantime never reaches
/// [`reconcile`], so its backoff entry would otherwise never be reset.
pub fn forget_deleted<K: Lookup + ?Sized>(backoff: &Backoff, obj_ref: &ObjectRef<K>) {
    if let Some(ns) = &obj_ref.namespace {
        let key = NamespacedName::new(ns.clone(), obj_ref.name.clone());
        debug!(cronjob = %key, "object gone, dropping retry history");
        backoff.reset(&key);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the controller until SIGINT/SIGTERM.
pub async fn run(client: Client, config: &ControllerConfig) -> anyhow::Result<()> {
    let (cron_jobs, jobs): (Api<CronJob>, Api<Job>) = match &config.namespace {
        Some(ns) => (
            Api::namespaced(client.clone(), ns),
            Api::namespaced(client.clone(), ns),
        ),
        None => (Api::all(client.clone()), Api::all(client.clone())),
    };

    if let Err(e) = cron_jobs.list(&ListParams::default().limit(1)).await {
        anyhow::bail!("CronJob resources are not queryable ({e}); is the CRD installed?");
    }

    let ctx = Arc::new(Context::new(KubeStore::new(client), SystemClock, config));
    let events_ctx = ctx.clone();

    info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        "starting cronjob controller"
    );

    Controller::new(cron_jobs, watcher::Config::default())
        .owns(jobs, watcher::Config::default())
        .shutdown_on_signal()
        .run(
            reconcile::<KubeStore, SystemClock>,
            error_policy::<KubeStore, SystemClock>,
            ctx,
        )
        .for_each(move |res| {
            let ctx = events_ctx.clone();
            async move {
                match res {
                    Ok((obj, _)) => debug!(cronjob = %obj, "reconcile finished"),
                    Err(controller::Error::ObjectNotFound(obj_ref)) => {
                        forget_deleted(&ctx.backoff, &obj_ref)
                    }
                    Err(e) => debug!("controller event: {e}"),
                }
            }
        })
        .await;

    info!("cronjob controller stopped");
    Ok(())
}
