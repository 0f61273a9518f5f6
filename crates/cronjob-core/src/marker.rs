//! The scheduled-at marker carried by child jobs.
//!
//! Every job created for a CronJob tick records the tick in the
//! [`SCHEDULED_TIME_ANNOTATION`] annotation. The marker is read back from the
//! live children on each pass instead of being trusted from status, since a
//! status write can be lost after the child was already created. A tick that
//! already has a child must never get a second one.

use crate::error::{CronJobError, Result};
use crate::types::CronJob;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::warn;

pub const SCHEDULED_TIME_ANNOTATION: &str = "batch.tutorial.kubebuilder.io/scheduled-at";

/// Render a tick as the marker value, e.g. `2024-01-01T00:00:00Z`.
pub fn format_scheduled_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_scheduled_time(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc))
}

/// Read the marker back from a job. `Ok(None)` when the job has none.
pub fn scheduled_time_of(job: &Job) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = job.annotations().get(SCHEDULED_TIME_ANNOTATION) else {
        return Ok(None);
    };
    parse_scheduled_time(value)
        .map(Some)
        .map_err(|_| CronJobError::InvalidMarker {
            job: job.name_any(),
            value: value.clone(),
        })
}

/// Stamp a job with the tick it satisfies.
pub fn mark_scheduled_time(job: &mut Job, t: DateTime<Utc>) {
    job.annotations_mut()
        .insert(SCHEDULED_TIME_ANNOTATION.to_string(), format_scheduled_time(t));
}

/// Controller owner reference a child of `cron_job` carries. `None` until the
/// CronJob has been persisted and has a UID.
pub fn owner_reference(cron_job: &CronJob) -> Option<OwnerReference> {
    cron_job.controller_owner_ref(&())
}

pub fn is_owned_by(job: &Job, cron_job: &CronJob) -> bool {
    let Some(uid) = cron_job.uid() else {
        return false;
    };
    job.owner_references().iter().any(|o| o.uid == uid)
}

// ---------------------------------------------------------------------------
// ChildIndex
// ---------------------------------------------------------------------------

/// The children of one CronJob, indexed by the tick they were created for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildIndex {
    by_tick: BTreeMap<DateTime<Utc>, Vec<String>>,
    unmarked: usize,
    invalid: usize,
}

impl ChildIndex {
    /// Index the jobs owned by `cron_job`. Jobs owned by anything else are
    /// ignored; malformed markers are logged and skipped.
    pub fn build(cron_job: &CronJob, jobs: &[Job]) -> Self {
        let mut index = ChildIndex::default();
        for job in jobs.iter().filter(|j| is_owned_by(j, cron_job)) {
            match scheduled_time_of(job) {
                Ok(Some(t)) => index.insert(t, job.name_any()),
                Ok(None) => index.unmarked += 1,
                Err(e) => {
                    warn!(cronjob = %cron_job.name_any(), "skipping child: {e}");
                    index.invalid += 1;
                }
            }
        }
        index
    }

    fn insert(&mut self, t: DateTime<Utc>, name: String) {
        self.by_tick.entry(t.trunc_subsecs(0)).or_default().push(name);
    }

    pub fn contains(&self, tick: DateTime<Utc>) -> bool {
        self.by_tick.contains_key(&tick.trunc_subsecs(0))
    }

    /// Whether a child still has to be created for `tick`.
    pub fn needs_child_for(&self, tick: DateTime<Utc>) -> bool {
        !self.contains(tick)
    }

    pub fn jobs_for(&self, tick: DateTime<Utc>) -> &[String] {
        self.by_tick
            .get(&tick.trunc_subsecs(0))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Latest tick any child was created for. This is the last-scheduled time
    /// as recomputed from the children themselves.
    pub fn most_recent(&self) -> Option<DateTime<Utc>> {
        self.by_tick.keys().next_back().copied()
    }

    /// Number of marked children.
    pub fn len(&self) -> usize {
        self.by_tick.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tick.is_empty()
    }

    pub fn unmarked(&self) -> usize {
        self.unmarked
    }

    pub fn invalid(&self) -> usize {
        self.invalid
    }
}
