use crate::output::print_json;
use anyhow::Context;
use cronjob_controller::KubeStore;
use cronjob_core::config::ControllerConfig;
use cronjob_core::marker::format_scheduled_time;
use cronjob_core::{NamespacedName, Outcome, Reconciler, SystemClock};
use std::path::Path;

/// Run a single read-only pass for one CronJob and report what was observed.
pub fn run(config_path: Option<&Path>, key: NamespacedName, json: bool) -> anyhow::Result<()> {
    let config =
        ControllerConfig::load_or_default(config_path).context("failed to load config")?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let client = kube::Client::try_default()
            .await
            .context("failed to create kubernetes client")?;
        let reconciler = Reconciler::new(KubeStore::new(client), SystemClock)
            .with_request_timeout(config.request_timeout());

        let observation = reconciler.observe(&key).await?;
        let outcome = reconciler.converge(&key, observation.as_ref());
        let outcome_label = match outcome {
            Outcome::Done => "done".to_string(),
            Outcome::RequeueAfter(d) => format!("requeue after {}s", d.as_secs()),
        };

        if json {
            let value = match &observation {
                Some(obs) => serde_json::json!({
                    "key": key.to_string(),
                    "found": true,
                    "schedule": obs.cron_job.spec.schedule,
                    "suspended": obs.cron_job.spec.is_suspended(),
                    "children": obs.children.len(),
                    "unmarked_children": obs.children.unmarked(),
                    "last_scheduled": obs.children.most_recent().map(format_scheduled_time),
                    "observed_at": format_scheduled_time(obs.observed_at),
                    "outcome": outcome_label,
                }),
                None => serde_json::json!({
                    "key": key.to_string(),
                    "found": false,
                    "outcome": outcome_label,
                }),
            };
            return print_json(&value);
        }

        match &observation {
            Some(obs) => {
                println!("{key}");
                println!("  schedule:        {}", obs.cron_job.spec.schedule);
                println!("  suspended:       {}", obs.cron_job.spec.is_suspended());
                println!("  children:        {}", obs.children.len());
                println!(
                    "  last scheduled:  {}",
                    obs.children
                        .most_recent()
                        .map(format_scheduled_time)
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            None => println!("{key}: not found"),
        }
        println!("outcome: {outcome_label}");
        Ok(())
    })
}
