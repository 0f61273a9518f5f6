use anyhow::Context;
use cronjob_core::config::ControllerConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>, namespace: Option<String>) -> anyhow::Result<()> {
    let mut config =
        ControllerConfig::load_or_default(config_path).context("failed to load config")?;
    if namespace.is_some() {
        config.namespace = namespace;
    }
    if config.has_errors() {
        anyhow::bail!("invalid config; run `cronjob-controller config check` for details");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let client = kube::Client::try_default()
            .await
            .context("failed to create kubernetes client")?;
        cronjob_controller::run(client, &config).await
    })
}
