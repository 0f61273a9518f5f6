use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CronJobError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("request for {key} timed out after {}s", .after.as_secs_f64())]
    Timeout { key: String, after: Duration },

    #[error("invalid namespaced name '{0}': expected <namespace>/<name>")]
    InvalidKey(String),

    #[error("resource '{0}' has no namespace")]
    MissingNamespace(String),

    #[error("job '{job}' carries a malformed scheduled-at marker '{value}'")]
    InvalidMarker { job: String, value: String },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl CronJobError {
    /// True when the error means the addressed object does not exist.
    ///
    /// Raw API errors with HTTP 404 count too, so callers can hand a
    /// `kube::Error` straight through without mapping it first.
    pub fn is_not_found(&self) -> bool {
        match self {
            CronJobError::NotFound { .. } => true,
            CronJobError::Kube(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }
}

/// Turn a not-found error into `Ok(None)`; every other error passes through.
pub fn ignore_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub type Result<T> = std::result::Result<T, CronJobError>;
