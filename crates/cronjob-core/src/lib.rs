pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod key;
pub mod marker;
pub mod rbac;
pub mod reconciler;
pub mod store;
pub mod types;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{CronJobError, Result};
pub use key::NamespacedName;
pub use reconciler::{Observation, Outcome, Reconciler};
pub use store::{CronJobStore, MemoryStore};
pub use types::{ConcurrencyPolicy, CronJob, CronJobSpec, CronJobStatus};
