pub mod controller;
pub mod kube_store;

pub use controller::{error_policy, reconcile, run, Context};
pub use kube_store::KubeStore;
