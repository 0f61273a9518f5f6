pub mod config;
pub mod crd;
pub mod rbac;
pub mod reconcile;
pub mod run;
