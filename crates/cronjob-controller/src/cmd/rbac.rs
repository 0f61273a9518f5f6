use crate::output::{print_json, print_yaml};
use cronjob_core::rbac;

pub fn run(name: &str, json: bool) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("role name must not be empty");
    }
    let role = rbac::cluster_role(name);
    if json {
        print_json(&role)
    } else {
        print_yaml(&role)
    }
}
