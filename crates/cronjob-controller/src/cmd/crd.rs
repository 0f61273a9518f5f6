use crate::output::{print_json, print_yaml};
use cronjob_core::CronJob;
use kube::CustomResourceExt;

pub fn run(json: bool) -> anyhow::Result<()> {
    let crd = CronJob::crd();
    if json {
        print_json(&crd)
    } else {
        print_yaml(&crd)
    }
}
