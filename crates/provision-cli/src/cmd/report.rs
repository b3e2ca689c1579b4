use crate::output::print_json;
use anyhow::Context;
use provision_core::{paths, report::DeploymentReport};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let dir = paths::deployments_dir(root);
    let report = DeploymentReport::latest(&dir)
        .context("failed to read deployment reports")?
        .ok_or_else(|| anyhow::anyhow!("no deployment report found; run 'provision deploy' first"))?;

    if json {
        return print_json(&report);
    }
    print!("{}", report.to_markdown());
    Ok(())
}
