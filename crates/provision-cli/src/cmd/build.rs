use crate::output::{print_fields, print_json, print_list};
use anyhow::Context;
use provision_core::{
    artifact::ArtifactStore,
    compiler::{BuildPackage, Compiler},
    config::Config,
    estimate::{self, CostEstimate},
    paths,
    schema::SchemaStore,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct BuildSummary<'a> {
    path: String,
    package: &'a BuildPackage,
    estimate: CostEstimate,
}

pub fn run(
    root: &Path,
    tier: &str,
    client: &str,
    sample_data: Option<bool>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let include_seed_data = sample_data.or(config.deployment.sample_data).unwrap_or(true);

    let store = SchemaStore::open(&paths::schemas_dir(root)).context("failed to load schemas")?;
    if store.is_empty() {
        tracing::warn!("schema store is empty; run 'provision init' to install the built-in schemas");
    }

    let package = Compiler::new(&store).compile(client, tier, include_seed_data)?;
    let path = ArtifactStore::for_root(root)
        .save(&package)
        .context("failed to write build package")?;
    let estimate = estimate::for_package(&package);

    if json {
        return print_json(&BuildSummary {
            path: path.display().to_string(),
            package: &package,
            estimate,
        });
    }

    let meta = &package.metadata;
    println!("Built {} package for {}", package.tier, package.client);
    print_fields(&[
        ("Build", package.build_id.to_string()),
        ("Artifact", path.display().to_string()),
        ("Databases", meta.database_count.to_string()),
        ("Views", meta.view_count.to_string()),
        ("Fields", meta.field_count.to_string()),
        ("Seed records", meta.seed_record_count.to_string()),
        ("Integrations", meta.integration_count.to_string()),
        (
            "Estimate",
            format!(
                "{} units, {}",
                estimate.total_units,
                estimate.duration_display()
            ),
        ),
    ]);
    print_list(
        "Compiled from default fields (no schema found)",
        &meta.defaulted_schemas,
    );
    Ok(())
}
