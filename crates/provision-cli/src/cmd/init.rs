use crate::output::print_json;
use anyhow::Context;
use provision_core::{builtin, config::Config, io, paths, schema::SchemaStore};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct InitSummary {
    root: String,
    config_created: bool,
    schemas_written: Vec<String>,
    schemas_kept: usize,
}

/// Create `.provision/` and seed it. Existing files are never overwritten.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    for dir in [
        paths::PROVISION_DIR,
        paths::SCHEMAS_DIR,
        paths::BUILDS_DIR,
        paths::DEPLOYMENTS_DIR,
    ] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_created = !paths::config_path(root).exists();
    if config_created {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
    }

    let schemas_dir = paths::schemas_dir(root);
    let mut written = Vec::new();
    let mut kept = 0;
    for schema in builtin::schemas() {
        if SchemaStore::write_schema(&schemas_dir, &schema)
            .with_context(|| format!("failed to write schema '{}'", schema.name))?
        {
            written.push(schema.name);
        } else {
            kept += 1;
        }
    }

    if json {
        return print_json(&InitSummary {
            root: root.display().to_string(),
            config_created,
            schemas_written: written,
            schemas_kept: kept,
        });
    }

    println!("Initialized provision in: {}", root.display());
    if config_created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    println!(
        "  schemas: {} written, {} already present ({})",
        written.len(),
        kept,
        paths::SCHEMAS_DIR
    );
    println!("\nNext: provision build --tier starter --client \"<client name>\"");
    Ok(())
}
