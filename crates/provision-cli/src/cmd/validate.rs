use crate::output::{print_json, print_table};
use anyhow::Context;
use provision_core::config::WarnLevel;
use provision_core::{paths, schema};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidationSummary {
    schemas: usize,
    errors: usize,
    warnings: usize,
    findings: Vec<schema::SchemaFinding>,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = schema::SchemaStore::open(&paths::schemas_dir(root))
        .context("failed to load schemas")?;
    let findings = schema::validate(&store);
    let errors = findings
        .iter()
        .filter(|f| f.level == WarnLevel::Error)
        .count();
    let warnings = findings.len() - errors;

    if json {
        print_json(&ValidationSummary {
            schemas: store.len(),
            errors,
            warnings,
            findings,
        })?;
    } else {
        if store.is_empty() {
            println!("No schemas in {}. Run 'provision init'.", paths::SCHEMAS_DIR);
        } else if findings.is_empty() {
            println!("{} schema(s) valid.", store.len());
        } else {
            let rows = findings
                .iter()
                .map(|f| {
                    let level = match f.level {
                        WarnLevel::Error => "error",
                        WarnLevel::Warning => "warning",
                    };
                    vec![level.to_string(), f.schema.clone(), f.message.clone()]
                })
                .collect();
            print_table(&["Level", "Schema", "Finding"], rows);
            println!(
                "\n{} schema(s): {errors} error(s), {warnings} warning(s)",
                store.len()
            );
        }
    }

    if errors > 0 {
        anyhow::bail!("schema validation failed with {errors} error(s)");
    }
    Ok(())
}
