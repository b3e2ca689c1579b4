use crate::output::{print_fields, print_json, print_list};
use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::Args;
use provision_core::{
    artifact::ArtifactStore,
    config::Config,
    orchestrator::{DeployInputs, Orchestrator},
    paths,
    report::DeploymentReport,
    ProvisionError,
};
use serde::Serialize;
use std::path::Path;
use workspace_api::{ClientConfig, WorkspaceClient};

#[derive(Args)]
pub struct DeployArgs {
    /// Client name the build package was compiled for
    #[arg(long, env = "PROVISION_CLIENT")]
    pub client: Option<String>,
    /// Tier whose latest build package is deployed
    #[arg(long, env = "PROVISION_TIER")]
    pub tier: Option<String>,
    /// API token for the remote workspace
    #[arg(long, env = "PROVISION_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Override the sample-data phase (true/false)
    #[arg(long, env = "PROVISION_SAMPLE_DATA", value_parser = BoolishValueParser::new())]
    pub sample_data: Option<bool>,
    /// Deployment region recorded in the report
    #[arg(long, env = "PROVISION_REGION")]
    pub region: Option<String>,
    /// Custom domain recorded in the report
    #[arg(long, env = "PROVISION_CUSTOM_DOMAIN")]
    pub custom_domain: Option<String>,
}

#[derive(Serialize)]
struct AbortSummary<'a> {
    outcome: &'static str,
    phase: String,
    error: String,
    cleanup: Vec<&'a provision_core::state::CreatedResource>,
}

pub fn run(root: &Path, args: DeployArgs, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if args.region.is_some() {
        config.deployment.region = args.region.clone();
    }
    if args.custom_domain.is_some() {
        config.deployment.custom_domain = args.custom_domain.clone();
    }

    let token = args
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ProvisionError::MissingInput("api token (PROVISION_API_TOKEN)".into()))?
        .to_string();

    let client = WorkspaceClient::new(ClientConfig::from_api_config(&config.api, &token))
        .context("failed to build api client")?;
    let inputs = DeployInputs {
        client: args.client,
        tier: args.tier,
        token: Some(token),
    };
    let artifacts = ArtifactStore::for_root(root);

    let orchestrator = Orchestrator::new(&client, config)
        .with_output_dir(paths::deployments_dir(root))
        .with_sample_data(args.sample_data);

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(orchestrator.run(&inputs, &artifacts)) {
        Ok(report) => {
            if json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
            if !report.is_clean() {
                anyhow::bail!(
                    "deployment finished with {} error(s); see {}",
                    report.counts.errors,
                    paths::DEPLOYMENTS_DIR
                );
            }
            Ok(())
        }
        Err(failure) => {
            let cleanup = failure.cleanup_list();
            if json {
                print_json(&AbortSummary {
                    outcome: "aborted",
                    phase: failure.phase.to_string(),
                    error: failure.cause.to_string(),
                    cleanup,
                })?;
            } else if !cleanup.is_empty() {
                eprintln!("Resources created before the abort (remove manually, newest first):");
                for resource in cleanup {
                    eprintln!("  {} {} ({})", resource.kind, resource.name, resource.remote_id);
                }
            }
            Err(failure.into())
        }
    }
}

fn print_report(report: &DeploymentReport) {
    println!("Deployed {} workspace for {}", report.tier, report.client);
    let mut fields = vec![
        ("Outcome", format!("{:?}", report.outcome).to_lowercase()),
        ("Databases", report.counts.databases.to_string()),
        ("Records", report.counts.records.to_string()),
        ("Pages", report.counts.pages.to_string()),
        ("Errors", report.counts.errors.to_string()),
        ("Success rate", format!("{:.1}%", report.success_rate)),
        ("Duration", format!("{:.1}s", report.duration_secs)),
    ];
    if let Some(region) = &report.region {
        fields.push(("Region", region.clone()));
    }
    if let Some(domain) = &report.custom_domain {
        fields.push(("Domain", domain.clone()));
    }
    print_fields(&fields);

    let errors: Vec<String> = report
        .errors
        .iter()
        .map(|e| format!("[{}] {}: {}", e.phase, e.resource, e.message))
        .collect();
    print_list("Errors", &errors);
    print_list("Warnings", &report.warnings);
    print_list("Recommendations", &report.recommendations);
}
