//! Deployment orchestrator.
//!
//! Drives one build package through the fixed phase sequence against a
//! [`RemoteApi`]. Per-resource failures are recorded and the run moves on;
//! a failed precondition (inputs, artifact, identity probe) aborts the run
//! and hands back the partial [`DeploymentState`] in a [`DeployFailure`].
//!
//! An `Orchestrator` is built for a single run and consumed by it.

#[cfg(test)]
mod mock;

use crate::artifact::ArtifactStore;
use crate::compiler::BuildPackage;
use crate::config::Config;
use crate::error::ProvisionError;
use crate::pacer::{CallClass, Pacer};
use crate::paths;
use crate::properties;
use crate::remote::RemoteApi;
use crate::report::DeploymentReport;
use crate::seed;
use crate::state::{CreatedResource, DeploymentState, Outcome};
use crate::types::{Phase, ResourceKind, TierId};
use std::path::PathBuf;
use thiserror::Error;

pub const SUMMARY_PAGE_NAME: &str = "Workspace Summary";

// ---------------------------------------------------------------------------
// Inputs / failure
// ---------------------------------------------------------------------------

/// Operator inputs for [`Orchestrator::run`], typically from the environment.
#[derive(Debug, Clone, Default)]
pub struct DeployInputs {
    pub client: Option<String>,
    pub tier: Option<String>,
    pub token: Option<String>,
}

/// A hard failure. Carries everything the run did before it stopped.
#[derive(Debug, Error)]
#[error("deployment aborted during {phase}: {cause}")]
pub struct DeployFailure {
    pub phase: Phase,
    #[source]
    pub cause: ProvisionError,
    pub state: Box<DeploymentState>,
}

impl DeployFailure {
    /// Resources created before the abort, newest first.
    pub fn cleanup_list(&self) -> Vec<&CreatedResource> {
        self.state.cleanup_list()
    }
}

pub type DeployResult = std::result::Result<DeploymentReport, DeployFailure>;

fn present<'s>(value: &'s Option<String>, what: &str) -> Result<&'s str, ProvisionError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProvisionError::MissingInput(what.to_string()))
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    api: &'a dyn RemoteApi,
    config: Config,
    pacer: Pacer,
    output_dir: Option<PathBuf>,
    sample_data: Option<bool>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn RemoteApi, config: Config) -> Self {
        let pacer = Pacer::new(&config.pacing);
        Self {
            api,
            config,
            pacer,
            output_dir: None,
            sample_data: None,
        }
    }

    /// Persist the state snapshot and report here when the run ends.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Per-run sample-data toggle. Takes precedence over the config file.
    pub fn with_sample_data(mut self, enabled: Option<bool>) -> Self {
        self.sample_data = enabled;
        self
    }

    /// Full run: validate inputs, load the latest artifact for the tier,
    /// then deploy it.
    pub async fn run(self, inputs: &DeployInputs, artifacts: &ArtifactStore) -> DeployResult {
        let mut state = DeploymentState::new(
            inputs.client.clone().unwrap_or_default(),
            inputs.tier.clone().unwrap_or_default(),
        );

        tracing::info!(phase = %Phase::Initializing, "validating deployment inputs");
        let (client, tier) = match validate_inputs(inputs) {
            Ok(v) => v,
            Err(e) => return Err(self.abort(state, Phase::Initializing, e)),
        };
        state.client = client.clone();
        state.tier = tier.to_string();
        state.complete_phase(Phase::Initializing);

        tracing::info!(phase = %Phase::ArtifactsLoaded, tier = %tier, "loading build package");
        let package = match artifacts.latest(tier) {
            Ok(p) => p,
            Err(e) => return Err(self.abort(state, Phase::ArtifactsLoaded, e)),
        };
        if package.client != client {
            tracing::warn!(
                requested = %client,
                packaged = %package.client,
                "latest build package was compiled for a different client"
            );
        }
        state.build_id = Some(package.build_id);
        state.complete_phase(Phase::ArtifactsLoaded);

        self.execute(state, &package).await
    }

    /// Deploy a package the caller already holds.
    pub async fn deploy(self, package: &BuildPackage) -> DeployResult {
        let mut state = DeploymentState::new(&package.client, package.tier.as_str());

        tracing::info!(phase = %Phase::Initializing, "validating build package");
        if let Err(e) = paths::validate_client_identity(&package.client) {
            return Err(self.abort(state, Phase::Initializing, e));
        }
        state.complete_phase(Phase::Initializing);

        state.build_id = Some(package.build_id);
        state.complete_phase(Phase::ArtifactsLoaded);

        self.execute(state, package).await
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    async fn execute(mut self, mut state: DeploymentState, package: &BuildPackage) -> DeployResult {
        tracing::info!(phase = %Phase::Connected, "probing remote api");
        match self.api.identity_probe().await {
            Ok(identity) => {
                tracing::info!(identity = %identity.id, "connected");
                state.complete_phase(Phase::Connected);
            }
            Err(e) => return Err(self.abort(state, Phase::Connected, e.into())),
        }

        self.deploy_databases(&mut state, package).await;
        state.complete_phase(Phase::DatabasesDeployed);

        self.deploy_views(&state, package);
        state.complete_phase(Phase::ViewsDeployed);

        if self.sample_data_enabled(package) {
            self.deploy_sample_data(&mut state, package).await;
            state.complete_phase(Phase::SampleDataDeployed);
        } else {
            tracing::info!(phase = %Phase::SampleDataDeployed, "skipped");
            state.skip_phase(Phase::SampleDataDeployed);
        }

        for integration in &package.integrations {
            tracing::info!(
                phase = %Phase::IntegrationsDeployed,
                integration = %integration,
                "integration reserved; requires client authorization"
            );
        }
        state.complete_phase(Phase::IntegrationsDeployed);

        Ok(self.finalize(state, package).await)
    }

    async fn deploy_databases(&mut self, state: &mut DeploymentState, package: &BuildPackage) {
        tracing::info!(
            phase = %Phase::DatabasesDeployed,
            count = package.schemas.len(),
            "creating databases"
        );
        let parent = self.config.api.parent_page_id.clone();
        let api = self.api;

        for schema in &package.schemas {
            let created = state.database_ids();
            let translation = properties::database_request(schema, &created, parent.as_deref());
            let request = &translation.request;

            match self
                .pacer
                .call(CallClass::Database, move || api.create_resource(request))
                .await
            {
                Ok(id) => {
                    tracing::info!(resource = %schema.name, id = %id, "created database");
                    state.record_created(ResourceKind::Database, &schema.name, id, None);
                }
                Err(e) => {
                    tracing::warn!(resource = %schema.name, kind = e.kind(), error = %e, "database creation failed");
                    state.record_error(Phase::DatabasesDeployed, &schema.name, e.to_string());
                }
            }
        }
    }

    /// Views follow from the databases; only the intent is logged.
    fn deploy_views(&self, state: &DeploymentState, package: &BuildPackage) {
        let created = state.database_ids();
        for view in &package.views {
            match view.resource_type.as_deref() {
                Some(rt) if !created.contains_key(rt) => tracing::warn!(
                    view = %view.name,
                    resource = %rt,
                    "view target database was not created"
                ),
                _ => tracing::info!(view = %view.name, kind = %view.kind, "view configured"),
            }
        }
    }

    fn sample_data_enabled(&self, package: &BuildPackage) -> bool {
        let enabled = self
            .sample_data
            .or(self.config.deployment.sample_data)
            .unwrap_or(true);
        enabled && package.has_seed_data()
    }

    async fn deploy_sample_data(&mut self, state: &mut DeploymentState, package: &BuildPackage) {
        let limit = self.config.deployment.max_records_per_resource;
        let ids = state.database_ids();
        let api = self.api;

        for schema in &package.schemas {
            let Some(database) = ids.get(&schema.name) else {
                continue;
            };
            for record in package.seed_records(&schema.name).iter().take(limit) {
                let name = seed::record_title(record).unwrap_or(&schema.name).to_string();
                let request = properties::record_request(database, record);
                let request = &request;

                match self
                    .pacer
                    .call(CallClass::Record, move || api.create_record(request))
                    .await
                {
                    Ok(id) => {
                        tracing::debug!(resource = %schema.name, record = %name, "created record");
                        state.record_created(ResourceKind::Page, &name, id, Some(&schema.name));
                    }
                    Err(e) => {
                        tracing::warn!(
                            resource = %schema.name,
                            record = %name,
                            kind = e.kind(),
                            error = %e,
                            "record creation failed"
                        );
                        state.record_error(Phase::SampleDataDeployed, &name, e.to_string());
                    }
                }
            }
        }
        tracing::info!(
            phase = %Phase::SampleDataDeployed,
            records = state.count(ResourceKind::Page),
            "sample data created"
        );
    }

    async fn finalize(mut self, mut state: DeploymentState, package: &BuildPackage) -> DeploymentReport {
        let title = format!("{} {}", package.client, SUMMARY_PAGE_NAME);
        let request = properties::page_request(
            self.config.api.parent_page_id.as_deref(),
            &title,
            summary_lines(&state, package),
        );
        let request = &request;
        let api = self.api;

        match self
            .pacer
            .call(CallClass::Record, move || api.create_record(request))
            .await
        {
            Ok(id) => state.record_created(ResourceKind::SummaryPage, SUMMARY_PAGE_NAME, id, None),
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "summary page creation failed");
                state.record_error(Phase::Finalized, SUMMARY_PAGE_NAME, e.to_string());
            }
        }

        state.complete_phase(Phase::Finalized);
        state.finish(Outcome::Finalized);

        let report = self.persist(&state, Some(package));
        tracing::info!(
            databases = report.counts.databases,
            records = report.counts.records,
            errors = report.counts.errors,
            "deployment finalized"
        );
        report
    }

    fn abort(&self, mut state: DeploymentState, phase: Phase, cause: ProvisionError) -> DeployFailure {
        tracing::error!(
            phase = %phase,
            error = %cause,
            created = state.created.len(),
            "deployment aborted"
        );
        state.finish(Outcome::Aborted);
        self.persist(&state, None);
        DeployFailure {
            phase,
            cause,
            state: Box::new(state),
        }
    }

    /// Build the report and write it plus the state snapshot to the output
    /// dir. Write failures end up as report warnings.
    fn persist(&self, state: &DeploymentState, package: Option<&BuildPackage>) -> DeploymentReport {
        let mut report = DeploymentReport::from_state(state, package);
        report.region = self.config.deployment.region.clone();
        report.custom_domain = self.config.deployment.custom_domain.clone();

        let Some(dir) = &self.output_dir else {
            return report;
        };
        if let Err(e) = state.save(dir) {
            tracing::warn!(error = %e, "could not persist deployment state");
            report.warnings.push(format!("Deployment state was not saved: {e}"));
        }
        match report.save(dir) {
            Ok(path) => tracing::info!(path = %path.display(), "report written"),
            Err(e) => {
                tracing::warn!(error = %e, "could not persist deployment report");
                report.warnings.push(format!("Deployment report was not saved: {e}"));
            }
        }
        report
    }
}

fn validate_inputs(inputs: &DeployInputs) -> Result<(String, TierId), ProvisionError> {
    let client = present(&inputs.client, "client identity (PROVISION_CLIENT)")?;
    let tier = present(&inputs.tier, "tier (PROVISION_TIER)")?;
    present(&inputs.token, "api token (PROVISION_API_TOKEN)")?;
    let client = paths::validate_client_identity(client)?;
    let tier: TierId = tier.parse()?;
    Ok((client, tier))
}

fn summary_lines(state: &DeploymentState, package: &BuildPackage) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} workspace provisioned on the {} tier.",
            package.client, package.tier
        ),
        format!("Build {}.", package.build_id),
        format!(
            "{} database(s), {} sample record(s), {} error(s).",
            state.count(ResourceKind::Database),
            state.count(ResourceKind::Page),
            state.errors.len()
        ),
    ];
    let databases: Vec<&str> = state
        .created
        .iter()
        .filter(|r| r.kind == ResourceKind::Database)
        .map(|r| r.name.as_str())
        .collect();
    if !databases.is_empty() {
        lines.push(format!("Databases: {}.", databases.join(", ")));
    }
    if !package.integrations.is_empty() {
        lines.push(format!(
            "Integrations awaiting authorization: {}.",
            package.integrations.join(", ")
        ));
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::mock::ScriptedApi;
    use super::*;
    use crate::builtin;
    use crate::compiler::Compiler;
    use crate::config::PacingConfig;
    use crate::remote::RemoteError;
    use crate::schema::SchemaStore;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            pacing: PacingConfig::immediate(),
            ..Config::default()
        }
    }

    fn package(tier: &str, seed: bool) -> BuildPackage {
        let store = SchemaStore::from_schemas(builtin::schemas()).unwrap();
        Compiler::new(&store).compile("Acme Co", tier, seed).unwrap()
    }

    #[tokio::test]
    async fn starter_all_succeed() {
        let api = ScriptedApi::new();
        let report = Orchestrator::new(&api, config())
            .deploy(&package("starter", true))
            .await
            .unwrap();

        assert_eq!(report.counts.databases, 5);
        assert_eq!(report.counts.errors, 0);
        assert_eq!(report.counts.records, 2);
        assert_eq!(report.counts.pages, 1);
        assert_eq!(report.phases.last(), Some(&Phase::Finalized));
        assert_eq!(report.phases, Phase::sequence());
        assert_eq!(report.outcome, Outcome::Finalized);
    }

    #[tokio::test]
    async fn third_database_failure_is_isolated() {
        let api = ScriptedApi::new().fail_resource(3);
        let report = Orchestrator::new(&api, config())
            .deploy(&package("starter", true))
            .await
            .unwrap();

        assert_eq!(report.counts.databases, 4);
        assert_eq!(report.counts.errors, 1);
        assert_eq!(report.errors[0].resource, "projects");
        assert_eq!(report.errors[0].phase, Phase::DatabasesDeployed);
        assert_eq!(api.resource_calls(), 5);
        assert_eq!(report.phases.last(), Some(&Phase::Finalized));
        let names: Vec<&str> = report
            .created
            .iter()
            .filter(|r| r.kind == ResourceKind::Database)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["clients", "team_members", "tasks", "meeting_notes"]);
    }

    #[tokio::test]
    async fn probe_failure_short_circuits() {
        let api = ScriptedApi::new().fail_probe(RemoteError::Unauthorized("bad token".into()));
        let failure = Orchestrator::new(&api, config())
            .deploy(&package("starter", true))
            .await
            .unwrap_err();

        assert_eq!(failure.phase, Phase::Connected);
        assert!(matches!(
            failure.cause,
            ProvisionError::Remote(RemoteError::Unauthorized(_))
        ));
        assert_eq!(api.resource_calls(), 0);
        assert_eq!(api.record_calls(), 0);
        assert!(!failure.state.has_completed(Phase::DatabasesDeployed));
        assert_eq!(failure.state.outcome, Outcome::Aborted);
        assert!(failure.cleanup_list().is_empty());
    }

    #[tokio::test]
    async fn relations_use_ids_created_earlier_in_the_run() {
        let api = ScriptedApi::new();
        Orchestrator::new(&api, config())
            .deploy(&package("starter", false))
            .await
            .unwrap();

        let requests = api.database_requests();
        assert_eq!(requests[0].title, "Clients");
        let projects = requests.iter().find(|r| r.title == "Projects").unwrap();
        assert_eq!(
            projects.properties["Client"]["relation"]["database_id"],
            serde_json::json!("db-1")
        );
    }

    #[tokio::test]
    async fn sample_records_are_capped_per_resource() {
        let api = ScriptedApi::new();
        let report = Orchestrator::new(&api, config())
            .deploy(&package("enterprise", true))
            .await
            .unwrap();

        // 4 seeded types with 10 generated records each.
        assert_eq!(report.counts.records, 20);
        assert_eq!(report.counts.databases, 13);
        for resource in ["clients", "projects", "tasks", "team_members"] {
            let n = report
                .created
                .iter()
                .filter(|r| r.parent.as_deref() == Some(resource))
                .count();
            assert_eq!(n, 5, "{resource}");
        }
    }

    #[tokio::test]
    async fn sample_data_override_skips_phase() {
        let api = ScriptedApi::new();
        let report = Orchestrator::new(&api, config())
            .with_sample_data(Some(false))
            .deploy(&package("professional", true))
            .await
            .unwrap();

        assert_eq!(report.skipped_phases, [Phase::SampleDataDeployed]);
        assert!(!report.phases.contains(&Phase::SampleDataDeployed));
        assert_eq!(report.counts.records, 0);
        assert_eq!(api.record_calls(), 1);
    }

    #[tokio::test]
    async fn config_override_disables_sample_data() {
        let api = ScriptedApi::new();
        let mut cfg = config();
        cfg.deployment.sample_data = Some(false);
        let report = Orchestrator::new(&api, cfg)
            .deploy(&package("starter", true))
            .await
            .unwrap();
        assert_eq!(report.skipped_phases, [Phase::SampleDataDeployed]);
    }

    #[tokio::test]
    async fn package_without_seed_data_skips_phase() {
        let api = ScriptedApi::new();
        let report = Orchestrator::new(&api, config())
            .deploy(&package("starter", false))
            .await
            .unwrap();
        assert_eq!(report.skipped_phases, [Phase::SampleDataDeployed]);
    }

    #[tokio::test]
    async fn record_failure_is_soft() {
        let api = ScriptedApi::new().fail_record(1);
        let report = Orchestrator::new(&api, config())
            .deploy(&package("starter", true))
            .await
            .unwrap();
        assert_eq!(report.counts.records, 1);
        assert_eq!(report.counts.errors, 1);
        assert_eq!(report.errors[0].phase, Phase::SampleDataDeployed);
        assert!(report.phases.contains(&Phase::SampleDataDeployed));
    }

    #[tokio::test]
    async fn summary_page_failure_is_soft() {
        let api = ScriptedApi::new().fail_summary();
        let report = Orchestrator::new(&api, config())
            .deploy(&package("starter", false))
            .await
            .unwrap();
        assert_eq!(report.counts.pages, 0);
        assert_eq!(report.errors[0].resource, SUMMARY_PAGE_NAME);
        assert_eq!(report.outcome, Outcome::Finalized);
    }

    #[tokio::test]
    async fn rate_limited_creation_is_retried() {
        let api = ScriptedApi::new().rate_limit_resource(1);
        let report = Orchestrator::new(&api, config())
            .deploy(&package("starter", false))
            .await
            .unwrap();
        assert_eq!(report.counts.databases, 5);
        assert_eq!(report.counts.errors, 0);
        assert_eq!(api.resource_calls(), 6);
    }

    #[tokio::test]
    async fn run_requires_token() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        let inputs = DeployInputs {
            client: Some("Acme Co".into()),
            tier: Some("starter".into()),
            token: None,
        };
        let failure = Orchestrator::new(&api, config())
            .run(&inputs, &ArtifactStore::new(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(failure.phase, Phase::Initializing);
        assert!(matches!(failure.cause, ProvisionError::MissingInput(_)));
        assert_eq!(api.probe_calls(), 0);
        assert!(failure.state.completed_phases.is_empty());
    }

    #[tokio::test]
    async fn run_rejects_unknown_tier() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        let inputs = DeployInputs {
            client: Some("Acme Co".into()),
            tier: Some("gold".into()),
            token: Some("secret".into()),
        };
        let failure = Orchestrator::new(&api, config())
            .run(&inputs, &ArtifactStore::new(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(failure.cause, ProvisionError::UnknownTier(_)));
    }

    #[tokio::test]
    async fn run_without_artifact_aborts() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        let inputs = DeployInputs {
            client: Some("Acme Co".into()),
            tier: Some("starter".into()),
            token: Some("secret".into()),
        };
        let failure = Orchestrator::new(&api, config())
            .run(&inputs, &ArtifactStore::new(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(failure.phase, Phase::ArtifactsLoaded);
        assert!(matches!(failure.cause, ProvisionError::ArtifactNotFound(_)));
        assert_eq!(failure.state.completed_phases, [Phase::Initializing]);
        assert_eq!(api.probe_calls(), 0);
    }

    #[tokio::test]
    async fn run_loads_latest_artifact_and_persists_outputs() {
        let dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::new(dir.path().join("builds"));
        let pkg = package("starter", true);
        artifacts.save(&pkg).unwrap();

        let out = dir.path().join("deployments");
        let api = ScriptedApi::new();
        let inputs = DeployInputs {
            client: Some("Acme Co".into()),
            tier: Some("starter".into()),
            token: Some("secret".into()),
        };
        let report = Orchestrator::new(&api, config())
            .with_output_dir(&out)
            .run(&inputs, &artifacts)
            .await
            .unwrap();

        assert_eq!(report.build_id, Some(pkg.build_id));
        assert!(report.warnings.is_empty());
        let files: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(files.iter().any(|f| f.starts_with("state-")));
        assert!(files.iter().any(|f| f.starts_with("report-") && f.ends_with(".md")));
        let latest = DeploymentReport::latest(&out).unwrap().unwrap();
        assert_eq!(latest.counts.databases, 5);
    }

    #[tokio::test]
    async fn abort_after_creation_lists_cleanup() {
        let api = ScriptedApi::new();
        let mut state = DeploymentState::new("Acme Co", "starter");
        state.record_created(
            ResourceKind::Database,
            "clients",
            crate::remote::RemoteId::new("db-1"),
            None,
        );
        let orchestrator = Orchestrator::new(&api, config());
        let failure = orchestrator.abort(
            state,
            Phase::DatabasesDeployed,
            ProvisionError::MissingInput("x".into()),
        );
        assert_eq!(failure.cleanup_list().len(), 1);
        assert!(failure.to_string().contains("databases_deployed"));
    }
}
