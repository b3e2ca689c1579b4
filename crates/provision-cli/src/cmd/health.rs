use crate::output::{print_json, print_table};
use provision_core::{
    artifact::ArtifactStore,
    config::{Config, WarnLevel},
    paths,
    remote::RemoteApi,
    schema::{self, SchemaStore},
    types::TierId,
    ProvisionError,
};
use serde::Serialize;
use std::path::Path;
use workspace_api::{ClientConfig, WorkspaceClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Serialize)]
struct Check {
    name: &'static str,
    status: Status,
    detail: String,
}

impl Check {
    fn new(name: &'static str, status: Status, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

pub fn run(root: &Path, quick: bool, token: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut checks = Vec::new();

    let config = check_config(root, &mut checks);
    check_schemas(root, &mut checks);
    check_artifacts(root, &mut checks);
    if !quick {
        checks.push(check_remote(config.as_ref(), token));
    }

    if json {
        print_json(&checks)?;
    } else {
        let rows = checks
            .iter()
            .map(|c| {
                let status = match c.status {
                    Status::Ok => "ok",
                    Status::Warn => "warn",
                    Status::Fail => "FAIL",
                };
                vec![c.name.to_string(), status.to_string(), c.detail.clone()]
            })
            .collect();
        print_table(&["Check", "Status", "Detail"], rows);
    }

    let failed = checks.iter().filter(|c| c.status == Status::Fail).count();
    if failed > 0 {
        anyhow::bail!("{failed} health check(s) failed");
    }
    Ok(())
}

fn check_config(root: &Path, checks: &mut Vec<Check>) -> Option<Config> {
    if !paths::provision_dir(root).is_dir() {
        checks.push(Check::new(
            "project",
            Status::Fail,
            ProvisionError::NotInitialized.to_string(),
        ));
    } else {
        checks.push(Check::new("project", Status::Ok, root.display().to_string()));
    }

    match Config::load(root) {
        Ok(config) => {
            let warnings = config.validate();
            let errors = warnings
                .iter()
                .filter(|w| w.level == WarnLevel::Error)
                .count();
            let status = if errors > 0 {
                Status::Fail
            } else if warnings.is_empty() {
                Status::Ok
            } else {
                Status::Warn
            };
            let detail = if warnings.is_empty() {
                "valid".to_string()
            } else {
                warnings
                    .iter()
                    .map(|w| w.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            checks.push(Check::new("config", status, detail));
            Some(config)
        }
        Err(e) => {
            checks.push(Check::new("config", Status::Fail, e.to_string()));
            None
        }
    }
}

fn check_schemas(root: &Path, checks: &mut Vec<Check>) {
    let check = match SchemaStore::open(&paths::schemas_dir(root)) {
        Ok(store) if store.is_empty() => {
            Check::new("schemas", Status::Warn, "no schemas; defaults will be used")
        }
        Ok(store) => {
            let errors = schema::validate(&store)
                .iter()
                .filter(|f| f.level == WarnLevel::Error)
                .count();
            if errors > 0 {
                Check::new(
                    "schemas",
                    Status::Fail,
                    format!("{errors} error(s); run 'provision validate-schemas'"),
                )
            } else {
                Check::new("schemas", Status::Ok, format!("{} loaded", store.len()))
            }
        }
        Err(e) => Check::new("schemas", Status::Fail, e.to_string()),
    };
    checks.push(check);
}

fn check_artifacts(root: &Path, checks: &mut Vec<Check>) {
    let store = ArtifactStore::for_root(root);
    let mut built = Vec::new();
    for tier in TierId::all() {
        match store.list_tier(*tier) {
            Ok(files) if !files.is_empty() => built.push(format!("{tier}: {}", files.len())),
            Ok(_) => {}
            Err(e) => {
                checks.push(Check::new("artifacts", Status::Fail, e.to_string()));
                return;
            }
        }
    }
    let check = if built.is_empty() {
        Check::new("artifacts", Status::Warn, "no build packages yet")
    } else {
        Check::new("artifacts", Status::Ok, built.join(", "))
    };
    checks.push(check);
}

fn check_remote(config: Option<&Config>, token: Option<&str>) -> Check {
    let Some(config) = config else {
        return Check::new("remote", Status::Fail, "skipped: config did not load");
    };
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Check::new(
            "remote",
            Status::Fail,
            "missing api token (PROVISION_API_TOKEN)",
        );
    };

    let client = match WorkspaceClient::new(ClientConfig::from_api_config(&config.api, token)) {
        Ok(c) => c,
        Err(e) => return Check::new("remote", Status::Fail, e.to_string()),
    };
    let probe = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(client.identity_probe()),
        Err(e) => return Check::new("remote", Status::Fail, e.to_string()),
    };
    match probe {
        Ok(identity) => {
            let who = identity.name.unwrap_or(identity.id);
            Check::new("remote", Status::Ok, format!("authenticated as {who}"))
        }
        Err(e) => Check::new("remote", Status::Fail, e.to_string()),
    }
}
