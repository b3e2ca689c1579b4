#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "PROVISION_CLIENT",
    "PROVISION_TIER",
    "PROVISION_API_TOKEN",
    "PROVISION_SAMPLE_DATA",
    "PROVISION_REGION",
    "PROVISION_CUSTOM_DOMAIN",
];

fn provision(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("provision").unwrap();
    cmd.current_dir(dir.path()).env("PROVISION_ROOT", dir.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn init_project(dir: &TempDir) {
    provision(dir).arg("init").assert().success();
}

fn build_starter(dir: &TempDir) {
    provision(dir)
        .args(["build", "--tier", "starter", "--client", "Acme Co"])
        .assert()
        .success();
}

/// Points the api at a closed local port so the identity probe fails fast.
fn use_unreachable_api(dir: &TempDir) {
    std::fs::write(
        dir.path().join(".provision/config.yaml"),
        "api:\n  base_url: http://127.0.0.1:9\n  timeout_secs: 2\n",
    )
    .unwrap();
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// provision init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    assert!(dir.path().join(".provision").is_dir());
    assert!(dir.path().join(".provision/schemas").is_dir());
    assert!(dir.path().join(".provision/builds").is_dir());
    assert!(dir.path().join(".provision/deployments").is_dir());
    assert!(dir.path().join(".provision/config.yaml").exists());
    assert!(dir.path().join(".provision/schemas/clients.yaml").exists());
    assert!(dir.path().join(".provision/schemas/tasks.yaml").exists());
}

#[test]
fn init_is_idempotent_and_keeps_edits() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let schema = dir.path().join(".provision/schemas/clients.yaml");
    std::fs::write(&schema, "name: clients\ntitle: Clients\nfields: []\n").unwrap();

    let out = json_output(provision(&dir).args(["init", "--json"]));
    assert_eq!(out["config_created"], false);
    assert_eq!(out["schemas_written"].as_array().unwrap().len(), 0);

    let content = std::fs::read_to_string(&schema).unwrap();
    assert_eq!(content, "name: clients\ntitle: Clients\nfields: []\n");
}

// ---------------------------------------------------------------------------
// provision build
// ---------------------------------------------------------------------------

#[test]
fn build_writes_artifact() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let out = json_output(provision(&dir).args([
        "build", "--tier", "starter", "--client", "Acme Co", "--json",
    ]));
    assert_eq!(out["package"]["tier"], "starter");
    assert_eq!(out["package"]["client"], "Acme Co");
    assert_eq!(out["package"]["metadata"]["database_count"], 5);

    let builds: Vec<_> = std::fs::read_dir(dir.path().join(".provision/builds"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(builds.len(), 1);
    assert!(builds[0].starts_with("build-starter-"));
    assert!(builds[0].ends_with("-acme-co.json"));
}

#[test]
fn build_without_sample_data_has_no_seed_records() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let out = json_output(provision(&dir).args([
        "build",
        "--tier",
        "professional",
        "--client",
        "Acme Co",
        "--sample-data",
        "false",
        "--json",
    ]));
    assert_eq!(out["package"]["metadata"]["seed_record_count"], 0);
    assert!(out["package"].get("seed_data").is_none());
}

#[test]
fn build_without_init_uses_default_fields() {
    let dir = TempDir::new().unwrap();
    provision(&dir)
        .args(["build", "--tier", "starter", "--client", "Acme Co"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled from default fields"));
}

#[test]
fn build_rejects_unknown_tier() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir)
        .args(["build", "--tier", "platinum", "--client", "Acme Co"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tier 'platinum'"));
}

#[test]
fn build_rejects_invalid_client() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir)
        .args(["build", "--tier", "starter", "--client", "../etc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid client identity"));
}

// ---------------------------------------------------------------------------
// provision estimate-cost
// ---------------------------------------------------------------------------

#[test]
fn estimate_starter_totals() {
    let dir = TempDir::new().unwrap();
    let out = json_output(provision(&dir).args(["estimate-cost", "--tier", "starter", "--json"]));
    assert_eq!(out["total_units"], 73);
    assert_eq!(out["estimated_seconds"], 25);
}

#[test]
fn estimate_compare_lists_every_tier() {
    let dir = TempDir::new().unwrap();
    provision(&dir)
        .args(["estimate-cost", "--compare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("starter"))
        .stdout(predicate::str::contains("professional"))
        .stdout(predicate::str::contains("enterprise"));
}

#[test]
fn estimate_requires_tier_or_compare() {
    let dir = TempDir::new().unwrap();
    provision(&dir).arg("estimate-cost").assert().failure();
}

// ---------------------------------------------------------------------------
// provision validate-schemas
// ---------------------------------------------------------------------------

#[test]
fn builtin_schemas_validate() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir).arg("validate-schemas").assert().success();
}

#[test]
fn validate_fails_on_two_title_fields() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".provision/schemas/widgets.yaml"),
        "name: widgets\ntitle: Widgets\nfields:\n  - name: A\n    type: title\n  - name: B\n    type: title\n",
    )
    .unwrap();

    provision(&dir)
        .arg("validate-schemas")
        .assert()
        .failure()
        .stdout(predicate::str::contains("widgets"))
        .stderr(predicate::str::contains("schema validation failed"));
}

// ---------------------------------------------------------------------------
// provision health
// ---------------------------------------------------------------------------

#[test]
fn quick_health_passes_after_init() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir)
        .args(["health", "--quick"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schemas"));
}

#[test]
fn health_fails_before_init() {
    let dir = TempDir::new().unwrap();
    provision(&dir)
        .args(["health", "--quick"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not initialized"));
}

#[test]
fn full_health_needs_token() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir)
        .arg("health")
        .assert()
        .failure()
        .stdout(predicate::str::contains("PROVISION_API_TOKEN"));
}

// ---------------------------------------------------------------------------
// provision deploy / report
// ---------------------------------------------------------------------------

#[test]
fn deploy_requires_token() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    build_starter(&dir);
    provision(&dir)
        .args(["deploy", "--client", "Acme Co", "--tier", "starter"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("api token"));
}

#[test]
fn deploy_without_artifact_aborts() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir)
        .args(["deploy", "--client", "Acme Co", "--tier", "starter"])
        .env("PROVISION_API_TOKEN", "secret_test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run 'provision build' first"));
}

#[test]
fn unreachable_api_aborts_and_leaves_report() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    use_unreachable_api(&dir);
    build_starter(&dir);

    provision(&dir)
        .args(["deploy", "--client", "Acme Co", "--tier", "starter"])
        .env("PROVISION_API_TOKEN", "secret_test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("aborted during connected"));

    let out = json_output(provision(&dir).args(["report", "--json"]));
    assert_eq!(out["outcome"], "aborted");
    assert_eq!(out["client"], "Acme Co");
    assert_eq!(out["counts"]["total_resources"], 0);
}

#[test]
fn report_without_deployments_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    provision(&dir)
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no deployment report found"));
}
