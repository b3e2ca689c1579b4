//! Deployment reports: a read-only projection of a finished run.

use crate::compiler::BuildPackage;
use crate::error::Result;
use crate::paths;
use crate::state::{CreatedResource, DeploymentError, DeploymentState, Outcome};
use crate::types::{Phase, ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const ELEVATED_ERROR_RATE: f64 = 20.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub databases: usize,
    pub records: usize,
    pub pages: usize,
    pub errors: usize,
    pub total_resources: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub client: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<Uuid>,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub skipped_phases: Vec<Phase>,
    pub counts: ReportCounts,
    /// Percentage of attempted creations that succeeded.
    pub success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Resources to remove by hand, newest first. Empty unless aborted.
    #[serde(default)]
    pub cleanup: Vec<CreatedResource>,
    pub created: Vec<CreatedResource>,
    pub errors: Vec<DeploymentError>,
}

impl DeploymentReport {
    pub fn from_state(state: &DeploymentState, package: Option<&BuildPackage>) -> Self {
        let counts = ReportCounts {
            databases: state.count(ResourceKind::Database),
            records: state.count(ResourceKind::Page),
            pages: state.count(ResourceKind::SummaryPage),
            errors: state.errors.len(),
            total_resources: state.created.len(),
        };
        let attempted = counts.total_resources + counts.errors;
        let success_rate = if attempted == 0 {
            100.0
        } else {
            counts.total_resources as f64 * 100.0 / attempted as f64
        };

        let defaulted: Vec<String> = package
            .map(|p| p.metadata.defaulted_schemas.clone())
            .unwrap_or_default();

        let mut warnings: Vec<String> = defaulted
            .iter()
            .map(|name| format!("No schema defined for '{name}'; deployed with default fields"))
            .collect();
        for phase in &state.skipped_phases {
            warnings.push(format!("Phase '{phase}' was skipped"));
        }

        let cleanup = if state.outcome == Outcome::Aborted {
            state.cleanup_list().into_iter().cloned().collect()
        } else {
            Vec::new()
        };

        let mut report = Self {
            client: state.client.clone(),
            tier: state.tier.clone(),
            build_id: state.build_id,
            outcome: state.outcome,
            started_at: state.started_at,
            finished_at: state.finished_at,
            duration_secs: state.duration_secs(),
            phases: state.completed_phases.clone(),
            skipped_phases: state.skipped_phases.clone(),
            counts,
            success_rate,
            region: None,
            custom_domain: None,
            warnings,
            recommendations: Vec::new(),
            cleanup,
            created: state.created.clone(),
            errors: state.errors.clone(),
        };
        report.recommendations = recommend(&report, &defaulted);
        report
    }

    pub fn error_rate(&self) -> f64 {
        100.0 - self.success_rate
    }

    pub fn is_clean(&self) -> bool {
        self.outcome == Outcome::Finalized && self.counts.errors == 0
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Deployment Report: {}\n", self.client);
        let _ = writeln!(md, "| | |");
        let _ = writeln!(md, "|---|---|");
        let _ = writeln!(md, "| Tier | {} |", self.tier);
        if let Some(id) = self.build_id {
            let _ = writeln!(md, "| Build | `{id}` |");
        }
        let _ = writeln!(md, "| Outcome | {:?} |", self.outcome);
        let _ = writeln!(md, "| Started | {} |", self.started_at.to_rfc3339());
        let _ = writeln!(md, "| Duration | {:.1}s |", self.duration_secs);
        let _ = writeln!(md, "| Databases | {} |", self.counts.databases);
        let _ = writeln!(md, "| Records | {} |", self.counts.records);
        let _ = writeln!(md, "| Pages | {} |", self.counts.pages);
        let _ = writeln!(md, "| Errors | {} |", self.counts.errors);
        let _ = writeln!(md, "| Success rate | {:.1}% |", self.success_rate);
        if let Some(region) = &self.region {
            let _ = writeln!(md, "| Region | {region} |");
        }
        if let Some(domain) = &self.custom_domain {
            let _ = writeln!(md, "| Custom domain | {domain} |");
        }

        let _ = writeln!(md, "\n## Phases\n");
        for phase in &self.phases {
            let _ = writeln!(md, "- [x] {phase}");
        }
        for phase in &self.skipped_phases {
            let _ = writeln!(md, "- [ ] {phase} (skipped)");
        }

        if !self.created.is_empty() {
            let _ = writeln!(md, "\n## Created Resources\n");
            for r in &self.created {
                let _ = writeln!(md, "- {} `{}` ({})", r.kind, r.name, r.remote_id);
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(md, "\n## Errors\n");
            for e in &self.errors {
                let _ = writeln!(md, "- [{}] {}: {}", e.phase, e.resource, e.message);
            }
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(md, "\n## Warnings\n");
            for w in &self.warnings {
                let _ = writeln!(md, "- {w}");
            }
        }

        if !self.cleanup.is_empty() {
            let _ = writeln!(md, "\n## Manual Cleanup\n");
            for r in &self.cleanup {
                let _ = writeln!(md, "1. Delete {} `{}` ({})", r.kind, r.name, r.remote_id);
            }
        }

        let _ = writeln!(md, "\n## Recommendations\n");
        for rec in &self.recommendations {
            let _ = writeln!(md, "- {rec}");
        }
        md
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn stem(&self) -> String {
        format!(
            "{}{}-{}",
            paths::REPORT_FILE_PREFIX,
            paths::timestamp_key(self.started_at),
            paths::slugify(&self.client)
        )
    }

    /// Write `<stem>.json` and `<stem>.md` into `dir`. Returns the JSON path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let stem = self.stem();
        let json_path = dir.join(format!("{stem}.json"));
        crate::io::write_json(&json_path, self)?;
        crate::io::atomic_write(&dir.join(format!("{stem}.md")), self.to_markdown().as_bytes())?;
        Ok(json_path)
    }

    /// The most recent report saved in `dir`, if any.
    pub fn latest(dir: &Path) -> Result<Option<Self>> {
        if !dir.exists() {
            return Ok(None);
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(paths::REPORT_FILE_PREFIX) && n.ends_with(".json"))
            .collect();
        names.sort();
        match names.pop() {
            Some(name) => Ok(Some(crate::io::read_json(&dir.join(name))?)),
            None => Ok(None),
        }
    }
}

fn recommend(report: &DeploymentReport, defaulted: &[String]) -> Vec<String> {
    let mut recs = Vec::new();
    if report.counts.errors > 0 {
        recs.push(format!(
            "Review and address {} provisioning error(s)",
            report.counts.errors
        ));
    }
    if report.error_rate() > ELEVATED_ERROR_RATE {
        recs.push(format!(
            "Investigate elevated error rate ({:.0}%) before the next deployment",
            report.error_rate()
        ));
    }
    if report.outcome == Outcome::Aborted && !report.cleanup.is_empty() {
        recs.push(format!(
            "Remove {} resource(s) created before the abort, or finish the deployment by hand",
            report.cleanup.len()
        ));
    }
    if !defaulted.is_empty() {
        recs.push(format!("Define schemas for {}", defaulted.join(", ")));
    }
    if report.counts.records > 0 {
        recs.push("Replace sample records with real client data before handover".to_string());
    }
    recs.push("Share the workspace with the client team".to_string());
    recs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
