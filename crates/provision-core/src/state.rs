use crate::error::Result;
use crate::paths;
use crate::properties::CreatedIds;
use crate::remote::RemoteId;
use crate::types::{Phase, ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub remote_id: RemoteId,
    /// Logical name of the database a record was created in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentError {
    pub phase: Phase,
    pub resource: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Running,
    Finalized,
    Aborted,
}

// ---------------------------------------------------------------------------
// DeploymentState
// ---------------------------------------------------------------------------

/// Everything one deployment run has done so far. Lists only grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub client: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub completed_phases: Vec<Phase>,
    #[serde(default)]
    pub skipped_phases: Vec<Phase>,
    pub created: Vec<CreatedResource>,
    pub errors: Vec<DeploymentError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Outcome,
}

impl DeploymentState {
    pub fn new(client: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            tier: tier.into(),
            build_id: None,
            started_at: Utc::now(),
            completed_phases: Vec::new(),
            skipped_phases: Vec::new(),
            created: Vec::new(),
            errors: Vec::new(),
            finished_at: None,
            outcome: Outcome::Running,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn complete_phase(&mut self, phase: Phase) {
        self.completed_phases.push(phase);
    }

    pub fn skip_phase(&mut self, phase: Phase) {
        self.skipped_phases.push(phase);
    }

    pub fn record_created(
        &mut self,
        kind: ResourceKind,
        name: &str,
        remote_id: RemoteId,
        parent: Option<&str>,
    ) {
        self.created.push(CreatedResource {
            kind,
            name: name.to_string(),
            remote_id,
            parent: parent.map(str::to_string),
            created_at: Utc::now(),
        });
    }

    pub fn record_error(&mut self, phase: Phase, resource: &str, message: impl Into<String>) {
        self.errors.push(DeploymentError {
            phase,
            resource: resource.to_string(),
            message: message.into(),
        });
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn has_completed(&self, phase: Phase) -> bool {
        self.completed_phases.contains(&phase)
    }

    pub fn last_phase(&self) -> Option<Phase> {
        self.completed_phases.last().copied()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.created.iter().filter(|r| r.kind == kind).count()
    }

    /// Ids of the databases created so far, keyed by resource type.
    pub fn database_ids(&self) -> CreatedIds {
        self.created
            .iter()
            .filter(|r| r.kind == ResourceKind::Database)
            .map(|r| (r.name.clone(), r.remote_id.clone()))
            .collect()
    }

    /// Created resources, newest first, for manual cleanup after an abort.
    pub fn cleanup_list(&self) -> Vec<&CreatedResource> {
        self.created.iter().rev().collect()
    }

    pub fn duration_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as f64 / 1000.0
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn file_name(&self) -> String {
        format!(
            "{}{}-{}.json",
            paths::STATE_FILE_PREFIX,
            paths::timestamp_key(self.started_at),
            paths::slugify(&self.client)
        )
    }

    /// Write a JSON snapshot into `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        crate::io::write_json(&path, self)?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        crate::io::read_json(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
