use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TierId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierId {
    Starter,
    Professional,
    Enterprise,
}

impl TierId {
    /// All tiers in ascending order.
    pub fn all() -> &'static [TierId] {
        &[TierId::Starter, TierId::Professional, TierId::Enterprise]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TierId::Starter => "starter",
            TierId::Professional => "professional",
            TierId::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TierId {
    type Err = crate::error::ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starter" => Ok(TierId::Starter),
            "professional" => Ok(TierId::Professional),
            "enterprise" => Ok(TierId::Enterprise),
            _ => Err(crate::error::ProvisionError::UnknownTier(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Deployment phases in execution order. `Aborted` is terminal and never
/// appears in the completed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    ArtifactsLoaded,
    Connected,
    DatabasesDeployed,
    ViewsDeployed,
    SampleDataDeployed,
    IntegrationsDeployed,
    Finalized,
    Aborted,
}

impl Phase {
    /// The ordered, non-terminal-failure sequence.
    pub fn sequence() -> &'static [Phase] {
        &[
            Phase::Initializing,
            Phase::ArtifactsLoaded,
            Phase::Connected,
            Phase::DatabasesDeployed,
            Phase::ViewsDeployed,
            Phase::SampleDataDeployed,
            Phase::IntegrationsDeployed,
            Phase::Finalized,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::ArtifactsLoaded => "artifacts_loaded",
            Phase::Connected => "connected",
            Phase::DatabasesDeployed => "databases_deployed",
            Phase::ViewsDeployed => "views_deployed",
            Phase::SampleDataDeployed => "sample_data_deployed",
            Phase::IntegrationsDeployed => "integrations_deployed",
            Phase::Finalized => "finalized",
            Phase::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ViewKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Board,
    Timeline,
    Table,
    Calendar,
}

impl ViewKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Board => "board",
            ViewKind::Timeline => "timeline",
            ViewKind::Table => "table",
            ViewKind::Calendar => "calendar",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Database,
    Page,
    SummaryPage,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Database => "database",
            ResourceKind::Page => "page",
            ResourceKind::SummaryPage => "summary_page",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
