//! Static tier catalog.
//!
//! Each tier lists the resource types it provisions in dependency order:
//! a type appears after every type it relates to, so sequential creation can
//! always resolve relation targets. Higher tiers extend lower ones.

use crate::error::Result;
use crate::types::TierId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierConfiguration {
    pub id: TierId,
    pub display_name: &'static str,
    pub resource_types: &'static [&'static str],
    pub views: &'static [&'static str],
    pub features: &'static [&'static str],
    pub integrations: &'static [&'static str],
    pub automations: &'static [&'static str],
    /// Resource types that receive synthetic records when seed data is requested.
    pub seed_resources: &'static [&'static str],
    /// Records generated per seeded resource type.
    pub seed_count: usize,
    pub monthly_price_usd: u32,
}

impl TierConfiguration {
    pub fn includes(&self, resource_type: &str) -> bool {
        self.resource_types.contains(&resource_type)
    }
}

static STARTER: TierConfiguration = TierConfiguration {
    id: TierId::Starter,
    display_name: "Starter",
    resource_types: &["clients", "team_members", "projects", "tasks", "meeting_notes"],
    views: &[
        "Projects Kanban",
        "Task Timeline",
        "Client Overview",
        "Team Directory",
    ],
    features: &["core_databases", "basic_views", "email_support"],
    integrations: &[],
    automations: &[],
    seed_resources: &["projects"],
    seed_count: 2,
    monthly_price_usd: 49,
};

static PROFESSIONAL: TierConfiguration = TierConfiguration {
    id: TierId::Professional,
    display_name: "Professional",
    resource_types: &[
        "clients",
        "team_members",
        "projects",
        "tasks",
        "meeting_notes",
        "time_entries",
        "invoices",
        "expenses",
        "goals",
    ],
    views: &[
        "Projects Kanban",
        "Task Timeline",
        "Client Overview",
        "Team Directory",
        "Time Tracking Dashboard",
        "Invoice Schedule",
        "Meeting Calendar",
        "Goals Overview",
    ],
    features: &[
        "core_databases",
        "basic_views",
        "email_support",
        "time_tracking",
        "invoicing",
        "automations",
    ],
    integrations: &["slack", "google_calendar"],
    automations: &[
        "task_status_notifications",
        "invoice_reminders",
        "weekly_time_summary",
    ],
    seed_resources: &["clients", "projects", "tasks"],
    seed_count: 5,
    monthly_price_usd: 149,
};

static ENTERPRISE: TierConfiguration = TierConfiguration {
    id: TierId::Enterprise,
    display_name: "Enterprise",
    resource_types: &[
        "clients",
        "team_members",
        "projects",
        "tasks",
        "meeting_notes",
        "time_entries",
        "invoices",
        "expenses",
        "goals",
        "key_results",
        "risks",
        "contracts",
        "audit_log",
    ],
    views: &[
        "Projects Kanban",
        "Task Timeline",
        "Client Overview",
        "Team Directory",
        "Time Tracking Dashboard",
        "Invoice Schedule",
        "Meeting Calendar",
        "Goals Overview",
        "Portfolio Dashboard",
        "Risk Kanban",
        "Contract Timeline",
        "Executive Overview",
    ],
    features: &[
        "core_databases",
        "basic_views",
        "email_support",
        "time_tracking",
        "invoicing",
        "automations",
        "okrs",
        "risk_management",
        "audit_trail",
        "priority_support",
    ],
    integrations: &["slack", "google_calendar", "salesforce", "jira", "sso"],
    automations: &[
        "task_status_notifications",
        "invoice_reminders",
        "weekly_time_summary",
        "risk_escalation",
        "contract_renewal_alerts",
        "okr_progress_rollup",
    ],
    seed_resources: &["clients", "projects", "tasks", "team_members"],
    seed_count: 10,
    monthly_price_usd: 399,
};

/// Every tier, ascending.
pub fn catalog() -> [&'static TierConfiguration; 3] {
    [&STARTER, &PROFESSIONAL, &ENTERPRISE]
}

pub fn get(tier: TierId) -> &'static TierConfiguration {
    match tier {
        TierId::Starter => &STARTER,
        TierId::Professional => &PROFESSIONAL,
        TierId::Enterprise => &ENTERPRISE,
    }
}

/// Resolve a tier identifier string, failing with `UnknownTier`.
pub fn resolve(tier: &str) -> Result<&'static TierConfiguration> {
    Ok(get(tier.parse()?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
