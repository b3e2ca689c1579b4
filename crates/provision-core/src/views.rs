use crate::types::ViewKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ViewDefinition
// ---------------------------------------------------------------------------

/// A catalog view: explicit kind, grouping and sort for one resource type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDefinition {
    pub name: &'static str,
    pub kind: ViewKind,
    pub resource_type: &'static str,
    pub group_by: Option<&'static str>,
    pub sort_by: Option<&'static str>,
}

const fn view(
    name: &'static str,
    kind: ViewKind,
    resource_type: &'static str,
    group_by: Option<&'static str>,
    sort_by: Option<&'static str>,
) -> ViewDefinition {
    ViewDefinition {
        name,
        kind,
        resource_type,
        group_by,
        sort_by,
    }
}

const DEFINITIONS: &[ViewDefinition] = &[
    view("Projects Kanban", ViewKind::Board, "projects", Some("Status"), Some("Due Date")),
    view("Task Timeline", ViewKind::Timeline, "tasks", Some("Project"), Some("Due Date")),
    view("Client Overview", ViewKind::Table, "clients", Some("Status"), Some("Name")),
    view("Team Directory", ViewKind::Table, "team_members", Some("Department"), Some("Name")),
    view("Time Tracking Dashboard", ViewKind::Table, "time_entries", Some("Team Member"), Some("Date")),
    view("Invoice Schedule", ViewKind::Timeline, "invoices", Some("Status"), Some("Due Date")),
    view("Meeting Calendar", ViewKind::Calendar, "meeting_notes", None, Some("Date")),
    view("Goals Overview", ViewKind::Table, "goals", Some("Quarter"), Some("Objective")),
    view("Portfolio Dashboard", ViewKind::Table, "projects", Some("Client"), Some("Budget")),
    view("Risk Kanban", ViewKind::Board, "risks", Some("Impact"), Some("Likelihood")),
    view("Contract Timeline", ViewKind::Timeline, "contracts", None, Some("End Date")),
    view("Executive Overview", ViewKind::Table, "goals", Some("Status"), Some("Progress")),
];

pub fn definition(name: &str) -> Option<&'static ViewDefinition> {
    DEFINITIONS.iter().find(|d| d.name == name)
}

// ---------------------------------------------------------------------------
// Kind inference
// ---------------------------------------------------------------------------

/// Infer a view kind from its human-readable name. Total: any input maps to
/// exactly one kind, `Table` when nothing matches.
pub fn infer_view_kind(name: &str) -> ViewKind {
    let lowered = name.to_lowercase();
    let has = |needle: &str| lowered.contains(needle);

    if has("kanban") {
        ViewKind::Board
    } else if has("timeline") || has("schedule") {
        ViewKind::Timeline
    } else if has("calendar") {
        ViewKind::Calendar
    } else {
        // "dashboard" / "overview" and everything else render as tables.
        ViewKind::Table
    }
}

// ---------------------------------------------------------------------------
// ViewSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub name: String,
    pub kind: ViewKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// True when the kind came from name inference rather than the table.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inferred: bool,
}

impl ViewSpec {
    pub fn for_name(name: &str) -> Self {
        match definition(name) {
            Some(def) => Self {
                name: def.name.to_string(),
                kind: def.kind,
                resource_type: Some(def.resource_type.to_string()),
                group_by: def.group_by.map(str::to_string),
                sort_by: def.sort_by.map(str::to_string),
                inferred: false,
            },
            None => Self {
                name: name.to_string(),
                kind: infer_view_kind(name),
                resource_type: None,
                group_by: None,
                sort_by: None,
                inferred: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
