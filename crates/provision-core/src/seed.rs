//! Synthetic seed records.
//!
//! Record shape is deterministic per resource type and index; only date
//! values depend on the injected [`Clock`].

use crate::clock::Clock;
use crate::schema::{display_title, ResourceSchema};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// SeedValue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SeedValue {
    Title(String),
    Text(String),
    Number(f64),
    Select(String),
    MultiSelect(Vec<String>),
    Date(NaiveDate),
    Checkbox(bool),
    Url(String),
    Email(String),
}

pub type SeedRecord = BTreeMap<String, SeedValue>;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

const PROJECT_NAMES: &[&str] = &[
    "Website Redesign",
    "Mobile App Launch",
    "Data Migration",
    "Brand Refresh",
    "Customer Portal",
    "Analytics Rollout",
    "Onboarding Revamp",
    "Security Audit",
    "Pricing Update",
    "Partner Program",
];

const TASK_NAMES: &[&str] = &[
    "Draft requirements",
    "Review wireframes",
    "Set up staging",
    "Write test plan",
    "Migrate records",
    "Prepare launch notes",
    "Collect feedback",
    "Fix reported issues",
    "Update documentation",
    "Run retrospective",
];

const CLIENT_NAMES: &[&str] = &[
    "Northwind Traders",
    "Blue Harbor Labs",
    "Summit Health",
    "Copperleaf Retail",
    "Evergreen Finance",
    "Lumen Studios",
    "Orbit Logistics",
    "Granite Partners",
    "Willow Education",
    "Vertex Manufacturing",
];

const PEOPLE: &[&str] = &[
    "Avery Chen",
    "Jordan Patel",
    "Riley Okafor",
    "Morgan Silva",
    "Casey Novak",
    "Taylor Haddad",
    "Quinn Larsen",
    "Drew Moreau",
    "Sam Ibarra",
    "Jamie Kowalski",
];

fn pick<'a>(pool: &[&'a str], i: usize) -> &'a str {
    pool[i % pool.len()]
}

fn text(s: &str) -> SeedValue {
    SeedValue::Text(s.to_string())
}

fn select(s: &str) -> SeedValue {
    SeedValue::Select(s.to_string())
}

fn offset(today: NaiveDate, days: i64) -> SeedValue {
    let date = if days >= 0 {
        today.checked_add_days(Days::new(days as u64))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    SeedValue::Date(date.unwrap_or(today))
}

fn raw_record(resource_type: &str, i: usize, today: NaiveDate) -> SeedRecord {
    let mut r = SeedRecord::new();
    let n = i as i64;
    match resource_type {
        "projects" => {
            r.insert("Name".into(), SeedValue::Title(pick(PROJECT_NAMES, i).into()));
            r.insert("Status".into(), select(pick(&["Planning", "Active", "On Hold"], i)));
            r.insert("Priority".into(), select(pick(&["High", "Medium", "Low"], i)));
            r.insert("Start Date".into(), offset(today, 7 * n));
            r.insert("Due Date".into(), offset(today, 7 * n + 45));
            r.insert("Budget".into(), SeedValue::Number(10_000.0 + 5_000.0 * i as f64));
            r.insert(
                "Description".into(),
                text("Sample project created during workspace provisioning."),
            );
        }
        "tasks" => {
            r.insert("Name".into(), SeedValue::Title(pick(TASK_NAMES, i).into()));
            r.insert("Status".into(), select(pick(&["To Do", "In Progress", "Done"], i)));
            r.insert("Priority".into(), select(pick(&["Medium", "High", "Low", "Urgent"], i)));
            r.insert("Due Date".into(), offset(today, 3 * n + 2));
            r.insert("Estimate Hours".into(), SeedValue::Number(2.0 + 2.0 * (i % 4) as f64));
        }
        "clients" => {
            let name = pick(CLIENT_NAMES, i);
            let domain = crate::paths::slugify(name).replace('-', "");
            r.insert("Name".into(), SeedValue::Title(name.into()));
            r.insert("Status".into(), select(pick(&["Active", "Lead", "Paused"], i)));
            r.insert(
                "Industry".into(),
                select(pick(&["Technology", "Finance", "Healthcare", "Retail"], i)),
            );
            r.insert(
                "Contact Email".into(),
                SeedValue::Email(format!("hello@{domain}.example")),
            );
            r.insert(
                "Website".into(),
                SeedValue::Url(format!("https://{domain}.example")),
            );
        }
        "team_members" => {
            let name = pick(PEOPLE, i);
            let handle = name.to_lowercase().replace(' ', ".");
            r.insert("Name".into(), SeedValue::Title(name.into()));
            r.insert(
                "Role".into(),
                select(pick(&["Manager", "Lead", "Contributor"], i)),
            );
            r.insert(
                "Department".into(),
                select(pick(&["Engineering", "Design", "Operations", "Sales"], i)),
            );
            r.insert("Email".into(), SeedValue::Email(format!("{handle}@example.com")));
            r.insert("Start Date".into(), offset(today, -30 * (n + 1)));
            r.insert("Active".into(), SeedValue::Checkbox(true));
            r.insert(
                "Skills".into(),
                SeedValue::MultiSelect(vec![
                    pick(&["Planning", "Delivery"], i).to_string(),
                    pick(&["Research", "Support"], i).to_string(),
                ]),
            );
        }
        other => {
            r.insert(
                "Name".into(),
                SeedValue::Title(format!("Sample {} {}", display_title(other), i + 1)),
            );
        }
    }
    r
}

/// Keep only values for fields the schema declares, and file the title
/// value under the schema's title field.
fn conform(record: SeedRecord, schema: &ResourceSchema) -> SeedRecord {
    let title_field = schema.title_property();

    record
        .into_iter()
        .filter_map(|(key, value)| match value {
            SeedValue::Title(_) => Some((title_field.to_string(), value)),
            _ => schema.field(&key).map(|_| (key, value)),
        })
        .collect()
}

/// `count` synthetic records shaped for `schema`.
pub fn generate(schema: &ResourceSchema, count: usize, clock: &dyn Clock) -> Vec<SeedRecord> {
    let today = clock.now().date_naive();
    (0..count)
        .map(|i| conform(raw_record(&schema.name, i, today), schema))
        .collect()
}

/// The title text of a record, used as its logical name once created.
pub fn record_title(record: &SeedRecord) -> Option<&str> {
    record.values().find_map(|v| match v {
        SeedValue::Title(t) => Some(t.as_str()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
