//! Built-in schema definitions for every resource type in the catalog.
//!
//! `provision init` writes these into the schema store so operators can
//! edit them. The estimator counts fields from them.

use crate::schema::{
    Cardinality, FieldKind, FieldSpec, RelationshipSpec, ResourceSchema,
};
use std::sync::OnceLock;

static BUILTIN: OnceLock<Vec<ResourceSchema>> = OnceLock::new();

fn all() -> &'static [ResourceSchema] {
    BUILTIN.get_or_init(build)
}

pub fn get(name: &str) -> Option<&'static ResourceSchema> {
    all().iter().find(|s| s.name == name)
}

pub fn schemas() -> Vec<ResourceSchema> {
    all().to_vec()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    all().iter().map(|s| s.name.as_str())
}

fn schema(
    name: &str,
    title: &str,
    description: &str,
    fields: Vec<FieldSpec>,
    relationships: &[(&str, Cardinality)],
) -> ResourceSchema {
    ResourceSchema {
        name: name.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        fields,
        relationships: relationships
            .iter()
            .map(|(target, cardinality)| RelationshipSpec {
                target: target.to_string(),
                cardinality: *cardinality,
            })
            .collect(),
        defaulted: false,
    }
}

fn f(name: &str, kind: FieldKind) -> FieldSpec {
    FieldSpec::new(name, kind)
}

const PRIORITIES: &[&str] = &["Low", "Medium", "High", "Urgent"];

fn build() -> Vec<ResourceSchema> {
    use Cardinality::*;
    use FieldKind::*;

    vec![
        schema(
            "clients",
            "Clients",
            "Client organizations and their primary contacts",
            vec![
                f("Name", Title),
                f("Status", FieldKind::select(&["Lead", "Active", "Paused", "Churned"])),
                f(
                    "Industry",
                    FieldKind::select(&["Technology", "Finance", "Healthcare", "Retail", "Other"]),
                ),
                f("Contact Email", Email),
                f("Phone", PhoneNumber),
                f("Website", Url),
                f("Account Owner", People),
                f("Created", CreatedTime),
            ],
            &[],
        ),
        schema(
            "team_members",
            "Team Members",
            "People working in this workspace",
            vec![
                f("Name", Title),
                f("Role", FieldKind::select(&["Manager", "Lead", "Contributor", "Contractor"])),
                f(
                    "Department",
                    FieldKind::select(&["Engineering", "Design", "Operations", "Sales"]),
                ),
                f("Email", Email),
                f("Start Date", Date),
                f("Active", Checkbox),
                f("Skills", FieldKind::multi_select(&["Planning", "Delivery", "Research", "Support"])),
            ],
            &[],
        ),
        schema(
            "projects",
            "Projects",
            "Client engagements with status, budget and schedule",
            vec![
                f("Name", Title),
                f(
                    "Status",
                    FieldKind::select(&["Planning", "Active", "On Hold", "Completed"]),
                ),
                f("Priority", FieldKind::select(PRIORITIES)),
                f("Client", FieldKind::relation("clients")),
                f("Lead", FieldKind::relation("team_members")),
                f("Start Date", Date),
                f("Due Date", Date),
                f("Budget", FieldKind::number("dollar")),
                f("Description", RichText),
                f("Last Edited", LastEditedTime),
            ],
            &[("clients", ManyToOne), ("team_members", ManyToOne)],
        ),
        schema(
            "tasks",
            "Tasks",
            "Units of work within a project",
            vec![
                f("Name", Title),
                f(
                    "Status",
                    FieldKind::select(&["To Do", "In Progress", "Blocked", "Done"]),
                ),
                f("Priority", FieldKind::select(PRIORITIES)),
                f("Project", FieldKind::relation("projects")),
                f("Assignee", FieldKind::relation("team_members")),
                f("Due Date", Date),
                f("Estimate Hours", FieldKind::number("number")),
                f(
                    "Overdue",
                    Formula {
                        expression: "and(prop(\"Status\") != \"Done\", now() > prop(\"Due Date\"))"
                            .to_string(),
                    },
                ),
            ],
            &[("projects", ManyToOne), ("team_members", ManyToOne)],
        ),
        schema(
            "meeting_notes",
            "Meeting Notes",
            "Agendas, decisions and action items",
            vec![
                f("Title", Title),
                f("Date", Date),
                f("Project", FieldKind::relation("projects")),
                f("Attendees", People),
                f(
                    "Type",
                    FieldKind::select(&["Kickoff", "Status", "Review", "Retrospective"]),
                ),
                f("Action Items", RichText),
            ],
            &[("projects", ManyToOne)],
        ),
        schema(
            "time_entries",
            "Time Entries",
            "Logged hours against tasks",
            vec![
                f("Description", Title),
                f("Task", FieldKind::relation("tasks")),
                f("Team Member", FieldKind::relation("team_members")),
                f("Date", Date),
                f("Hours", FieldKind::number("number")),
                f("Rate", FieldKind::number("dollar")),
                f("Billable", Checkbox),
                f(
                    "Amount",
                    Formula {
                        expression: "prop(\"Hours\") * prop(\"Rate\")".to_string(),
                    },
                ),
            ],
            &[("tasks", ManyToOne), ("team_members", ManyToOne)],
        ),
        schema(
            "invoices",
            "Invoices",
            "Billing documents issued to clients",
            vec![
                f("Invoice Number", Title),
                f("Client", FieldKind::relation("clients")),
                f("Project", FieldKind::relation("projects")),
                f("Amount", FieldKind::number("dollar")),
                f(
                    "Status",
                    FieldKind::select(&["Draft", "Sent", "Paid", "Overdue"]),
                ),
                f("Issue Date", Date),
                f("Due Date", Date),
                f(
                    "Project Budget",
                    Rollup {
                        relation: "Project".to_string(),
                        property: "Budget".to_string(),
                        function: "sum".to_string(),
                    },
                ),
            ],
            &[("clients", ManyToOne), ("projects", ManyToOne)],
        ),
        schema(
            "expenses",
            "Expenses",
            "Costs incurred on projects",
            vec![
                f("Description", Title),
                f("Project", FieldKind::relation("projects")),
                f("Amount", FieldKind::number("dollar")),
                f(
                    "Category",
                    FieldKind::select(&["Travel", "Software", "Hardware", "Services"]),
                ),
                f("Date", Date),
                f("Reimbursable", Checkbox),
                f("Receipt", Url),
            ],
            &[("projects", ManyToOne)],
        ),
        schema(
            "goals",
            "Goals",
            "Company and team objectives",
            vec![
                f("Objective", Title),
                f("Owner", People),
                f("Quarter", FieldKind::select(&["Q1", "Q2", "Q3", "Q4"])),
                f(
                    "Status",
                    FieldKind::select(&["Not Started", "On Track", "At Risk", "Achieved"]),
                ),
                f("Progress", FieldKind::number("percent")),
            ],
            &[],
        ),
        schema(
            "key_results",
            "Key Results",
            "Measurable outcomes for each goal",
            vec![
                f("Key Result", Title),
                f("Goal", FieldKind::relation("goals")),
                f("Target", FieldKind::number("number")),
                f("Current", FieldKind::number("number")),
                f(
                    "Attainment",
                    Formula {
                        expression: "prop(\"Current\") / prop(\"Target\")".to_string(),
                    },
                ),
            ],
            &[("goals", ManyToOne)],
        ),
        schema(
            "risks",
            "Risks",
            "Delivery risks with likelihood and mitigation",
            vec![
                f("Risk", Title),
                f("Project", FieldKind::relation("projects")),
                f("Likelihood", FieldKind::select(&["Low", "Medium", "High"])),
                f("Impact", FieldKind::select(&["Low", "Medium", "High"])),
                f("Mitigation", RichText),
                f("Owner", People),
                f("Open", Checkbox),
            ],
            &[("projects", ManyToOne)],
        ),
        schema(
            "contracts",
            "Contracts",
            "Signed agreements and renewal dates",
            vec![
                f("Contract", Title),
                f("Client", FieldKind::relation("clients")),
                f("Value", FieldKind::number("dollar")),
                f("Start Date", Date),
                f("End Date", Date),
                f("Auto Renew", Checkbox),
                f("Document", Url),
            ],
            &[("clients", ManyToOne)],
        ),
        schema(
            "audit_log",
            "Audit Log",
            "Record of significant workspace changes",
            vec![
                f("Event", Title),
                f("Actor", People),
                f(
                    "Category",
                    FieldKind::multi_select(&["Access", "Billing", "Data", "Configuration"]),
                ),
                f("Details", RichText),
                f("Logged", CreatedTime),
            ],
            &[],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier;

    #[test]
    fn every_catalog_type_has_a_builtin() {
        for tier in tier::catalog() {
            for name in tier.resource_types {
                assert!(get(name).is_some(), "missing built-in for {name}");
            }
        }
    }

    #[test]
    fn builtins_pass_structural_checks() {
        for schema in schemas() {
            schema.check().unwrap();
            assert!(schema.has_title(), "{} has no title", schema.name);
            assert!(!schema.defaulted);
        }
    }

    #[test]
    fn builtin_yaml_roundtrip() {
        let projects = get("projects").unwrap();
        let yaml = serde_yaml::to_string(projects).unwrap();
        assert!(yaml.contains("type: relation"));
        let parsed: ResourceSchema = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(&parsed, projects);
    }
}
