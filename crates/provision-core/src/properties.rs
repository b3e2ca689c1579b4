//! Translation of schemas and seed records into the platform's JSON
//! property objects.

use crate::remote::{DatabaseRequest, RecordParent, RecordRequest, RemoteId};
use crate::schema::{default_fields, FieldKind, FieldSpec, ResourceSchema};
use crate::seed::{SeedRecord, SeedValue};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Logical resource-type name to the id the platform assigned this run.
pub type CreatedIds = BTreeMap<String, RemoteId>;

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseTranslation {
    pub request: DatabaseRequest,
    /// Fields left out because their relation target was not created.
    pub dropped: Vec<String>,
}

fn options(values: &[String]) -> Value {
    let options: Vec<Value> = values.iter().map(|name| json!({ "name": name })).collect();
    json!({ "options": options })
}

/// Property object for one field, or `None` when it cannot be expressed
/// yet (relation target not created in this run).
fn field_property(kind: &FieldKind, created: &CreatedIds) -> Option<Value> {
    let value = match kind {
        FieldKind::Title => json!({ "title": {} }),
        FieldKind::RichText => json!({ "rich_text": {} }),
        FieldKind::Number { format } => json!({ "number": { "format": format } }),
        FieldKind::Select { options: o } => json!({ "select": options(o) }),
        FieldKind::MultiSelect { options: o } => json!({ "multi_select": options(o) }),
        FieldKind::Date => json!({ "date": {} }),
        FieldKind::Checkbox => json!({ "checkbox": {} }),
        FieldKind::Url => json!({ "url": {} }),
        FieldKind::Email => json!({ "email": {} }),
        FieldKind::PhoneNumber => json!({ "phone_number": {} }),
        FieldKind::People => json!({ "people": {} }),
        FieldKind::Formula { expression } => json!({ "formula": { "expression": expression } }),
        FieldKind::Relation { target } => {
            let id = created.get(target)?;
            json!({ "relation": { "database_id": id, "single_property": {} } })
        }
        FieldKind::Rollup {
            relation,
            property,
            function,
        } => json!({
            "rollup": {
                "relation_property_name": relation,
                "rollup_property_name": property,
                "function": function,
            }
        }),
        FieldKind::CreatedTime => json!({ "created_time": {} }),
        FieldKind::LastEditedTime => json!({ "last_edited_time": {} }),
    };
    Some(value)
}

/// Build the create request for `schema`.
///
/// Schemas without fields get the default field set, and a title property
/// is added when none is declared. Relations whose target has no id in
/// `created` are dropped, along with rollups that go through them.
pub fn database_request(
    schema: &ResourceSchema,
    created: &CreatedIds,
    parent_page_id: Option<&str>,
) -> DatabaseTranslation {
    let fields: Vec<FieldSpec> = if schema.fields.is_empty() {
        default_fields()
    } else {
        schema.fields.clone()
    };

    let mut properties = Map::new();
    let mut dropped = Vec::new();
    let mut relations: HashSet<&str> = HashSet::new();

    for field in fields.iter().filter(|f| !matches!(f.kind, FieldKind::Rollup { .. })) {
        match field_property(&field.kind, created) {
            Some(value) => {
                if matches!(field.kind, FieldKind::Relation { .. }) {
                    relations.insert(field.name.as_str());
                }
                properties.insert(field.name.clone(), value);
            }
            None => dropped.push(field.name.clone()),
        }
    }

    // Rollups last: they only work through a relation that survived.
    for field in &fields {
        if let FieldKind::Rollup { relation, .. } = &field.kind {
            if relations.contains(relation.as_str()) {
                if let Some(value) = field_property(&field.kind, created) {
                    properties.insert(field.name.clone(), value);
                }
            } else {
                dropped.push(field.name.clone());
            }
        }
    }

    if !schema.fields.is_empty() && !schema.has_title() {
        properties.insert(schema.title_property().to_string(), json!({ "title": {} }));
    }

    for name in &dropped {
        tracing::warn!(resource = %schema.name, field = %name, "dropping field with unresolved relation");
    }

    DatabaseTranslation {
        request: DatabaseRequest {
            parent_page_id: parent_page_id.map(str::to_string),
            title: schema.title.clone(),
            description: schema.description.clone(),
            properties,
        },
        dropped,
    }
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Page property value for one seed value.
pub fn seed_property(value: &SeedValue) -> Value {
    match value {
        SeedValue::Title(s) => json!({ "title": rich_text(s) }),
        SeedValue::Text(s) => json!({ "rich_text": rich_text(s) }),
        SeedValue::Number(n) => json!({ "number": n }),
        SeedValue::Select(s) => json!({ "select": { "name": s } }),
        SeedValue::MultiSelect(values) => {
            let names: Vec<Value> = values.iter().map(|v| json!({ "name": v })).collect();
            json!({ "multi_select": names })
        }
        SeedValue::Date(d) => json!({ "date": { "start": d.format("%Y-%m-%d").to_string() } }),
        SeedValue::Checkbox(b) => json!({ "checkbox": b }),
        SeedValue::Url(s) => json!({ "url": s }),
        SeedValue::Email(s) => json!({ "email": s }),
    }
}

pub fn record_request(database: &RemoteId, record: &SeedRecord) -> RecordRequest {
    let properties = record
        .iter()
        .map(|(name, value)| (name.clone(), seed_property(value)))
        .collect();
    RecordRequest {
        parent: Some(RecordParent::Database(database.clone())),
        properties,
        children: Vec::new(),
    }
}

/// A free-standing page with a title and paragraphs of body text.
pub fn page_request(parent_page_id: Option<&str>, title: &str, body: Vec<String>) -> RecordRequest {
    let mut properties = Map::new();
    properties.insert("title".to_string(), json!({ "title": rich_text(title) }));
    RecordRequest {
        parent: parent_page_id.map(|id| RecordParent::Page(RemoteId::new(id))),
        properties,
        children: body,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use chrono::NaiveDate;

    fn ids(pairs: &[(&str, &str)]) -> CreatedIds {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), RemoteId::new(*v)))
            .collect()
    }

    #[test]
    fn every_field_kind_translates() {
        let kinds = [
            (FieldKind::Title, "title"),
            (FieldKind::RichText, "rich_text"),
            (FieldKind::number("percent"), "number"),
            (FieldKind::select(&["A"]), "select"),
            (FieldKind::multi_select(&["A"]), "multi_select"),
            (FieldKind::Date, "date"),
            (FieldKind::Checkbox, "checkbox"),
            (FieldKind::Url, "url"),
            (FieldKind::Email, "email"),
            (FieldKind::PhoneNumber, "phone_number"),
            (FieldKind::People, "people"),
            (
                FieldKind::Formula {
                    expression: "1".into(),
                },
                "formula",
            ),
            (FieldKind::relation("clients"), "relation"),
            (FieldKind::CreatedTime, "created_time"),
            (FieldKind::LastEditedTime, "last_edited_time"),
        ];
        let created = ids(&[("clients", "db-clients")]);
        for (kind, key) in kinds {
            let value = field_property(&kind, &created).unwrap();
            assert!(value.get(key).is_some(), "{key} missing in {value}");
        }
    }

    #[test]
    fn relation_resolves_created_id() {
        let projects = builtin::get("projects").unwrap();
        let created = ids(&[("clients", "db-c"), ("team_members", "db-t")]);
        let t = database_request(projects, &created, Some("parent"));
        assert!(t.dropped.is_empty());
        assert_eq!(
            t.request.properties["Client"]["relation"]["database_id"],
            json!("db-c")
        );
        assert_eq!(t.request.parent_page_id.as_deref(), Some("parent"));
        assert_eq!(
            t.request.properties["Status"]["select"]["options"][0]["name"],
            json!("Planning")
        );
    }

    #[test]
    fn unresolved_relation_and_its_rollup_are_dropped() {
        let invoices = builtin::get("invoices").unwrap();
        let created = ids(&[("clients", "db-c")]);
        let t = database_request(invoices, &created, None);
        assert_eq!(t.dropped, ["Project", "Project Budget"]);
        assert!(t.request.properties.contains_key("Client"));
        assert!(!t.request.properties.contains_key("Project Budget"));
    }

    #[test]
    fn rollup_kept_when_relation_resolves() {
        let invoices = builtin::get("invoices").unwrap();
        let created = ids(&[("clients", "db-c"), ("projects", "db-p")]);
        let t = database_request(invoices, &created, None);
        assert!(t.dropped.is_empty());
        assert_eq!(
            t.request.properties["Project Budget"]["rollup"]["function"],
            json!("sum")
        );
    }

    #[test]
    fn empty_schema_gets_default_fields() {
        let schema = ResourceSchema {
            name: "notes".into(),
            title: "Notes".into(),
            description: None,
            fields: Vec::new(),
            relationships: Vec::new(),
            defaulted: false,
        };
        let t = database_request(&schema, &CreatedIds::new(), None);
        let keys: Vec<&str> = t.request.properties.keys().map(String::as_str).collect();
        assert!(keys.contains(&"Name"));
        assert!(keys.contains(&"Status"));
        assert!(keys.contains(&"Created"));
    }

    #[test]
    fn title_injected_when_absent() {
        let schema = ResourceSchema {
            name: "log".into(),
            title: "Log".into(),
            description: None,
            fields: vec![FieldSpec::new("Name", FieldKind::RichText)],
            relationships: Vec::new(),
            defaulted: false,
        };
        let t = database_request(&schema, &CreatedIds::new(), None);
        assert_eq!(t.request.properties["Title"], json!({ "title": {} }));
        assert_eq!(t.request.properties["Name"], json!({ "rich_text": {} }));
    }

    #[test]
    fn seed_titles_match_the_database_title_property() {
        let schema = ResourceSchema {
            name: "projects".into(),
            title: "Projects".into(),
            description: None,
            fields: vec![
                FieldSpec::new("Name", FieldKind::RichText),
                FieldSpec::new("Status", FieldKind::select(&["Planning", "Active", "Done"])),
            ],
            relationships: Vec::new(),
            defaulted: false,
        };
        let db = database_request(&schema, &CreatedIds::new(), None).request;
        let clock = crate::clock::FixedClock(
            chrono::DateTime::parse_from_rfc3339("2025-03-10T09:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
        );

        for record in crate::seed::generate(&schema, 2, &clock) {
            let request = record_request(&RemoteId::new("db-1"), &record);
            let titled: Vec<&String> = request
                .properties
                .iter()
                .filter(|(_, v)| v.get("title").is_some())
                .map(|(k, _)| k)
                .collect();
            assert_eq!(titled, ["Title"]);
            assert_eq!(db.properties["Title"], json!({ "title": {} }));
            for key in request.properties.keys() {
                assert!(db.properties.contains_key(key), "{key} not on database");
            }
        }
    }

    #[test]
    fn seed_record_translation() {
        let mut record = SeedRecord::new();
        record.insert("Name".into(), SeedValue::Title("Launch".into()));
        record.insert(
            "Due".into(),
            SeedValue::Date(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()),
        );
        record.insert("Budget".into(), SeedValue::Number(1500.0));

        let req = record_request(&RemoteId::new("db-1"), &record);
        assert_eq!(req.parent, Some(RecordParent::Database(RemoteId::new("db-1"))));
        assert_eq!(
            req.properties["Name"]["title"][0]["text"]["content"],
            json!("Launch")
        );
        assert_eq!(req.properties["Due"]["date"]["start"], json!("2025-04-01"));
        assert_eq!(req.properties["Budget"]["number"], json!(1500.0));
    }

    #[test]
    fn page_request_without_parent() {
        let req = page_request(None, "Summary", vec!["line".into()]);
        assert!(req.parent.is_none());
        assert_eq!(req.children, ["line"]);
    }
}
