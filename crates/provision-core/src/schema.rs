//! Resource schemas and the file-backed schema store.
//!
//! A schema file holds exactly one [`ResourceSchema`] in YAML:
//!
//! ```yaml
//! name: projects
//! title: Projects
//! fields:
//!   - name: Name
//!     type: title
//!   - name: Status
//!     type: select
//!     options: [Planning, Active, Done]
//! relationships:
//!   - target: clients
//!     cardinality: many_to_one
//! ```

use crate::config::WarnLevel;
use crate::error::{ProvisionError, Result};
use crate::tier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// One case per field kind the remote platform understands. Kind-specific
/// parameters live on the variant, so choice options can only exist on the
/// two choice kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    RichText,
    Number {
        #[serde(default = "default_number_format")]
        format: String,
    },
    Select {
        options: Vec<String>,
    },
    MultiSelect {
        options: Vec<String>,
    },
    Date,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    People,
    Formula {
        expression: String,
    },
    Relation {
        target: String,
    },
    Rollup {
        relation: String,
        property: String,
        #[serde(default = "default_rollup_function")]
        function: String,
    },
    CreatedTime,
    LastEditedTime,
}

fn default_number_format() -> String {
    "number".to_string()
}

fn default_rollup_function() -> String {
    "count".to_string()
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::RichText => "rich_text",
            FieldKind::Number { .. } => "number",
            FieldKind::Select { .. } => "select",
            FieldKind::MultiSelect { .. } => "multi_select",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Url => "url",
            FieldKind::Email => "email",
            FieldKind::PhoneNumber => "phone_number",
            FieldKind::People => "people",
            FieldKind::Formula { .. } => "formula",
            FieldKind::Relation { .. } => "relation",
            FieldKind::Rollup { .. } => "rollup",
            FieldKind::CreatedTime => "created_time",
            FieldKind::LastEditedTime => "last_edited_time",
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            FieldKind::Select { options } | FieldKind::MultiSelect { options } => {
                Some(options.as_slice())
            }
            _ => None,
        }
    }

    pub fn select(options: &[&str]) -> Self {
        FieldKind::Select {
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn multi_select(options: &[&str]) -> Self {
        FieldKind::MultiSelect {
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn number(format: &str) -> Self {
        FieldKind::Number {
            format: format.to_string(),
        }
    }

    pub fn relation(target: &str) -> Self {
        FieldKind::Relation {
            target: target.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec / RelationshipSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    pub target: String,
    pub cardinality: Cardinality,
}

// ---------------------------------------------------------------------------
// ResourceSchema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipSpec>,
    /// Set when the compiler substituted the minimal default schema.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub defaulted: bool,
}

impl ResourceSchema {
    /// The minimal schema used when no definition exists for `name`.
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: display_title(name),
            description: None,
            fields: default_fields(),
            relationships: Vec::new(),
            defaulted: true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_title(&self) -> bool {
        self.fields.iter().any(|f| f.kind == FieldKind::Title)
    }

    /// Property that carries a record's title once deployed: the declared
    /// title field, else `Name`, else `Title` when `Name` is already taken.
    pub fn title_property(&self) -> &str {
        if let Some(field) = self.fields.iter().find(|f| f.kind == FieldKind::Title) {
            return &field.name;
        }
        if self.field("Name").is_some() {
            "Title"
        } else {
            "Name"
        }
    }

    /// Names of every resource type this schema points at, through declared
    /// relationships or relation fields.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        let fields = self.fields.iter().filter_map(|f| match &f.kind {
            FieldKind::Relation { target } => Some(target.as_str()),
            _ => None,
        });
        let rels = self.relationships.iter().map(|r| r.target.as_str());
        for target in rels.chain(fields) {
            if target != self.name && !deps.contains(&target) {
                deps.push(target);
            }
        }
        deps
    }

    /// Structural checks applied to every schema entering the system.
    pub fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ProvisionError::InvalidSchema {
                schema: self.title.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ProvisionError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Tier-agnostic fields used for fallback schemas and for schemas that
/// declare no fields of their own.
pub fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("Name", FieldKind::Title),
        FieldSpec::new(
            "Status",
            FieldKind::select(&["Not started", "In progress", "Done"]),
        ),
        FieldSpec::new("Created", FieldKind::CreatedTime),
    ]
}

/// `meeting_notes` → `Meeting Notes`.
pub fn display_title(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// SchemaStore
// ---------------------------------------------------------------------------

/// Read-only collection of schema definitions, loaded once per compilation.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    schemas: Vec<ResourceSchema>,
}

impl SchemaStore {
    pub fn from_schemas(schemas: Vec<ResourceSchema>) -> Result<Self> {
        let mut names = HashSet::new();
        for schema in &schemas {
            schema.check()?;
            if !names.insert(schema.name.clone()) {
                return Err(ProvisionError::InvalidSchema {
                    schema: schema.name.clone(),
                    reason: "defined more than once".to_string(),
                });
            }
        }
        Ok(Self { schemas })
    }

    /// Load every `*.yaml` / `*.yml` file in `dir`, sorted by file name.
    /// A missing directory yields an empty store.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "schema directory missing, using empty store");
            return Ok(Self::default());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        paths.sort();

        let mut schemas = Vec::with_capacity(paths.len());
        for path in paths {
            let data = std::fs::read_to_string(&path)?;
            let schema: ResourceSchema =
                serde_yaml::from_str(&data).map_err(|e| ProvisionError::InvalidSchema {
                    schema: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            schemas.push(schema);
        }
        Self::from_schemas(schemas)
    }

    /// Write `schema` to `dir/<name>.yaml` unless that file already exists.
    pub fn write_schema(dir: &Path, schema: &ResourceSchema) -> Result<bool> {
        let path = dir.join(format!("{}.yaml", schema.name));
        let data = serde_yaml::to_string(schema)?;
        crate::io::write_if_missing(&path, data.as_bytes())
    }

    pub fn list_schemas(&self) -> &[ResourceSchema] {
        &self.schemas
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFinding {
    pub level: WarnLevel,
    pub schema: String,
    pub message: String,
}

/// Policy checks behind `validate-schemas`. Structural errors (duplicate
/// fields) are rejected at load time; these are the cross-schema rules.
pub fn validate(store: &SchemaStore) -> Vec<SchemaFinding> {
    let mut findings = Vec::new();
    let known: HashSet<&str> = store
        .list_schemas()
        .iter()
        .map(|s| s.name.as_str())
        .chain(crate::builtin::names().map(|n| -> &str { n }))
        .collect();
    let catalogued: HashSet<&str> = tier::catalog()
        .iter()
        .flat_map(|t| t.resource_types.iter().copied())
        .collect();

    for schema in store.list_schemas() {
        let mut push = |level: WarnLevel, message: String| {
            findings.push(SchemaFinding {
                level,
                schema: schema.name.clone(),
                message,
            })
        };

        if schema.fields.is_empty() {
            push(
                WarnLevel::Warning,
                "declares no fields; default fields will be used".to_string(),
            );
        } else if !schema.has_title() {
            push(
                WarnLevel::Warning,
                format!(
                    "has no title field; a '{}' title will be injected",
                    schema.title_property()
                ),
            );
        }

        let titles = schema
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Title)
            .count();
        if titles > 1 {
            push(
                WarnLevel::Error,
                format!("declares {titles} title fields; exactly one is allowed"),
            );
        }

        for field in &schema.fields {
            match &field.kind {
                FieldKind::Select { options } | FieldKind::MultiSelect { options }
                    if options.is_empty() =>
                {
                    push(
                        WarnLevel::Error,
                        format!("choice field '{}' has no options", field.name),
                    );
                }
                FieldKind::Relation { target } if !known.contains(target.as_str()) => {
                    push(
                        WarnLevel::Error,
                        format!(
                            "relation field '{}' targets unknown resource type '{target}'",
                            field.name
                        ),
                    );
                }
                FieldKind::Rollup { relation, .. } => {
                    let via = schema.field(relation);
                    if !matches!(via.map(|f| &f.kind), Some(FieldKind::Relation { .. })) {
                        push(
                            WarnLevel::Error,
                            format!(
                                "rollup field '{}' references '{relation}', which is not a relation field",
                                field.name
                            ),
                        );
                    }
                }
                FieldKind::Formula { expression } if expression.trim().is_empty() => {
                    push(
                        WarnLevel::Error,
                        format!("formula field '{}' has an empty expression", field.name),
                    );
                }
                _ => {}
            }
        }

        for rel in &schema.relationships {
            if !known.contains(rel.target.as_str()) {
                push(
                    WarnLevel::Error,
                    format!("relationship targets unknown resource type '{}'", rel.target),
                );
            }
        }

        if !catalogued.contains(schema.name.as_str()) {
            push(
                WarnLevel::Warning,
                "is not included in any tier and will never be deployed".to_string(),
            );
        }
    }

    findings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
