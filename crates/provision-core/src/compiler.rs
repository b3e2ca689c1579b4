//! Template compiler.
//!
//! Turns a tier selection and client identity into an immutable
//! [`BuildPackage`]: the ordered schemas, view specifications, optional seed
//! records and documentation that a deployment run provisions.

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::paths;
use crate::schema::{ResourceSchema, SchemaStore};
use crate::seed::{self, SeedRecord};
use crate::tier::{self, TierConfiguration};
use crate::types::TierId;
use crate::views::ViewSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use uuid::Uuid;

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// BuildPackage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSection {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub database_count: usize,
    pub view_count: usize,
    pub field_count: usize,
    pub seed_record_count: usize,
    pub integration_count: usize,
    /// Resource types compiled from the minimal default schema.
    #[serde(default)]
    pub defaulted_schemas: Vec<String>,
    pub build_duration_ms: u64,
    pub generator_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPackage {
    pub build_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub client: String,
    pub tier: TierId,
    pub schemas: Vec<ResourceSchema>,
    pub views: Vec<ViewSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_data: Option<BTreeMap<String, Vec<SeedRecord>>>,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub documentation: Vec<DocSection>,
    pub metadata: BuildMetadata,
}

impl BuildPackage {
    pub fn schema(&self, name: &str) -> Option<&ResourceSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn seed_records(&self, resource_type: &str) -> &[SeedRecord] {
        self.seed_data
            .as_ref()
            .and_then(|d| d.get(resource_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_seed_data(&self) -> bool {
        self.seed_data.as_ref().is_some_and(|d| !d.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

pub struct Compiler<'a> {
    store: &'a SchemaStore,
    clock: Box<dyn Clock>,
}

impl<'a> Compiler<'a> {
    pub fn new(store: &'a SchemaStore) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The store's definition, or the tagged minimal schema when it has none.
    fn lookup(&self, name: &str) -> ResourceSchema {
        if let Some(schema) = self.store.get(name) {
            return schema.clone();
        }
        tracing::warn!(resource = %name, "no schema definition found, using default schema");
        ResourceSchema::fallback(name)
    }

    pub fn compile(&self, client: &str, tier: &str, include_seed_data: bool) -> Result<BuildPackage> {
        let started = Instant::now();
        let client = paths::validate_client_identity(client)?;
        let config = tier::resolve(tier)?;

        let schemas: Vec<ResourceSchema> = config
            .resource_types
            .iter()
            .map(|name| self.lookup(name))
            .collect();

        let views: Vec<ViewSpec> = config.views.iter().map(|v| ViewSpec::for_name(v)).collect();

        let seed_data = include_seed_data.then(|| self.seed(config, &schemas));

        let integrations: Vec<String> =
            config.integrations.iter().map(|i| i.to_string()).collect();

        let documentation = document(&client, config, &schemas, &views);

        let defaulted_schemas: Vec<String> = schemas
            .iter()
            .filter(|s| s.defaulted)
            .map(|s| s.name.clone())
            .collect();

        let metadata = BuildMetadata {
            database_count: schemas.len(),
            view_count: views.len(),
            field_count: schemas.iter().map(|s| s.fields.len()).sum(),
            seed_record_count: seed_data
                .as_ref()
                .map(|d| d.values().map(Vec::len).sum())
                .unwrap_or(0),
            integration_count: integrations.len(),
            defaulted_schemas,
            build_duration_ms: started.elapsed().as_millis() as u64,
            generator_version: GENERATOR_VERSION.to_string(),
        };

        let package = BuildPackage {
            build_id: Uuid::new_v4(),
            created_at: self.clock.now(),
            client,
            tier: config.id,
            schemas,
            views,
            seed_data,
            integrations,
            documentation,
            metadata,
        };

        tracing::info!(
            build_id = %package.build_id,
            tier = %package.tier,
            databases = package.metadata.database_count,
            views = package.metadata.view_count,
            seed_records = package.metadata.seed_record_count,
            "compiled build package"
        );
        Ok(package)
    }

    fn seed(
        &self,
        config: &TierConfiguration,
        schemas: &[ResourceSchema],
    ) -> BTreeMap<String, Vec<SeedRecord>> {
        schemas
            .iter()
            .filter(|s| config.seed_resources.contains(&s.name.as_str()))
            .map(|s| {
                (
                    s.name.clone(),
                    seed::generate(s, config.seed_count, self.clock.as_ref()),
                )
            })
            .collect()
    }
}

fn document(
    client: &str,
    config: &TierConfiguration,
    schemas: &[ResourceSchema],
    views: &[ViewSpec],
) -> Vec<DocSection> {
    let mut docs = Vec::with_capacity(schemas.len() + 2);

    let mut readme = format!(
        "{client} workspace, {} tier.\n\n{} databases and {} views are provisioned.",
        config.display_name,
        schemas.len(),
        views.len()
    );
    if !config.features.is_empty() {
        readme.push_str("\n\nIncluded features: ");
        readme.push_str(&config.features.join(", "));
        readme.push('.');
    }
    docs.push(DocSection {
        title: "README".to_string(),
        body: readme,
    });

    for schema in schemas {
        let mut body = schema
            .description
            .clone()
            .unwrap_or_else(|| format!("{} records.", schema.title));
        body.push_str("\n\nFields:\n");
        for field in &schema.fields {
            body.push_str(&format!("- {} ({})\n", field.name, field.kind.as_str()));
        }
        let related: Vec<&ViewSpec> = views
            .iter()
            .filter(|v| v.resource_type.as_deref() == Some(schema.name.as_str()))
            .collect();
        if !related.is_empty() {
            body.push_str("\nViews:\n");
            for view in related {
                body.push_str(&format!("- {} ({})\n", view.name, view.kind));
            }
        }
        docs.push(DocSection {
            title: schema.title.clone(),
            body,
        });
    }

    let integrations = if config.integrations.is_empty() {
        "No integrations are included in this tier.".to_string()
    } else {
        format!(
            "The following integrations are reserved and must be authorized by the client: {}.",
            config.integrations.join(", ")
        )
    };
    docs.push(DocSection {
        title: "Integrations".to_string(),
        body: integrations,
    });

    docs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
