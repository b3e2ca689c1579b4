//! API-call volume and wall-clock estimates.
//!
//! Every provisioning operation has a fixed weight in API units. The same
//! weight table prices a tier up front and a compiled build package after
//! the fact.

use crate::builtin;
use crate::compiler::BuildPackage;
use crate::error::Result;
use crate::tier::{self, TierConfiguration};
use crate::types::TierId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

pub const WEIGHT_DATABASE: u64 = 2;
pub const WEIGHT_VIEW: u64 = 1;
pub const WEIGHT_FIELD: u64 = 1;
pub const WEIGHT_INTEGRATION: u64 = 3;
pub const WEIGHT_AUTOMATION: u64 = 2;
pub const WEIGHT_RECORD: u64 = 1;

/// Setup and validation calls made by every deployment.
pub const BASE_OVERHEAD_UNITS: u64 = 20;

/// Sustained units per second the platform accepts.
pub const ASSUMED_THROUGHPUT: u64 = 3;

/// Records a deployment creates per seeded resource type at most.
pub const MAX_RECORDS_PER_RESOURCE: usize = 5;

const LARGE_DEPLOYMENT_UNITS: u64 = 1000;
const LONG_DEPLOYMENT_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// CostEstimate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Databases,
    Views,
    Fields,
    Integrations,
    Automations,
    Records,
    Overhead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub category: Category,
    pub count: u64,
    pub weight: u64,
    pub units: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub tier: TierId,
    pub include_seed_data: bool,
    pub breakdown: Vec<CostLine>,
    pub total_units: u64,
    pub estimated_seconds: u64,
    pub monthly_price_usd: u32,
    pub recommendations: Vec<String>,
}

impl CostEstimate {
    pub fn line(&self, category: Category) -> Option<&CostLine> {
        self.breakdown.iter().find(|l| l.category == category)
    }

    /// `1m 05s` style rendering of the estimate.
    pub fn duration_display(&self) -> String {
        let (m, s) = (self.estimated_seconds / 60, self.estimated_seconds % 60);
        if m == 0 {
            format!("{s}s")
        } else {
            format!("{m}m {s:02}s")
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    databases: u64,
    views: u64,
    fields: u64,
    integrations: u64,
    automations: u64,
    records: u64,
}

fn line(category: Category, count: u64, weight: u64) -> CostLine {
    CostLine {
        category,
        count,
        weight,
        units: count * weight,
    }
}

fn build(tier: &TierConfiguration, include_seed_data: bool, counts: Counts) -> CostEstimate {
    let mut breakdown = vec![
        line(Category::Databases, counts.databases, WEIGHT_DATABASE),
        line(Category::Views, counts.views, WEIGHT_VIEW),
        line(Category::Fields, counts.fields, WEIGHT_FIELD),
        line(Category::Integrations, counts.integrations, WEIGHT_INTEGRATION),
        line(Category::Automations, counts.automations, WEIGHT_AUTOMATION),
    ];
    if include_seed_data {
        breakdown.push(line(Category::Records, counts.records, WEIGHT_RECORD));
    }
    breakdown.push(line(Category::Overhead, 1, BASE_OVERHEAD_UNITS));

    let total_units: u64 = breakdown.iter().map(|l| l.units).sum();
    let estimated_seconds = total_units.div_ceil(ASSUMED_THROUGHPUT);

    let mut estimate = CostEstimate {
        tier: tier.id,
        include_seed_data,
        breakdown,
        total_units,
        estimated_seconds,
        monthly_price_usd: tier.monthly_price_usd,
        recommendations: Vec::new(),
    };
    estimate.recommendations = recommend(&estimate, counts);
    estimate
}

fn recommend(estimate: &CostEstimate, counts: Counts) -> Vec<String> {
    let mut recs = Vec::new();
    if estimate.total_units > LARGE_DEPLOYMENT_UNITS {
        recs.push(format!(
            "Large deployment ({} units): split provisioning into batches to stay under the platform quota",
            estimate.total_units
        ));
    }
    if estimate.estimated_seconds > LONG_DEPLOYMENT_SECS {
        recs.push("Schedule the deployment outside business hours".to_string());
    }
    if counts.integrations > 0 {
        recs.push(format!(
            "Have the client pre-authorize {} integration(s) before deploying",
            counts.integrations
        ));
    }
    if estimate.include_seed_data && counts.records > 0 {
        recs.push(format!(
            "Sample data adds {} record(s); disable it for production workspaces",
            counts.records
        ));
    }
    if recs.is_empty() {
        recs.push("No special preparation needed".to_string());
    }
    recs
}

fn tier_counts(tier: &TierConfiguration) -> Counts {
    let fields: usize = tier
        .resource_types
        .iter()
        .map(|name| {
            builtin::get(name)
                .map(|s| s.fields.len())
                .unwrap_or(crate::schema::default_fields().len())
        })
        .sum();
    let per_resource = tier.seed_count.min(MAX_RECORDS_PER_RESOURCE);
    Counts {
        databases: tier.resource_types.len() as u64,
        views: tier.views.len() as u64,
        fields: fields as u64,
        integrations: tier.integrations.len() as u64,
        automations: tier.automations.len() as u64,
        records: (tier.seed_resources.len() * per_resource) as u64,
    }
}

/// Predicted cost of deploying `tier`. Pure and deterministic.
pub fn estimate(tier: &str, include_seed_data: bool) -> Result<CostEstimate> {
    let config = tier::resolve(tier)?;
    Ok(build(config, include_seed_data, tier_counts(config)))
}

/// Estimates for every tier, ascending.
pub fn compare(include_seed_data: bool) -> Vec<CostEstimate> {
    tier::catalog()
        .into_iter()
        .map(|t| build(t, include_seed_data, tier_counts(t)))
        .collect()
}

/// Cost of a compiled package, using its actual schema and seed counts.
pub fn for_package(package: &BuildPackage) -> CostEstimate {
    let config = tier::get(package.tier);
    let records: usize = package
        .seed_data
        .as_ref()
        .map(|d| d.values().map(|r| r.len().min(MAX_RECORDS_PER_RESOURCE)).sum())
        .unwrap_or(0);
    let counts = Counts {
        databases: package.metadata.database_count as u64,
        views: package.metadata.view_count as u64,
        fields: package.metadata.field_count as u64,
        integrations: package.metadata.integration_count as u64,
        automations: config.automations.len() as u64,
        records: records as u64,
    };
    build(config, package.seed_data.is_some(), counts)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
