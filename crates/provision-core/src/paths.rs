use crate::error::{ProvisionError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PROVISION_DIR: &str = ".provision";
pub const SCHEMAS_DIR: &str = ".provision/schemas";
pub const BUILDS_DIR: &str = ".provision/builds";
pub const DEPLOYMENTS_DIR: &str = ".provision/deployments";

pub const CONFIG_FILE: &str = ".provision/config.yaml";

pub const STATE_FILE_PREFIX: &str = "state-";
pub const REPORT_FILE_PREFIX: &str = "report-";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn provision_dir(root: &Path) -> PathBuf {
    root.join(PROVISION_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn schemas_dir(root: &Path) -> PathBuf {
    root.join(SCHEMAS_DIR)
}

pub fn builds_dir(root: &Path) -> PathBuf {
    root.join(BUILDS_DIR)
}

pub fn deployments_dir(root: &Path) -> PathBuf {
    root.join(DEPLOYMENTS_DIR)
}

/// Sortable UTC timestamp used in artifact and report file names,
/// e.g. `20250115T120000123Z`.
pub fn timestamp_key(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%3fZ").to_string()
}

// ---------------------------------------------------------------------------
// Client identity validation
// ---------------------------------------------------------------------------

pub const MAX_CLIENT_LEN: usize = 100;

const RESERVED_WORDS: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9", "admin",
    "root", "system",
];

static UNSAFE_RE: OnceLock<Regex> = OnceLock::new();

fn unsafe_re() -> &'static Regex {
    UNSAFE_RE.get_or_init(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]|\.\."#).unwrap())
}

/// Check a client identity before it is used in artifact names and remote
/// titles. Returns the trimmed identity.
pub fn validate_client_identity(identity: &str) -> Result<String> {
    let invalid = |reason: &str| ProvisionError::InvalidClientIdentity {
        identity: identity.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if trimmed.chars().count() > MAX_CLIENT_LEN {
        return Err(invalid("must be at most 100 characters"));
    }
    if trimmed.starts_with('.') || unsafe_re().is_match(trimmed) {
        return Err(invalid("contains path-unsafe characters"));
    }
    let lowered = trimmed.to_lowercase();
    if RESERVED_WORDS.contains(&lowered.as_str()) {
        return Err(invalid("is a reserved word"));
    }
    Ok(trimmed.to_string())
}

/// Lowercase, hyphen-separated form of a client identity for file names.
pub fn slugify(identity: &str) -> String {
    let mut slug = String::with_capacity(identity.len());
    let mut pending_dash = false;
    for c in identity.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("client");
    }
    slug
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
