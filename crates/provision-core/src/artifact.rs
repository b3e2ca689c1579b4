use crate::compiler::BuildPackage;
use crate::error::{ProvisionError, Result};
use crate::paths;
use crate::types::TierId;
use std::path::{Path, PathBuf};

const BUILD_FILE_PREFIX: &str = "build-";

/// Persisted build packages, one JSON file each, keyed by tier and build
/// timestamp.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store under a project root (`.provision/builds`).
    pub fn for_root(root: &Path) -> Self {
        Self::new(paths::builds_dir(root))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(package: &BuildPackage) -> String {
        format!(
            "{BUILD_FILE_PREFIX}{}-{}-{}.json",
            package.tier,
            paths::timestamp_key(package.created_at),
            paths::slugify(&package.client)
        )
    }

    pub fn save(&self, package: &BuildPackage) -> Result<PathBuf> {
        let path = self.dir.join(Self::file_name(package));
        crate::io::write_json(&path, package)?;
        tracing::info!(path = %path.display(), build_id = %package.build_id, "saved build package");
        Ok(path)
    }

    /// Every artifact file, sorted by name. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(BUILD_FILE_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn list_tier(&self, tier: TierId) -> Result<Vec<PathBuf>> {
        let prefix = format!("{BUILD_FILE_PREFIX}{tier}-");
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect())
    }

    /// Load the lexicographically latest package for `tier`.
    pub fn latest(&self, tier: TierId) -> Result<BuildPackage> {
        let path = self
            .list_tier(tier)?
            .pop()
            .ok_or_else(|| ProvisionError::ArtifactNotFound(tier.to_string()))?;
        tracing::debug!(path = %path.display(), "loading build package");
        crate::io::read_json(&path)
    }
}
