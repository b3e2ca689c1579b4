use crate::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("not initialized: run 'provision init'")]
    NotInitialized,

    #[error("unknown tier '{0}': expected one of starter, professional, enterprise")]
    UnknownTier(String),

    #[error("invalid client identity '{identity}': {reason}")]
    InvalidClientIdentity { identity: String, reason: String },

    #[error("missing required input: {0}")]
    MissingInput(String),

    #[error("no build package found for tier '{0}': run 'provision build' first")]
    ArtifactNotFound(String),

    #[error("invalid schema '{schema}': {reason}")]
    InvalidSchema { schema: String, reason: String },

    #[error("duplicate field '{field}' in schema '{schema}'")]
    DuplicateField { schema: String, field: String },

    #[error("remote api error: {0}")]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
