use thiserror::Error;

/// Failures while constructing a [`crate::WorkspaceClient`]. Request
/// failures are reported as `provision_core::remote::RemoteError`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("api token is empty")]
    MissingToken,

    #[error("invalid {0} header value")]
    InvalidHeader(&'static str),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
