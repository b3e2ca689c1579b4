//! `workspace-api`: HTTP binding of `provision_core::remote::RemoteApi` for
//! a Notion-style workspace platform.
//!
//! Four endpoints are used:
//!
//! ```text
//! GET  /v1/users/me     identity probe
//! POST /v1/databases    create a database
//! POST /v1/pages        create a record or free page
//! POST /v1/search       find existing databases and pages
//! ```
//!
//! Every request carries `Authorization: Bearer <token>` and the
//! configured `Notion-Version` header. Non-2xx responses are mapped onto
//! the closed `RemoteError` set; see [`client::classify`].

pub mod client;
pub mod error;

pub use client::{ClientConfig, WorkspaceClient};
pub use error::ClientError;
