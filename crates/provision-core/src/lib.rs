pub mod artifact;
pub mod builtin;
pub mod clock;
pub mod compiler;
pub mod config;
pub mod error;
pub mod estimate;
pub mod io;
pub mod orchestrator;
pub mod pacer;
pub mod paths;
pub mod properties;
pub mod remote;
pub mod report;
pub mod schema;
pub mod seed;
pub mod state;
pub mod tier;
pub mod types;
pub mod views;

pub use error::{ProvisionError, Result};
