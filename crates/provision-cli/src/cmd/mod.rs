pub mod build;
pub mod deploy;
pub mod estimate;
pub mod health;
pub mod init;
pub mod report;
pub mod validate;
