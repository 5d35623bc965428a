//! Shared types, error model, and configuration for renewtrack.
//!
//! This crate is the foundation depended on by all other renewtrack crates.
//! It provides:
//! - [`RenewTrackError`]: the unified error type
//! - Domain types ([`ContractRecord`], [`RenewalWindow`], [`RunId`])
//! - Configuration ([`AppConfig`], [`IngestOptions`], [`NotifyOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, IngestConfig, IngestOptions, NotifyConfig, NotifyOptions, PathsConfig, SmtpConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, smtp_password,
};
pub use error::{RenewTrackError, Result};
pub use types::{ContractRecord, DATE_FORMAT, RenewalWindow, RunId};
