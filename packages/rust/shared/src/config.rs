//! Application configuration for renewtrack.
//!
//! User config lives at `~/.renewtrack/renewtrack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RenewTrackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "renewtrack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".renewtrack";

// ---------------------------------------------------------------------------
// Config structs (matching renewtrack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Document ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Reminder window settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Outgoing mail settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for contract documents.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Location of the contract database file.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            database: default_database(),
        }
    }
}

fn default_source_dir() -> String {
    "./contracts".into()
}
fn default_database() -> String {
    "contracts.db".into()
}

/// `[ingest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// File extensions (without the dot) treated as contract documents.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".into()]
}

/// `[notify]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Days ahead of a renewal date at which a reminder goes out.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            lookahead_days: default_lookahead_days(),
        }
    }
}

fn default_lookahead_days() -> u32 {
    30
}

/// `[smtp]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Mail server host name.
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Mail server port (STARTTLS submission).
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// `From` address on reminders.
    #[serde(default = "default_sender")]
    pub sender: String,

    /// `To` address on reminders.
    #[serde(default = "default_receiver")]
    pub receiver: String,

    /// Login user name.
    #[serde(default = "default_sender")]
    pub username: String,

    /// Name of the env var holding the SMTP password (never store the password itself).
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            sender: default_sender(),
            receiver: default_receiver(),
            username: default_sender(),
            password_env: default_password_env(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.example.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_sender() -> String {
    "your_email@example.com".into()
}
fn default_receiver() -> String {
    "receiver@example.com".into()
}
fn default_password_env() -> String {
    "RENEWTRACK_SMTP_PASSWORD".into()
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime ingestion options.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Directory to scan.
    pub source_dir: PathBuf,
    /// Recognized document extensions, without the dot.
    pub extensions: Vec<String>,
    /// Abort the batch on the first unreadable document.
    pub fail_fast: bool,
}

impl From<&AppConfig> for IngestOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            source_dir: PathBuf::from(&config.paths.source_dir),
            extensions: config.ingest.extensions.clone(),
            fail_fast: false,
        }
    }
}

/// Runtime notification options.
#[derive(Debug, Clone)]
pub struct NotifyOptions {
    /// Size of the reminder window in days.
    pub lookahead_days: u32,
    /// Address reminders are sent to.
    pub recipient: String,
    /// Evaluate the window without sending or marking anything.
    pub dry_run: bool,
    /// Abort the pass on the first dispatch failure.
    pub fail_fast: bool,
}

impl From<&AppConfig> for NotifyOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            lookahead_days: config.notify.lookahead_days,
            recipient: config.smtp.receiver.clone(),
            dry_run: false,
            fail_fast: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.renewtrack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RenewTrackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.renewtrack/renewtrack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RenewTrackError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RenewTrackError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RenewTrackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RenewTrackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RenewTrackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the SMTP password from the env var named by `smtp.password_env`.
pub fn smtp_password(config: &AppConfig) -> Result<String> {
    let var_name = &config.smtp.password_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(RenewTrackError::config(format!(
            "SMTP password not found. Set the {var_name} environment variable."
        ))),
    }
}
