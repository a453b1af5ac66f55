//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Read the file given on the command line, or the first file found by
//!    [`probe_config_paths`]; with neither, start from defaults
//! 2. Apply environment overrides
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `MAILGUN_API_KEY`: API key
//! - `MAILGUN_REGION`: `us` or `eu`
//! - `MAILGUN_BASE_URL`: endpoint override
//! - `MAILGUN_CREDENTIALS_FILE`: path to a JSON connection secret, applied
//!   before the individual variables above
//! - `PROVIDER_MAX_CONCURRENCY`: bound on concurrent resource operations
//! - `PROVIDER_HEALTH_ADDR`: listen address for health and metrics
//!
//! ## File Locations
//! Probed in order, in the working directory, its parent and grandparent,
//! then next to the executable: `provider-mailgun.toml`, `config.toml`,
//! `config.json`.

use std::path::{Path, PathBuf};

use provider_mailgun_common::{CommonError, CommonResult};
use provider_mailgun_domain::Region;

use super::credentials::ApiCredentials;
use super::schema::ProviderConfig;

const FILE_NAMES: &[&str] = &["provider-mailgun.toml", "config.toml", "config.json"];

/// Load, override and validate the configuration.
///
/// # Errors
/// Returns `CommonError::Config` if:
/// - An explicit `path` does not exist
/// - The file or an environment variable cannot be parsed
/// - The final configuration fails [`ProviderConfig::validate`]
pub fn load(path: Option<PathBuf>) -> CommonResult<ProviderConfig> {
    let mut config = match path.or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            ProviderConfig::default()
        }
    };
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Read and parse one configuration file without validating it.
///
/// Format is detected by extension (`.toml` or `.json`).
pub fn load_from_file(path: &Path) -> CommonResult<ProviderConfig> {
    if !path.exists() {
        return Err(CommonError::config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| CommonError::config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> CommonResult<ProviderConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CommonError::config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CommonError::config(format!("Invalid JSON format: {e}"))),
        _ => Err(CommonError::config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing configuration file in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Overlay environment variables on a loaded configuration.
///
/// # Errors
/// Returns `CommonError::Config` naming the variable that failed to parse.
pub fn apply_env_overrides(config: &mut ProviderConfig) -> CommonResult<()> {
    if let Some(path) = env_var("MAILGUN_CREDENTIALS_FILE") {
        let raw = std::fs::read(&path).map_err(|e| {
            CommonError::config_field(
                "MAILGUN_CREDENTIALS_FILE",
                format!("failed to read {path}: {e}"),
            )
        })?;
        ApiCredentials::from_json(&raw)?.apply_to(&mut config.api);
    }
    if let Some(key) = env_var("MAILGUN_API_KEY") {
        config.api.api_key = key;
    }
    if let Some(region) = env_var("MAILGUN_REGION") {
        config.api.region = region
            .parse::<Region>()
            .map_err(|e| CommonError::config_field("MAILGUN_REGION", e))?;
    }
    if let Some(url) = env_var("MAILGUN_BASE_URL") {
        config.api.base_url = Some(url);
    }
    if let Some(raw) = env_var("PROVIDER_MAX_CONCURRENCY") {
        config.controller.max_concurrency = raw.parse().map_err(|e| {
            CommonError::config_field("PROVIDER_MAX_CONCURRENCY", format!("invalid number: {e}"))
        })?;
    }
    if let Some(raw) = env_var("PROVIDER_HEALTH_ADDR") {
        config.server.health_addr = raw.parse().map_err(|e| {
            CommonError::config_field("PROVIDER_HEALTH_ADDR", format!("invalid address: {e}"))
        })?;
    }
    Ok(())
}

/// Non-empty environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
