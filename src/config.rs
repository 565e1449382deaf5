// Startup configuration: backing-service credentials from the environment and
// optional default identifiers from an on-disk JSON file. Read once; a missing
// URL or key aborts startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

pub const DEFAULT_PORT: u16 = 3000;
const CONFIG_PATH_ENV: &str = "SUPABASE_GATEWAY_CONFIG";
const CONFIG_DIR_NAME: &str = "supabase-gateway";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("SUPABASE_URL is not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Identifiers the config file may provide. The project id stands in for a
/// missing `project_id` parameter; it never selects a different connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectDefaults {
    #[serde(default, alias = "organizationId")]
    pub organization_id: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub supabase_url: Url,
    pub supabase_key: String,
    pub defaults: ProjectDefaults,
}

impl Settings {
    /// Load from the process environment (after `.env`) and the config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = non_empty("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let supabase_url = Url::parse(raw_url.trim())?;

        let supabase_key = non_empty("SUPABASE_KEY")
            .or_else(|| non_empty("SUPABASE_SERVICE_ROLE_KEY"))
            .ok_or(ConfigError::Missing("SUPABASE_KEY"))?;

        let config_path = non_empty(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);
        let defaults = match config_path {
            Some(path) => load_defaults(&path)?,
            None => ProjectDefaults::default(),
        };

        Ok(Self {
            supabase_url,
            supabase_key: supabase_key.trim().to_string(),
            defaults,
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// A missing file means "no defaults"; an unreadable or malformed one is an
/// error.
pub fn load_defaults(path: &Path) -> Result<ProjectDefaults, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using empty defaults");
            return Ok(ProjectDefaults::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let defaults: ProjectDefaults = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(defaults)
}
