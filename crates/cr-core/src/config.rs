//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, storage backend, grades, auth and playback.
//! Every section defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub grades: GradesConfig,
    pub auth: AuthConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None`, the file does not exist, or it cannot be parsed.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.storage.driver == StorageDriver::Remote {
            let remote = &self.storage.remote;
            for (name, value) in [
                ("bucket", &remote.bucket),
                ("region", &remote.region),
                ("access_key_id", &remote.access_key_id),
                ("access_key_secret", &remote.access_key_secret),
            ] {
                if value.is_empty() {
                    warnings.push(format!(
                        "storage.driver is remote but storage.remote.{name} is empty"
                    ));
                }
            }
        }

        if self.auth.token_secret.is_none() {
            warnings.push(
                "auth.token_secret is not set; viewer tokens cannot be verified and all views count anonymously"
                    .into(),
            );
        }

        if self.grades.defaults.is_empty() {
            warnings.push("grades.defaults is empty; every grade will be allowed".into());
        }

        for grade in self.grades.access_tokens.keys() {
            if !self.grades.defaults.contains(grade) {
                warnings.push(format!(
                    "grades.access_tokens has an entry for '{grade}', which is not a default grade"
                ));
            }
        }

        warnings
    }

    /// Directory holding the JSON record files.
    pub fn data_dir(&self) -> &Path {
        &self.server.data_dir
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 4000,
            data_dir: PathBuf::from("./data"),
            upload_dir: PathBuf::from("./uploads"),
            static_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

/// Where uploaded video bytes live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    #[default]
    Local,
    Remote,
}

impl StorageDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageDriver::Local => "local",
            StorageDriver::Remote => "remote",
        }
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub driver: StorageDriver,
    pub remote: RemoteStorageConfig,
}

/// Object-store settings, used when `driver` is `remote` or a video record
/// says it is remote-backed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteStorageConfig {
    pub region: String,
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Public base URL; when set, stream URLs are unsigned.
    pub base_url: String,
    pub prefix: String,
    #[serde(default = "default_signed_url_expires")]
    pub signed_url_expires_secs: u64,
}

fn default_signed_url_expires() -> u64 {
    3600
}

impl Default for RemoteStorageConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            bucket: String::new(),
            endpoint: String::new(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            base_url: String::new(),
            prefix: "videos".into(),
            signed_url_expires_secs: default_signed_url_expires(),
        }
    }
}

/// Grade list and access-token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradesConfig {
    /// Grades used when the grade file is missing or unreadable.
    pub defaults: Vec<String>,
    #[serde(default = "default_grade_cache_ttl")]
    pub cache_ttl_ms: u64,
    /// Per-grade access keys viewers must present.
    pub access_tokens: BTreeMap<String, String>,
}

fn default_grade_cache_ttl() -> u64 {
    5000
}

impl Default for GradesConfig {
    fn default() -> Self {
        Self {
            defaults: vec!["Grade 7".into(), "Grade 8".into(), "Grade 9".into()],
            cache_ttl_ms: default_grade_cache_ttl(),
            access_tokens: BTreeMap::new(),
        }
    }
}

/// Bearer-token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_secret: Option<String>,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: u64,
}

fn default_token_ttl() -> u64 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_hours: default_token_ttl(),
        }
    }
}

/// Settings handed to the student player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    pub allow_seek: bool,
}

fn default_refresh_interval() -> u64 {
    5000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            allow_seek: false,
        }
    }
}
