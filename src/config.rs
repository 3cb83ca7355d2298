//! SiteSeer configuration.
//!
//! Loaded from a TOML file whose path is resolved through a chain:
//!
//! 1. `--config <path>` — explicit per-invocation override
//! 2. `SITESEER_CONFIG` env var
//! 3. `~/.siteseer/config.toml`
//!
//! Secrets can stay out of the file: `SITESEER_MAPS_KEY` and
//! `SITESEER_ACCESS_TOKEN` override the matching entries.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

const REDACTED: &str = "<redacted>";

/// SiteSeer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    pub classifier: ClassifierConfig,
    pub blob: BlobConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub touch: TouchConfig,
    #[serde(default, rename = "loop")]
    pub pacing: LoopConfig,
}

/// The remote key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Database root, e.g. `https://siteseer.firebaseio.com`.
    pub url: String,

    /// Database secret or ID token, sent as `?auth=`.
    pub auth: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MapsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/directions/json".into(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassifierConfig {
    #[serde(default = "default_automl_endpoint")]
    pub endpoint: String,
    pub project: String,
    #[serde(default = "default_region")]
    pub region: String,
    pub model: String,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

fn default_automl_endpoint() -> String {
    "https://automl.googleapis.com/v1beta1".into()
}

fn default_region() -> String {
    "us-central1".into()
}

fn default_score_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BlobConfig {
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
    pub bucket: String,
    /// Object name each frame overwrites.
    #[serde(default = "default_object")]
    pub object: String,
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".into()
}

fn default_object() -> String {
    "Sidewalk".into()
}

/// Credentials for the classifier and blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GoogleConfig {
    /// Fixed bearer token. When absent, `token-command` is run per request.
    pub access_token: Option<String>,
    pub token_command: Vec<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            token_command: vec![
                "gcloud".into(),
                "auth".into(),
                "print-access-token".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CameraConfig {
    /// Where each frame is written. Overwritten every iteration.
    pub image_path: PathBuf,
    pub command: String,
    /// Arguments before the image path, which is always appended last.
    pub args: Vec<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("/home/pi/image.jpg"),
            command: "raspistill".into(),
            args: vec!["-n".into(), "-o".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TouchConfig {
    /// BCM pin number.
    pub pin: u32,
    pub gpio_root: PathBuf,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            pin: 11,
            gpio_root: PathBuf::from("/sys/class/gpio"),
        }
    }
}

/// Pacing between loop iterations. Zero means back-to-back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoopConfig {
    pub iteration_delay_ms: u64,
}

impl LoopConfig {
    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }
}

/// Resolve the config file path from the chain described in the module docs.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, String> {
    // 1. Explicit --config flag.
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    // 2. SITESEER_CONFIG environment variable.
    if let Ok(path) = env::var("SITESEER_CONFIG")
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    // 3. ~/.siteseer/config.toml.
    default_path().ok_or_else(|| "could not determine home directory".to_string())
}

/// The default config file path: `~/.siteseer/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".siteseer").join("config.toml"))
}

impl Config {
    /// Load config from `path`, applying environment overrides.
    /// Returns an error if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!(
                "no config file found at {}\n\
                 Create one with at minimum:\n\n\
                 [store]\n\
                 url = \"https://<database>.firebaseio.com\"\n\n\
                 [maps]\n\
                 api-key = \"...\"\n\n\
                 [classifier]\n\
                 project = \"...\"\n\
                 model = \"...\"\n\n\
                 [blob]\n\
                 bucket = \"...\"",
                path.display()
            ));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        Self::parse(&contents, path, |name| env::var(name).ok())
    }

    /// Parse and validate config text. `env` looks up override variables.
    pub fn parse(
        contents: &str,
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut config: Self = toml::from_str(contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if let Some(key) = env("SITESEER_MAPS_KEY").filter(|s| !s.is_empty()) {
            config.maps.api_key = Some(key);
        }
        if let Some(token) = env("SITESEER_ACCESS_TOKEN").filter(|s| !s.is_empty()) {
            config.google.access_token = Some(token);
        }

        config.validate().map_err(|e| format!("{e} in {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.store.url.trim().is_empty() {
            return Err("store.url is empty".into());
        }
        if self.maps.api_key.as_deref().is_none_or(str::is_empty) {
            return Err("maps.api-key is not set (or set SITESEER_MAPS_KEY)".into());
        }
        if !(0.0..=1.0).contains(&self.classifier.score_threshold) {
            return Err(format!(
                "classifier.score-threshold {} is outside 0..=1",
                self.classifier.score_threshold
            ));
        }
        if self.camera.command.trim().is_empty() {
            return Err("camera.command is empty".into());
        }
        Ok(())
    }

    /// A copy safe to print: secrets replaced.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let hide = |secret: &mut Option<String>| {
            if secret.is_some() {
                *secret = Some(REDACTED.into());
            }
        };
        hide(&mut config.store.auth);
        hide(&mut config.maps.api_key);
        hide(&mut config.google.access_token);
        config
    }
}
