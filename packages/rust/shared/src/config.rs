//! Application configuration for asrskit.
//!
//! User config lives at `~/.asrskit/asrskit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AsrsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "asrskit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".asrskit";

// ---------------------------------------------------------------------------
// Config structs (matching asrskit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Class names that mark heading/section/data paragraphs.
    #[serde(default)]
    pub markers: MarkerClasses,

    /// Remote classification service settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Per-token prices used for the cost preview.
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// `[markers]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerClasses {
    /// Class carried by the paragraph that opens a record.
    #[serde(default = "default_heading_class")]
    pub heading_class: String,

    /// Class carried by section title paragraphs.
    #[serde(default = "default_section_class")]
    pub section_class: String,

    /// Class carried by data paragraphs.
    #[serde(default = "default_data_class")]
    pub data_class: String,
}

impl Default for MarkerClasses {
    fn default() -> Self {
        Self {
            heading_class: default_heading_class(),
            section_class: default_section_class(),
            data_class: default_data_class(),
        }
    }
}

fn default_heading_class() -> String {
    "acnheading".into()
}
fn default_section_class() -> String {
    "acnsection".into()
}
fn default_data_class() -> String {
    "acndata".into()
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the inference API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Reasoning effort hint for reasoning models.
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,

    /// Pause between consecutive requests, in milliseconds.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Write the output file after this many processed records.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// HTTP timeout per request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            reasoning_effort: default_reasoning_effort(),
            request_delay_ms: default_request_delay(),
            checkpoint_every: default_checkpoint_every(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "o3-2025-04-16".into()
}
fn default_reasoning_effort() -> String {
    "medium".into()
}
fn default_request_delay() -> u64 {
    1000
}
fn default_checkpoint_every() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    300
}

/// `[pricing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// USD per million input tokens.
    #[serde(default = "default_input_price")]
    pub input_per_million: f64,

    /// USD per million output tokens (reasoning tokens are billed as output).
    #[serde(default = "default_output_price")]
    pub output_per_million: f64,

    /// Assumed output tokens per call when previewing a run.
    #[serde(default = "default_avg_output_tokens")]
    pub avg_output_tokens: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million: default_input_price(),
            output_per_million: default_output_price(),
            avg_output_tokens: default_avg_output_tokens(),
        }
    }
}

fn default_input_price() -> f64 {
    10.0
}
fn default_output_price() -> f64 {
    40.0
}
fn default_avg_output_tokens() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.asrskit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AsrsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.asrskit/asrskit.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| AsrsError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| AsrsError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AsrsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| AsrsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AsrsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make a run meaningless.
fn validate_config(config: &AppConfig) -> Result<()> {
    Url::parse(&config.classifier.api_base).map_err(|e| {
        AsrsError::config(format!(
            "classifier.api_base '{}' is not a valid URL: {e}",
            config.classifier.api_base
        ))
    })?;

    if config.classifier.checkpoint_every == 0 {
        return Err(AsrsError::config("classifier.checkpoint_every must be at least 1"));
    }

    let markers = &config.markers;
    for class in [&markers.heading_class, &markers.section_class, &markers.data_class] {
        if class.trim().is_empty() || class.contains(char::is_whitespace) {
            return Err(AsrsError::config(format!(
                "marker class '{class}' must be a single non-empty class name"
            )));
        }
    }

    Ok(())
}

/// Read the API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.classifier.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(AsrsError::config(format!(
            "API key not found. Set the {var_name} environment variable.\n\
             Example: export {var_name}='your_api_key_here'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("acnheading"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.classifier.checkpoint_every, 5);
        assert_eq!(parsed.classifier.request_delay_ms, 1000);
        assert_eq!(parsed.markers, MarkerClasses::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[markers]
heading_class = "reportheading"

[classifier]
model = "gpt-4.1"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.markers.heading_class, "reportheading");
        assert_eq!(config.markers.data_class, "acndata");
        assert_eq!(config.classifier.model, "gpt-4.1");
        assert_eq!(config.classifier.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.pricing.avg_output_tokens, 1000);
    }

    #[test]
    fn load_config_from_rejects_bad_api_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("asrskit.toml");
        std::fs::write(&path, "[classifier]\napi_base = \"not a url\"\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("api_base"));
    }

    #[test]
    fn load_config_from_rejects_zero_checkpoint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("asrskit.toml");
        std::fs::write(&path, "[classifier]\ncheckpoint_every = 0\n").expect("write");

        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn api_key_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.classifier.api_key_env = "ASRSKIT_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
