//! `swisscv.toml` and its environment overrides
//!
//! A setting is taken from the first of: command-line flag, `SWISSCV_*`
//! variable (`OPENAI_API_KEY` for the key), TOML file, built-in default.
//! Every section is `#[serde(default)]`, so an empty file is a valid config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::persona::{MAX_AGE, MIN_WORKING_AGE};
use crate::summary::SummaryProvider;

/// Main generator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Reference data location and loading policy
    pub data: DataSettings,

    /// Sampling bounds
    pub sampling: SamplingSettings,

    /// LLM summary settings
    pub summary: SummarySettings,

    /// Export settings
    pub output: OutputSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Reference data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory containing cantons.json, occupations.json, companies.json and name CSVs
    pub dir: String,

    /// Use the dataset compiled into the binary for any missing table
    pub bundled_fallback: bool,

    /// Fail on the first malformed row instead of skipping it
    pub strict: bool,
}

/// Sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Lowest sampled age (inclusive)
    pub min_age: u32,

    /// Highest sampled age (inclusive)
    pub max_age: u32,
}

/// OpenAI-compatible summary backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Attach an LLM-generated summary to each persona
    pub enabled: bool,

    /// Backend: "openai" (any OpenAI-compatible server) or "template" (offline)
    pub provider: SummaryProvider,

    /// Root of the OpenAI-compatible API; `/chat/completions` is appended
    pub base_url: String,

    /// Only required by api.openai.com; local servers accept none
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Per-persona timeout in seconds
    pub timeout_secs: u64,

    /// Extra attempts after a 429, 5xx or connection failure
    pub max_retries: u32,

    /// Maximum tokens in the generated summary
    pub max_tokens: u32,

    /// Sampling temperature (0-2)
    pub temperature: f32,

    /// Cache responses on disk
    pub cache_enabled: bool,

    /// Response cache directory
    pub cache_dir: String,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output directory for generated documents
    pub dir: String,

    /// Document formats to write
    pub formats: Vec<ExportFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Threshold before `-v`/`-q` are applied
    pub level: String,

    /// Daily-rolling log file; stderr only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Rolled files kept on disk
    pub max_files: u32,

    /// One JSON object per event on every sink
    pub json_format: bool,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            bundled_fallback: true,
            strict: false,
        }
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 65,
        }
    }
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: SummaryProvider::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            max_tokens: 200,
            temperature: 0.7,
            cache_enabled: true,
            cache_dir: "~/.swisscv/cache/summaries".to_string(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            formats: vec![ExportFormat::Json],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl GeneratorConfig {
    /// Defaults, then the first config file found, then `SWISSCV_*` variables.
    /// The result is validated before it is returned; CLI flags are applied
    /// on top by the caller.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match locate_config(explicit)? {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No swisscv.toml found, starting from defaults");
                Self::default()
            }
        };

        config.overlay_env();
        config.resolve_paths();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e),
            source: Some(e),
        })?;
        info!(path = %path.display(), "Using configuration file");
        Ok(config)
    }

    fn overlay_env(&mut self) {
        let flag = |v: &str| Some(v.eq_ignore_ascii_case("true") || v == "1");
        let text = |v: &str| Some(v.to_string());

        from_env("SWISSCV_DATA_DIR", &mut self.data.dir, text);
        from_env("SWISSCV_BUNDLED_FALLBACK", &mut self.data.bundled_fallback, flag);
        from_env("SWISSCV_DATA_STRICT", &mut self.data.strict, flag);

        from_env("SWISSCV_MIN_AGE", &mut self.sampling.min_age, |v| v.parse().ok());
        from_env("SWISSCV_MAX_AGE", &mut self.sampling.max_age, |v| v.parse().ok());

        let summary = &mut self.summary;
        from_env("SWISSCV_SUMMARY_ENABLED", &mut summary.enabled, flag);
        from_env("SWISSCV_SUMMARY_PROVIDER", &mut summary.provider, |v| v.parse().ok());
        from_env("SWISSCV_OPENAI_BASE_URL", &mut summary.base_url, text);
        // The swisscv-specific key wins over the one shared with other tools
        from_env("OPENAI_API_KEY", &mut summary.api_key, text);
        from_env("SWISSCV_OPENAI_API_KEY", &mut summary.api_key, text);
        from_env("SWISSCV_OPENAI_MODEL", &mut summary.model, text);
        from_env("SWISSCV_SUMMARY_TIMEOUT_SECS", &mut summary.timeout_secs, |v| v.parse().ok());
        from_env("SWISSCV_SUMMARY_CACHE_DIR", &mut summary.cache_dir, text);

        from_env("SWISSCV_OUTPUT_DIR", &mut self.output.dir, text);

        from_env("SWISSCV_LOG_LEVEL", &mut self.logging.level, text);
        from_env("SWISSCV_LOG_FILE", &mut self.logging.file, |v| Some(Some(v.to_string())));
        from_env("SWISSCV_LOG_JSON", &mut self.logging.json_format, flag);
    }

    fn resolve_paths(&mut self) {
        for dir in [&mut self.data.dir, &mut self.output.dir, &mut self.summary.cache_dir] {
            *dir = expand_path(dir);
        }
        self.logging.file = self.logging.file.as_deref().map(expand_path);
    }

    /// Reject settings that would only fail later, mid-batch
    pub fn validate(&self) -> Result<()> {
        let sampling = &self.sampling;
        if sampling.min_age < MIN_WORKING_AGE || sampling.max_age > MAX_AGE {
            return Err(Error::config_field_invalid(
                "sampling",
                format!(
                    "sampling ages must lie within [{}, {}], got [{}, {}]",
                    MIN_WORKING_AGE, MAX_AGE, sampling.min_age, sampling.max_age
                ),
            ));
        }
        if sampling.min_age > sampling.max_age {
            return Err(Error::config_field_invalid(
                "sampling.min_age",
                "sampling.min_age must not exceed sampling.max_age",
            ));
        }

        let summary = &self.summary;
        let http = url::Url::parse(&summary.base_url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !http {
            return Err(Error::config_field_invalid(
                "summary.base_url",
                format!("summary.base_url '{}' is not an http(s) URL", summary.base_url),
            ));
        }
        if summary.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "summary.timeout_secs",
                "summary.timeout_secs must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&summary.temperature) {
            return Err(Error::config_field_invalid(
                "summary.temperature",
                "summary.temperature must be between 0 and 2",
            ));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}', expected {}",
                    self.logging.level,
                    LOG_LEVELS.join("|")
                ),
            ));
        }

        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.dir)
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Overwrite `target` when `var` is set and `parse` accepts its value
fn from_env<T>(var: &str, target: &mut T, parse: impl Fn(&str) -> Option<T>) {
    if let Some(value) = std::env::var(var).ok().as_deref().and_then(parse) {
        *target = value;
    }
}

/// An explicit path must exist. Without one, the first hit among
/// `./swisscv.toml`, the XDG config dir, `~/.swisscv/config.toml` and
/// `/etc/swisscv/config.toml` is used.
fn locate_config(explicit: Option<&str>) -> Result<Option<PathBuf>> {
    if let Some(raw) = explicit {
        let path = PathBuf::from(expand_path(raw));
        return if path.is_file() {
            Ok(Some(path))
        } else {
            Err(Error::ConfigNotFound { path })
        };
    }

    let candidates = [
        Some(PathBuf::from("swisscv.toml")),
        dirs::config_dir().map(|d| d.join("swisscv").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".swisscv").join("config.toml")),
        Some(PathBuf::from("/etc/swisscv/config.toml")),
    ];
    Ok(candidates.into_iter().flatten().find(|path| {
        let hit = path.is_file();
        if hit {
            debug!(path = %path.display(), "Discovered configuration file");
        }
        hit
    }))
}

fn expand_path(path: &str) -> String {
    match shellexpand::full(path) {
        Ok(expanded) => expanded.into_owned(),
        Err(_) => path.to_string(),
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".swisscv")
        .join("config.toml")
}

/// Write the commented default config to `path` (or `~/.swisscv/config.toml`)
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let target = path.map(|p| PathBuf::from(expand_path(p))).unwrap_or_else(default_config_path);

    if target.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists; pass --force to replace it",
            target.display()
        )));
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target, default_config_toml()).map_err(|source| Error::IoWrite {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}

fn default_config_toml() -> &'static str {
    r#"# swisscv configuration

[data]
# Directory with cantons.json, occupations.json, companies.json,
# names_de.csv, names_fr.csv, names_it.csv and surnames.csv
dir = "data"

# Use the dataset compiled into the binary for missing tables
bundled_fallback = true

# Fail on the first malformed row instead of skipping it
strict = false

[sampling]
# Uniform age range (inclusive)
min_age = 18
max_age = 65

[summary]
# Attach an LLM-generated summary to each persona
enabled = false

# "openai" for any OpenAI-compatible server, "template" for offline text
provider = "openai"

# OpenAI-compatible API base URL (OpenAI, Ollama, vLLM, LM Studio, ...)
base_url = "https://api.openai.com/v1"

# API key; OPENAI_API_KEY is read from the environment when unset
# api_key = ""

model = "gpt-4o-mini"
timeout_secs = 30
max_retries = 2
max_tokens = 200
temperature = 0.7

# Cache responses on disk, keyed by prompt hash
cache_enabled = true
cache_dir = "~/.swisscv/cache/summaries"

[output]
dir = "output"
# Any of: json, html, pdf, csv
formats = ["json"]

[logging]
# error, warn, info, debug or trace; -v and -q adjust it per run
level = "info"

# Also log to a file rolled daily, e.g. swisscv.2026-10-16.log
# file = "~/.swisscv/logs/swisscv.log"
max_files = 5

# Structured JSON events instead of compact text
json_format = false
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.data.dir, "data");
        assert!(config.data.bundled_fallback);
        assert_eq!(config.sampling.min_age, 18);
        assert_eq!(config.sampling.max_age, 65);
        assert!(!config.summary.enabled);
        assert_eq!(config.output.formats, vec![ExportFormat::Json]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_override() {
        env::set_var("SWISSCV_MIN_AGE", "25");
        env::set_var("SWISSCV_DATA_STRICT", "true");
        env::set_var("SWISSCV_OPENAI_MODEL", "llama3");

        let mut config = GeneratorConfig::default();
        config.overlay_env();

        assert_eq!(config.sampling.min_age, 25);
        assert!(config.data.strict);
        assert_eq!(config.summary.model, "llama3");

        env::remove_var("SWISSCV_MIN_AGE");
        env::remove_var("SWISSCV_DATA_STRICT");
        env::remove_var("SWISSCV_OPENAI_MODEL");
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_age_bounds() {
        let mut config = GeneratorConfig::default();
        config.sampling.min_age = 12;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.sampling.max_age = 120;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.sampling.min_age = 50;
        config.sampling.max_age = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_base_url() {
        let mut config = GeneratorConfig::default();
        config.summary.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.summary.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_temperature() {
        let mut config = GeneratorConfig::default();
        config.summary.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = GeneratorConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = GeneratorConfig::default();
        config.output.dir = "~/swisscv/out".to_string();
        config.resolve_paths();
        assert!(!config.output.dir.contains('~'));
    }

    #[test]
    fn test_default_toml_parses() {
        let config: GeneratorConfig = toml::from_str(default_config_toml()).unwrap();
        assert_eq!(config.sampling.max_age, 65);
        assert_eq!(config.summary.model, "gpt-4o-mini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config_file() {
        let config_str = r#"
[data]
dir = "/srv/swisscv/data"
strict = true

[sampling]
min_age = 20
max_age = 60

[output]
formats = ["json", "html", "pdf", "csv"]
"#;

        let config: GeneratorConfig = toml::from_str(config_str).unwrap();

        assert_eq!(config.data.dir, "/srv/swisscv/data");
        assert!(config.data.strict);
        assert!(config.data.bundled_fallback);
        assert_eq!(config.sampling.min_age, 20);
        assert_eq!(
            config.output.formats,
            vec![
                ExportFormat::Json,
                ExportFormat::Html,
                ExportFormat::Pdf,
                ExportFormat::Csv
            ]
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("swisscv.toml");
        let path_str = path.to_str().unwrap();

        init_config(Some(path_str), false).unwrap();
        assert!(path.exists());
        assert!(init_config(Some(path_str), false).is_err());
        assert!(init_config(Some(path_str), true).is_ok());
    }
}
