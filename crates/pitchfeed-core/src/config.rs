// Configuration loading and parsing (config/pitchfeed.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::PollIntervals;

/// File name shared by `defaults/` and `config/`.
pub const CONFIG_FILE_NAME: &str = "pitchfeed.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub db_path: String,
}

impl Config {
    /// Poll intervals in the form the pollers consume.
    pub fn intervals(&self) -> PollIntervals {
        PollIntervals {
            at_bat: Duration::from_secs(self.polling.at_bat_secs),
            play_by_play: Duration::from_secs(self.polling.play_by_play_secs),
            games_list: Duration::from_secs(self.polling.games_list_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// pitchfeed.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    polling: PollingConfig,
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_user_agent() -> String {
    "pitchfeed/0.1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub at_bat_secs: u64,
    pub play_by_play_secs: u64,
    pub games_list_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/pitchfeed.toml` relative to
/// `base_dir`. Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate configuration text. `path` is only used in errors.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        api: file.api,
        polling: file.polling,
        db_path: file.database.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure `config/pitchfeed.toml` exists by copying it from `defaults/`.
/// Returns the files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let source = defaults_dir.join(CONFIG_FILE_NAME);
    let target = config_dir.join(CONFIG_FILE_NAME);
    if !source.is_file() || target.exists() {
        return Ok(vec![]);
    }

    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;

    Ok(vec![target])
}

/// Load config relative to the current working directory, copying defaults
/// first when needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    let copied = ensure_config_files(&cwd)?;
    for path in &copied {
        tracing::info!("Initialized {} from defaults", path.display());
    }
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    let interval_fields: &[(&str, u64)] = &[
        ("polling.at_bat_secs", config.polling.at_bat_secs),
        ("polling.play_by_play_secs", config.polling.play_by_play_secs),
        ("polling.games_list_secs", config.polling.games_list_secs),
    ];
    for (name, val) in interval_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be greater than 0".into(),
            });
        }
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    const VALID: &str = r#"
[api]
base_url = "https://statsapi.mlb.com"
timeout_secs = 5

[polling]
at_bat_secs = 10
play_by_play_secs = 30
games_list_secs = 15

[database]
path = ":memory:"
"#;

    #[test]
    fn load_shipped_defaults() {
        let tmp = std::env::temp_dir().join("pitchfeed_config_shipped_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE_NAME),
            tmp.join("defaults").join(CONFIG_FILE_NAME),
        )
        .unwrap();

        ensure_config_files(&tmp).expect("should copy default config");
        let config = load_config_from(&tmp).expect("should load shipped defaults");

        assert_eq!(config.api.base_url, "https://statsapi.mlb.com");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.db_path, "pitchfeed.db");
        assert_eq!(config.intervals(), PollIntervals::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn user_agent_defaults_when_omitted() {
        let config = parse_config(VALID, Path::new("inline.toml")).unwrap();
        assert_eq!(config.api.user_agent, "pitchfeed/0.1");
        assert_eq!(config.intervals().at_bat, Duration::from_secs(10));
    }

    #[test]
    fn rejects_zero_interval() {
        let text = VALID.replace("play_by_play_secs = 30", "play_by_play_secs = 0");
        let err = parse_config(&text, Path::new("inline.toml")).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "polling.play_by_play_secs");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_zero_timeout() {
        let text = VALID.replace("timeout_secs = 5", "timeout_secs = 0");
        let err = parse_config(&text, Path::new("inline.toml")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "api.timeout_secs"
        ));
    }

    #[test]
    fn rejects_empty_base_url() {
        let text = VALID.replace("https://statsapi.mlb.com", "  ");
        let err = parse_config(&text, Path::new("inline.toml")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "api.base_url"
        ));
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let err = parse_config("[api\nbase_url = ", Path::new("broken.toml")).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert_eq!(path, PathBuf::from("broken.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("pitchfeed_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("pitchfeed_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE_NAME), VALID).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE_NAME), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("pitchfeed_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
