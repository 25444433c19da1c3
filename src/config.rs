use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "RiskMonitor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment override for the bleeding model artifact path.
pub const ENV_MODEL_PATH: &str = "RISKMONITOR_MODEL";
/// Environment override for the history database path.
pub const ENV_DB_PATH: &str = "RISKMONITOR_DB";
/// Environment override for the log filter (falls back to `RUST_LOG`).
pub const ENV_LOG: &str = "RISKMONITOR_LOG";

/// File name of the trained bleeding-risk artifact.
pub const MODEL_FILE_NAME: &str = "bleeding_risk_model.json";

/// Get the application data directory
/// ~/RiskMonitor/ on all platforms, or the working directory when no home exists.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Default location of the bleeding-risk artifact.
pub fn default_model_path() -> PathBuf {
    models_dir().join(MODEL_FILE_NAME)
}

/// Default location of the history database.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("history.db")
}

/// Log filter used when neither `RISKMONITOR_LOG` nor `RUST_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "riskmonitor=info,riskmonitor_lib=info"
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub database_path: PathBuf,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            database_path: default_database_path(),
            log_filter: default_log_filter().to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `RISKMONITOR_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_MODEL_PATH).filter(|v| !v.trim().is_empty()) {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(filter) = lookup(ENV_LOG).or_else(|| lookup("RUST_LOG")) {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }
        config
    }
}
