use crate::utils::error::{Result, ZitatError};
use crate::utils::validation::{validate_at_least, Validate};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Sentinel returned by `get` for unknown or unusable options.
pub const OPTION_INVALID: i64 = -1;

/// Recognized options and their built-in defaults.
pub const DEFAULTS: &[(&str, i64)] = &[
    ("min_rpt", 3),              // stable weight read at least 3 times
    ("max_dis", 30),             // tolerate 30kg difference for stable weight
    ("read_sleep", 2),           // seconds between readings
    ("zitat_show_time", 5),      // seconds a quotation stays up
    ("banner_wait", 5),          // seconds the banner stays up
    ("no_zitat_time", 5),
    ("random", 1),               // random selection (0 or non-0)
    ("weight_display", 0),       // just display the weight (0 or non-0)
    ("weight_scale", 100),       // scale skew correction, in percent
    ("min_weight_display", 190), // min weight worth showing at all
];

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    zitat: toml::Table,
}

/// Integer tunables backed by an optional TOML file.
///
/// The file holds a single `[zitat]` table. Reload is gated on the file's
/// modification time and happens implicitly on every `get`. Any bad option
/// resets the whole set to defaults.
#[derive(Debug)]
pub struct Config {
    path: Option<PathBuf>,
    loaded_at: Option<SystemTime>,
    healthy: bool,
    options: HashMap<String, i64>,
}

impl Config {
    pub fn with_defaults() -> Self {
        let mut config = Self {
            path: None,
            loaded_at: None,
            healthy: true,
            options: HashMap::new(),
        };
        config.set_defaults();
        config
    }

    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        let mut config = Self::with_defaults();
        config.path = Some(path.into());
        config
    }

    fn set_defaults(&mut self) {
        self.options = DEFAULTS
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect();
    }

    /// Re-read the backing file if its modification time has advanced.
    ///
    /// Returns whether the configuration is healthy: a missing file means
    /// the defaults apply and counts as healthy, a file with any bad option
    /// does not (the defaults are substituted for the whole set).
    pub fn load(&mut self) -> bool {
        let Some(path) = self.path.clone() else {
            return self.healthy;
        };
        let mtime = match std::fs::metadata(&path).and_then(|meta| meta.modified()) {
            Ok(mtime) => mtime,
            Err(_) => return true,
        };
        if let Some(loaded_at) = self.loaded_at {
            if mtime <= loaded_at {
                return self.healthy;
            }
        }
        tracing::info!("options in {}", path.display());
        self.loaded_at = Some(mtime);

        self.set_defaults();
        self.healthy = match Self::read_options(&path) {
            Ok(parsed) => {
                self.options.extend(parsed);
                match self.validate() {
                    Ok(()) => {
                        for (key, _) in DEFAULTS {
                            tracing::info!("option {} = {}", key, self.options[*key]);
                        }
                        true
                    }
                    Err(e) => {
                        tracing::error!("{}", e);
                        tracing::info!("using defaults");
                        self.set_defaults();
                        false
                    }
                }
            }
            Err(e) => {
                tracing::error!("{}", e);
                tracing::info!("using defaults");
                self.set_defaults();
                false
            }
        };
        self.healthy
    }

    /// Look up an option, reloading first when the file changed.
    ///
    /// Unknown names fail soft: log, reset the option set to defaults and
    /// return the sentinel.
    pub fn get(&mut self, key: &str) -> i64 {
        self.load();
        match self.options.get(key) {
            Some(value) => *value,
            None => {
                tracing::error!("unknown/bad key: {}", key);
                self.set_defaults();
                OPTION_INVALID
            }
        }
    }

    fn read_options(path: &Path) -> Result<HashMap<String, i64>> {
        let content = std::fs::read_to_string(path)?;
        let content = substitute_env_vars(&content);
        let file: ConfigFile = toml::from_str(&content).map_err(|e| ZitatError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;

        let mut options = HashMap::new();
        for (key, value) in &file.zitat {
            if !DEFAULTS.iter().any(|(known, _)| *known == key.as_str()) {
                tracing::debug!("ignoring unrecognized option {}", key);
                continue;
            }
            let parsed = coerce_int(value).ok_or_else(|| ZitatError::ConfigError {
                message: format!("unknown/bad key: {} = {}", key, value),
            })?;
            options.insert(key.clone(), parsed);
        }
        Ok(options)
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<()> {
        // timing options feed Duration conversions and must not be negative
        for key in ["min_rpt", "read_sleep", "zitat_show_time", "banner_wait", "no_zitat_time"] {
            let value = self.options.get(key).copied().unwrap_or(OPTION_INVALID);
            validate_at_least(key, value, 0)?;
        }
        Ok(())
    }
}

/// Values may be TOML integers or integer strings ("900").
fn coerce_int(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(i) => Some(*i),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Replace `${VAR_NAME}` with the environment value, leaving unset variables
/// as-is.
fn substitute_env_vars(content: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

/// Clone-and-share handle to the single `Config`, handed to every component
/// that needs tunables.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<Mutex<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    pub fn get(&self, key: &str) -> i64 {
        match self.inner.lock() {
            Ok(mut config) => config.get(key),
            Err(_) => {
                tracing::error!("configuration lock poisoned");
                OPTION_INVALID
            }
        }
    }

    pub fn reload(&self) -> bool {
        match self.inner.lock() {
            Ok(mut config) => config.load(),
            Err(_) => {
                tracing::error!("configuration lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let mut config = Config::with_defaults();
        assert!(config.load());
        assert_eq!(config.get("min_rpt"), 3);
        assert_eq!(config.get("max_dis"), 30);
        assert_eq!(config.get("min_weight_display"), 190);
    }

    #[test]
    fn test_unknown_key_returns_sentinel() {
        let mut config = Config::with_defaults();
        assert_eq!(config.get("no_such_option"), OPTION_INVALID);
        // the set is reset, known options still answer
        assert_eq!(config.get("min_rpt"), 3);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[zitat]\nmin_rpt = 5\nzitat_show_time = \"900\"").unwrap();

        let mut config = Config::from_path(file.path());
        assert!(config.load());
        assert_eq!(config.get("min_rpt"), 5);
        assert_eq!(config.get("zitat_show_time"), 900);
        // untouched options keep their defaults
        assert_eq!(config.get("max_dis"), 30);
    }

    #[test]
    fn test_bad_value_resets_whole_set() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[zitat]\nmin_rpt = 5\nmax_dis = \"plenty\"").unwrap();

        let mut config = Config::from_path(file.path());
        assert!(!config.load());
        // not just the bad option reverts
        assert_eq!(config.get("min_rpt"), 3);
        assert_eq!(config.get("max_dis"), 30);
    }

    #[test]
    fn test_negative_timing_is_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[zitat]\nread_sleep = -2").unwrap();

        let mut config = Config::from_path(file.path());
        assert!(!config.load());
        assert_eq!(config.get("read_sleep"), 2);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ZITAT_TEST_MIN_RPT", "7");

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[zitat]\nmin_rpt = \"${{ZITAT_TEST_MIN_RPT}}\"").unwrap();

        let mut config = Config::from_path(file.path());
        assert!(config.load());
        assert_eq!(config.get("min_rpt"), 7);

        std::env::remove_var("ZITAT_TEST_MIN_RPT");
    }

    #[test]
    fn test_reload_only_when_mtime_advances() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[zitat]\nmin_rpt = 5").unwrap();
        file.flush().unwrap();
        let first_mtime = std::fs::metadata(file.path()).unwrap().modified().unwrap();

        let mut config = Config::from_path(file.path());
        assert_eq!(config.get("min_rpt"), 5);

        // rewrite but wind the mtime back: must not be picked up
        std::fs::write(file.path(), "[zitat]\nmin_rpt = 9\n").unwrap();
        let handle = std::fs::OpenOptions::new()
            .write(true)
            .open(file.path())
            .unwrap();
        handle.set_modified(first_mtime).unwrap();
        assert_eq!(config.get("min_rpt"), 5);

        // advance the mtime: picked up on the next get
        handle
            .set_modified(first_mtime + Duration::from_secs(10))
            .unwrap();
        assert_eq!(config.get("min_rpt"), 9);
    }
}
