//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive. Numeric getters fall back to
//! the default when a key is absent or does not parse, logging a warning for
//! the latter.

use crate::domain::error::BiframeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use tracing::warn;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BiframeError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| BiframeError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, BiframeError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| BiframeError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parsed<T: std::str::FromStr>(&self, section: &str, key: &str, default: T) -> T {
        let Some(raw) = self.config.get(section, key) else {
            return default;
        };
        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("[{}] {} = {:?} is not a number, using default", section, key, raw);
                default
            }
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parsed(section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parsed(section, key, default)
    }
}
