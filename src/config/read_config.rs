use crate::{
    config::{Config, CONFIG_FILE_NAME},
    error::ConfigError,
};
use std::{fs::File, io::BufReader, path::Path};

impl Config {
    /// Reads `pumpconsole.json` from `dir`, or returns the defaults when the
    /// file does not exist. A file that exists but does not parse or
    /// validate is an error.
    pub fn load_or_default(dir: &Path) -> Result<Config, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            tracing::debug!(path = ?config_path, "no config file, using defaults");
            return Ok(Config::default());
        }
        let cfg = Self::read_config_file(&config_path)?;
        println!("> [config] loaded {:?}", config_path);
        Ok(cfg)
    }

    pub fn read_config_file(config_path: &Path) -> Result<Config, ConfigError> {
        if config_path.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "{:?} is a directory",
                config_path
            )));
        }
        let file = File::open(config_path)?;
        let reader = BufReader::new(file);
        let cfg: Config = serde_json::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be > 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be > 0".into()));
        }
        if self.path_token.trim().is_empty() || self.vendor_token.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "discovery tokens must not be empty".into(),
            ));
        }
        for (name, value) in [
            ("default_flow", self.default_flow),
            ("default_on_secs", self.default_on_secs),
            ("default_off_secs", self.default_off_secs),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be finite", name)));
            }
        }
        Ok(())
    }
}
