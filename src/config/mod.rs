//! TOML configuration stored as `config.toml` in the app directory.
//!
//! Every key is optional; missing keys fall back to the built-in defaults and
//! out-of-range values are clamped on load.

mod defaults;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};
use thiserror::Error;

use crate::app_dirs;
use crate::ml::regressor::TrainOptions;
use defaults::*;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Small synthetic dataset bundled for tests and quick starts.
pub const TEST_DATA_FILE: &str = "test_data.csv";
/// Full training dataset name.
pub const TRAINING_DATA_FILE: &str = "municipal_complaints_training.csv";
/// When set, overrides `dataset.use_test_data` (`true`/`1` enable it).
pub const USE_TEST_DATA_ENV: &str = "CIVIC_PRIORITY_USE_TEST_DATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
}

/// Regressor training knobs.
///
/// Config keys: `epochs`, `batch_size`, `learning_rate`, `validation_split`,
/// `patience`, `log_every`, `l2_penalty`, `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_validation_split")]
    pub validation_split: f32,
    #[serde(default = "default_patience")]
    pub patience: usize,
    #[serde(default = "default_log_every")]
    pub log_every: usize,
    #[serde(default = "default_l2_penalty")]
    pub l2_penalty: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            validation_split: default_validation_split(),
            patience: default_patience(),
            log_every: default_log_every(),
            l2_penalty: default_l2_penalty(),
            seed: default_seed(),
        }
    }
}

impl TrainingSettings {
    pub fn to_options(&self) -> TrainOptions {
        TrainOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            validation_split: self.validation_split,
            patience: self.patience,
            log_every: self.log_every,
            l2_penalty: self.l2_penalty,
            seed: self.seed,
        }
    }
}

/// Config keys: `training_timeout_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// How long a prediction waits for an in-flight training run.
    #[serde(default = "default_training_timeout_secs")]
    pub training_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            training_timeout_secs: default_training_timeout_secs(),
        }
    }
}

impl ServiceSettings {
    pub fn training_timeout(&self) -> Duration {
        Duration::from_secs(self.training_timeout_secs)
    }
}

/// Config keys: `dataset_path`, `use_test_data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSettings {
    /// Explicit dataset file; relative paths resolve against the data directory.
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
    /// Pick the bundled synthetic dataset instead of the full one.
    #[serde(default)]
    pub use_test_data: bool,
}

impl DatasetSettings {
    /// Dataset file inside `data_dir`; `use_test_data` overrides the configured switch.
    pub fn resolve_in(&self, data_dir: &Path, use_test_data: Option<bool>) -> PathBuf {
        if let Some(path) = &self.dataset_path {
            return if path.is_absolute() {
                path.clone()
            } else {
                data_dir.join(path)
            };
        }
        if use_test_data.unwrap_or(self.use_test_data) {
            data_dir.join(TEST_DATA_FILE)
        } else {
            data_dir.join(TRAINING_DATA_FILE)
        }
    }
}

impl Settings {
    pub(crate) fn normalized(mut self) -> Self {
        let training = &mut self.training;
        training.epochs = training.epochs.clamp(1, MAX_EPOCHS);
        training.batch_size = training.batch_size.clamp(1, MAX_BATCH_SIZE);
        training.learning_rate = clamp_learning_rate(training.learning_rate);
        training.validation_split = clamp_fraction(
            training.validation_split,
            MAX_VALIDATION_SPLIT,
            default_validation_split(),
        );
        training.log_every = training.log_every.max(1);
        training.l2_penalty = clamp_fraction(training.l2_penalty, 1.0, default_l2_penalty());
        self.service.training_timeout_secs = self
            .service
            .training_timeout_secs
            .clamp(MIN_TRAINING_TIMEOUT_SECS, MAX_TRAINING_TIMEOUT_SECS);
        self
    }

    /// Dataset file for this process, honoring [`USE_TEST_DATA_ENV`].
    pub fn dataset_path(&self) -> Result<PathBuf, ConfigError> {
        let data_dir = app_dirs::data_dir().map_err(map_app_dir_error)?;
        Ok(self.dataset.resolve_in(&data_dir, test_data_override()))
    }

    /// Whether the synthetic test dataset is selected, after the env override.
    ///
    /// False whenever an explicit `dataset_path` is configured.
    pub fn uses_test_data(&self) -> bool {
        self.dataset.dataset_path.is_none()
            && test_data_override().unwrap_or(self.dataset.use_test_data)
    }
}

fn test_data_override() -> Option<bool> {
    std::env::var(USE_TEST_DATA_ENV)
        .ok()
        .map(|value| parse_flag(&value))
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load `config.toml` from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    load_from(&config_path()?)
}

/// Load settings from a specific file; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str::<Settings>(&text)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(Settings::normalized)
}

/// Write settings as pretty TOML, creating parent directories as needed.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.training.to_options(), TrainOptions::default());
        assert_eq!(settings.service.training_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[training]\nepochs = 12\n\n[dataset]\nuse_test_data = true\n")
            .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.training.epochs, 12);
        assert_eq!(settings.training.batch_size, 32);
        assert!(settings.dataset.use_test_data);
        assert_eq!(settings.service, ServiceSettings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[training]\nepochs = 0\nbatch_size = 0\nlearning_rate = -1.0\nvalidation_split = 0.9\nlog_every = 0\n\n[service]\ntraining_timeout_secs = 0\n",
        )
        .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.training.epochs, 1);
        assert_eq!(settings.training.batch_size, 1);
        assert_eq!(settings.training.learning_rate, 0.001);
        assert_eq!(settings.training.validation_split, 0.5);
        assert_eq!(settings.training.log_every, 1);
        assert_eq!(settings.service.training_timeout_secs, 1);
    }

    #[test]
    fn huge_training_timeout_is_capped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[service]\ntraining_timeout_secs = 9223372036854775807\n",
        )
        .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.service.training_timeout_secs, MAX_TRAINING_TIMEOUT_SECS);
        assert_eq!(
            settings.service.training_timeout(),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[training\nepochs = ").unwrap();
        match load_from(&path) {
            Err(ConfigError::ParseToml { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut settings = Settings::default();
        settings.training.seed = 7;
        settings.dataset.dataset_path = Some(PathBuf::from("complaints.csv"));
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), settings);
    }

    #[test]
    fn dataset_resolution_follows_switches() {
        let data = Path::new("/srv/data");
        let mut dataset = DatasetSettings::default();
        assert_eq!(dataset.resolve_in(data, None), data.join(TRAINING_DATA_FILE));
        assert_eq!(dataset.resolve_in(data, Some(true)), data.join(TEST_DATA_FILE));
        dataset.use_test_data = true;
        assert_eq!(dataset.resolve_in(data, None), data.join(TEST_DATA_FILE));
        assert_eq!(dataset.resolve_in(data, Some(false)), data.join(TRAINING_DATA_FILE));
        dataset.dataset_path = Some(PathBuf::from("custom.csv"));
        assert_eq!(dataset.resolve_in(data, Some(true)), data.join("custom.csv"));
    }

    #[test]
    fn env_flag_parsing() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("yes please"));
    }
}
