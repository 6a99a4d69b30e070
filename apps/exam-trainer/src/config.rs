//! Configuration for exam trainer.

use exam_core::ExamConfig;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exam: ExamConfig,
    #[serde(default)]
    pub study: StudyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub bank: BankConfig,
}

impl Config {
    /// Load the config file, writing a default one on first run.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_default(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                if let Err(err) = config.save_to(path) {
                    tracing::warn!(path = %path.display(), error = %err, "could not write default config");
                }
                config
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read config file");
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Option<Self> {
        match toml::from_str(content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed config file");
                None
            }
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "exam-trainer")
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.config_dir().join("config.toml"))
    }

    /// Database path: the configured one, else the platform data dir.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.storage
            .db_path
            .clone()
            .or_else(|| Self::project_dirs().map(|d| d.data_dir().join("exam-trainer.db")))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.data_dir().join("exam-trainer.log"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Delay before a marked flashcard advances to the next one.
    #[serde(default = "default_advance_delay")]
    pub auto_advance_delay_ms: u64,
}

fn default_advance_delay() -> u64 { 500 }

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay_ms: default_advance_delay(),
        }
    }
}

impl StudyConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankConfig {
    /// External question bank; the bundled one is used when unset.
    #[serde(default)]
    pub questions_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.exam, ExamConfig::default());
        assert_eq!(config.study.auto_advance_delay_ms, 500);
        assert!(config.storage.db_path.is_none());
        assert!(config.bank.questions_path.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [exam]
            passing_score = 30

            [study]
            auto_advance_delay_ms = 250

            [storage]
            db_path = "/tmp/exam.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.exam.passing_score, 30);
        assert_eq!(config.exam.general_questions, 32);
        assert_eq!(config.study.auto_advance_delay(), Duration::from_millis(250));
        assert_eq!(config.db_path(), Some(PathBuf::from("/tmp/exam.db")));
    }

    #[test]
    fn test_malformed_config_is_rejected() {
        assert!(Config::parse("[exam\npassing_score = ").is_none());
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.study.auto_advance_delay_ms, config.study.auto_advance_delay_ms);
        assert_eq!(parsed.exam, config.exam);
    }

    #[test]
    fn test_first_run_writes_default_file() {
        let dir = std::env::temp_dir().join(format!("exam-trainer-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = std::fs::remove_dir_all(&dir);

        let config = Config::load_from(&path);
        assert_eq!(config.exam, ExamConfig::default());
        assert!(path.exists());

        std::fs::write(&path, "[study]\nauto_advance_delay_ms = 900\n").unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.study.auto_advance_delay_ms, 900);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
