use crate::constants::{get_supported_sources, CONFIG_PATH, CONFIG_PATH_ENV, DEFAULT_FUZZY_THRESHOLD};
use crate::error::{Result, ShowingsError};
use crate::types::Source;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Similarity ratio (0-100) a pair must strictly exceed to be merged
    pub fuzzy_threshold: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub file: String,
    /// Directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file: "showings.log".to_string(),
            filter: "showings_aggregator=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub fixtures_dir: String,
    pub enabled: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fixtures_dir: "fixtures".to_string(),
            enabled: get_supported_sources().into_iter().map(String::from).collect(),
        }
    }
}

impl SourcesConfig {
    pub fn enabled_sources(&self) -> Result<Vec<Source>> {
        let mut sources = Vec::with_capacity(self.enabled.len());
        for name in &self.enabled {
            let source: Source = name.parse()?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(sources)
    }
}

impl Config {
    /// Load from `$SHOWINGS_CONFIG`, falling back to `config.toml`.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        let path = Path::new(&config_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|e| {
            ShowingsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&config_content).map_err(|e| {
            ShowingsError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.matching.fuzzy_threshold > 100 {
            return Err(ShowingsError::Config(format!(
                "matching.fuzzy_threshold must be between 0 and 100, got {}",
                self.matching.fuzzy_threshold
            )));
        }
        self.sources.enabled_sources()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.matching.fuzzy_threshold, 70);
        assert_eq!(config.sources.enabled_sources().unwrap(), Source::ALL.to_vec());
        assert_eq!(config.logging.dir, "logs");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[matching]\nfuzzy_threshold = 80\n\n[sources]\nenabled = [\"taj\", \"grand\"]\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.matching.fuzzy_threshold, 80);
        assert_eq!(
            config.sources.enabled_sources().unwrap(),
            vec![Source::Taj, Source::Grand]
        );
        assert_eq!(config.sources.fixtures_dir, "fixtures");
        assert_eq!(config.logging.file, "showings.log");
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("threshold.toml");
        fs::write(&path, "[matching]\nfuzzy_threshold = 150\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ShowingsError::Config(_))));

        let path = dir.path().join("source.toml");
        fs::write(&path, "[sources]\nenabled = [\"vox\"]\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ShowingsError::Config(_))));

        let path = dir.path().join("broken.toml");
        fs::write(&path, "[matching\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ShowingsError::Config(_))));
    }
}
