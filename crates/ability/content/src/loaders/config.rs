//! Engine configuration loader.

use std::path::Path;

use ability_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
///
/// Missing keys keep their defaults, so a file only lists what it changes.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
    }

    /// Configuration shipped with the crate.
    pub fn embedded() -> LoadResult<EngineConfig> {
        Self::parse(include_str!("../../data/engine.toml"))
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_config_matches_defaults() {
        let config = ConfigLoader::embedded().unwrap();
        assert_eq!(config, EngineConfig::new());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deferred_timeout = 4.5").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.deferred_timeout, 4.5);
        assert_eq!(config.min_channel_tick, EngineConfig::DEFAULT_MIN_CHANNEL_TICK);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deferred_timeout = \"soon\"").unwrap();

        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
