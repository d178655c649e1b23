//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use ability_content::{ConfigLoader, LoadResult, RecipeLibrary, StepCatalog};
use ability_core::EngineConfig;

/// Configuration of one caster's ability runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of ability slots per caster.
    pub slots: usize,
    /// Extra recipe directory loaded on top of the embedded recipes.
    pub content_dir: Option<PathBuf>,
    /// Engine configuration file; embedded defaults when unset.
    pub engine_config: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            slots: Self::DEFAULT_SLOTS,
            content_dir: None,
            engine_config: None,
        }
    }
}

impl RuntimeConfig {
    pub const DEFAULT_SLOTS: usize = 4;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ABILITY_SLOTS` - Ability slots per caster (default: 4, minimum 1)
    /// - `ABILITY_CONTENT_DIR` - Directory of extra recipe RON files (optional)
    /// - `ABILITY_ENGINE_CONFIG` - Engine configuration TOML (optional)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(slots) = read_env::<usize>("ABILITY_SLOTS") {
            config.slots = slots.max(1);
        }
        config.content_dir = env::var("ABILITY_CONTENT_DIR").ok().map(PathBuf::from);
        config.engine_config = env::var("ABILITY_ENGINE_CONFIG").ok().map(PathBuf::from);

        config
    }

    /// Engine configuration from the configured file, or the embedded one.
    pub fn load_engine_config(&self) -> LoadResult<EngineConfig> {
        match &self.engine_config {
            Some(path) => ConfigLoader::load(path),
            None => ConfigLoader::embedded(),
        }
    }

    /// Embedded recipes plus everything in the content directory.
    pub fn load_library(&self) -> LoadResult<RecipeLibrary> {
        let mut library = RecipeLibrary::embedded(StepCatalog::embedded()?)?;
        if let Some(dir) = &self.content_dir {
            let loaded = library.load_dir(dir)?;
            tracing::info!(dir = %dir.display(), loaded, "loaded recipe directory");
        }
        Ok(library)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_embedded_content() {
        let config = RuntimeConfig::default();
        assert_eq!(config.slots, 4);
        assert_eq!(config.load_engine_config().unwrap(), EngineConfig::new());
        assert!(config.load_library().unwrap().get("cleave").is_some());
    }

    #[test]
    fn content_dir_extends_the_library() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("jab.ron"),
            r#"(name: "jab", steps: [(id: "AnimateStrike", start: 0.2)])"#,
        )
        .unwrap();

        let config = RuntimeConfig {
            content_dir: Some(dir.path().to_path_buf()),
            ..RuntimeConfig::default()
        };
        let library = config.load_library().unwrap();
        assert!(library.get("jab").is_some());
        assert!(library.get("whirlwind").is_some());
    }

    #[test]
    fn missing_engine_config_is_an_error() {
        let config = RuntimeConfig {
            engine_config: Some(PathBuf::from("/nonexistent/engine.toml")),
            ..RuntimeConfig::default()
        };
        assert!(config.load_engine_config().is_err());
    }
}
