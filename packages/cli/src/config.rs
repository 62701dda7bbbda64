use etch_common::{CachedSvgStore, MemoryComponentStore, MemoryLoopPresetStore, MemorySvgStore};
use etch_engine::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "etch.config.json";

/// Etch configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Directory of component definitions, one `*.json` file each
    pub components_dir: Option<String>,

    /// JSON file holding an array of loop presets
    pub presets_file: Option<String>,

    /// Directory of `*.svg` files, looked up by file name
    pub svg_dir: Option<String>,

    pub engine: EngineOptions,
}

/// Everything a render needs from disk
pub struct Stores {
    pub components: MemoryComponentStore,
    pub presets: MemoryLoopPresetStore,
    pub svgs: CachedSvgStore<MemorySvgStore>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_stores(&self, cwd: &str) -> anyhow::Result<Stores> {
        let resolve = |relative: &str| -> PathBuf { Path::new(cwd).join(relative) };

        let components = match &self.components_dir {
            Some(dir) => MemoryComponentStore::load_dir(&resolve(dir))?,
            None => MemoryComponentStore::new(),
        };
        let presets = match &self.presets_file {
            Some(file) => MemoryLoopPresetStore::load_file(&resolve(file))?,
            None => MemoryLoopPresetStore::new(),
        };
        let svgs = match &self.svg_dir {
            Some(dir) => MemorySvgStore::load_dir(&resolve(dir))?,
            None => MemorySvgStore::new(),
        };

        Ok(Stores {
            components,
            presets,
            svgs: CachedSvgStore::new(svgs),
        })
    }
}
