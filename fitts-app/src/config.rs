use std::path::{Path, PathBuf};

use fitts_experiment::{ExperimentConfig, ExperimentError};
use fitts_store::StorageConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "fitts.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid display settings: {0}")]
    Display(String),

    #[error(transparent)]
    Experiment(#[from] ExperimentError),
}

/// Everything the binary reads from `fitts.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub experiment: ExperimentConfig,
    pub storage: StorageConfig,
    pub display: DisplayConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fullscreen: bool,
    /// Window size when not fullscreen
    pub width: u32,
    pub height: u32,
    /// Falls back to a system font search
    pub font_path: Option<PathBuf>,
    /// Redraw ceiling for surfaces that present without vsync
    pub max_fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            width: 1024,
            height: 768,
            font_path: None,
            max_fps: 240,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Open the trial sheet in the desktop's default viewer afterwards
    pub open_after: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("data/export"),
            open_after: false,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.experiment.validate()?;
        if self.display.max_fps == 0 {
            return Err(ConfigError::Display("max_fps must be positive".to_string()));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Display(format!(
                "window size must be positive, got {}x{}",
                self.display.width, self.display.height
            )));
        }
        if !self.display.fullscreen {
            self.experiment.check_fits(self.display.width as f64)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `./fitts.toml` when present, defaults otherwise
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
