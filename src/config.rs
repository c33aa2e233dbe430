//! Renderer configuration, loadable from YAML.

use std::path::PathBuf;

use serde::Deserialize;

use crate::display;
use crate::error::Error;

pub const DEFAULT_CACHE_CAPACITY: usize = 200;

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_text_scale() -> f32 {
    1.0
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    /// A `.map` file, or a directory of them.
    pub map_path: PathBuf,
    /// A built-in theme name or the path of an `.xml` theme.
    pub theme: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_text_scale")]
    pub text_scale: f32,
    /// Overrides the process-wide device scale for this renderer only.
    #[serde(default)]
    pub device_scale: Option<f32>,
}

impl RendererConfig {
    pub fn new(map_path: impl Into<PathBuf>, theme: impl Into<String>) -> RendererConfig {
        RendererConfig {
            map_path: map_path.into(),
            theme: theme.into(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            text_scale: default_text_scale(),
            device_scale: None,
        }
    }

    /// Parses a YAML config document.
    pub fn from_yaml(data: &str) -> Result<RendererConfig, Error> {
        let config: RendererConfig = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    pub fn with_text_scale(mut self, text_scale: f32) -> Self {
        self.text_scale = text_scale;
        self
    }

    pub fn with_device_scale(mut self, device_scale: f32) -> Self {
        self.device_scale = Some(device_scale);
        self
    }

    /// Checks the numeric settings. The map path and theme are checked when they are opened.
    pub fn validate(&self) -> Result<(), Error> {
        if self.cache_capacity == 0 {
            return Err(Error::InvalidCacheCapacity);
        }
        if !(self.text_scale.is_finite() && self.text_scale > 0.0) {
            return Err(Error::InvalidTextScale(self.text_scale));
        }
        if let Some(scale) = self.device_scale {
            display::validate_scale(scale)?;
        }
        Ok(())
    }
}
