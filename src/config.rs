//! Render settings
//!
//! Uses RON (Rusty Object Notation) for a human-readable settings file.
//! Every field is optional; missing ones take the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rasterizer::{RenderState, Vec3, HEIGHT, WIDTH};

/// Default settings file, relative to the working directory
pub const CONFIG_PATH: &str = "render.ron";

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render resolution (the window is this times `window_scale`)
    pub width: usize,
    pub height: usize,
    pub window_scale: u32,

    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// Direction towards the light; normalized on use
    pub light_dir: Vec3,

    pub backface_culling: bool,
    pub wireframe: bool,
    pub smooth_shading: bool,

    /// Model catalog to load at startup
    pub catalog: PathBuf,
    pub start_model: usize,
    /// Spin the model while the mouse is not dragging it
    pub auto_rotate: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            window_scale: 3,
            eye: Vec3::new(0.0, 0.0, 3.0),
            center: Vec3::ZERO,
            up: Vec3::UP,
            light_dir: Vec3::new(1.0, 1.0, 1.0),
            backface_culling: true,
            wireframe: false,
            smooth_shading: true,
            catalog: PathBuf::from("assets/models.ron"),
            start_model: 0,
            auto_rotate: true,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!("resolution {}x{}", self.width, self.height)));
        }
        if self.window_scale == 0 {
            return Err(ConfigError::Invalid("window_scale must be at least 1".to_string()));
        }
        if (self.eye - self.center).len() == 0.0 {
            return Err(ConfigError::Invalid("eye and center coincide".to_string()));
        }
        if self.light_dir.try_normalize().is_none() {
            return Err(ConfigError::Invalid("light_dir has zero length".to_string()));
        }
        if self.up.cross(self.eye - self.center).try_normalize().is_none() {
            return Err(ConfigError::Invalid("up is parallel to the view direction".to_string()));
        }
        Ok(())
    }

    pub fn parse_str(s: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse_str(&contents)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            println!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .indentor("  ".to_string());

        let contents = ron::ser::to_string_pretty(self, config)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Camera, matrices and toggles for the configured resolution
    pub fn render_state(&self) -> RenderState {
        let mut state = RenderState::new(
            self.eye,
            self.center,
            self.up,
            self.light_dir.normalize(),
            self.width,
            self.height,
        );
        state.backface_culling = self.backface_culling;
        state.wireframe = self.wireframe;
        state.smooth_shading = self.smooth_shading;
        state
    }

    /// Copy the pipeline toggles back from a live render state
    pub fn capture_toggles(&mut self, state: &RenderState) {
        self.backface_culling = state.backface_culling;
        self.wireframe = state.wireframe;
        self.smooth_shading = state.smooth_shading;
    }
}
