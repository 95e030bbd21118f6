//! Viewer configuration - the models table plus camera, lighting and labels
//!
//! The viewer ships with an embedded `viewer.toml`. A replacement can be
//! supplied as TOML or JSON (see [`ViewerConfig::parse`]).

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::registry::{parse_hex_color, ModelConfig, ModelRegistry, RegistryError};
use crate::rig::LockPresets;
use crate::tween::Ease;

const EMBEDDED_CONFIG: &str = include_str!("../viewer.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read viewer config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse viewer config: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to parse viewer config: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid viewer config: {0}")]
    Invalid(#[from] RegistryError),
    #[error("Invalid {preset} orbit bounds: {reason}")]
    InvalidBounds { preset: &'static str, reason: String },
    #[error("Invalid camera {field}: {value}")]
    InvalidCamera { field: &'static str, value: f32 },
}

/// Camera projection, start pose and transition timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_start_position")]
    pub start_position: Vec3,
    #[serde(default = "default_transition_secs")]
    pub transition_secs: f32,
    #[serde(default)]
    pub ease: Ease,
    /// Radians per pixel of drag
    #[serde(default = "default_rotate_speed")]
    pub rotate_speed: f32,
    /// Fraction of distance per scroll line
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
    /// Fraction of distance per pixel of pan drag
    #[serde(default = "default_pan_speed")]
    pub pan_speed: f32,
}

fn default_fov() -> f32 {
    50.0
}

fn default_start_position() -> Vec3 {
    Vec3::new(300.0, 0.0, 0.0)
}

fn default_transition_secs() -> f32 {
    1.2
}

fn default_rotate_speed() -> f32 {
    0.005
}

fn default_zoom_speed() -> f32 {
    0.1
}

fn default_pan_speed() -> f32 {
    0.002
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            start_position: default_start_position(),
            transition_secs: default_transition_secs(),
            ease: Ease::default(),
            rotate_speed: default_rotate_speed(),
            zoom_speed: default_zoom_speed(),
            pan_speed: default_pan_speed(),
        }
    }
}

/// World-anchored text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelConfig {
    pub text: String,
    #[serde(default)]
    pub position: Vec3,
    /// Euler rotation (XYZ order) in radians; the text faces +Z unrotated
    #[serde(default)]
    pub rotation: Vec3,
    /// Text height in world units
    pub size: f32,
    pub color: String,
    #[serde(default)]
    pub font: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightConfig {
    Directional {
        position: Vec3,
        intensity: f32,
        #[serde(default = "default_light_color")]
        color: String,
    },
    Spot {
        position: Vec3,
        /// Outer cone angle in radians
        angle: f32,
        intensity: f32,
        #[serde(default = "default_light_color")]
        color: String,
    },
    Point {
        position: Vec3,
        intensity: f32,
        #[serde(default = "default_light_color")]
        color: String,
    },
}

fn default_light_color() -> String {
    "#ffffff".to_string()
}

impl LightConfig {
    pub fn color(&self) -> &str {
        match self {
            LightConfig::Directional { color, .. }
            | LightConfig::Spot { color, .. }
            | LightConfig::Point { color, .. } => color,
        }
    }
}

/// Pre-filtered environment map pair (KTX2)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
    pub diffuse_map: String,
    pub specular_map: String,
    #[serde(default = "default_environment_intensity")]
    pub intensity: f32,
}

fn default_environment_intensity() -> f32 {
    900.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_background")]
    pub background: String,
    /// Ambient intensity on the 0..1 scale of the page styling
    #[serde(default = "default_ambient")]
    pub ambient: f32,
    #[serde(default)]
    pub light: Vec<LightConfig>,
    #[serde(default)]
    pub environment: Option<EnvironmentConfig>,
}

fn default_background() -> String {
    "#111111".to_string()
}

fn default_ambient() -> f32 {
    0.3
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            ambient: default_ambient(),
            light: Vec::new(),
            environment: None,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_version")]
    pub version: String,
    pub default_model: String,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lock: LockPresets,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub easter_egg: Option<LabelConfig>,
    #[serde(default)]
    pub model: Vec<ModelConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl ViewerConfig {
    /// The configuration compiled into the viewer
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(EMBEDDED_CONFIG)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse by source name: `.json` sources as JSON, everything else as TOML
    pub fn parse(source: &str, content: &str) -> Result<Self, ConfigError> {
        let path = source.split(['?', '#']).next().unwrap_or(source);
        if path.to_ascii_lowercase().ends_with(".json") {
            Self::from_json(content)
        } else {
            Self::from_toml(content)
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&path.to_string_lossy(), &content)
    }

    /// Build the model registry described by this config
    pub fn registry(&self) -> Result<ModelRegistry, RegistryError> {
        ModelRegistry::new(self.model.clone(), &self.default_model)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.registry()?;
        for (preset, bounds) in [("locked", &self.lock.locked), ("unlocked", &self.lock.unlocked)] {
            bounds
                .check()
                .map_err(|reason| ConfigError::InvalidBounds { preset, reason })?;
        }
        let camera = &self.camera;
        for (field, value) in [
            ("fov_degrees", camera.fov_degrees),
            ("transition_secs", camera.transition_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidCamera { field, value });
            }
        }
        if camera.fov_degrees >= 180.0 {
            return Err(ConfigError::InvalidCamera {
                field: "fov_degrees",
                value: camera.fov_degrees,
            });
        }
        parse_hex_color(&self.scene.background)?;
        for light in &self.scene.light {
            parse_hex_color(light.color())?;
        }
        if let Some(egg) = &self.easter_egg {
            parse_hex_color(&egg.color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::OrbitBounds;
    use std::io::Write;

    const MINIMAL: &str = r##"
default_model = "cat_skull"

[[model]]
id = "cat_skull"
asset = "models/cat_skull/scene.gltf"
scale = 2.0
camera_position = [300.0, 0.0, 0.0]
text = "kannssai"
"##;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = ViewerConfig::embedded().unwrap();
        let registry = config.registry().unwrap();
        assert!(registry.len() >= 3);
        assert!(config.easter_egg.is_some());
        assert_eq!(config.scene.light.len(), 3);

        // Every model must open inside the locked framing
        for model in registry.models() {
            let offset = model.camera_position - model.orbit_target;
            let distance = offset.length();
            let polar = (offset.y / distance).acos();
            let locked = config.lock.locked;
            assert!(distance >= locked.min_distance && distance <= locked.max_distance, "{}", model.id);
            assert!(polar >= locked.min_polar && polar <= locked.max_polar, "{}", model.id);
        }
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = ViewerConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.camera.fov_degrees, 50.0);
        assert_eq!(config.camera.start_position, Vec3::new(300.0, 0.0, 0.0));
        assert_eq!(config.camera.ease, Ease::InOut(2));
        assert_eq!(config.lock.locked, OrbitBounds::locked());
        assert_eq!(config.scene.background, "#111111");

        let skull = config.registry().unwrap().get("cat_skull").unwrap().clone();
        assert_eq!(skull.text_color, "#ff0000");
        assert_eq!(skull.text_position, Vec3::new(0.0, -50.0, 0.0));
        assert_eq!(skull.display_name(), "cat_skull");
        assert_eq!(skull.overlay().text, "kannssai");
    }

    #[test]
    fn test_lights_and_ease_from_toml() {
        let content = format!(
            r##"{MINIMAL}
[camera]
ease = "power3.out"

[[scene.light]]
kind = "spot"
position = [0.0, 10.0, 10.0]
angle = 0.4
intensity = 0.5
color = "#aaccff"
"##
        );
        let config = ViewerConfig::from_toml(&content).unwrap();
        assert_eq!(config.camera.ease, Ease::Out(3));
        assert!(matches!(config.scene.light[0], LightConfig::Spot { angle, .. } if angle == 0.4));
    }

    #[test]
    fn test_invalid_default_is_rejected() {
        let content = MINIMAL.replace("default_model = \"cat_skull\"", "default_model = \"dodo\"");
        assert!(matches!(
            ViewerConfig::from_toml(&content),
            Err(ConfigError::Invalid(RegistryError::UnknownDefault(_)))
        ));
    }

    #[test]
    fn test_unusable_orbit_bounds_are_rejected() {
        let inverted = format!(
            "{MINIMAL}\n[lock.locked]\nenable_pan = false\nmin_distance = 450.0\nmax_distance = 120.0\nmin_polar = 1.0\nmax_polar = 2.0\n"
        );
        assert!(matches!(
            ViewerConfig::from_toml(&inverted),
            Err(ConfigError::InvalidBounds { preset: "locked", .. })
        ));

        let polar_past_pole = format!(
            "{MINIMAL}\n[lock.unlocked]\nenable_pan = true\nmin_distance = 1.0\nmax_distance = 10.0\nmin_polar = 0.0\nmax_polar = 4.0\n"
        );
        assert!(matches!(
            ViewerConfig::from_toml(&polar_past_pole),
            Err(ConfigError::InvalidBounds { preset: "unlocked", .. })
        ));

        let mut bounds = OrbitBounds::locked();
        bounds.min_distance = f32::NAN;
        assert!(bounds.check().is_err());
        bounds.min_distance = -1.0;
        assert!(bounds.check().is_err());
        assert!(OrbitBounds::unlocked().check().is_ok());
    }

    #[test]
    fn test_camera_timing_must_be_positive() {
        let zero = format!("{MINIMAL}\n[camera]\ntransition_secs = 0.0\n");
        assert!(matches!(
            ViewerConfig::from_toml(&zero),
            Err(ConfigError::InvalidCamera { field: "transition_secs", .. })
        ));

        let wide = format!("{MINIMAL}\n[camera]\nfov_degrees = 200.0\n");
        assert!(matches!(
            ViewerConfig::from_toml(&wide),
            Err(ConfigError::InvalidCamera { field: "fov_degrees", .. })
        ));
    }

    #[test]
    fn test_parse_by_source_name() {
        let json = r##"{
            "default_model": "a",
            "model": [{
                "id": "a",
                "asset": "models/a.glb",
                "camera_position": [0.0, 0.0, 300.0],
                "text": "A",
                "text_color": "#00ff00"
            }]
        }"##;
        let config = ViewerConfig::parse("https://example.org/viewer.json?v=2", json).unwrap();
        assert_eq!(config.default_model, "a");

        assert!(matches!(
            ViewerConfig::parse("viewer.toml", json),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ViewerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.len(), 1);
    }
}
