//! Vitrine Core - Renderer-independent viewer logic
//!
//! This crate provides everything in the viewer that is not drawing pixels:
//! - Viewer configuration (models table, camera, lighting, lock presets)
//! - Model registry and active-model selection
//! - Eased tweens driven by the frame clock
//! - Orbit camera rig with locked/unlocked bounds
//! - Asset load tracking for the loading indicator

pub mod config;
pub mod loading;
pub mod registry;
pub mod rig;
pub mod tween;

pub use config::{CameraConfig, ConfigError, LabelConfig, LightConfig, SceneConfig, ViewerConfig};
pub use loading::{LoadPhase, LoadTracker};
pub use registry::{parse_hex_color, ModelConfig, ModelRegistry, RegistryError, Selection};
pub use rig::{CameraRig, LockPresets, LockState, OrbitBounds};
pub use tween::{Ease, Lerp, Tween};
