//! Model registry - Maps model identifiers to their display parameters
//!
//! The registry is built once from the viewer configuration and never
//! mutated. The active model is tracked by [`Selection`], which only ever
//! holds identifiers the registry resolves.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::LabelConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Model not found: {0}")]
    NotFound(String),
    #[error("Model table is empty")]
    Empty,
    #[error("Model id must not be empty")]
    EmptyId,
    #[error("Duplicate model id: {0}")]
    DuplicateId(String),
    #[error("Model {0} has no asset path")]
    EmptyAsset(String),
    #[error("Model {id} has invalid scale {scale}")]
    InvalidScale { id: String, scale: f32 },
    #[error("Default model {0} is not in the model table")]
    UnknownDefault(String),
    #[error("Invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

/// One selectable 3D asset and how to present it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Identifier used by the selector and the `?model=` parameter
    pub id: String,
    /// Name shown in the selector (defaults to the id)
    #[serde(default)]
    pub label: Option<String>,
    /// glTF asset path, relative to the asset root
    pub asset: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub position: Vec3,
    /// Euler rotation (XYZ order) in radians
    #[serde(default)]
    pub rotation: Vec3,
    /// Where the camera settles when this model is focused or reset
    pub camera_position: Vec3,
    /// Orbit focus point
    #[serde(default)]
    pub orbit_target: Vec3,
    /// Overlay text shown next to the model
    pub text: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_text_position")]
    pub text_position: Vec3,
    #[serde(default = "default_text_rotation")]
    pub text_rotation: Vec3,
    /// Text height in world units
    #[serde(default = "default_text_size")]
    pub text_size: f32,
    #[serde(default)]
    pub font: Option<String>,
}

fn default_scale() -> f32 {
    1.0
}

fn default_text_color() -> String {
    "#ff0000".to_string()
}

fn default_text_position() -> Vec3 {
    Vec3::new(0.0, -50.0, 0.0)
}

fn default_text_rotation() -> Vec3 {
    Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0)
}

fn default_text_size() -> f32 {
    20.0
}

impl ModelConfig {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// World-anchored overlay label for this model
    pub fn overlay(&self) -> LabelConfig {
        LabelConfig {
            text: self.text.clone(),
            position: self.text_position,
            rotation: self.text_rotation,
            size: self.text_size,
            color: self.text_color.clone(),
            font: self.font.clone(),
        }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.id.trim().is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.asset.trim().is_empty() {
            return Err(RegistryError::EmptyAsset(self.id.clone()));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RegistryError::InvalidScale {
                id: self.id.clone(),
                scale: self.scale,
            });
        }
        parse_hex_color(&self.text_color)?;
        Ok(())
    }
}

/// Immutable lookup table of selectable models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelConfig>,
    index: HashMap<String, usize>,
    default_id: String,
}

impl ModelRegistry {
    /// Build a registry, checking that every entry is loadable and the
    /// default id resolves
    pub fn new(models: Vec<ModelConfig>, default_id: &str) -> Result<Self, RegistryError> {
        if models.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut index = HashMap::with_capacity(models.len());
        for (i, model) in models.iter().enumerate() {
            model.validate()?;
            if index.insert(model.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateId(model.id.clone()));
            }
        }

        if !index.contains_key(default_id) {
            return Err(RegistryError::UnknownDefault(default_id.to_string()));
        }

        Ok(Self {
            models,
            index,
            default_id: default_id.to_string(),
        })
    }

    pub fn get(&self, id: &str) -> Result<&ModelConfig, RegistryError> {
        self.index
            .get(id)
            .map(|&i| &self.models[i])
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Model ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn default_model(&self) -> &ModelConfig {
        // Index checked in new()
        &self.models[self.index[&self.default_id]]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// The currently selected model id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    id: String,
}

impl Selection {
    /// Start on the registry's default model
    pub fn new(registry: &ModelRegistry) -> Self {
        Self {
            id: registry.default_id().to_string(),
        }
    }

    /// Start on `initial` if the registry knows it, else on the default
    pub fn with_initial(registry: &ModelRegistry, initial: Option<&str>) -> Self {
        let mut selection = Self::new(registry);
        if let Some(id) = initial {
            if let Err(e) = selection.select(registry, id) {
                tracing::warn!("Ignoring initial model: {}", e);
            }
        }
        selection
    }

    /// Switch to `id`. Returns whether the selection changed; unknown ids
    /// leave it untouched.
    pub fn select(&mut self, registry: &ModelRegistry, id: &str) -> Result<bool, RegistryError> {
        registry.get(id)?;
        if self.id == id {
            return Ok(false);
        }
        self.id = id.to_string();
        Ok(true)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model<'r>(&self, registry: &'r ModelRegistry) -> Result<&'r ModelConfig, RegistryError> {
        registry.get(&self.id)
    }
}

/// Parse a `#rrggbb` sRGB color into `[r, g, b]` in `0.0..=1.0`
pub fn parse_hex_color(color: &str) -> Result<[f32; 3], RegistryError> {
    let invalid = || RegistryError::InvalidColor(color.to_string());
    let hex = color.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }

    let mut rgb = [0.0; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        *channel = f32::from(byte) / 255.0;
    }
    Ok(rgb)
}
