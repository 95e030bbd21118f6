//! Shared resources, messages and conversions used across the scene plugins

use bevy::prelude::*;
use bevy_egui::egui;
use vitrine_core::{
    parse_hex_color, CameraRig, ConfigError, LoadTracker, ModelConfig, ModelRegistry, RegistryError, Selection,
    ViewerConfig,
};

/// Viewer configuration together with the registry built from it
#[derive(Debug, Clone, Resource)]
pub struct ViewerSettings {
    pub config: ViewerConfig,
    pub registry: ModelRegistry,
}

impl ViewerSettings {
    pub fn new(config: ViewerConfig) -> Result<Self, RegistryError> {
        let registry = config.registry()?;
        Ok(Self { config, registry })
    }

    /// Settings from the configuration compiled into the viewer
    pub fn embedded() -> Result<Self, ConfigError> {
        let config = ViewerConfig::embedded()?;
        Ok(Self::new(config)?)
    }

    /// Settings plus a fresh selection, rig and load tracker. The rig starts
    /// flying towards the selected model.
    pub fn into_resources(self, initial_model: Option<&str>) -> ViewerResources {
        let selection = Selection::with_initial(&self.registry, initial_model);
        let mut rig = CameraRig::new(&self.config.camera, self.config.lock);
        if let Ok(model) = selection.model(&self.registry) {
            rig.focus_model(model);
        }

        tracing::info!(
            "Viewer configured with {} models, showing {}",
            self.registry.len(),
            selection.id()
        );

        ViewerResources {
            settings: self,
            active: ActiveModel(selection),
            rig: CameraRigState(rig),
            loading: ModelLoading::default(),
        }
    }

    /// Replace the running viewer state with these settings
    pub fn install(self, commands: &mut Commands, initial_model: Option<&str>) {
        let resources = self.into_resources(initial_model);
        commands.insert_resource(resources.active);
        commands.insert_resource(resources.rig);
        commands.insert_resource(resources.loading);
        commands.insert_resource(resources.settings);
    }
}

/// Everything the scene plugins need to start
pub struct ViewerResources {
    pub settings: ViewerSettings,
    pub active: ActiveModel,
    pub rig: CameraRigState,
    pub loading: ModelLoading,
}

/// The selected model. Only ever holds ids present in [`ViewerSettings::registry`].
#[derive(Debug, Clone, Resource)]
pub struct ActiveModel(pub Selection);

impl ActiveModel {
    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn model<'r>(&self, settings: &'r ViewerSettings) -> Option<&'r ModelConfig> {
        self.0.model(&settings.registry).ok()
    }
}

/// Camera rig driven by signals, user input and the frame clock
#[derive(Debug, Clone, Resource)]
pub struct CameraRigState(pub CameraRig);

/// Load phase of the active model, read by the loading indicator
#[derive(Debug, Clone, Resource, Default)]
pub struct ModelLoading(pub LoadTracker);

/// Named signals dispatched by the page shell and consumed by the scene
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum ViewerSignal {
    SelectModel(String),
    ToggleLock,
    ResetCamera,
}

/// UI layout settings for responsive design
#[derive(Debug, Clone, Resource)]
pub struct UiLayout {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Whether we're on a small screen (mobile/tablet)
    pub is_mobile: bool,
    /// Scale factor for UI elements
    pub ui_scale: f32,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            screen_width: 1920.0,
            screen_height: 1080.0,
            is_mobile: false,
            ui_scale: 1.0,
        }
    }
}

impl UiLayout {
    /// Update layout based on screen dimensions
    pub fn update_for_screen(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;

        // Consider mobile if width < 800 or if it's a portrait orientation with width < 600
        self.is_mobile = width < 800.0 || (width < height && width < 600.0);

        // Slightly larger controls for touch
        self.ui_scale = if self.is_mobile { 1.2 } else { 1.0 };
    }

    /// Distance of the control bar from the bottom edge
    pub fn controls_margin(&self) -> f32 {
        if self.is_mobile {
            12.0
        } else {
            20.0
        }
    }
}

/// Convert a `#rrggbb` config color, falling back to white
pub fn color_from_hex(hex: &str) -> Color {
    match parse_hex_color(hex) {
        Ok([r, g, b]) => Color::srgb(r, g, b),
        Err(e) => {
            tracing::warn!("{}", e);
            Color::WHITE
        }
    }
}

/// Convert a `#rrggbb` config color for egui, falling back to white
pub fn color32_from_hex(hex: &str) -> egui::Color32 {
    match parse_hex_color(hex) {
        Ok([r, g, b]) => egui::Color32::from_rgb(to_byte(r), to_byte(g), to_byte(b)),
        Err(e) => {
            tracing::warn!("{}", e);
            egui::Color32::WHITE
        }
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Euler XYZ rotation (radians) from config into a quaternion
pub fn euler_to_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(color32_from_hex("#ff0044"), egui::Color32::from_rgb(255, 0, 68));
        assert_eq!(color32_from_hex("nope"), egui::Color32::WHITE);
        assert_eq!(color_from_hex("#ffffff"), Color::srgb(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_mobile_layout() {
        let mut layout = UiLayout::default();
        layout.update_for_screen(390.0, 844.0);
        assert!(layout.is_mobile);
        assert_eq!(layout.controls_margin(), 12.0);

        layout.update_for_screen(1440.0, 900.0);
        assert!(!layout.is_mobile);
        assert_eq!(layout.ui_scale, 1.0);
    }

    #[test]
    fn test_euler_quarter_turn_faces_text_along_x() {
        let q = euler_to_quat(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let normal = q * Vec3::Z;
        assert!(normal.distance(Vec3::X) < 1e-5);
    }
}
