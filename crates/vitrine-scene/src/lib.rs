//! Vitrine Scene - 3D rendering and page shell for the specimen viewer
//!
//! This crate turns a [`vitrine_core::ViewerConfig`] into a running Bevy
//! scene: orbit camera, lighting, glTF model switching, world labels and
//! the egui control bar.

pub mod camera;
pub mod labels;
pub mod models;
pub mod scene;
pub mod types;
pub mod ui;

use bevy::prelude::*;

/// Plugin that sets up the viewer scene from a configuration
pub struct VitrineScenePlugin {
    settings: ViewerSettings,
    initial_model: Option<String>,
}

impl VitrineScenePlugin {
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            settings,
            initial_model: None,
        }
    }

    /// Start on `id` instead of the configured default
    pub fn with_initial_model(mut self, id: Option<String>) -> Self {
        self.initial_model = id;
        self
    }
}

impl Plugin for VitrineScenePlugin {
    fn build(&self, app: &mut App) {
        let resources = self
            .settings
            .clone()
            .into_resources(self.initial_model.as_deref());

        app.insert_resource(resources.settings)
            .insert_resource(resources.active)
            .insert_resource(resources.rig)
            .insert_resource(resources.loading)
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(labels::LabelsPlugin)
            .add_plugins(ui::UiPlugin);
    }
}

// Re-export commonly used types
pub use camera::MainCamera;
pub use types::*;
