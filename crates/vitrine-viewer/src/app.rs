//! Bevy application setup

use bevy::prelude::*;
use bevy::winit::{UpdateMode, WinitSettings};
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use std::time::Duration;
use vitrine_scene::{CameraRigState, ModelLoading, UiLayout, ViewerSettings, VitrineScenePlugin};

use crate::url_params::{RemoteConfigPlugin, UrlParams};

pub fn run(params: UrlParams) {
    let settings = match ViewerSettings::embedded() {
        Ok(settings) => settings,
        Err(e) => {
            // Only reachable with a broken build; nothing sensible to draw
            tracing::error!("Embedded viewer config is invalid: {}", e);
            return;
        }
    };

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.067, 0.067, 0.067)))
        // Start with default continuous rendering - mobile will switch to power-saving mode
        .insert_resource(WinitSettings::default())
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Vitrine".to_string(),
                    canvas: Some("#viewer-canvas".to_string()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Models, fonts and environment maps are served next to the page
                file_path: "".to_string(),
                // Don't look for .meta files - the static host doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        // bevy_egui's picking integration needs PickingPlugin registered before EguiPlugin.
        // Label occlusion casts rays directly and needs no picking backend.
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .add_plugins(VitrineScenePlugin::new(settings).with_initial_model(params.model.clone()))
        .add_plugins(RemoteConfigPlugin { params })
        .add_systems(Update, adjust_power_settings)
        .run();
}

/// Whether the app must render every frame
fn needs_continuous(is_mobile: bool, animating: bool, loading: bool) -> bool {
    !is_mobile || animating || loading
}

/// On mobile, use power saving mode while idle. On desktop, and while the
/// camera flies or a model loads, render continuously.
fn adjust_power_settings(
    layout: Res<UiLayout>,
    rig: Res<CameraRigState>,
    loading: Res<ModelLoading>,
    mut winit_settings: ResMut<WinitSettings>,
    mut continuous: Local<Option<bool>>,
) {
    let wanted = needs_continuous(layout.is_mobile, rig.0.is_animating(), loading.0.is_pending());
    // Only touch WinitSettings when the mode actually flips
    if *continuous == Some(wanted) {
        return;
    }
    *continuous = Some(wanted);

    if wanted {
        *winit_settings = WinitSettings::default();
    } else {
        winit_settings.focused_mode = UpdateMode::reactive_low_power(Duration::from_millis(100)); // 10 FPS max when idle
        winit_settings.unfocused_mode = UpdateMode::reactive_low_power(Duration::from_millis(500)); // 2 FPS when unfocused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_idles_only_when_nothing_moves() {
        assert!(needs_continuous(false, false, false));
        assert!(!needs_continuous(true, false, false));
        assert!(needs_continuous(true, true, false));
        assert!(needs_continuous(true, false, true));
    }
}
