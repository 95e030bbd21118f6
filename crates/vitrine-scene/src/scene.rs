//! Scene setup - background, lights and environment map

use bevy::light::EnvironmentMapLight;
use bevy::prelude::*;
use vitrine_core::LightConfig;

use crate::camera::MainCamera;
use crate::types::{color_from_hex, ViewerSettings};

// Config intensities use the 0..1-ish scale of the page styling
const DIRECTIONAL_LUX_PER_UNIT: f32 = 4000.0;
const SPOT_LUMENS_PER_UNIT: f32 = 40_000_000.0;
const POINT_LUMENS_PER_UNIT: f32 = 40_000_000.0;
const AMBIENT_BRIGHTNESS_PER_UNIT: f32 = 1000.0;
const LIGHT_RANGE: f32 = 5000.0;

/// Marker component for lights spawned from the viewer config
#[derive(Component)]
pub struct ConfigLight;

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, sync_scene_lighting);
    }
}

/// Rebuild background, lights and environment whenever the settings change
fn sync_scene_lighting(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    asset_server: Res<AssetServer>,
    existing_lights: Query<Entity, With<ConfigLight>>,
    cameras: Query<Entity, With<MainCamera>>,
    mut built: Local<bool>,
) {
    // The camera is spawned at startup; wait for it so the environment map has a home
    let Ok(camera) = cameras.single() else {
        return;
    };
    if *built && !settings.is_changed() {
        return;
    }
    *built = true;

    for entity in &existing_lights {
        commands.entity(entity).despawn();
    }

    let scene = &settings.config.scene;
    commands.insert_resource(ClearColor(color_from_hex(&scene.background)));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: scene.ambient * AMBIENT_BRIGHTNESS_PER_UNIT,
        ..default()
    });

    for (i, light) in scene.light.iter().enumerate() {
        spawn_light(&mut commands, light, i == 0);
    }

    match &scene.environment {
        Some(environment) => {
            commands.entity(camera).insert(EnvironmentMapLight {
                diffuse_map: asset_server.load(&environment.diffuse_map),
                specular_map: asset_server.load(&environment.specular_map),
                intensity: environment.intensity,
                ..default()
            });
        }
        None => {
            commands.entity(camera).remove::<EnvironmentMapLight>();
        }
    }

    tracing::info!("Scene lighting rebuilt with {} lights", scene.light.len());
}

fn spawn_light(commands: &mut Commands, light: &LightConfig, casts_shadows: bool) {
    match light {
        LightConfig::Directional {
            position,
            intensity,
            color,
        } => {
            commands.spawn((
                DirectionalLight {
                    illuminance: intensity * DIRECTIONAL_LUX_PER_UNIT,
                    color: color_from_hex(color),
                    shadows_enabled: casts_shadows,
                    ..default()
                },
                Transform::from_translation(*position).looking_at(Vec3::ZERO, Vec3::Y),
                ConfigLight,
            ));
        }
        LightConfig::Spot {
            position,
            angle,
            intensity,
            color,
        } => {
            commands.spawn((
                SpotLight {
                    intensity: intensity * SPOT_LUMENS_PER_UNIT,
                    color: color_from_hex(color),
                    outer_angle: *angle,
                    inner_angle: angle * 0.8,
                    range: LIGHT_RANGE,
                    shadows_enabled: false,
                    ..default()
                },
                Transform::from_translation(*position).looking_at(Vec3::ZERO, Vec3::Y),
                ConfigLight,
            ));
        }
        LightConfig::Point {
            position,
            intensity,
            color,
        } => {
            commands.spawn((
                PointLight {
                    intensity: intensity * POINT_LUMENS_PER_UNIT,
                    color: color_from_hex(color),
                    range: LIGHT_RANGE,
                    shadows_enabled: false,
                    ..default()
                },
                Transform::from_translation(*position),
                ConfigLight,
            ));
        }
    }
}
