//! Orbit camera: signal handling, user input and rig-to-transform sync

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::types::{ActiveModel, CameraRigState, ViewerSettings, ViewerSignal};

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ViewerSignal>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (apply_viewer_signals, orbit_input, advance_rig, sync_camera_transform).chain(),
            );
    }
}

fn spawn_camera(mut commands: Commands, settings: Res<ViewerSettings>, rig: Res<CameraRigState>) {
    let camera = &settings.config.camera;
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: 0.05,
            far: 10_000.0,
            ..default()
        }),
        Transform::from_translation(rig.0.position()).looking_at(rig.0.target(), Vec3::Y),
        MainCamera,
    ));
}

/// Apply page-shell signals to the selection and the camera rig
pub fn apply_viewer_signals(
    mut signals: MessageReader<ViewerSignal>,
    settings: Res<ViewerSettings>,
    mut active: ResMut<ActiveModel>,
    mut rig: ResMut<CameraRigState>,
) {
    for signal in signals.read() {
        match signal {
            ViewerSignal::SelectModel(id) => {
                if active.id() == id {
                    continue;
                }
                let model = match settings.registry.get(id) {
                    Ok(model) => model,
                    Err(e) => {
                        tracing::warn!("Ignoring model selection: {}", e);
                        continue;
                    }
                };
                if let Err(e) = active.0.select(&settings.registry, id) {
                    tracing::warn!("Ignoring model selection: {}", e);
                    continue;
                }
                tracing::info!("Selected model {}", id);
                rig.0.focus_model(model);
            }
            ViewerSignal::ToggleLock => {
                if let Some(model) = active.model(&settings) {
                    let state = rig.0.toggle_lock(model);
                    tracing::info!("Camera lock: {:?}", state);
                }
            }
            ViewerSignal::ResetCamera => {
                if let Some(model) = active.model(&settings) {
                    rig.0.reset(model);
                }
            }
        }
    }
}

/// Track touch pinch distance between frames
#[derive(Default)]
struct PinchState {
    last_distance: Option<f32>,
}

fn orbit_input(
    mut rig: ResMut<CameraRigState>,
    settings: Res<ViewerSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    mut pinch: Local<PinchState>,
    mut contexts: EguiContexts,
) {
    // Don't steer the camera while the pointer is on the control bar
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area())
        .unwrap_or(false);

    let camera = &settings.config.camera;

    let mut total_motion = Vec2::ZERO;
    for motion in mouse_motion.read() {
        total_motion += motion.delta;
    }

    let mut scroll = 0.0;
    for wheel in mouse_wheel.read() {
        scroll += match wheel.unit {
            MouseScrollUnit::Line => wheel.y,
            MouseScrollUnit::Pixel => wheel.y / 100.0,
        };
    }

    if egui_wants_pointer {
        pinch.last_distance = None;
        return;
    }

    if total_motion != Vec2::ZERO {
        if mouse_button.pressed(MouseButton::Left) {
            rig.0.orbit(
                -total_motion.x * camera.rotate_speed,
                -total_motion.y * camera.rotate_speed,
            );
        } else if mouse_button.pressed(MouseButton::Right) || mouse_button.pressed(MouseButton::Middle) {
            rig.0.pan(-total_motion.x * camera.pan_speed, total_motion.y * camera.pan_speed);
        }
    }

    if scroll != 0.0 {
        let factor = (1.0 - scroll * camera.zoom_speed).max(0.1);
        rig.0.zoom(factor);
    }

    let touches: Vec<_> = touch_input.iter().collect();
    match touches.as_slice() {
        [touch] => {
            let delta = touch.delta();
            if delta != Vec2::ZERO {
                rig.0.orbit(-delta.x * camera.rotate_speed, -delta.y * camera.rotate_speed);
            }
            pinch.last_distance = None;
        }
        [first, second, ..] => {
            let distance = first.position().distance(second.position());
            if let Some(last) = pinch.last_distance {
                if distance > 1.0 {
                    rig.0.zoom(last / distance);
                }
            }
            pinch.last_distance = Some(distance);
        }
        [] => pinch.last_distance = None,
    }
}

fn advance_rig(mut rig: ResMut<CameraRigState>, time: Res<Time>) {
    rig.0.advance(time.delta_secs());
}

fn sync_camera_transform(
    rig: Res<CameraRigState>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    let Ok(mut transform) = camera_query.single_mut() else {
        return;
    };
    transform.translation = rig.0.position();
    transform.look_at(rig.0.target(), Vec3::Y);
}
