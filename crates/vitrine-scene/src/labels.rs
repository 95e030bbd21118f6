//! World-anchored text labels painted through egui
//!
//! Labels keep a world position and a facing direction. Each frame they are
//! projected into the viewport and drawn at a perspective-correct size, so
//! small labels only become legible when the camera gets close. Labels
//! facing away from the camera, or hidden behind scene meshes, are not drawn.

use bevy::prelude::*;
use bevy::text::Font;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use bevy_picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use vitrine_core::LabelConfig;

use crate::camera::MainCamera;
use crate::types::{color32_from_hex, euler_to_quat, CameraRigState, ViewerSettings};

/// Labels smaller than this many pixels are not drawn
const MIN_LABEL_PX: f32 = 3.0;
/// Labels fade in over this many pixels above the minimum
const FADE_RANGE_PX: f32 = 6.0;
const MAX_LABEL_PX: f32 = 512.0;
/// Hits this close to the label count as the label itself
const OCCLUSION_SLACK: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Per-model overlay text
    Overlay,
    /// Tiny text hidden inside the scene
    EasterEgg,
}

#[derive(Component, Debug, Clone)]
pub struct WorldLabel {
    pub config: LabelConfig,
    pub kind: LabelKind,
    /// A mesh sits between the camera and the label
    pub occluded: bool,
    color: egui::Color32,
}

impl WorldLabel {
    pub fn new(config: LabelConfig, kind: LabelKind) -> Self {
        let color = color32_from_hex(&config.color);
        Self {
            config,
            kind,
            occluded: false,
            color,
        }
    }

    /// Direction the text faces (unrotated text faces +Z)
    pub fn normal(&self) -> Vec3 {
        euler_to_quat(self.config.rotation) * Vec3::Z
    }
}

/// Plugin for world labels
pub struct LabelsPlugin;

impl Plugin for LabelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LabelFonts>()
            .add_systems(
                Update,
                (sync_easter_egg, request_label_fonts, update_label_occlusion).chain(),
            )
            .add_systems(EguiPrimaryContextPass, (install_label_fonts, paint_world_labels).chain());
    }
}

/// Whether the front of a label at `label_pos` facing `normal` is visible
/// from `camera_pos`
pub fn faces_camera(label_pos: Vec3, normal: Vec3, camera_pos: Vec3) -> bool {
    normal.dot(camera_pos - label_pos) > 0.0
}

/// On-screen height in pixels of text `size` world units tall at `depth`
/// along the view direction
pub fn projected_text_px(size: f32, depth: f32, fov_y: f32, viewport_height: f32) -> f32 {
    if depth <= f32::EPSILON {
        return 0.0;
    }
    size * viewport_height / (2.0 * depth * (fov_y * 0.5).tan())
}

/// Opacity for a label drawn at `px` pixels; `None` when it should be skipped
pub fn label_alpha(px: f32) -> Option<f32> {
    if px < MIN_LABEL_PX {
        return None;
    }
    Some(((px - MIN_LABEL_PX) / FADE_RANGE_PX).clamp(0.0, 1.0).max(0.15))
}

/// Whether a mesh lies between `eye` and the label at `position`.
///
/// Back faces are not hit, so a camera inside a hollow model still sees
/// what is inside it.
pub fn label_occluded(ray_cast: &mut MeshRayCast, eye: Vec3, position: Vec3) -> bool {
    let offset = position - eye;
    let distance = offset.length();
    let Ok(direction) = Dir3::new(offset) else {
        return false;
    };
    // Scene children may not have their visibility computed yet
    let settings = MeshRayCastSettings {
        visibility: RayCastVisibility::Any,
        ..default()
    };
    ray_cast
        .cast_ray(Ray3d::new(eye, direction), &settings)
        .iter()
        .any(|(_, hit)| hit.distance < distance - OCCLUSION_SLACK)
}

/// Custom label fonts and their egui install state.
///
/// egui applies new font definitions at the start of the next pass, so a
/// font only becomes usable one pass after it was staged.
#[derive(Debug, Default)]
pub struct LabelFontSet {
    data: BTreeMap<String, Arc<Vec<u8>>>,
    pending: HashSet<String>,
    active: HashSet<String>,
}

impl LabelFontSet {
    /// Add font bytes under `name`. Returns false if the name is known.
    pub fn stage(&mut self, name: &str, bytes: Arc<Vec<u8>>) -> bool {
        if self.data.contains_key(name) {
            return false;
        }
        self.data.insert(name.to_string(), bytes);
        self.pending.insert(name.to_string());
        true
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Fonts staged during the previous pass are live from now on
    pub fn begin_pass(&mut self) {
        self.active.extend(self.pending.drain());
    }

    /// Default egui fonts plus one named family per staged font
    pub fn definitions(&self) -> egui::FontDefinitions {
        let mut fonts = egui::FontDefinitions::default();
        for (name, bytes) in &self.data {
            fonts.font_data.insert(
                name.clone(),
                Arc::new(egui::FontData::from_owned(bytes.as_ref().clone())),
            );
            fonts
                .families
                .insert(egui::FontFamily::Name(name.as_str().into()), vec![name.clone()]);
        }
        fonts
    }

    /// Family to paint with; falls back to the default until the font is live
    pub fn family(&self, font: Option<&str>) -> egui::FontFamily {
        match font {
            Some(name) if self.active.contains(name) => egui::FontFamily::Name(name.into()),
            _ => egui::FontFamily::Proportional,
        }
    }
}

#[derive(Resource, Default)]
pub struct LabelFonts {
    handles: HashMap<String, Handle<Font>>,
    set: LabelFontSet,
}

/// Keep the easter egg label in sync with the settings
fn sync_easter_egg(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    labels: Query<(Entity, &WorldLabel)>,
) {
    if !settings.is_changed() {
        return;
    }

    for (entity, label) in &labels {
        if label.kind == LabelKind::EasterEgg {
            commands.entity(entity).despawn();
        }
    }

    if let Some(egg) = &settings.config.easter_egg {
        commands.spawn(WorldLabel::new(egg.clone(), LabelKind::EasterEgg));
    }
}

/// Cast from the camera to every label to find the ones behind geometry
fn update_label_occlusion(
    rig: Res<CameraRigState>,
    mut labels: Query<&mut WorldLabel>,
    mut ray_cast: MeshRayCast,
) {
    let eye = rig.0.position();
    for mut label in &mut labels {
        let occluded = label_occluded(&mut ray_cast, eye, label.config.position);
        if label.occluded != occluded {
            label.occluded = occluded;
        }
    }
}

fn request_label_fonts(
    mut fonts: ResMut<LabelFonts>,
    asset_server: Res<AssetServer>,
    labels: Query<&WorldLabel>,
) {
    for label in &labels {
        let Some(path) = &label.config.font else {
            continue;
        };
        if !fonts.handles.contains_key(path) {
            tracing::info!("Loading label font: {}", path);
            let handle: Handle<Font> = asset_server.load(path.clone());
            fonts.handles.insert(path.clone(), handle);
        }
    }
}

fn install_label_fonts(
    mut contexts: EguiContexts,
    mut fonts: ResMut<LabelFonts>,
    font_assets: Res<Assets<Font>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let fonts = fonts.as_mut();
    fonts.set.begin_pass();

    let mut staged = false;
    for (name, handle) in &fonts.handles {
        if fonts.set.is_known(name) {
            continue;
        }
        if let Some(font) = font_assets.get(handle) {
            staged |= fonts.set.stage(name, font.data.clone());
        }
    }

    if staged {
        tracing::info!("Installing label fonts into egui");
        ctx.set_fonts(fonts.set.definitions());
    }
}

fn paint_world_labels(
    mut contexts: EguiContexts,
    fonts: Res<LabelFonts>,
    labels: Query<&WorldLabel>,
    cameras: Query<(&Camera, &GlobalTransform, &Projection), With<MainCamera>>,
) {
    let Ok((camera, camera_transform, projection)) = cameras.single() else {
        return;
    };
    let Projection::Perspective(perspective) = projection else {
        return;
    };
    let Some(viewport) = camera.logical_viewport_size() else {
        return;
    };
    let Ok(ctx) = contexts.ctx_mut() else { return };

    let camera_pos = camera_transform.translation();
    let forward = camera_transform.forward();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("world_labels"),
    ));

    for label in &labels {
        if label.occluded {
            continue;
        }
        let position = label.config.position;
        if !faces_camera(position, label.normal(), camera_pos) {
            continue;
        }

        let depth = (position - camera_pos).dot(*forward);
        if depth <= perspective.near {
            continue;
        }

        let px = projected_text_px(label.config.size, depth, perspective.fov, viewport.y).min(MAX_LABEL_PX);
        let Some(alpha) = label_alpha(px) else {
            continue;
        };
        let Ok(screen) = camera.world_to_viewport(camera_transform, position) else {
            continue;
        };

        let family = fonts.set.family(label.config.font.as_deref());
        painter.text(
            egui::pos2(screen.x, screen.y),
            egui::Align2::CENTER_CENTER,
            &label.config.text,
            egui::FontId::new(px, family),
            label.color.gamma_multiply(alpha),
        );
    }
}
