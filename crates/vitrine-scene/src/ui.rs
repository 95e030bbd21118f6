//! Page shell overlays using bevy_egui: control bar and loading indicator

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use vitrine_core::LoadPhase;

use crate::types::{ActiveModel, CameraRigState, ModelLoading, UiLayout, ViewerSettings, ViewerSignal};

const ACCENT_TEXT: egui::Color32 = egui::Color32::from_rgb(0xff, 0x55, 0x55);
const ACCENT_BORDER: egui::Color32 = egui::Color32::from_rgb(0xff, 0x33, 0x33);
// rgba(255, 0, 0, 0.15) and 0.25 on hover
const BUTTON_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(38, 0, 0, 38);
const BUTTON_FILL_HOVER: egui::Color32 = egui::Color32::from_rgba_premultiplied(64, 0, 0, 64);

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UiLayout>()
            .add_systems(Update, (update_ui_layout, keyboard_shortcuts))
            // Main UI system runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, (controls_ui, loading_indicator_ui));
    }
}

/// Update UI layout based on window size
fn update_ui_layout(windows: Query<&Window>, mut ui_layout: ResMut<UiLayout>) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        // Only update if dimensions changed significantly
        if (ui_layout.screen_width - width).abs() > 1.0 || (ui_layout.screen_height - height).abs() > 1.0 {
            ui_layout.update_for_screen(width, height);
        }
    }
}

/// R resets the camera, L toggles the lock, digits pick a model
fn keyboard_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<ViewerSettings>,
    mut contexts: EguiContexts,
    mut signals: MessageWriter<ViewerSignal>,
) {
    let typing = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false);
    if typing {
        return;
    }

    if keys.just_pressed(KeyCode::KeyR) {
        signals.write(ViewerSignal::ResetCamera);
    }
    if keys.just_pressed(KeyCode::KeyL) {
        signals.write(ViewerSignal::ToggleLock);
    }

    const DIGITS: [KeyCode; 9] = [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];
    for (key, id) in DIGITS.iter().zip(settings.registry.ids()) {
        if keys.just_pressed(*key) {
            signals.write(ViewerSignal::SelectModel(id.to_string()));
        }
    }
}

/// Red translucent controls matching the page styling
fn apply_shell_style(ui: &mut egui::Ui, ui_scale: f32) {
    let style = ui.style_mut();
    style.spacing.button_padding = egui::vec2(10.0, 5.0) * ui_scale;
    style.spacing.item_spacing = egui::vec2(8.0, 0.0) * ui_scale;
    style.override_font_id = Some(egui::FontId::monospace(16.0 * ui_scale));

    let visuals = &mut style.visuals;
    visuals.override_text_color = Some(ACCENT_TEXT);
    for widget in [
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
        &mut visuals.widgets.open,
    ] {
        widget.weak_bg_fill = BUTTON_FILL;
        widget.bg_fill = BUTTON_FILL;
        widget.bg_stroke = egui::Stroke::new(1.0, ACCENT_BORDER);
        widget.corner_radius = egui::CornerRadius::same(10);
        widget.fg_stroke = egui::Stroke::new(1.0, ACCENT_TEXT);
        widget.expansion = 0.0;
    }
    visuals.widgets.hovered.weak_bg_fill = BUTTON_FILL_HOVER;
    visuals.widgets.hovered.bg_fill = BUTTON_FILL_HOVER;
    visuals.widgets.active.weak_bg_fill = BUTTON_FILL_HOVER;
    visuals.selection.bg_fill = BUTTON_FILL_HOVER;
    visuals.window_fill = egui::Color32::from_rgba_premultiplied(17, 0, 0, 230);
    visuals.window_stroke = egui::Stroke::new(1.0, ACCENT_BORDER);
}

fn controls_ui(
    mut contexts: EguiContexts,
    settings: Res<ViewerSettings>,
    active: Res<ActiveModel>,
    rig: Res<CameraRigState>,
    ui_layout: Res<UiLayout>,
    mut signals: MessageWriter<ViewerSignal>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let ui_scale = ui_layout.ui_scale;

    egui::Area::new(egui::Id::new("viewer_controls"))
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -ui_layout.controls_margin()))
        .show(ctx, |ui| {
            apply_shell_style(ui, ui_scale);
            ui.horizontal(|ui| {
                // Model selector
                let selected_name = active
                    .model(&settings)
                    .map(|m| m.display_name().to_string())
                    .unwrap_or_else(|| active.id().to_string());
                egui::ComboBox::from_id_salt("model_selector")
                    .selected_text(selected_name)
                    .show_ui(ui, |ui| {
                        for model in settings.registry.models() {
                            let is_selected = model.id == active.id();
                            if ui.selectable_label(is_selected, model.display_name()).clicked() && !is_selected {
                                signals.write(ViewerSignal::SelectModel(model.id.clone()));
                            }
                        }
                    });

                // Lock toggle
                let (lock_icon, lock_hint) = if rig.0.is_locked() {
                    ("🔒", "Unlock camera: pan and zoom freely")
                } else {
                    ("🔓", "Lock camera to the framed view")
                };
                if ui.button(lock_icon).on_hover_text(lock_hint).clicked() {
                    signals.write(ViewerSignal::ToggleLock);
                }

                // Reset
                if ui.button("⟲").on_hover_text("Reset camera").clicked() {
                    signals.write(ViewerSignal::ResetCamera);
                }
            });
        });
}

fn loading_indicator_ui(
    mut contexts: EguiContexts,
    loading: Res<ModelLoading>,
    settings: Res<ViewerSettings>,
    ui_layout: Res<UiLayout>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let ui_scale = ui_layout.ui_scale;

    let name_of = |id: &str| {
        settings
            .registry
            .get(id)
            .map(|m| m.display_name().to_string())
            .unwrap_or_else(|_| id.to_string())
    };

    match loading.0.phase() {
        LoadPhase::Pending { id } => {
            egui::Area::new(egui::Id::new("loading_indicator"))
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .interactable(false)
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add(egui::Spinner::new().size(32.0 * ui_scale).color(ACCENT_TEXT));
                        ui.add_space(8.0);
                        ui.label(
                            egui::RichText::new(format!("loading {}", name_of(id)))
                                .monospace()
                                .size(14.0 * ui_scale)
                                .color(ACCENT_TEXT),
                        );
                    });
                });
            // Keep repainting so the spinner animates in reactive mode
            ctx.request_repaint();
        }
        LoadPhase::Failed { id, reason } => {
            egui::Area::new(egui::Id::new("loading_failed"))
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .interactable(false)
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("could not load {}", name_of(id)))
                            .monospace()
                            .size(14.0 * ui_scale)
                            .color(ACCENT_BORDER),
                    );
                    ui.label(
                        egui::RichText::new(reason)
                            .small()
                            .color(egui::Color32::GRAY),
                    );
                });
        }
        LoadPhase::Idle | LoadPhase::Ready { .. } => {}
    }
}
