//! glTF model loading and active-model spawning

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::HashMap;
use vitrine_core::ModelConfig;

use crate::labels::{LabelKind, WorldLabel};
use crate::types::{euler_to_quat, ActiveModel, ModelLoading, ViewerSettings};

/// Root entity of the spawned active model
#[derive(Component)]
pub struct ActiveModelEntity {
    pub model_id: String,
}

/// Plugin for model loading
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelCache>()
            .add_systems(Update, (begin_model_transition, poll_model_loads, spawn_ready_model).chain());
    }
}

/// Outcome of a model asset request
#[derive(Debug, Clone, PartialEq)]
pub enum AssetStatus {
    Unrequested,
    Loading,
    Ready(Handle<Scene>),
    Failed(String),
}

/// Cache of model handles keyed by asset path
#[derive(Resource, Default)]
pub struct ModelCache {
    pub loading: HashMap<String, Handle<Gltf>>,
    pub scenes: HashMap<String, Handle<Scene>>,
    pub failed: HashMap<String, String>,
}

impl ModelCache {
    pub fn status(&self, asset: &str) -> AssetStatus {
        if let Some(scene) = self.scenes.get(asset) {
            AssetStatus::Ready(scene.clone())
        } else if let Some(reason) = self.failed.get(asset) {
            AssetStatus::Failed(reason.clone())
        } else if self.loading.contains_key(asset) {
            AssetStatus::Loading
        } else {
            AssetStatus::Unrequested
        }
    }

    /// Start loading `asset` unless it is already known
    pub fn request(&mut self, asset: &str, asset_server: &AssetServer) {
        if self.status(asset) != AssetStatus::Unrequested {
            return;
        }
        tracing::info!("Starting to load model: {}", asset);
        let handle: Handle<Gltf> = asset_server.load(asset.to_string());
        self.loading.insert(asset.to_string(), handle);
    }

    pub fn mark_ready(&mut self, asset: &str, scene: Handle<Scene>) {
        self.loading.remove(asset);
        self.scenes.insert(asset.to_string(), scene);
    }

    pub fn mark_failed(&mut self, asset: &str, reason: impl Into<String>) {
        self.loading.remove(asset);
        self.failed.insert(asset.to_string(), reason.into());
    }
}

/// Transform of the model root from its config
pub fn model_transform(model: &ModelConfig) -> Transform {
    Transform::from_translation(model.position)
        .with_rotation(euler_to_quat(model.rotation))
        .with_scale(Vec3::splat(model.scale))
}

/// On selection change, unmount the previous model and start loading the new one
fn begin_model_transition(
    mut commands: Commands,
    active: Res<ActiveModel>,
    settings: Res<ViewerSettings>,
    mut loading: ResMut<ModelLoading>,
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    mounted: Query<Entity, Or<(With<ActiveModelEntity>, With<OverlayLabelMarker>)>>,
) {
    if !active.is_changed() && !settings.is_changed() {
        return;
    }
    let Some(model) = active.model(&settings) else {
        return;
    };

    for entity in &mounted {
        commands.entity(entity).despawn();
    }

    loading.0.begin(&model.id);
    cache.request(&model.asset, &asset_server);
}

/// Move finished glTF loads into the scene cache
fn poll_model_loads(
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
) {
    let loading_keys: Vec<String> = cache.loading.keys().cloned().collect();
    for key in loading_keys {
        let Some(handle) = cache.loading.get(&key).cloned() else {
            continue;
        };

        match asset_server.get_load_state(handle.id()) {
            Some(LoadState::Loaded) => {
                let Some(gltf) = gltf_assets.get(&handle) else {
                    continue;
                };
                // Use first scene if no default
                match gltf.default_scene.clone().or_else(|| gltf.scenes.first().cloned()) {
                    Some(scene) => {
                        tracing::info!("Model loaded: {}", key);
                        cache.mark_ready(&key, scene);
                    }
                    None => {
                        tracing::error!("Model has no scenes: {}", key);
                        cache.mark_failed(&key, "no scenes in glTF");
                    }
                }
            }
            Some(LoadState::Failed(err)) => {
                tracing::error!("Failed to load model {}: {}", key, err);
                cache.mark_failed(&key, err.to_string());
            }
            _ => {
                // Still loading
            }
        }
    }
}

/// Marker so overlay labels are unmounted together with their model
#[derive(Component)]
pub struct OverlayLabelMarker;

/// Mount the active model and its overlay text once its asset is ready
fn spawn_ready_model(
    mut commands: Commands,
    active: Res<ActiveModel>,
    settings: Res<ViewerSettings>,
    mut loading: ResMut<ModelLoading>,
    cache: Res<ModelCache>,
) {
    // Leave at least one frame between unmount and mount
    if active.is_changed() || settings.is_changed() {
        return;
    }
    let Some(model) = active.model(&settings) else {
        return;
    };
    if !loading.0.is_pending_for(&model.id) {
        return;
    }

    match cache.status(&model.asset) {
        AssetStatus::Ready(scene) => {
            tracing::info!("Spawning model {} from {}", model.id, model.asset);
            commands.spawn((
                SceneRoot(scene),
                model_transform(model),
                ActiveModelEntity {
                    model_id: model.id.clone(),
                },
            ));
            commands.spawn((
                WorldLabel::new(model.overlay(), LabelKind::Overlay),
                OverlayLabelMarker,
            ));
            loading.0.finish(&model.id);
        }
        AssetStatus::Failed(reason) => {
            loading.0.fail(&model.id, reason);
        }
        AssetStatus::Loading | AssetStatus::Unrequested => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::apply_viewer_signals;
    use crate::types::ViewerSignal;
    use vitrine_core::LoadPhase;

    /// Headless app running the model systems, with every asset already cached
    fn test_app(failing_asset: Option<&str>) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Gltf>()
            .init_asset::<Scene>()
            .init_resource::<ModelCache>()
            .add_message::<ViewerSignal>()
            .add_systems(
                Update,
                (apply_viewer_signals, begin_model_transition, poll_model_loads, spawn_ready_model).chain(),
            );

        let settings = ViewerSettings::embedded().unwrap();
        for model in settings.registry.models() {
            if Some(model.asset.as_str()) == failing_asset {
                app.world_mut()
                    .resource_mut::<ModelCache>()
                    .mark_failed(&model.asset, "HTTP 404");
                continue;
            }
            let scene = app
                .world_mut()
                .resource_mut::<Assets<Scene>>()
                .add(Scene::new(World::new()));
            app.world_mut().resource_mut::<ModelCache>().mark_ready(&model.asset, scene);
        }

        settings.install(&mut app.world_mut().commands(), None);
        app.world_mut().flush();
        app
    }

    fn send(app: &mut App, signal: ViewerSignal) {
        app.world_mut()
            .resource_mut::<Messages<ViewerSignal>>()
            .write(signal);
        app.update();
    }

    fn phase(app: &App) -> LoadPhase {
        app.world().resource::<ModelLoading>().0.phase().clone()
    }

    fn mounted(app: &mut App) -> Vec<(String, Handle<Scene>, Transform)> {
        app.world_mut()
            .query::<(&ActiveModelEntity, &SceneRoot, &Transform)>()
            .iter(app.world())
            .map(|(model, root, transform)| (model.model_id.clone(), root.0.clone(), *transform))
            .collect()
    }

    fn overlay_texts(app: &mut App) -> Vec<String> {
        app.world_mut()
            .query_filtered::<&WorldLabel, With<OverlayLabelMarker>>()
            .iter(app.world())
            .map(|label| label.config.text.clone())
            .collect()
    }

    #[test]
    fn test_selecting_each_model_mounts_its_asset_and_overlay() {
        let mut app = test_app(None);
        let settings = app.world().resource::<ViewerSettings>().clone();

        // Startup selection goes through the same pending window
        app.update();
        assert_eq!(phase(&app), LoadPhase::Pending { id: "cat_skull".to_string() });
        assert!(mounted(&mut app).is_empty());
        app.update();
        assert_eq!(mounted(&mut app).len(), 1);

        for model in settings.registry.models().iter().rev() {
            send(&mut app, ViewerSignal::SelectModel(model.id.clone()));

            // Previous model is gone and the indicator is up before the new scene mounts
            assert_eq!(phase(&app), LoadPhase::Pending { id: model.id.clone() });
            assert!(mounted(&mut app).is_empty());
            assert!(overlay_texts(&mut app).is_empty());

            app.update();
            assert_eq!(phase(&app), LoadPhase::Ready { id: model.id.clone() });

            let expected_scene = match app.world().resource::<ModelCache>().status(&model.asset) {
                AssetStatus::Ready(scene) => scene,
                other => panic!("asset not cached: {other:?}"),
            };
            let spawned = mounted(&mut app);
            assert_eq!(spawned.len(), 1);
            let (id, scene, transform) = &spawned[0];
            assert_eq!(id, &model.id);
            assert_eq!(scene, &expected_scene);
            assert_eq!(*transform, model_transform(model));
            assert_eq!(overlay_texts(&mut app), vec![model.text.clone()]);
        }
    }

    #[test]
    fn test_failed_asset_ends_in_failed_phase() {
        let mut app = test_app(Some("models/ram_skull/scene.gltf"));
        app.update();
        app.update();
        assert_eq!(mounted(&mut app).len(), 1);

        send(&mut app, ViewerSignal::SelectModel("ram_skull".to_string()));
        assert_eq!(phase(&app), LoadPhase::Pending { id: "ram_skull".to_string() });

        app.update();
        assert_eq!(
            phase(&app),
            LoadPhase::Failed {
                id: "ram_skull".to_string(),
                reason: "HTTP 404".to_string(),
            }
        );
        assert!(mounted(&mut app).is_empty());
        assert!(overlay_texts(&mut app).is_empty());

        // Another model still loads after the failure
        send(&mut app, ViewerSignal::SelectModel("raven_skull".to_string()));
        app.update();
        assert_eq!(phase(&app), LoadPhase::Ready { id: "raven_skull".to_string() });
        assert_eq!(mounted(&mut app).len(), 1);
    }

    #[test]
    fn test_model_transform_from_config() {
        let settings = ViewerSettings::embedded().unwrap();
        let skull = settings.registry.get("cat_skull").unwrap();
        let transform = model_transform(skull);
        assert_eq!(transform.scale, Vec3::splat(2.0));
        assert_eq!(transform.translation, Vec3::ZERO);

        let raven = settings.registry.get("raven_skull").unwrap();
        let transform = model_transform(raven);
        assert_eq!(transform.translation, raven.position);
        assert!((transform.rotation * Vec3::Z).distance(-Vec3::X) < 1e-5);
    }

    #[test]
    fn test_cache_status_transitions() {
        let mut cache = ModelCache::default();
        let path = "models/cat_skull/scene.gltf";
        assert_eq!(cache.status(path), AssetStatus::Unrequested);

        cache.loading.insert(path.to_string(), Handle::default());
        assert_eq!(cache.status(path), AssetStatus::Loading);

        let scene: Handle<Scene> = Handle::default();
        cache.mark_ready(path, scene.clone());
        assert_eq!(cache.status(path), AssetStatus::Ready(scene));
        assert!(cache.loading.is_empty());

        cache.mark_failed("models/missing.glb", "404");
        assert_eq!(
            cache.status("models/missing.glb"),
            AssetStatus::Failed("404".to_string())
        );
    }
}
