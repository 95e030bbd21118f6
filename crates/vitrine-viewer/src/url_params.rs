//! Page URL parameters and remote configuration loading
//!
//! - `?model=<id>` starts on a model other than the configured default
//! - `?config=<url>` replaces the embedded config with a fetched TOML or JSON file
//! - `?debug=1` raises the console log level

use bevy::prelude::*;
use std::sync::{Arc, Mutex};
use vitrine_core::{ConfigError, ViewerConfig};
use vitrine_scene::{ActiveModel, ViewerSettings};

/// Parameters read from the page URL at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Resource)]
pub struct UrlParams {
    pub model: Option<String>,
    pub config: Option<String>,
    pub debug: bool,
}

impl UrlParams {
    /// Build from decoded query pairs; unknown keys are ignored
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            match key {
                "model" if !value.is_empty() => params.model = Some(value.to_string()),
                "config" if !value.is_empty() => params.config = Some(value.to_string()),
                // A bare `?debug` counts as on
                "debug" => params.debug = !matches!(value, "0" | "false" | "off"),
                _ => {}
            }
        }
        params
    }

    /// Read the parameters of the current page
    #[cfg(target_arch = "wasm32")]
    pub fn from_location() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Ok(href) = window.location().href() else {
            return Self::default();
        };
        let Ok(url) = web_sys::Url::new(&href) else {
            return Self::default();
        };

        let search = url.search_params();
        let found: Vec<(&str, String)> = ["model", "config", "debug"]
            .into_iter()
            .filter_map(|key| search.get(key).map(|value| (key, value)))
            .collect();
        Self::from_pairs(found.iter().map(|(key, value)| (*key, value.as_str())))
    }

    /// Outside the browser there is no page URL
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_location() -> Self {
        Self::default()
    }
}

/// Plugin that fetches `?config=` and swaps it in once it arrives
pub struct RemoteConfigPlugin {
    pub params: UrlParams,
}

impl Plugin for RemoteConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.params.clone())
            .init_resource::<PendingConfig>()
            .add_systems(Startup, request_remote_config)
            .add_systems(Update, apply_remote_config);
    }
}

/// Fetched config text (or the fetch error), filled in by the fetch future
#[derive(Resource, Default)]
pub struct PendingConfig {
    pub result: Arc<Mutex<Option<Result<String, String>>>>,
}

fn request_remote_config(params: Res<UrlParams>, pending: Res<PendingConfig>) {
    let Some(url) = params.config.clone() else {
        return;
    };
    tracing::info!("Loading viewer config from URL parameter: {}", url);
    spawn_config_fetch(url, pending.result.clone());
}

#[cfg(target_arch = "wasm32")]
fn spawn_config_fetch(url: String, slot: Arc<Mutex<Option<Result<String, String>>>>) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch_text(&url).await;
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(result);
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_config_fetch(url: String, slot: Arc<Mutex<Option<Result<String, String>>>>) {
    if let Ok(mut slot) = slot.lock() {
        *slot = Some(Err(format!("cannot fetch {} outside the browser", url)));
    }
}

/// Fetch a text document relative to the page
#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, String> {
    use wasm_bindgen::JsCast;

    let window = web_sys::window().ok_or("No window")?;

    let resp = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("Fetch failed: {:?}", e))?;

    let resp: web_sys::Response = resp.dyn_into().map_err(|_| "Response cast failed")?;

    if !resp.ok() {
        return Err(format!("HTTP {}: {}", resp.status(), resp.status_text()));
    }

    let text = wasm_bindgen_futures::JsFuture::from(resp.text().map_err(|_| "Failed to get text")?)
        .await
        .map_err(|e| format!("Text extraction failed: {:?}", e))?;

    text.as_string().ok_or_else(|| "Not a string".to_string())
}

/// Parse fetched config text into settings
pub fn settings_from_source(source: &str, content: &str) -> Result<ViewerSettings, ConfigError> {
    let config = ViewerConfig::parse(source, content)?;
    Ok(ViewerSettings::new(config)?)
}

/// Swap in the fetched config; on any failure the current config stays
fn apply_remote_config(
    mut commands: Commands,
    params: Res<UrlParams>,
    pending: Res<PendingConfig>,
    active: Res<ActiveModel>,
) {
    let Ok(mut slot) = pending.result.try_lock() else {
        return;
    };
    let Some(result) = slot.take() else {
        return;
    };
    let source = params.config.as_deref().unwrap_or_default();

    let content = match result {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Could not fetch viewer config {}: {}", source, e);
            return;
        }
    };

    match settings_from_source(source, &content) {
        Ok(settings) => {
            // The URL choice wins over whatever the embedded config fell back to
            let initial = params.model.as_deref().unwrap_or(active.id()).to_string();
            settings.install(&mut commands, Some(&initial));
        }
        Err(e) => {
            tracing::error!("Invalid viewer config {}: {}", source, e);
        }
    }
}
