//! Vitrine Viewer - browser entry point
//!
//! Reads the page URL, sets up logging and starts the Bevy app that draws
//! into `#viewer-canvas`.

mod app;
mod url_params;

pub use url_params::UrlParams;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    let params = UrlParams::from_location();

    // WARN keeps the console quiet; ?debug=1 shows the load and signal trail
    let max_level = if params.debug {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(max_level)
            .build(),
    );

    // Run the Bevy app
    app::run(params);
}
