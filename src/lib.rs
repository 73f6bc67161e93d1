pub mod composition;
pub mod dsp;
pub mod error;
pub mod playback;
#[cfg(feature = "web")]
pub mod web;

use crate::composition::CYBER_GROOVE;
use crate::dsp::engine::RenderSettings;
use crate::error::SynthError;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the chiploop-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Render the built-in loop as WAV bytes with the default settings.
pub fn render_loop_wav() -> Result<dsp::renderer::WavAsset, SynthError> {
    dsp::renderer::render_wav(&CYBER_GROOVE, &RenderSettings::default())
}

/// WASM-exposed: render the built-in loop to a WAV byte array.
#[wasm_bindgen]
pub fn render_chiptune_wav() -> Result<Vec<u8>, JsValue> {
    render_loop_wav()
        .map(dsp::renderer::WavAsset::into_bytes)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render the built-in loop as a `data:audio/wav;base64,` URI.
#[wasm_bindgen]
pub fn chiptune_data_uri() -> Result<String, JsValue> {
    render_loop_wav()
        .and_then(|wav| wav.data_uri())
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: decode persisted preferences from raw stored strings.
/// Returns `{ enabled, volume, pendingStart }`.
#[wasm_bindgen]
pub fn parse_playback_state(
    enabled: Option<String>,
    volume: Option<String>,
    pending: Option<String>,
) -> Result<JsValue, JsValue> {
    let state = playback::PlaybackState {
        enabled: playback::state::parse_enabled(enabled.as_deref()),
        volume: playback::state::parse_volume(volume.as_deref()),
        pending_start: playback::state::parse_pending(pending.as_deref()),
    };
    serde_wasm_bindgen::to_value(&state).map_err(|e| JsValue::from_str(&format!("{e}")))
}
