//! Unistream WASM - browser player over dash.js, hls.js and hasplayer.js
//!
//! The engines are loaded by the page as globals (`dashjs`, `Hls`,
//! `MediaPlayer`); this crate binds them to the capability traits of
//! `unistream-core` and exposes one player class to JavaScript.
//!
//! ## Usage
//!
//! ```javascript
//! import init, { UnistreamPlayer } from '@unistream/wasm';
//!
//! await init();
//! const player = new UnistreamPlayer(document.querySelector('video'));
//! player.on('hlsManifestParsed', (event) => console.log(event));
//! player.init('hls', { url: 'https://cdn.example.com/master.m3u8', autoplay: true });
//! ```

use std::sync::Once;
use wasm_bindgen::prelude::*;

mod engines;
mod player;
mod sink;

pub use engines::{DashJsFactory, HasPlayerFactory, HlsJsFactory};
pub use player::UnistreamPlayer;
pub use sink::HtmlMediaSink;

static CONSOLE_LOGGING: Once = Once::new();

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    unistream_core::init();
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    unistream_core::VERSION.to_string()
}

/// Route Rust `tracing` output to the browser console.
///
/// Safe to call more than once; only the first call installs the subscriber.
#[wasm_bindgen(js_name = enableConsoleLogging)]
pub fn enable_console_logging(debug: bool) {
    CONSOLE_LOGGING.call_once(|| {
        let level = if debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
        let config = tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(level)
            .build();
        tracing_wasm::set_as_global_default_with_config(config);
    });
}

/// Human-readable bitrate (`"2mbps"`, `"800kbps"`, `"640bps"`)
#[wasm_bindgen(js_name = formatBitrate)]
pub fn format_bitrate(bitrate: f64) -> String {
    unistream_core::format_bitrate(bitrate.max(0.0) as u64)
}
