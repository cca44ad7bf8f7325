#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the collage viewer.
//!
//! This module wraps [`super::WebHost`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use std::time::Duration;

use js_sys::{JSON, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::{FrameOutput, WebHost};
use drift_runtime::ViewerConfig;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn output_to_js(output: &FrameOutput) -> Result<JsValue, JsValue> {
    let json = output
        .to_json_string()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    JSON::parse(&json)
}

fn ms_to_duration(ms: f64) -> Duration {
    if ms > 0.0 {
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Collage viewer handle for the page script.
///
/// Host-driven: JavaScript pushes DOM events as encoded JSON and calls
/// [`frame`](Self::frame) from `requestAnimationFrame` while the previous
/// output reported `animating: true`.
#[wasm_bindgen]
pub struct CollageHandle {
    inner: WebHost,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl CollageHandle {
    /// Create a handle. `config_json` overrides defaults field by field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<CollageHandle, JsValue> {
        install_panic_hook();
        let config = match config_json.as_deref() {
            Some(json) => serde_json::from_str::<ViewerConfig>(json)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => ViewerConfig::default(),
        };
        let inner = WebHost::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse and apply one JSON-encoded host event.
    ///
    /// Returns the frame output for `frame` events and `undefined` otherwise.
    /// Malformed input throws.
    #[wasm_bindgen(js_name = pushEncodedInput)]
    pub fn push_encoded_input(&mut self, json: &str) -> Result<JsValue, JsValue> {
        match self
            .inner
            .push_encoded(json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?
        {
            Some(output) => output_to_js(&output),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Run the animation frame at `now_ms` on the host's monotonic clock.
    pub fn frame(&mut self, now_ms: f64) -> Result<JsValue, JsValue> {
        self.inner.clock_mut().set(ms_to_duration(now_ms));
        let output = self.inner.frame();
        output_to_js(&output)
    }

    /// Whether another animation frame is wanted.
    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self) -> bool {
        self.inner.viewer().pending_frame().is_some()
    }
}
