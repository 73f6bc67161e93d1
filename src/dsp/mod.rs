//! DSP — Pure Rust synthesis of the fallback loop.
//!
//! Everything here is synchronous and deterministic, so the same bytes come
//! out in the browser (via WASM) and in native tests.

pub mod engine;
pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
