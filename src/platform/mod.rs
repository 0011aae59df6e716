//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (pointer, touch swipes, keyboard)
//! - Storage (LocalStorage on web, in-memory elsewhere)
//! - Canvas drawing and animation frames (web only)

pub mod input;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod web;
