//! HTTP command handlers
//!
//! Handlers are grouped by the part of the API they serve. All of them take
//! the shared `AppState` through axum's `State` extractor.

pub mod convert;
pub mod download;
pub mod jobs;
pub mod system;
pub mod youtube;
