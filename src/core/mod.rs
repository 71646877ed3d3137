//! Core business logic module
//!
//! This module contains the domain models, the job registry and lifecycle
//! manager, the progress simulator and the mock conversion service.

pub mod artifacts;
pub mod catalogue;
pub mod config;
pub mod container;
pub mod converter;
pub mod manager;
pub mod models;
pub mod registry;
pub mod runtime;
pub mod simulator;
pub mod store;



// Re-export commonly used types
pub use config::AppConfig;
pub use manager::JobManager;
