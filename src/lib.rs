//! UN reports harvester
//!
//! Collects metadata about United Nations reports from the UN Digital
//! Library (MARCXML), normalizes it into flat report tables and selects the
//! Secretary-General reports. Thin collaborators cover the entity registry,
//! local PDF matching and the UN iLibrary RSS feed.

pub mod config;
pub mod error;
pub mod logging;
pub mod marc;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
