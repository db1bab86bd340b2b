//! geostacks-core — shared types and settings for GeoStacks.

pub mod settings;
pub mod types;

pub use settings::{EngineSettings, Settings};
pub use types::{Site, SiteSummary, validate_username};
