//! Shared types, error model, and configuration for asrskit.
//!
//! This crate is the foundation depended on by all other asrskit crates.
//! It provides:
//! - [`AsrsError`] — the unified error type
//! - The record model ([`Record`], [`Section`], [`FieldValue`])
//! - Configuration ([`AppConfig`], [`MarkerClasses`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClassifierConfig, MarkerClasses, PricingConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{AsrsError, Result};
pub use types::{CLASSIFICATION_KEY, FieldValue, IDENTIFIER_KEY, Record, Section, TEXT_KEY};
