//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), one sub-config per component,
//! `AppPaths` for cross-platform directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ClassifierConfig, RecognizerConfig, RhythmConfig, SegmenterConfig, StorageConfig,
    TrailingEnd, VtvMode,
};
