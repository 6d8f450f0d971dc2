//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\vowel-rhythm\
//!   macOS:   ~/Library/Application Support/vowel-rhythm/
//!   Linux:   ~/.config/vowel-rhythm/
//!
//! Cache dir (per-file phoneme segment tables):
//!   Windows: %LOCALAPPDATA%\vowel-rhythm\phonemes\
//!   macOS:   ~/Library/Caches/vowel-rhythm/phonemes/
//!   Linux:   ~/.cache/vowel-rhythm/phonemes/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for cached segment tables.
    pub cache_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "vowel-rhythm";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME)
            .join("phonemes");

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            cache_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
