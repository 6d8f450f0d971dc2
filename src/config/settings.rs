//! Analysis settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to each
//! component at construction time.  Several configurations (languages,
//! thresholds) can coexist in one process.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::phoneme::{DEFAULT_PAUSE_SYMBOL, DEFAULT_VOWELS};

// ---------------------------------------------------------------------------
// TrailingEnd
// ---------------------------------------------------------------------------

/// How the end of the last event of an utterance is derived.  It has no
/// successor onset to bound it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingEnd {
    /// `onset + mean_duration`.
    MeanDuration,
    /// `onset + frame_duration` as reported by the recognizer.
    FrameDuration,
    /// `onset + frame_duration + mean_duration`.
    FramePlusMean,
}

impl Default for TrailingEnd {
    fn default() -> Self {
        Self::MeanDuration
    }
}

// ---------------------------------------------------------------------------
// SegmenterConfig
// ---------------------------------------------------------------------------

/// Constants driving the segmenter's outlier split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Mean expected phoneme duration `M` in seconds.
    pub mean_duration: f64,
    /// Spans longer than `outlier_factor × mean_duration` are split into a
    /// phoneme part and a pause part.
    pub outlier_factor: f64,
    /// End-time policy for the last event.
    pub trailing_end: TrailingEnd,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            mean_duration: 0.09,
            outlier_factor: 3.0,
            trailing_end: TrailingEnd::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

/// Vowel table and pause marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Symbol reserved for silence.  Also emitted by the segmenter for the
    /// pause half of a split span.
    pub pause_symbol: String,
    /// Closed set of vowel symbols.
    pub vowels: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pause_symbol: DEFAULT_PAUSE_SYMBOL.into(),
            vowels: DEFAULT_VOWELS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// RhythmConfig
// ---------------------------------------------------------------------------

/// Formula used for the VtV metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VtvMode {
    /// Two-pass accumulation, numerically identical to the reference tool.
    Literal,
    /// `(onset(last vowel) - onset(first vowel)) / (vowels - 1)`.
    OnsetInterval,
}

impl Default for VtvMode {
    fn default() -> Self {
        Self::Literal
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    pub vtv_mode: VtvMode,
    /// Report negative VtV values as 0.  Off by default so `Literal` output
    /// matches the reference tool, single-vowel negatives included.
    pub clamp_negative_vtv: bool,
}

// ---------------------------------------------------------------------------
// RecognizerConfig
// ---------------------------------------------------------------------------

/// External phoneme recognizer invocation.
///
/// `{lang}` and `{audio}` in `args` are substituted per call.  The process
/// must print one `onset duration symbol` line per phone on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Executable to run.
    pub program: String,
    /// Argument template.
    pub args: Vec<String>,
    /// Recognizer language / inventory code (e.g. `"ita"`, `"ipa"`).
    pub language: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            program: "python3".into(),
            args: [
                "-m",
                "allosaurus.run",
                "--timestamp",
                "True",
                "--lang",
                "{lang}",
                "-i",
                "{audio}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            language: "ita".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one segment table per audio file.  `None` uses the
    /// platform cache directory from [`AppPaths`].
    pub cache_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use vowel_rhythm::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub segmenter: SegmenterConfig,
    pub classifier: ClassifierConfig,
    pub rhythm: RhythmConfig,
    pub recognizer: RecognizerConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the components cannot work with.
    pub fn validate(&self) -> Result<()> {
        let seg = &self.segmenter;
        if !(seg.mean_duration.is_finite() && seg.mean_duration > 0.0) {
            bail!("segmenter.mean_duration must be positive, got {}", seg.mean_duration);
        }
        // below 1 a split would place the phoneme end past the next onset
        if !(seg.outlier_factor.is_finite() && seg.outlier_factor >= 1.0) {
            bail!("segmenter.outlier_factor must be at least 1, got {}", seg.outlier_factor);
        }
        if self.classifier.pause_symbol.trim().is_empty() {
            bail!("classifier.pause_symbol must not be empty");
        }
        if self.recognizer.program.trim().is_empty() {
            bail!("recognizer.program must not be empty");
        }
        Ok(())
    }

    /// Resolved segment cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.storage
            .cache_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().cache_dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.segmenter.mean_duration, 0.09);
        assert_eq!(cfg.segmenter.outlier_factor, 3.0);
        assert_eq!(cfg.segmenter.trailing_end, TrailingEnd::MeanDuration);
        assert_eq!(cfg.classifier.pause_symbol, "X");
        assert_eq!(cfg.classifier.vowels.len(), DEFAULT_VOWELS.len());
        assert_eq!(cfg.rhythm.vtv_mode, VtvMode::Literal);
        assert!(!cfg.rhythm.clamp_negative_vtv);
        assert_eq!(cfg.recognizer.language, "ita");
        assert!(cfg.storage.cache_dir.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[segmenter]\nmean_duration = 0.05\ntrailing_end = \"frame_plus_mean\"\n\n\
             [rhythm]\nvtv_mode = \"onset_interval\"\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.segmenter.mean_duration, 0.05);
        assert_eq!(cfg.segmenter.outlier_factor, 3.0);
        assert_eq!(cfg.segmenter.trailing_end, TrailingEnd::FramePlusMean);
        assert_eq!(cfg.rhythm.vtv_mode, VtvMode::OnsetInterval);
        assert_eq!(cfg.classifier, ClassifierConfig::default());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.segmenter.outlier_factor = 4.0;
        cfg.classifier.pause_symbol = "sil".into();
        cfg.classifier.vowels = vec!["a".into(), "ə".into()];
        cfg.recognizer.language = "eng".into();
        cfg.storage.cache_dir = Some(PathBuf::from("/tmp/phones"));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.segmenter.outlier_factor, 4.0);
        assert_eq!(loaded.classifier.pause_symbol, "sil");
        assert_eq!(loaded.classifier.vowels, vec!["a", "ə"]);
        assert_eq!(loaded.recognizer.language, "eng");
        assert_eq!(loaded.cache_dir(), PathBuf::from("/tmp/phones"));
    }

    #[test]
    fn validate_rejects_bad_constants() {
        let mut cfg = AppConfig::default();
        cfg.segmenter.mean_duration = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.segmenter.outlier_factor = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.segmenter.outlier_factor = 0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.segmenter.outlier_factor = 1.0;
        assert!(cfg.validate().is_ok());

        let mut cfg = AppConfig::default();
        cfg.classifier.pause_symbol = " ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[segmenter\nmean_duration = ").expect("write");
        assert!(AppConfig::load_from(&path).is_err());
    }
}
