//! Phoneme recognizer trait and implementations.
//!
//! # Overview
//!
//! [`PhonemeRecognizer`] is the interface used by the phonemizer.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn PhonemeRecognizer>` and called from worker threads.
//!
//! [`CommandRecognizer`] is the production implementation: it runs an
//! external recognizer process (allosaurus by default) and parses its
//! timestamped output.
//!
//! [`MockRecognizer`] (available under `#[cfg(test)]`) returns a fixed
//! recognizer transcript and counts calls, for testing cache behaviour
//! without a recognizer installed.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::config::RecognizerConfig;
use crate::phoneme::{parse_raw_events, RawEvent};

// ---------------------------------------------------------------------------
// RecognizerError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum RecognizerError {
    /// The audio file to analyse does not exist.
    #[error("Audio file not found: {0}")]
    AudioNotFound(String),

    /// The recognizer process could not be started.
    #[error("Failed to start recognizer `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    /// The recognizer ran but exited unsuccessfully.
    #[error("Recognizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

// ---------------------------------------------------------------------------
// PhonemeRecognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for timestamped phoneme recognizers.
///
/// # Contract
///
/// - Returns events ordered by onset.
/// - Malformed output lines are dropped, never reported as errors.
pub trait PhonemeRecognizer: Send + Sync {
    fn recognize(&self, audio: &Path) -> Result<Vec<RawEvent>, RecognizerError>;
}

// Compile-time assertion: Box<dyn PhonemeRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn PhonemeRecognizer>) {}
};

// ---------------------------------------------------------------------------
// CommandRecognizer
// ---------------------------------------------------------------------------

/// Runs an external recognizer and reads `onset duration symbol` lines from
/// its stdout.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    language: String,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            language: language.into(),
        }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.language.clone(),
        )
    }

    /// Argument list with `{lang}` and `{audio}` substituted.
    pub fn render_args(&self, audio: &Path) -> Vec<String> {
        let audio = audio.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{lang}", &self.language).replace("{audio}", &audio))
            .collect()
    }
}

impl PhonemeRecognizer for CommandRecognizer {
    fn recognize(&self, audio: &Path) -> Result<Vec<RawEvent>, RecognizerError> {
        if !audio.exists() {
            return Err(RecognizerError::AudioNotFound(audio.display().to_string()));
        }

        let args = self.render_args(audio);
        log::debug!("recognizer: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| RecognizerError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RecognizerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let events = parse_raw_events(&stdout);
        if events.is_empty() {
            log::warn!("recognizer returned no phonemes for {}", audio.display());
        }
        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double that parses a fixed transcript on every call.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<String, RecognizerError>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn ok(transcript: impl Into<String>) -> Self {
        Self {
            response: Ok(transcript.into()),
            calls: Default::default(),
        }
    }

    pub fn err(error: RecognizerError) -> Self {
        Self {
            response: Err(error),
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl PhonemeRecognizer for MockRecognizer {
    fn recognize(&self, _audio: &Path) -> Result<Vec<RawEvent>, RecognizerError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response.clone().map(|text| parse_raw_events(&text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> std::path::PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, b"RIFF").unwrap();
        p
    }

    #[test]
    fn mock_parses_transcript_and_counts_calls() {
        let rec = MockRecognizer::ok("1.500 0.045 ʂ\n1.560 0.045 e\n");
        let events = rec.recognize(Path::new("x.wav")).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(rec.calls(), 1);
    }

    #[test]
    fn mock_err_returns_configured_error() {
        let rec = MockRecognizer::err(RecognizerError::AudioNotFound("x".into()));
        assert!(matches!(
            rec.recognize(Path::new("x.wav")),
            Err(RecognizerError::AudioNotFound(_))
        ));
    }

    #[test]
    fn render_args_substitutes_placeholders() {
        let rec = CommandRecognizer::from_config(&RecognizerConfig::default());
        let args = rec.render_args(Path::new("/data/a.wav"));
        assert!(args.contains(&"ita".to_string()));
        assert!(args.contains(&"/data/a.wav".to_string()));
        assert!(!args.iter().any(|a| a.contains('{')));
    }

    #[test]
    fn missing_audio_is_reported_before_spawning() {
        let rec = CommandRecognizer::new("/definitely/not/here", vec![], "ipa");
        assert!(matches!(
            rec.recognize(Path::new("/nonexistent/audio.wav")),
            Err(RecognizerError::AudioNotFound(_))
        ));
    }

    #[test]
    fn unknown_program_is_a_spawn_error() {
        let dir = tempdir().expect("temp dir");
        let audio = touch(dir.path(), "a.wav");
        let rec = CommandRecognizer::new("/definitely/not/here", vec![], "ipa");
        assert!(matches!(
            rec.recognize(&audio),
            Err(RecognizerError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_parsed_and_malformed_lines_skipped() {
        let dir = tempdir().expect("temp dir");
        let audio = touch(dir.path(), "a.wav");
        let rec = CommandRecognizer::new(
            "sh",
            vec![
                "-c".into(),
                "printf '0.000 0.045 a\\nnoise\\n0.120 0.045 t\\n'".into(),
                "{audio}".into(),
            ],
            "ipa",
        );
        let events = rec.recognize(&audio).expect("recognize");
        let symbols: Vec<&str> = events.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["a", "t"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_failure() {
        let dir = tempdir().expect("temp dir");
        let audio = touch(dir.path(), "a.wav");
        let rec = CommandRecognizer::new(
            "sh",
            vec!["-c".into(), "echo boom >&2; exit 3".into()],
            "ipa",
        );
        match rec.recognize(&audio) {
            Err(RecognizerError::Failed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
