//! External phoneme recognizer adapter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │             PhonemeRecognizer (trait)                │
//! │                                                      │
//! │   ┌──────────────────┐    ┌──────────────────────┐   │
//! │   │ RecognizerConfig │───▶│ CommandRecognizer    │   │
//! │   │ - program, args  │    │ - spawn process      │   │
//! │   │ - language       │    │ - parse stdout lines │   │
//! │   └──────────────────┘    └──────────┬───────────┘   │
//! │                                      ▼               │
//! │                           Vec<RawEvent> (ordered)    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vowel_rhythm::config::RecognizerConfig;
//! use vowel_rhythm::recognizer::{CommandRecognizer, PhonemeRecognizer};
//!
//! let recognizer = CommandRecognizer::from_config(&RecognizerConfig::default());
//! let events = recognizer.recognize(Path::new("test.wav")).unwrap();
//! println!("{} phones", events.len());
//! ```

pub mod engine;

pub use engine::{CommandRecognizer, PhonemeRecognizer, RecognizerError};

#[cfg(test)]
pub use engine::MockRecognizer;
