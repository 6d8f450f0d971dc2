//! Phoneme segmentation and classification.
//!
//! # Pipeline
//!
//! ```text
//! recognizer lines ──parse_raw_events──▶ [RawEvent]
//!                  ──Segmenter::segment─▶ [Segment]
//!                  ──Classifier──────────▶ Utterance ([PhonemeSegment])
//! ```
//!
//! # Quick start
//!
//! ```
//! use vowel_rhythm::phoneme::{parse_raw_events, Classifier, Segmenter};
//!
//! let raw = "0.000 0.045 a\n0.060 0.045 t\n0.150 0.045 i\n";
//! let segments = Segmenter::default().segment(&parse_raw_events(raw));
//! let utterance = Classifier::default().annotate_all(segments);
//! assert_eq!(utterance.len(), 3);
//! ```

pub mod segment;
pub mod segmenter;
pub mod vowels;

pub use segment::{parse_raw_events, PhonemeClass, PhonemeSegment, RawEvent, Segment, Utterance};
pub use segmenter::Segmenter;
pub use vowels::{Classifier, DEFAULT_PAUSE_SYMBOL, DEFAULT_VOWELS};
