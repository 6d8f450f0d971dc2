//! Speech-rhythm metrics.
//!
//! * [`RhythmEngine`]: VtV and pV for one [`Utterance`](crate::phoneme::Utterance).
//! * [`evaluate`]: MAE / Pearson agreement between two result tables.

pub mod evaluate;
pub mod metrics;

pub use evaluate::{evaluate, mean_absolute_error, pearson_cc, Agreement, EvalError, Evaluation};
pub use metrics::{RhythmEngine, RhythmMetrics, UtteranceMetrics};
