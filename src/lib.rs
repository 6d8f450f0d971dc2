//! Speech-rhythm indices (VtV, pV) from timestamped phoneme recognition.
//!
//! * [`phoneme`]: raw recognizer events → segments → classified utterances.
//! * [`rhythm`]: VtV / pV per utterance, agreement against reference values.
//! * [`recognizer`]: adapter for the external phoneme recognizer.
//! * [`store`]: segment / result tables and the segment cache.
//! * [`pipeline`]: corpus driver tying everything together.
//! * [`config`]: TOML settings and platform paths.

pub mod config;
pub mod phoneme;
pub mod pipeline;
pub mod recognizer;
pub mod rhythm;
pub mod store;
