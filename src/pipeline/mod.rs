//! Corpus driver wiring the recognizer, segment cache and metric engine.
//!
//! # Architecture
//!
//! ```text
//! [audio files] ──Phonemizer──▶ SegmentTable ──Analyzer──▶ [file,vtv,pv]
//!                   │   ▲
//!                   ▼   │
//!              SegmentCache (has / get / put)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use vowel_rhythm::config::AppConfig;
//! use vowel_rhythm::pipeline::Pipeline;
//!
//! let config = AppConfig::default();
//! let pipeline = Pipeline::from_config(&config);
//!
//! // one file
//! let metrics = pipeline.process(Path::new("test.wav")).unwrap();
//! println!("VtV {:.3}  pV {:.1}", metrics.vtv, metrics.pv);
//!
//! // a corpus
//! let files = vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")];
//! let report = pipeline.phonemizer().phonemize_corpus(&files);
//! let rows = pipeline.analyzer().table_metrics(&report.table);
//! ```

pub mod runner;

pub use runner::{Analyzer, CorpusReport, Phonemizer, Pipeline, PipelineError};
