//! Batch driver: recognizer → segmenter → cache, then classifier → metrics.
//!
//! # Flow
//!
//! ```text
//! audio file
//!   └─▶ cache.has(key)?
//!         ├─ yes → cache.get(key)                       [skip recognition]
//!         └─ no  → recognizer.recognize → Segmenter → cache.put(key)
//!   └─▶ SegmentTable (file,start,end,dur,phoneme)
//!
//! SegmentTable
//!   └─▶ group by file → Classifier → RhythmEngine → file,vtv,pv
//! ```
//!
//! Files and utterances are independent, so both stages fan out over the
//! rayon thread pool.  Output order always follows input order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::config::AppConfig;
use crate::phoneme::{Classifier, Segmenter, Utterance};
use crate::recognizer::{CommandRecognizer, PhonemeRecognizer, RecognizerError};
use crate::rhythm::{RhythmEngine, RhythmMetrics, UtteranceMetrics};
use crate::store::{cache_key, CacheError, DirCache, SegmentCache, SegmentTable};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("audio path has no file name: {0}")]
    BadAudioPath(String),

    #[error("recognition failed: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("segment cache: {0}")]
    Cache(#[from] CacheError),
}

// ---------------------------------------------------------------------------
// Phonemizer
// ---------------------------------------------------------------------------

/// Turns audio files into segment tables, consulting the cache first.
pub struct Phonemizer {
    recognizer: Arc<dyn PhonemeRecognizer>,
    cache: Arc<dyn SegmentCache>,
    segmenter: Segmenter,
}

/// Outcome of phonemizing a list of files.
#[derive(Debug, Default)]
pub struct CorpusReport {
    /// Segments of every file that succeeded, in input order.
    pub table: SegmentTable,
    /// Files that were skipped, with the reason.
    pub failures: Vec<(PathBuf, PipelineError)>,
}

impl Phonemizer {
    pub fn new(
        recognizer: Arc<dyn PhonemeRecognizer>,
        cache: Arc<dyn SegmentCache>,
        segmenter: Segmenter,
    ) -> Self {
        Self {
            recognizer,
            cache,
            segmenter,
        }
    }

    /// Segment table for one audio file.
    pub fn phonemize(&self, audio: &Path) -> Result<SegmentTable, PipelineError> {
        let key = cache_key(audio);
        if key.is_empty() {
            return Err(PipelineError::BadAudioPath(audio.display().to_string()));
        }

        let file = audio.to_string_lossy();
        if self.cache.has(&key) {
            log::info!("phoneme table for {} already cached, skipping", audio.display());
            let mut table = self.cache.get(&key)?;
            if table.files().iter().any(|f| f.as_str() != file) {
                log::debug!("cache entry {key} was stored under another name, relabelling");
                table.relabel(&file);
            }
            return Ok(table);
        }

        log::info!("processing {}...", audio.display());
        let events = self.recognizer.recognize(audio)?;
        let segments = self.segmenter.segment(&events);
        log::debug!(
            "{}: {} raw events → {} segments",
            audio.display(),
            events.len(),
            segments.len()
        );

        let table = SegmentTable::from_segments(&file, &segments);
        self.cache.put(&key, &table)?;
        Ok(table)
    }

    /// Phonemize every file.  Failures are logged and reported, never fatal.
    /// Repeated paths are processed once.
    pub fn phonemize_corpus(&self, files: &[PathBuf]) -> CorpusReport {
        let mut seen = HashSet::new();
        let files: Vec<&PathBuf> = files.iter().filter(|f| seen.insert(*f)).collect();

        let results: Vec<(PathBuf, Result<SegmentTable, PipelineError>)> = files
            .par_iter()
            .map(|f| ((*f).clone(), self.phonemize(f)))
            .collect();

        let mut report = CorpusReport::default();
        for (file, result) in results {
            match result {
                Ok(table) => report.table.extend(table),
                Err(e) => {
                    log::warn!("skipping {}: {e}", file.display());
                    report.failures.push((file, e));
                }
            }
        }

        log::info!(
            "phonemized {} of {} files ({} segments)",
            files.len() - report.failures.len(),
            files.len(),
            report.table.len()
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Classifies segments and computes rhythm metrics.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    classifier: Classifier,
    engine: RhythmEngine,
}

impl Analyzer {
    pub fn new(classifier: Classifier, engine: RhythmEngine) -> Self {
        Self { classifier, engine }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Classifier::from_config(&config.classifier),
            RhythmEngine::from_config(&config.rhythm),
        )
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn utterance_metrics(&self, utterance: &Utterance) -> RhythmMetrics {
        self.engine.compute(utterance)
    }

    /// One result row per file in `table`, in order of first appearance.
    pub fn table_metrics(&self, table: &SegmentTable) -> Vec<UtteranceMetrics> {
        table
            .utterances(&self.classifier)
            .par_iter()
            .map(|(file, utt)| UtteranceMetrics::new(file.clone(), self.engine.compute(utt)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Phonemizer and analyzer built from one [`AppConfig`].
pub struct Pipeline {
    phonemizer: Phonemizer,
    analyzer: Analyzer,
}

impl Pipeline {
    pub fn new(phonemizer: Phonemizer, analyzer: Analyzer) -> Self {
        Self {
            phonemizer,
            analyzer,
        }
    }

    /// Production wiring: external command recognizer and a directory cache.
    pub fn from_config(config: &AppConfig) -> Self {
        let recognizer: Arc<dyn PhonemeRecognizer> =
            Arc::new(CommandRecognizer::from_config(&config.recognizer));
        let cache: Arc<dyn SegmentCache> = Arc::new(DirCache::new(config.cache_dir()));
        let segmenter = Segmenter::new(
            config.segmenter.clone(),
            config.classifier.pause_symbol.clone(),
        );
        Self::new(
            Phonemizer::new(recognizer, cache, segmenter),
            Analyzer::from_config(config),
        )
    }

    pub fn phonemizer(&self) -> &Phonemizer {
        &self.phonemizer
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Audio file → (VtV, pV).
    pub fn process(&self, audio: &Path) -> Result<RhythmMetrics, PipelineError> {
        let table = self.phonemizer.phonemize(audio)?;
        let utterance = self.analyzer.classifier().annotate_all(table.segments());
        Ok(self.analyzer.utterance_metrics(&utterance))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VtvMode;
    use crate::recognizer::MockRecognizer;
    use crate::store::MemoryCache;

    const TRANSCRIPT: &str = "0.000 0.045 a\n0.050 0.045 t\n0.100 0.045 i\nbad line\n";

    fn phonemizer(rec: Arc<MockRecognizer>, cache: Arc<MemoryCache>) -> Phonemizer {
        Phonemizer::new(rec, cache, Segmenter::default())
    }

    #[test]
    fn phonemize_segments_and_caches() {
        let rec = Arc::new(MockRecognizer::ok(TRANSCRIPT));
        let cache = Arc::new(MemoryCache::new());
        let p = phonemizer(rec.clone(), cache.clone());

        let table = p.phonemize(Path::new("corpus/s1.wav")).expect("phonemize");
        assert_eq!(table.len(), 3);
        assert!(table.records().iter().all(|r| r.file == "corpus/s1.wav"));
        assert!(cache.has("corpus%2Fs1"));
        assert_eq!(rec.calls(), 1);
    }

    #[test]
    fn cache_hit_skips_recognizer() {
        let rec = Arc::new(MockRecognizer::ok(TRANSCRIPT));
        let cache = Arc::new(MemoryCache::new());
        let p = phonemizer(rec.clone(), cache);

        let first = p.phonemize(Path::new("s1.wav")).unwrap();
        let second = p.phonemize(Path::new("s1.wav")).unwrap();
        assert_eq!(first, second);
        assert_eq!(rec.calls(), 1);
    }

    #[test]
    fn recognizer_failure_is_not_cached() {
        let rec = Arc::new(MockRecognizer::err(RecognizerError::AudioNotFound("x".into())));
        let cache = Arc::new(MemoryCache::new());
        let p = phonemizer(rec, cache.clone());

        assert!(matches!(
            p.phonemize(Path::new("x.wav")),
            Err(PipelineError::Recognizer(_))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_file_name_is_rejected() {
        let p = phonemizer(
            Arc::new(MockRecognizer::ok(TRANSCRIPT)),
            Arc::new(MemoryCache::new()),
        );
        assert!(matches!(
            p.phonemize(Path::new("")),
            Err(PipelineError::BadAudioPath(_))
        ));
    }

    #[test]
    fn corpus_preserves_order_and_reports_failures() {
        let rec = Arc::new(MockRecognizer::ok(TRANSCRIPT));
        let p = phonemizer(rec, Arc::new(MemoryCache::new()));
        let files: Vec<PathBuf> = ["b.wav", "a.wav", "", "c.wav"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let report = p.phonemize_corpus(&files);
        assert_eq!(report.table.files(), vec!["b.wav", "a.wav", "c.wav"]);
        assert_eq!(report.table.len(), 9);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, PathBuf::from(""));
    }

    #[test]
    fn same_file_name_in_two_directories_stays_separate() {
        let dir = tempfile::tempdir().expect("temp dir");
        let rec = Arc::new(MockRecognizer::ok(TRANSCRIPT));
        let cache = Arc::new(DirCache::new(dir.path()));
        let p = Phonemizer::new(rec.clone(), cache, Segmenter::default());

        let spk1 = PathBuf::from("HC_speakers/spk1/read.wav");
        let spk2 = PathBuf::from("HC_speakers/spk2/read.wav");
        let first = p.phonemize(&spk1).expect("spk1");
        let second = p.phonemize(&spk2).expect("spk2");

        assert_eq!(rec.calls(), 2);
        assert_eq!(first.files(), vec!["HC_speakers/spk1/read.wav"]);
        assert_eq!(second.files(), vec!["HC_speakers/spk2/read.wav"]);

        let report = p.phonemize_corpus(&[spk1, spk2]);
        assert_eq!(rec.calls(), 2);
        let rows = Analyzer::default().table_metrics(&report.table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file, "HC_speakers/spk1/read.wav");
        assert_eq!(rows[1].file, "HC_speakers/spk2/read.wav");
    }

    #[test]
    fn cache_hit_is_attributed_to_the_requested_file() {
        let cache = Arc::new(MemoryCache::new());
        let stored = SegmentTable::from_segments(
            "old/location/s1.wav",
            &[crate::phoneme::Segment::new("a", 0.0, 0.1)],
        );
        cache.put(&cache_key(Path::new("s1.wav")), &stored).unwrap();

        let p = phonemizer(Arc::new(MockRecognizer::ok(TRANSCRIPT)), cache);
        let table = p.phonemize(Path::new("s1.wav")).expect("cached");
        assert_eq!(table.files(), vec!["s1.wav"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn repeated_corpus_entries_are_processed_once() {
        let rec = Arc::new(MockRecognizer::ok(TRANSCRIPT));
        let p = phonemizer(rec.clone(), Arc::new(MemoryCache::new()));
        let files: Vec<PathBuf> = ["a.wav", "b.wav", "a.wav"].iter().map(PathBuf::from).collect();

        let report = p.phonemize_corpus(&files);
        assert_eq!(report.table.files(), vec!["a.wav", "b.wav"]);
        assert_eq!(report.table.len(), 6);
        assert_eq!(rec.calls(), 2);
    }

    #[test]
    fn table_metrics_one_row_per_file() {
        let mut table = SegmentTable::new();
        table.push_segments(
            "vcv.wav",
            &Segmenter::default().segment(&crate::phoneme::parse_raw_events(TRANSCRIPT)),
        );
        table.push_segments(
            "cons.wav",
            &[
                crate::phoneme::Segment::new("t", 0.0, 0.1),
                crate::phoneme::Segment::new("k", 0.1, 0.2),
            ],
        );

        let rows = Analyzer::default().table_metrics(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file, "vcv.wav");
        // a 0.05, t 0.05, i 0.09 (trailing onset + M)
        assert!((rows[0].pv - 100.0 * 0.14 / 0.19).abs() < 1e-9);
        // forward 0.05 + 0.05, minus trailing vowel 0.09
        assert!((rows[0].vtv - 0.01).abs() < 1e-9);
        assert_eq!(rows[1].file, "cons.wav");
        assert_eq!((rows[1].vtv, rows[1].pv), (0.0, 0.0));
    }

    #[test]
    fn process_runs_the_whole_chain() {
        let pipeline = Pipeline::new(
            phonemizer(
                Arc::new(MockRecognizer::ok(TRANSCRIPT)),
                Arc::new(MemoryCache::new()),
            ),
            Analyzer::new(Classifier::default(), RhythmEngine::new(VtvMode::OnsetInterval)),
        );
        let m = pipeline.process(Path::new("s.wav")).expect("process");
        assert!((m.vtv - 0.10).abs() < 1e-9);
        assert!(m.pv > 0.0 && m.pv <= 100.0);
    }

    #[test]
    fn from_config_wires_directory_cache() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = AppConfig::default();
        config.storage.cache_dir = Some(dir.path().to_path_buf());

        // pre-seed the cache so no recognizer process is needed
        let seeded = SegmentTable::from_segments(
            "s.wav",
            &[
                crate::phoneme::Segment::new("a", 0.0, 0.1),
                crate::phoneme::Segment::new("t", 0.1, 0.2),
                crate::phoneme::Segment::new("e", 0.2, 0.3),
            ],
        );
        DirCache::new(dir.path()).put("s", &seeded).unwrap();

        let pipeline = Pipeline::from_config(&config);
        let m = pipeline.process(Path::new("s.wav")).expect("cached");
        assert!((m.pv - 100.0 * 0.2 / 0.3).abs() < 1e-9);
    }
}
