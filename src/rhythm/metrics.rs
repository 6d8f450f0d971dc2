//! VtV / pV computation over one classified utterance.
//!
//! Pause segments never contribute: they are dropped before either metric is
//! computed.  Degenerate utterances (nothing left after filtering, or no
//! vowel at all) yield `(0.0, 0.0)`.
//!
//! # VtV in `Literal` mode
//!
//! The forward pass adds a segment's duration once if counting has started
//! and once more if the segment is a vowel.  Vowels strictly between the
//! first and last vowel are therefore counted twice.  This is kept for
//! numeric compatibility with previously published results;
//! [`VtvMode::OnsetInterval`] computes the plain mean onset-to-onset
//! distance instead.
//!
//! The literal value is reported as computed.  With a single vowel it is
//! always `<= 0` (no division takes place), and multi-vowel utterances
//! whose last vowel is long can go negative too.  Set
//! `clamp_negative_vtv` to report such values as 0.

use serde::{Deserialize, Serialize};

use crate::config::{RhythmConfig, VtvMode};
use crate::phoneme::{PhonemeSegment, Utterance};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Rhythm indices of one utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RhythmMetrics {
    /// Mean interval between consecutive vowel onsets, in seconds.
    pub vtv: f64,
    /// Percentage of speech time occupied by vowels, in `[0, 100]`.
    pub pv: f64,
}

impl RhythmMetrics {
    pub const ZERO: Self = Self { vtv: 0.0, pv: 0.0 };
}

/// [`RhythmMetrics`] tagged with the file they were computed for.  One row
/// of the `file,vtv,pv` result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceMetrics {
    pub file: String,
    pub vtv: f64,
    pub pv: f64,
}

impl UtteranceMetrics {
    pub fn new(file: impl Into<String>, metrics: RhythmMetrics) -> Self {
        Self {
            file: file.into(),
            vtv: metrics.vtv,
            pv: metrics.pv,
        }
    }

    pub fn metrics(&self) -> RhythmMetrics {
        RhythmMetrics {
            vtv: self.vtv,
            pv: self.pv,
        }
    }
}

// ---------------------------------------------------------------------------
// RhythmEngine
// ---------------------------------------------------------------------------

/// Computes [`RhythmMetrics`] for utterances.  Stateless apart from the
/// chosen [`VtvMode`] and clamping flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct RhythmEngine {
    mode: VtvMode,
    clamp_negative: bool,
}

impl RhythmEngine {
    pub fn new(mode: VtvMode) -> Self {
        Self {
            mode,
            clamp_negative: false,
        }
    }

    pub fn from_config(config: &RhythmConfig) -> Self {
        Self::new(config.vtv_mode).clamp_negative(config.clamp_negative_vtv)
    }

    /// Report negative VtV values as 0.
    pub fn clamp_negative(mut self, clamp: bool) -> Self {
        self.clamp_negative = clamp;
        self
    }

    pub fn mode(&self) -> VtvMode {
        self.mode
    }

    pub fn compute(&self, utterance: &Utterance) -> RhythmMetrics {
        let speech: Vec<&PhonemeSegment> = utterance
            .segments()
            .iter()
            .filter(|s| s.class.is_speech())
            .collect();

        let vowel_count = speech.iter().filter(|s| s.is_vowel()).count();
        if vowel_count == 0 {
            return RhythmMetrics::ZERO;
        }

        let vtv = match self.mode {
            VtvMode::Literal => literal_vtv(&speech, vowel_count),
            VtvMode::OnsetInterval => onset_interval_vtv(&speech, vowel_count),
        };

        RhythmMetrics {
            vtv: if self.clamp_negative { vtv.max(0.0) } else { vtv },
            pv: percent_vocalic(&speech),
        }
    }
}

/// Two-pass VtV.  `speech` is non-empty and holds at least one vowel.
fn literal_vtv(speech: &[&PhonemeSegment], vowel_count: usize) -> f64 {
    let mut started = false;
    let mut acc = 0.0;
    for seg in &speech[..speech.len() - 1] {
        if started {
            acc += seg.duration;
        }
        if seg.is_vowel() {
            acc += seg.duration;
            started = true;
        }
    }

    // last vowel through the end, inclusive
    let mut rem = 0.0;
    for seg in speech.iter().rev() {
        rem += seg.duration;
        if seg.is_vowel() {
            break;
        }
    }

    let mut vtv = acc - rem;
    if vowel_count > 1 {
        vtv /= (vowel_count - 1) as f64;
    }
    vtv
}

fn onset_interval_vtv(speech: &[&PhonemeSegment], vowel_count: usize) -> f64 {
    if vowel_count < 2 {
        return 0.0;
    }
    let mut onsets = speech.iter().filter(|s| s.is_vowel()).map(|s| s.start);
    let first = onsets.next().unwrap_or(0.0);
    let last = onsets.last().unwrap_or(first);
    (last - first) / (vowel_count - 1) as f64
}

fn percent_vocalic(speech: &[&PhonemeSegment]) -> f64 {
    let total: f64 = speech.iter().map(|s| s.duration).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let vocalic: f64 = speech
        .iter()
        .filter(|s| s.is_vowel())
        .map(|s| s.duration)
        .sum();
    (100.0 * vocalic / total).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
