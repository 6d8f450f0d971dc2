//! Phoneme data model: raw recognizer events, segments and utterances.
//!
//! The types move through the pipeline in one direction:
//!
//! ```text
//! RawEvent ──Segmenter──▶ Segment ──Classifier──▶ PhonemeSegment ──▶ Utterance
//! ```
//!
//! A [`Segment`] is consumed by the classifier to produce a
//! [`PhonemeSegment`], so the class of a segment is assigned exactly once.

use serde::Serialize;

// ---------------------------------------------------------------------------
// RawEvent
// ---------------------------------------------------------------------------

/// One timestamped symbol as emitted by the external phoneme recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Onset of the symbol in seconds from the start of the recording.
    pub onset_time: f64,
    /// Frame duration reported by the recognizer, in seconds.
    pub frame_duration: f64,
    /// Phonetic symbol (IPA).
    pub symbol: String,
}

impl RawEvent {
    pub fn new(onset_time: f64, frame_duration: f64, symbol: impl Into<String>) -> Self {
        Self {
            onset_time,
            frame_duration,
            symbol: symbol.into(),
        }
    }

    /// Parse one recognizer output line of the form `onset duration symbol`.
    ///
    /// Returns `None` for any line that does not split into exactly three
    /// whitespace-separated fields, whose numbers do not parse, or whose
    /// timing is out of range (negative onset, non-positive frame duration).
    ///
    /// ```
    /// use vowel_rhythm::phoneme::RawEvent;
    ///
    /// let ev = RawEvent::parse_line("1.500 0.045 ʂ").unwrap();
    /// assert_eq!(ev.symbol, "ʂ");
    /// assert!(RawEvent::parse_line("1.500 ʂ").is_none());
    /// ```
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let (onset, dur, symbol) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let onset_time: f64 = onset.parse().ok()?;
        let frame_duration: f64 = dur.parse().ok()?;
        if !onset_time.is_finite() || onset_time < 0.0 {
            return None;
        }
        if !frame_duration.is_finite() || frame_duration <= 0.0 {
            return None;
        }

        Some(Self::new(onset_time, frame_duration, symbol))
    }
}

/// Parse a block of recognizer output, silently dropping malformed lines.
pub fn parse_raw_events(text: &str) -> Vec<RawEvent> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let parsed = RawEvent::parse_line(line);
            if parsed.is_none() {
                log::debug!("skipping malformed recognizer line: {line:?}");
            }
            parsed
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PhonemeClass
// ---------------------------------------------------------------------------

/// Coarse phonetic class of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PhonemeClass {
    Vowel,
    Consonant,
    Pause,
}

impl PhonemeClass {
    /// Single-letter label used in annotated tables (`V`, `C`, `X`).
    pub fn label(&self) -> &'static str {
        match self {
            PhonemeClass::Vowel => "V",
            PhonemeClass::Consonant => "C",
            PhonemeClass::Pause => "X",
        }
    }

    /// Inverse of [`label`](Self::label).  Any label other than `V` or `C`
    /// marks non-speech and maps to [`PhonemeClass::Pause`].
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "V" => PhonemeClass::Vowel,
            "C" => PhonemeClass::Consonant,
            _ => PhonemeClass::Pause,
        }
    }

    /// Whether segments of this class take part in rhythm computation.
    pub fn is_speech(&self) -> bool {
        matches!(self, PhonemeClass::Vowel | PhonemeClass::Consonant)
    }
}

// ---------------------------------------------------------------------------
// Segment / PhonemeSegment
// ---------------------------------------------------------------------------

/// A contiguous time span attributed to one symbol, not yet classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub symbol: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (`end >= start`).
    pub end: f64,
    /// Duration in seconds.  Normally `end - start`; tables may carry their
    /// own rounded value.
    pub duration: f64,
}

impl Segment {
    pub fn new(symbol: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            duration: end - start,
        }
    }
}

/// A [`Segment`] tagged with its [`PhonemeClass`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhonemeSegment {
    pub symbol: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub class: PhonemeClass,
}

impl PhonemeSegment {
    pub fn from_segment(segment: Segment, class: PhonemeClass) -> Self {
        Self {
            symbol: segment.symbol,
            start: segment.start,
            end: segment.end,
            duration: segment.duration,
            class,
        }
    }

    pub fn is_vowel(&self) -> bool {
        self.class == PhonemeClass::Vowel
    }
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// Ordered, classified segments for one recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Utterance {
    segments: Vec<PhonemeSegment>,
}

impl Utterance {
    pub fn new(segments: Vec<PhonemeSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PhonemeSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of all segment durations, pauses included.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// `true` when every segment ends where the next one starts, within
    /// `tolerance` seconds.
    pub fn is_contiguous(&self, tolerance: f64) -> bool {
        self.segments
            .windows(2)
            .all(|w| (w[0].end - w[1].start).abs() <= tolerance)
    }
}

impl From<Vec<PhonemeSegment>> for Utterance {
    fn from(segments: Vec<PhonemeSegment>) -> Self {
        Self::new(segments)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_accepts_three_fields() {
        let ev = RawEvent::parse_line("  1.560 0.045 e ").expect("valid line");
        assert_eq!(ev.onset_time, 1.56);
        assert_eq!(ev.frame_duration, 0.045);
        assert_eq!(ev.symbol, "e");
    }

    #[test]
    fn parse_line_rejects_wrong_field_count() {
        assert!(RawEvent::parse_line("").is_none());
        assert!(RawEvent::parse_line("1.0 0.045").is_none());
        assert!(RawEvent::parse_line("1.0 0.045 a b").is_none());
    }

    #[test]
    fn parse_line_rejects_bad_numbers() {
        assert!(RawEvent::parse_line("abc 0.045 a").is_none());
        assert!(RawEvent::parse_line("1.0 xyz a").is_none());
        assert!(RawEvent::parse_line("-1.0 0.045 a").is_none());
        assert!(RawEvent::parse_line("1.0 0 a").is_none());
        assert!(RawEvent::parse_line("NaN 0.045 a").is_none());
    }

    #[test]
    fn parse_raw_events_skips_malformed_lines() {
        let text = "1.500 0.045 ʂ\nbroken line\n1.560 0.045 e\n\n1.680 0.045 b\n";
        let events = parse_raw_events(text);
        let symbols: Vec<&str> = events.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ʂ", "e", "b"]);
    }

    #[test]
    fn class_labels_round_trip() {
        for class in [PhonemeClass::Vowel, PhonemeClass::Consonant, PhonemeClass::Pause] {
            assert_eq!(PhonemeClass::from_label(class.label()), class);
        }
        assert_eq!(PhonemeClass::from_label("P"), PhonemeClass::Pause);
    }

    #[test]
    fn utterance_contiguity() {
        let segs = vec![
            PhonemeSegment::from_segment(Segment::new("a", 0.0, 0.1), PhonemeClass::Vowel),
            PhonemeSegment::from_segment(Segment::new("t", 0.1, 0.2), PhonemeClass::Consonant),
        ];
        let utt = Utterance::new(segs);
        assert!(utt.is_contiguous(1e-9));
        assert!((utt.total_duration() - 0.2).abs() < 1e-12);

        let gap = Utterance::new(vec![
            PhonemeSegment::from_segment(Segment::new("a", 0.0, 0.1), PhonemeClass::Vowel),
            PhonemeSegment::from_segment(Segment::new("t", 0.3, 0.4), PhonemeClass::Consonant),
        ]);
        assert!(!gap.is_contiguous(1e-3));
    }
}
