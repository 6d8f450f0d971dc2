//! Vowel table and segment classifier.
//!
//! [`Classifier`] is a purely lexical oracle: every symbol maps to exactly
//! one [`PhonemeClass`].  The table is fixed at construction and never
//! mutated, so a classifier can be shared by reference across threads.

use std::collections::HashSet;

use crate::config::ClassifierConfig;

use super::segment::{PhonemeClass, PhonemeSegment, Segment, Utterance};

/// Reserved symbol marking silence / non-speech.
pub const DEFAULT_PAUSE_SYMBOL: &str = "X";

/// IPA vowel symbols, long vowels and diphthongs recognised as vowels.
///
/// `uː` appears twice; membership is what matters.
pub static DEFAULT_VOWELS: &[&str] = &[
    "e", "i", "a", "o", "u", "ɪ", "ɛ", "ɔ", "ʊ", "ʌ", "ɑ", "æ", "uː", "y", "ø", "œ", "ɶ", "ɒ",
    "ɜ", "ɐ", "ɪə", "eə", "ʊə", "aɪ", "aʊ", "ɔɪ", "a:ʊ", "ɔː", "ɪː", "eː", "uː", "oː", "aː",
    "ɒː", "ɜː", "ɐː", "iː", "eɪ", "oʊ", "aʊə", "aʊəː",
];

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Tags symbols as vowel, consonant or pause.
///
/// ```
/// use vowel_rhythm::phoneme::{Classifier, PhonemeClass};
///
/// let c = Classifier::default();
/// assert_eq!(c.classify("aʊ"), PhonemeClass::Vowel);
/// assert_eq!(c.classify("t"), PhonemeClass::Consonant);
/// assert_eq!(c.classify("X"), PhonemeClass::Pause);
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    vowels: HashSet<String>,
    pause_symbol: String,
}

impl Classifier {
    pub fn new<I, S>(vowels: I, pause_symbol: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vowels: vowels.into_iter().map(Into::into).collect(),
            pause_symbol: pause_symbol.into(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.vowels.iter().cloned(), config.pause_symbol.clone())
    }

    pub fn pause_symbol(&self) -> &str {
        &self.pause_symbol
    }

    /// Number of distinct vowel symbols in the table.
    pub fn vowel_count(&self) -> usize {
        self.vowels.len()
    }

    pub fn classify(&self, symbol: &str) -> PhonemeClass {
        if symbol == self.pause_symbol {
            PhonemeClass::Pause
        } else if self.vowels.contains(symbol) {
            PhonemeClass::Vowel
        } else {
            PhonemeClass::Consonant
        }
    }

    /// Consume a segment and attach its class.
    pub fn annotate(&self, segment: Segment) -> PhonemeSegment {
        let class = self.classify(&segment.symbol);
        PhonemeSegment::from_segment(segment, class)
    }

    /// Classify a whole segment sequence into an [`Utterance`].
    pub fn annotate_all(&self, segments: impl IntoIterator<Item = Segment>) -> Utterance {
        segments
            .into_iter()
            .map(|s| self.annotate(s))
            .collect::<Vec<_>>()
            .into()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_VOWELS.iter().copied(), DEFAULT_PAUSE_SYMBOL)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_forty_distinct_vowels() {
        assert_eq!(DEFAULT_VOWELS.len(), 41);
        assert_eq!(Classifier::default().vowel_count(), 40);
    }

    #[test]
    fn long_vowels_and_diphthongs_are_vowels() {
        let c = Classifier::default();
        for sym in ["iː", "aʊəː", "a:ʊ", "ɔɪ", "eə"] {
            assert_eq!(c.classify(sym), PhonemeClass::Vowel, "{sym}");
        }
    }

    #[test]
    fn unknown_symbols_are_consonants() {
        let c = Classifier::default();
        for sym in ["t", "ʂ", "b", "", "x", "A"] {
            assert_eq!(c.classify(sym), PhonemeClass::Consonant, "{sym:?}");
        }
    }

    #[test]
    fn pause_takes_precedence_over_vowel_table() {
        let c = Classifier::new(["a", "e"], "a");
        assert_eq!(c.classify("a"), PhonemeClass::Pause);
        assert_eq!(c.classify("e"), PhonemeClass::Vowel);
    }

    #[test]
    fn custom_configurations_coexist() {
        let ita = Classifier::default();
        let custom = Classifier::new(["ə"], "sil");
        assert_eq!(ita.classify("ə"), PhonemeClass::Consonant);
        assert_eq!(custom.classify("ə"), PhonemeClass::Vowel);
        assert_eq!(custom.classify("X"), PhonemeClass::Consonant);
        assert_eq!(custom.classify("sil"), PhonemeClass::Pause);
    }

    #[test]
    fn from_config_uses_defaults() {
        let c = Classifier::from_config(&ClassifierConfig::default());
        assert_eq!(c.pause_symbol(), DEFAULT_PAUSE_SYMBOL);
        assert_eq!(c.classify("oʊ"), PhonemeClass::Vowel);
    }

    #[test]
    fn annotate_all_preserves_order() {
        let c = Classifier::default();
        let utt = c.annotate_all(vec![
            Segment::new("a", 0.0, 0.05),
            Segment::new("t", 0.05, 0.1),
            Segment::new("X", 0.1, 0.3),
        ]);
        let classes: Vec<PhonemeClass> = utt.segments().iter().map(|s| s.class).collect();
        assert_eq!(
            classes,
            vec![PhonemeClass::Vowel, PhonemeClass::Consonant, PhonemeClass::Pause]
        );
    }
}
