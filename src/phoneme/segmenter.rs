//! Raw recognizer events → contiguous phoneme segments.
//!
//! Every event is bounded by the onset of the next one.  When a span grows
//! beyond `outlier_factor × mean_duration` it is treated as a spurious gap
//! (trailing silence attributed to the last phoneme, a recognizer dropout)
//! and split into a phoneme part of `mean_duration` followed by a pause
//! covering the remainder.
//!
//! ```text
//!  onset_i                        onset_i+1
//!    │◀──────────── span ───────────▶│
//!    │  symbol  │        PAUSE       │      (span > k·M)
//!    │◀── M ──▶│
//! ```

use crate::config::{SegmenterConfig, TrailingEnd};

use super::segment::{RawEvent, Segment};

/// Converts ordered [`RawEvent`]s into [`Segment`]s.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
    pause_symbol: String,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig, pause_symbol: impl Into<String>) -> Self {
        Self {
            config,
            pause_symbol: pause_symbol.into(),
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Spans strictly longer than this are split.
    pub fn outlier_threshold(&self) -> f64 {
        self.config.outlier_factor * self.config.mean_duration
    }

    /// Segment one utterance.  Empty input yields an empty output.
    pub fn segment(&self, events: &[RawEvent]) -> Vec<Segment> {
        let mean = self.config.mean_duration;
        let threshold = self.outlier_threshold();
        let mut out = Vec::with_capacity(events.len() + 1);

        for (i, ev) in events.iter().enumerate() {
            let start = ev.onset_time;
            let end = match events.get(i + 1) {
                Some(next) => next.onset_time,
                None => self.trailing_end(ev),
            };

            let end = if end < start {
                log::warn!(
                    "event {i} ({:?}) starts at {start} after its successor at {end}; clamping",
                    ev.symbol
                );
                start
            } else {
                end
            };

            let span = end - start;
            let split = start + mean;
            // a span shorter than M is never split, whatever outlier_factor is
            if span > threshold && split < end {
                out.push(Segment {
                    symbol: ev.symbol.clone(),
                    start,
                    end: split,
                    duration: mean,
                });
                out.push(Segment {
                    symbol: self.pause_symbol.clone(),
                    start: split,
                    end,
                    duration: end - split,
                });
            } else {
                out.push(Segment {
                    symbol: ev.symbol.clone(),
                    start,
                    end,
                    duration: span,
                });
            }
        }

        out
    }

    fn trailing_end(&self, last: &RawEvent) -> f64 {
        match self.config.trailing_end {
            TrailingEnd::MeanDuration => last.onset_time + self.config.mean_duration,
            TrailingEnd::FrameDuration => last.onset_time + last.frame_duration,
            TrailingEnd::FramePlusMean => {
                last.onset_time + last.frame_duration + self.config.mean_duration
            }
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(
            SegmenterConfig::default(),
            super::vowels::DEFAULT_PAUSE_SYMBOL,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
