pub mod dialog;
pub mod quote;
pub mod sentence;
pub mod silence;
pub mod words;

pub use dialog::*;
pub use quote::*;
pub use sentence::*;
pub use silence::*;
pub use words::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{SideChannels, TranscriptIndex};

/// Tolerance when comparing a proposed duration against the budget
const BUDGET_EPSILON: f64 = 1e-9;

/// Configuration for the boundary snap cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Largest pause between segments that still counts as the same sentence
    pub sentence_gap_seconds: f64,
    /// Padding kept before speech resumes after a silence
    pub silence_lead_in_seconds: f64,
    /// Padding kept after speech stops before a silence
    pub silence_tail_seconds: f64,
    /// Shortest interval the refiner will ever return
    pub min_clip_floor_seconds: f64,
    /// Boundaries closer than this are considered identical after snapping
    pub coalesce_epsilon_seconds: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            sentence_gap_seconds: 0.6,
            silence_lead_in_seconds: 0.25,
            silence_tail_seconds: 0.45,
            min_clip_floor_seconds: 0.3,
            coalesce_epsilon_seconds: 1e-3,
        }
    }
}

/// Clip bounds in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub start: f64,
    pub end: f64,
}

impl Bounds {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Steps of the snap cascade, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapStep {
    QuoteExtension,
    Dialog,
    Sentence,
    Word,
    Silence,
}

/// Pulls loosely-timed proposals onto natural speech boundaries
///
/// The cascade runs quote extension, dialog, sentence, word and silence
/// snapping in that order. Every step proposes new bounds from the bounds as
/// they currently stand and is kept only when the result is non-degenerate
/// and no longer than the original duration plus the headroom.
pub struct Refiner<'a> {
    transcript: &'a TranscriptIndex,
    sides: &'a SideChannels,
    config: &'a SnapConfig,
}

impl<'a> Refiner<'a> {
    pub fn new(transcript: &'a TranscriptIndex, sides: &'a SideChannels, config: &'a SnapConfig) -> Self {
        Self {
            transcript,
            sides,
            config,
        }
    }

    pub fn config(&self) -> &SnapConfig {
        self.config
    }

    /// Refine `(start, end)` without growing past `headroom` extra seconds
    pub fn refine(&self, start: f64, end: f64, quote: &str, headroom: f64) -> (f64, f64) {
        let original = Bounds::new(start, end);
        let limit = original.duration() + headroom.max(0.0);
        let mut bounds = original;

        let steps = [
            SnapStep::QuoteExtension,
            SnapStep::Dialog,
            SnapStep::Sentence,
            SnapStep::Word,
            SnapStep::Silence,
        ];

        for step in steps {
            let proposed = match step {
                SnapStep::QuoteExtension => extend_through_quote(
                    self.transcript,
                    bounds,
                    quote,
                    limit,
                    self.config.sentence_gap_seconds,
                ),
                SnapStep::Dialog => snap_to_dialog(self.sides, bounds),
                SnapStep::Sentence => snap_to_sentence(
                    self.transcript,
                    self.sides,
                    bounds,
                    self.config.sentence_gap_seconds,
                ),
                SnapStep::Word => snap_to_words(self.sides, bounds),
                SnapStep::Silence => snap_to_silence(
                    self.sides,
                    bounds,
                    self.config.silence_lead_in_seconds,
                    self.config.silence_tail_seconds,
                ),
            };

            let Some(proposed) = proposed else {
                continue;
            };

            if within_budget(proposed, limit) {
                if proposed != bounds {
                    debug!(
                        "{:?}: [{:.3}, {:.3}] -> [{:.3}, {:.3}]",
                        step, bounds.start, bounds.end, proposed.start, proposed.end
                    );
                }
                bounds = proposed;
            } else {
                debug!(
                    "{:?} rejected: [{:.3}, {:.3}] exceeds {:.3}s budget",
                    step, proposed.start, proposed.end, limit
                );
            }
        }

        if bounds.duration() < self.config.min_clip_floor_seconds {
            bounds.end = bounds.start + self.config.min_clip_floor_seconds;
        }

        (bounds.start, bounds.end)
    }
}

fn within_budget(bounds: Bounds, limit: f64) -> bool {
    bounds.end > bounds.start && bounds.duration() <= limit + BUDGET_EPSILON
}
