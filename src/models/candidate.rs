use serde::{Deserialize, Serialize};

/// Separator used when concatenating reasons and quotes of merged candidates
pub const TEXT_SEPARATOR: &str = " | ";

/// A validated moment proposal from the proposal source
///
/// Produced once at the boundary from loosely-shaped model output; see
/// `llm::validation::parse_proposals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProposal {
    pub start: f64,
    pub end: f64,
    /// Quality rating in [0, 10]
    pub rating: f64,
    pub reason: String,
    pub quote: String,
}

/// A clip candidate moving through merge, refinement and selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Quality rating in [0, 10]
    pub rating: f64,
    /// Why this moment was proposed
    #[serde(default)]
    pub reason: String,
    /// Representative quote from the moment
    #[serde(default)]
    pub quote: String,
    /// Number of original proposals folded into this rating
    #[serde(default = "default_count")]
    pub count: u32,
    /// Tone verdict, unset until verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_match: Option<bool>,
}

fn default_count() -> u32 {
    1
}

impl From<RawProposal> for Candidate {
    fn from(raw: RawProposal) -> Self {
        Self {
            start: raw.start,
            end: raw.end,
            rating: raw.rating,
            reason: raw.reason,
            quote: raw.quote,
            count: 1,
            tone_match: None,
        }
    }
}

impl Candidate {
    pub fn new(start: f64, end: f64, rating: f64) -> Self {
        Self {
            start,
            end,
            rating,
            reason: String::new(),
            quote: String::new(),
            count: 1,
            tone_match: None,
        }
    }

    pub fn with_text(mut self, reason: impl Into<String>, quote: impl Into<String>) -> Self {
        self.reason = reason.into();
        self.quote = quote.into();
        self
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Duration of the span covering both candidates
    pub fn merged_span(&self, other: &Candidate) -> f64 {
        self.end.max(other.end) - self.start.min(other.start)
    }

    /// Gap in seconds from the end of `self` to the start of `other` (negative when overlapping)
    pub fn gap_to(&self, other: &Candidate) -> f64 {
        other.start - self.end
    }

    /// Overlap test with a required minimum gap between clips
    pub fn overlaps(&self, other: &Candidate, min_gap: f64) -> bool {
        !(self.end + min_gap <= other.start || other.end + min_gap <= self.start)
    }

    /// Adjacency merge: covering span, best rating, concatenated text
    pub fn merged_keep_best(&self, other: &Candidate) -> Candidate {
        Candidate {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            rating: self.rating.max(other.rating),
            reason: join_text(&self.reason, &other.reason),
            quote: join_text(&self.quote, &other.quote),
            count: self.count + other.count,
            tone_match: merge_tone(self.tone_match, other.tone_match),
        }
    }

    /// Chain merge: covering span, count-weighted rating, concatenated text
    pub fn merged_weighted(&self, other: &Candidate) -> Candidate {
        let total = self.count + other.count;
        let rating = (self.rating * self.count as f64 + other.rating * other.count as f64)
            / total as f64;
        Candidate {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            rating,
            reason: join_text(&self.reason, &other.reason),
            quote: join_text(&self.quote, &other.quote),
            count: total,
            tone_match: merge_tone(self.tone_match, other.tone_match),
        }
    }

    /// Fold a suppressed candidate's rating into this survivor
    ///
    /// The suppressed rating enters with weight one, the survivor keeps its
    /// accumulated weight. Bounds and text are the survivor's.
    pub fn folded_with(&self, suppressed: &Candidate) -> Candidate {
        let count = self.count + 1;
        Candidate {
            rating: (self.rating * self.count as f64 + suppressed.rating) / count as f64,
            count,
            ..self.clone()
        }
    }

    /// Whether the tone verdict explicitly rejected this candidate
    pub fn tone_penalty(&self) -> u8 {
        u8::from(self.tone_match == Some(false))
    }
}

/// Join two text fragments, skipping empty ones
pub fn join_text(a: &str, b: &str) -> String {
    match (a.trim().is_empty(), b.trim().is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{}{}{}", a, TEXT_SEPARATOR, b),
    }
}

fn merge_tone(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), _) | (_, Some(true)) => Some(true),
        _ => None,
    }
}

/// Export shape of a selected clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedCandidate {
    pub start: f64,
    pub end: f64,
    /// Rating rounded to one decimal
    pub rating: f64,
    pub reason: String,
    pub quote: String,
}

impl From<&Candidate> for ExportedCandidate {
    fn from(c: &Candidate) -> Self {
        Self {
            start: c.start,
            end: c.end,
            rating: round_one_decimal(c.rating),
            reason: c.reason.clone(),
            quote: c.quote.clone(),
        }
    }
}

impl From<ExportedCandidate> for Candidate {
    fn from(e: ExportedCandidate) -> Self {
        Candidate {
            start: e.start,
            end: e.end,
            rating: e.rating,
            reason: e.reason,
            quote: e.quote,
            count: 1,
            tone_match: None,
        }
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
