use std::cmp::Ordering;

use tracing::{debug, info};

use crate::config::ClipConstraints;
use crate::models::Candidate;
use crate::snap::Refiner;
use crate::stages::coalesce_snapped;

/// Weight of the duration score in the duration prior
const DURATION_PRIOR_BASE: f64 = 0.65;
const DURATION_PRIOR_WEIGHT: f64 = 0.35;
/// Numerator of the short-clip length bonus
const LENGTH_BONUS: f64 = 0.1;
/// Rating spreads below this count as zero variance
const MIN_SPREAD: f64 = 1e-12;

/// Result of Stage 3 selection
#[derive(Debug, Default)]
pub struct SelectionResult {
    /// Selected clips ordered by start
    pub selected: Vec<Candidate>,
    /// Overlapping candidates folded into a selected clip
    pub folded: usize,
    /// Candidates that snapped onto an already refined clip
    pub coalesced: usize,
    /// Candidates removed by the rating, degeneracy or duration filters
    pub dropped: usize,
}

/// How well `duration` fits the sweet spot
///
/// 1.0 inside `[sweet_spot_min, sweet_spot_max]`. Outside it the score is
/// `1 / (1 + miss²)`, where `miss` is the distance to the nearest edge
/// relative to that edge, so it falls toward zero without reaching it.
pub fn duration_score(duration: f64, constraints: &ClipConstraints) -> f64 {
    let low = constraints.sweet_spot_min_seconds;
    let high = constraints.sweet_spot_max_seconds;

    let miss = if duration < low {
        (low - duration) / low
    } else if duration > high {
        (duration - high) / high
    } else {
        return 1.0;
    };
    1.0 / (1.0 + miss * miss)
}

/// Ranking key for the greedy walk; smaller sorts first
///
/// Explicit tone mismatches rank after everything else, then higher scores
/// win, then shorter clips, then earlier ones.
#[derive(Debug, Clone, Copy)]
pub struct SelectionKey {
    pub tone_penalty: u8,
    pub score: f64,
    pub duration: f64,
    pub start: f64,
    pub end: f64,
}

impl SelectionKey {
    pub fn new(candidate: &Candidate, score: f64) -> Self {
        Self {
            tone_penalty: candidate.tone_penalty(),
            score,
            duration: candidate.duration(),
            start: candidate.start,
            end: candidate.end,
        }
    }
}

impl Ord for SelectionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tone_penalty
            .cmp(&other.tone_penalty)
            .then_with(|| other.score.total_cmp(&self.score))
            .then_with(|| self.duration.total_cmp(&other.duration))
            .then_with(|| self.start.total_cmp(&other.start))
            .then_with(|| self.end.total_cmp(&other.end))
    }
}

impl PartialOrd for SelectionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SelectionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SelectionKey {}

/// Running state of the greedy walk
#[derive(Debug, Default)]
struct Selection {
    /// Picks in rank order
    picks: Vec<Candidate>,
    folded: usize,
}

impl Selection {
    /// Take the next candidate in rank order
    ///
    /// A candidate clashing with an existing pick is folded into the
    /// best-ranked pick it clashes with; otherwise it becomes a pick.
    fn absorb(mut self, candidate: Candidate, min_gap: f64) -> Self {
        match self.picks.iter().position(|p| p.overlaps(&candidate, min_gap)) {
            Some(idx) => {
                self.picks[idx] = self.picks[idx].folded_with(&candidate);
                self.folded += 1;
            }
            None => self.picks.push(candidate),
        }
        self
    }
}

/// Execute Stage 3: refine, filter, score and select non-overlapping clips
///
/// 1. Drop candidates rated below `default_min_rating`
/// 2. Refine each survivor with headroom up to `max_duration_seconds`
/// 3. Drop degenerate or out-of-bounds results
/// 4. Score by rating z-score, duration prior and length bonus
/// 5. Walk in [`SelectionKey`] order, folding overlapping candidates
///
/// With `enforce_non_overlap` off only steps 1-3 run.
pub fn select(candidates: Vec<Candidate>, refiner: &Refiner<'_>, constraints: &ClipConstraints) -> SelectionResult {
    let input = candidates.len();

    let mut refined: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.rating >= constraints.default_min_rating)
        .filter_map(|c| refine_candidate(c, refiner, constraints))
        .collect();
    let dropped = input - refined.len();

    if !constraints.enforce_non_overlap {
        refined.sort_by(|a, b| a.start.total_cmp(&b.start));
        info!(
            "Stage 3: non-overlap disabled, returning {} refined candidates ({} dropped)",
            refined.len(),
            dropped
        );
        return SelectionResult {
            selected: refined,
            dropped,
            ..Default::default()
        };
    }

    let before_coalesce = refined.len();
    let refined = coalesce_snapped(refined, refiner.config().coalesce_epsilon_seconds);
    let coalesced = before_coalesce - refined.len();

    let scores = score_candidates(&refined, constraints);
    let mut ranked: Vec<(SelectionKey, Candidate)> = refined
        .into_iter()
        .zip(scores)
        .map(|(c, score)| (SelectionKey::new(&c, score), c))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0));

    let selection = ranked
        .into_iter()
        .fold(Selection::default(), |acc, (_, c)| acc.absorb(c, constraints.min_gap));

    let mut selected = selection.picks;
    selected.sort_by(|a, b| a.start.total_cmp(&b.start));

    info!(
        "Stage 3: selected {} clips ({} folded, {} coalesced, {} dropped)",
        selected.len(),
        selection.folded,
        coalesced,
        dropped
    );

    SelectionResult {
        selected,
        folded: selection.folded,
        coalesced,
        dropped,
    }
}

fn refine_candidate(
    candidate: Candidate,
    refiner: &Refiner<'_>,
    constraints: &ClipConstraints,
) -> Option<Candidate> {
    let headroom = constraints.max_duration_seconds - candidate.duration();
    let (start, end) = refiner.refine(candidate.start, candidate.end, &candidate.quote, headroom);

    if end <= start || !constraints.duration_in_bounds(end - start) {
        debug!(
            "Dropping [{:.2}, {:.2}]: refined to {:.2}s",
            candidate.start,
            candidate.end,
            end - start
        );
        return None;
    }

    Some(Candidate {
        start,
        end,
        ..candidate
    })
}

/// `z(rating) * duration_prior + length_bonus` for each candidate
fn score_candidates(candidates: &[Candidate], constraints: &ClipConstraints) -> Vec<f64> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let n = candidates.len() as f64;
    let mean = candidates.iter().map(|c| c.rating).sum::<f64>() / n;
    let variance = candidates
        .iter()
        .map(|c| (c.rating - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = match variance.sqrt() {
        s if s < MIN_SPREAD => 1.0,
        s => s,
    };

    candidates
        .iter()
        .map(|c| {
            let duration = c.duration();
            let z = (c.rating - mean) / std;
            let prior =
                DURATION_PRIOR_BASE + DURATION_PRIOR_WEIGHT * duration_score(duration, constraints);
            let bonus = if duration >= constraints.min_duration_seconds {
                LENGTH_BONUS / duration
            } else {
                0.0
            };
            z * prior + bonus
        })
        .collect()
}
