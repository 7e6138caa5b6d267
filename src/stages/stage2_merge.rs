use tracing::info;

use crate::config::ClipConstraints;
use crate::models::{Candidate, RawProposal};

/// Result of Stage 2 merging
#[derive(Debug)]
pub struct MergeResult {
    /// Candidates ready for selection, ordered by start
    pub candidates: Vec<Candidate>,
    /// Number of pairwise adjacency merges performed
    pub adjacency_merges: usize,
    /// Number of candidates absorbed into sweet-spot chains
    pub chain_merges: usize,
}

/// Execute Stage 2: adjacency merge followed by sweet-spot chaining
///
/// Every window has been collected before this runs; merging needs the
/// global picture across window boundaries.
pub fn execute_merge(proposals: Vec<RawProposal>, constraints: &ClipConstraints) -> MergeResult {
    let candidates: Vec<Candidate> = proposals.into_iter().map(Candidate::from).collect();
    let input = candidates.len();

    let adjacent = merge_adjacent(candidates, constraints);
    let adjacency_merges = input - adjacent.len();

    let after_adjacency = adjacent.len();
    let chained = chain_into_sweet_spot(adjacent, constraints);
    let chain_merges = after_adjacency - chained.len();

    info!(
        "Stage 2: {} proposals -> {} candidates ({} adjacency merges, {} chained)",
        input,
        chained.len(),
        adjacency_merges,
        chain_merges
    );

    MergeResult {
        candidates: chained,
        adjacency_merges,
        chain_merges,
    }
}

/// Merge candidates that overlap or sit within `merge_gap_seconds` of each other
///
/// A merge only happens when the combined span stays within the maximum
/// clip duration. The merged candidate keeps the better rating.
pub fn merge_adjacent(candidates: Vec<Candidate>, constraints: &ClipConstraints) -> Vec<Candidate> {
    merge_sorted(candidates, |current, next| {
        let close = current.gap_to(next) <= constraints.merge_gap_seconds;
        let fits = current.merged_span(next) <= constraints.max_duration_seconds;
        (close && fits).then(|| current.merged_keep_best(next))
    })
}

/// Greedily chain consecutive candidates while the combined span lands in the sweet spot
///
/// Unlike the adjacency merge this ignores the gap between candidates and
/// steers toward the preferred clip length instead. The combined span never
/// exceeds the maximum clip duration. Ratings are averaged
/// weighted by how many proposals each side already represents.
pub fn chain_into_sweet_spot(candidates: Vec<Candidate>, constraints: &ClipConstraints) -> Vec<Candidate> {
    merge_sorted(candidates, |current, next| {
        let span = current.merged_span(next);
        let in_band = span >= constraints.sweet_spot_min_seconds
            && span <= constraints.sweet_spot_max_seconds
            && span <= constraints.max_duration_seconds;
        in_band.then(|| current.merged_weighted(next))
    })
}

/// Drop candidates that snapped onto the same bounds as an earlier one
///
/// Two proposals that independently refine onto the same sentence would
/// otherwise compete with each other during selection. The earliest
/// candidate (by start, then input order) is kept unchanged.
pub fn coalesce_snapped(mut candidates: Vec<Candidate>, epsilon: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let duplicate = kept.iter().any(|k| {
            (k.start - candidate.start).abs() <= epsilon && (k.end - candidate.end).abs() <= epsilon
        });
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

/// Sort by start and fold each candidate into the running one while `merge` accepts it
fn merge_sorted<F>(mut candidates: Vec<Candidate>, merge: F) -> Vec<Candidate>
where
    F: Fn(&Candidate, &Candidate) -> Option<Candidate>,
{
    candidates.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

    let mut merged = Vec::with_capacity(candidates.len());
    let mut iter = candidates.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        match merge(&current, &next) {
            Some(combined) => current = combined,
            None => {
                merged.push(current);
                current = next;
            }
        }
    }
    merged.push(current);

    merged
}
