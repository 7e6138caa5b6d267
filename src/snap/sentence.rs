use crate::models::{SideChannels, TranscriptIndex};

use super::Bounds;

/// Snap to segment edges and carry the end through a continuing sentence
///
/// The end moves to the end of its containing segment and then keeps going
/// while the next segment follows within `max_gap` seconds and opens with a
/// lower-case letter. The start moves back to the start of its containing
/// segment. Boundaries that fall between segments, or inside a silence,
/// stay where they are.
pub fn snap_to_sentence(
    transcript: &TranscriptIndex,
    sides: &SideChannels,
    bounds: Bounds,
    max_gap: f64,
) -> Option<Bounds> {
    let segments = &transcript.segments;
    let end_index = match sides.silence_containing(bounds.end) {
        Some(_) => None,
        None => transcript.segment_index_containing(bounds.end),
    };

    let end = match end_index {
        Some(mut idx) => {
            while idx + 1 < segments.len() {
                let current = &segments[idx];
                let next = &segments[idx + 1];
                if next.start - current.end > max_gap || !next.starts_lowercase() {
                    break;
                }
                idx += 1;
            }
            segments[idx].end
        }
        None => bounds.end,
    };

    let start = match sides.silence_containing(bounds.start) {
        Some(_) => bounds.start,
        None => transcript
            .segment_for_start(bounds.start)
            .map(|s| s.start)
            .unwrap_or(bounds.start),
    };

    let snapped = Bounds::new(start, end);
    (snapped != bounds).then_some(snapped)
}
