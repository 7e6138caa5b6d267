use crate::models::TranscriptIndex;

use super::Bounds;

/// Extend the end through consecutive segments that repeat the quote
///
/// Chants, refrains and repeated punchlines often span several identical
/// segments while the proposal only covers the first one. Starting at the
/// segment containing `end`, the end is pushed forward through segments whose
/// text equals the quote and that follow within `max_gap` seconds. The walk
/// stops before any segment that would push the duration past `limit`.
pub fn extend_through_quote(
    transcript: &TranscriptIndex,
    bounds: Bounds,
    quote: &str,
    limit: f64,
    max_gap: f64,
) -> Option<Bounds> {
    let quote = quote.trim();
    if quote.is_empty() {
        return None;
    }

    let anchor = transcript.segment_index_containing(bounds.end)?;
    let segments = &transcript.segments;
    if segments[anchor].text.trim() != quote {
        return None;
    }

    let mut last = anchor;
    for next in anchor + 1..segments.len() {
        let segment = &segments[next];
        if segment.text.trim() != quote {
            break;
        }
        if segment.start - segments[last].end > max_gap {
            break;
        }
        if segment.end - bounds.start > limit {
            break;
        }
        last = next;
    }

    let end = segments[last].end.max(bounds.end);
    if end == bounds.end {
        return None;
    }
    Some(Bounds::new(bounds.start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TranscriptSegment;

    fn repeated() -> TranscriptIndex {
        TranscriptIndex::new(vec![
            TranscriptSegment::new(0.0, 1.0, "Hello"),
            TranscriptSegment::new(1.0, 2.0, "Hello"),
            TranscriptSegment::new(2.0, 3.0, "Hello"),
            TranscriptSegment::new(3.0, 4.0, "Done"),
        ])
    }

    #[test]
    fn test_extends_to_last_repeat() {
        let result = extend_through_quote(&repeated(), Bounds::new(0.0, 1.0), "Hello", 10.0, 0.6);
        assert_eq!(result, Some(Bounds::new(0.0, 3.0)));
    }

    #[test]
    fn test_capped_by_limit() {
        let result = extend_through_quote(&repeated(), Bounds::new(0.0, 1.0), "Hello", 2.5, 0.6);
        assert_eq!(result, Some(Bounds::new(0.0, 2.0)));
    }

    #[test]
    fn test_gap_breaks_the_run() {
        let transcript = TranscriptIndex::new(vec![
            TranscriptSegment::new(0.0, 1.0, "Go"),
            TranscriptSegment::new(2.0, 3.0, "Go"),
        ]);
        assert_eq!(
            extend_through_quote(&transcript, Bounds::new(0.0, 1.0), "Go", 10.0, 0.6),
            None
        );
    }

    #[test]
    fn test_non_matching_anchor_is_skipped() {
        assert_eq!(
            extend_through_quote(&repeated(), Bounds::new(2.5, 3.5), "Hello", 10.0, 0.6),
            None
        );
        assert_eq!(
            extend_through_quote(&repeated(), Bounds::new(0.0, 1.0), "", 10.0, 0.6),
            None
        );
    }
}
