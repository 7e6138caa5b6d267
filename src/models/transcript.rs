use serde::{Deserialize, Serialize};

/// A single time-coded line of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Spoken text for this segment
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration of this segment in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check whether `t` falls inside this segment (inclusive on both ends)
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Check whether this segment overlaps the open interval `(start, end)`
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.end > start && self.start < end
    }

    /// Whether the text opens with a lower-case letter (a continued sentence)
    pub fn starts_lowercase(&self) -> bool {
        self.text
            .trim_start()
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(|c| c.is_lowercase())
    }
}

/// Ordered transcript segments with time lookups used by every snap policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptIndex {
    /// Segments ordered by start time
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptIndex {
    /// Build an index, dropping empty or inverted segments and sorting by start
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        let mut segments: Vec<TranscriptSegment> = segments
            .into_iter()
            .filter(|s| !s.text.trim().is_empty() && s.start < s.end)
            .collect();
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment with `start <= t <= end`
    pub fn segment_containing(&self, t: f64) -> Option<&TranscriptSegment> {
        self.segments.iter().find(|s| s.contains(t))
    }

    /// Index of the first segment with `start <= t <= end`
    pub fn segment_index_containing(&self, t: f64) -> Option<usize> {
        self.segments.iter().position(|s| s.contains(t))
    }

    /// First segment with `start <= t < end`
    ///
    /// Used for clip starts: a start sitting exactly on a segment boundary
    /// belongs to the segment that begins there.
    pub fn segment_for_start(&self, t: f64) -> Option<&TranscriptSegment> {
        self.segments.iter().find(|s| s.start <= t && t < s.end)
    }

    /// Earliest start and latest end covered by the transcript
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.segments.first()?;
        let end = self
            .segments
            .iter()
            .map(|s| s.end)
            .fold(first.end, f64::max);
        Some((first.start, end))
    }

    /// Total covered duration in seconds
    pub fn duration(&self) -> f64 {
        self.time_range().map(|(s, e)| e - s).unwrap_or(0.0)
    }

    /// Text of every segment overlapping `(start, end)`, space-joined
    pub fn text_between(&self, start: f64, end: f64) -> String {
        self.segments
            .iter()
            .filter(|s| s.overlaps(start, end))
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Total number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.text.split_whitespace().count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> TranscriptIndex {
        TranscriptIndex::new(vec![
            TranscriptSegment::new(2.0, 4.0, "second line"),
            TranscriptSegment::new(0.0, 2.0, "First line"),
            TranscriptSegment::new(4.5, 6.0, "   "),
            TranscriptSegment::new(6.0, 8.0, "Third line"),
        ])
    }

    #[test]
    fn test_new_sorts_and_drops_empty() {
        let index = index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.segments[0].text, "First line");
        assert_eq!(index.time_range(), Some((0.0, 8.0)));
    }

    #[test]
    fn test_segment_containing_prefers_first_match() {
        let index = index();
        // 2.0 is the boundary of two segments; the earlier one wins
        assert_eq!(index.segment_containing(2.0).unwrap().text, "First line");
        assert_eq!(index.segment_containing(3.0).unwrap().text, "second line");
        assert!(index.segment_containing(5.0).is_none());
        assert_eq!(index.segment_index_containing(7.0), Some(2));
    }

    #[test]
    fn test_segment_for_start_is_half_open() {
        let index = index();
        assert_eq!(index.segment_for_start(2.0).unwrap().text, "second line");
        assert_eq!(index.segment_for_start(0.0).unwrap().text, "First line");
        assert!(index.segment_for_start(8.0).is_none());
    }

    #[test]
    fn test_text_between() {
        let index = index();
        assert_eq!(index.text_between(1.0, 3.0), "First line second line");
        assert_eq!(index.text_between(8.0, 9.0), "");
    }

    #[test]
    fn test_starts_lowercase() {
        assert!(TranscriptSegment::new(0.0, 1.0, " and then").starts_lowercase());
        assert!(!TranscriptSegment::new(0.0, 1.0, "And then").starts_lowercase());
        assert!(TranscriptSegment::new(0.0, 1.0, "\"so it goes").starts_lowercase());
    }
}
