use serde::{Deserialize, Serialize};

/// A plain time interval in seconds (silence or dialog span)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A single timed word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    #[serde(alias = "word")]
    pub text: String,
}

impl Word {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Upstream structural signals the refiner snaps onto
///
/// Every list is sorted by start time. Empty lists simply disable the
/// corresponding snap step.
#[derive(Debug, Clone, Default)]
pub struct SideChannels {
    /// Detected silences
    pub silences: Vec<Interval>,
    /// Dialog turns or exchanges that should not be cut mid-way
    pub dialog: Vec<Interval>,
    /// Word-level timestamps
    pub words: Vec<Word>,
}

impl SideChannels {
    pub fn new(mut silences: Vec<Interval>, mut dialog: Vec<Interval>, mut words: Vec<Word>) -> Self {
        silences.retain(|i| i.start < i.end);
        dialog.retain(|i| i.start < i.end);
        words.retain(|w| w.start <= w.end);
        silences.sort_by(|a, b| a.start.total_cmp(&b.start));
        dialog.sort_by(|a, b| a.start.total_cmp(&b.start));
        words.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            silences,
            dialog,
            words,
        }
    }

    /// Dialog interval containing `t`, if any
    pub fn dialog_containing(&self, t: f64) -> Option<&Interval> {
        self.dialog.iter().find(|d| d.contains(t))
    }

    /// Words overlapping the open interval `(start, end)`
    pub fn words_overlapping(&self, start: f64, end: f64) -> impl Iterator<Item = &Word> {
        self.words
            .iter()
            .filter(move |w| w.end > start && w.start < end)
    }

    /// Silence covering `t`, edges included
    pub fn silence_containing(&self, t: f64) -> Option<&Interval> {
        self.silences.iter().find(|s| s.contains(t))
    }

    /// Last silence beginning at or before `t`
    pub fn silence_before(&self, t: f64) -> Option<&Interval> {
        self.silences.iter().rev().find(|s| s.start <= t)
    }

    /// First silence ending at or after `t`
    pub fn silence_after(&self, t: f64) -> Option<&Interval> {
        self.silences.iter().find(|s| s.end >= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_channel_lookups() {
        let sides = SideChannels::new(
            vec![Interval::new(10.0, 11.0), Interval::new(0.0, 1.0), Interval::new(20.0, 21.0)],
            vec![Interval::new(5.0, 9.0)],
            vec![Word::new(1.0, 1.4, "hi"), Word::new(1.5, 2.0, "there")],
        );

        assert_eq!(sides.silences[0], Interval::new(0.0, 1.0));
        assert_eq!(sides.silence_before(15.0), Some(&Interval::new(10.0, 11.0)));
        assert_eq!(sides.silence_after(15.0), Some(&Interval::new(20.0, 21.0)));
        assert_eq!(sides.silence_after(10.5), Some(&Interval::new(10.0, 11.0)));
        assert_eq!(sides.silence_containing(11.0), Some(&Interval::new(10.0, 11.0)));
        assert!(sides.silence_containing(11.5).is_none());
        assert!(sides.dialog_containing(6.0).is_some());
        assert!(sides.dialog_containing(9.5).is_none());
        assert_eq!(sides.words_overlapping(1.45, 3.0).count(), 1);
    }

    #[test]
    fn test_word_accepts_word_alias() {
        let word: Word = serde_json::from_str(r#"{"start": 0.1, "end": 0.4, "word": "yes"}"#).unwrap();
        assert_eq!(word.text, "yes");
    }
}
