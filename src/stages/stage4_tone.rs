use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Candidate, TranscriptIndex};

/// Configuration for Stage 4
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Target tone or theme; verification is skipped when unset
    pub tone: Option<String>,
    /// Maximum number of classifier calls in flight at once
    pub concurrency: usize,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            tone: None,
            concurrency: 4,
        }
    }
}

/// Classifier answer for one excerpt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneVerdict {
    /// `None` when the classifier gave no usable answer
    #[serde(rename = "match", default)]
    pub matches: Option<bool>,
}

/// Binary tone/theme classifier
#[async_trait]
pub trait ToneClassifier: Send + Sync {
    async fn classify(&self, text: &str, tone: &str) -> Result<ToneVerdict>;
}

/// Why a candidate was kept or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneOutcome {
    /// Too few words to judge
    TooShort,
    /// Classifier call failed
    ClassifierFailed,
    /// Classifier answered without a verdict
    NoVerdict,
    Matched,
    Rejected,
}

impl ToneOutcome {
    /// Only an explicit mismatch removes a candidate
    pub fn keep(self) -> bool {
        !matches!(self, ToneOutcome::Rejected)
    }
}

/// Result of Stage 4 verification
#[derive(Debug, Default)]
pub struct ToneResult {
    /// Kept candidates in their input order
    pub kept: Vec<Candidate>,
    pub rejected: usize,
    /// Classifier calls that errored and were let through
    pub failures: usize,
}

/// Verify one candidate against `tone`
pub async fn verify_candidate<C: ToneClassifier + ?Sized>(
    classifier: &C,
    transcript: &TranscriptIndex,
    candidate: &Candidate,
    tone: &str,
    min_words: usize,
) -> ToneOutcome {
    let text = transcript.text_between(candidate.start, candidate.end);
    let words = text.split_whitespace().count();
    if words < min_words {
        debug!(
            "[{:.2}, {:.2}]: {} words, skipping tone check",
            candidate.start, candidate.end, words
        );
        return ToneOutcome::TooShort;
    }

    match classifier.classify(&text, tone).await {
        Ok(ToneVerdict {
            matches: Some(true),
        }) => ToneOutcome::Matched,
        Ok(ToneVerdict {
            matches: Some(false),
        }) => ToneOutcome::Rejected,
        Ok(ToneVerdict { matches: None }) => ToneOutcome::NoVerdict,
        Err(e) => {
            warn!(
                "Tone check for [{:.2}, {:.2}] failed, keeping clip: {}",
                candidate.start, candidate.end, e
            );
            ToneOutcome::ClassifierFailed
        }
    }
}

/// Execute Stage 4: drop selected clips that explicitly miss the target tone
///
/// Every ambiguous outcome keeps the clip. Verdicts run with bounded
/// concurrency and the kept clips stay in input order. `tone_match` is set
/// on clips the classifier actually judged.
pub async fn execute_tone_verification<C: ToneClassifier + ?Sized>(
    classifier: &C,
    transcript: &TranscriptIndex,
    candidates: Vec<Candidate>,
    tone: &str,
    min_words: usize,
    concurrency: usize,
) -> ToneResult {
    info!(
        "Stage 4: Verifying {} clips against tone {:?}",
        candidates.len(),
        tone
    );

    let outcomes: Vec<ToneOutcome> = stream::iter(candidates.iter())
        .map(|c| verify_candidate(classifier, transcript, c, tone, min_words))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut result = ToneResult::default();
    for (mut candidate, outcome) in candidates.into_iter().zip(outcomes) {
        match outcome {
            ToneOutcome::Matched => candidate.tone_match = Some(true),
            ToneOutcome::Rejected => candidate.tone_match = Some(false),
            ToneOutcome::ClassifierFailed => result.failures += 1,
            ToneOutcome::TooShort | ToneOutcome::NoVerdict => {}
        }

        if outcome.keep() {
            result.kept.push(candidate);
        } else {
            debug!(
                "Rejected [{:.2}, {:.2}] for tone mismatch",
                candidate.start, candidate.end
            );
            result.rejected += 1;
        }
    }

    info!(
        "Stage 4: kept {} clips ({} rejected, {} classifier failures)",
        result.kept.len(),
        result.rejected,
        result.failures
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TranscriptSegment;

    /// Answers by the first word of the excerpt
    struct KeywordClassifier;

    #[async_trait]
    impl ToneClassifier for KeywordClassifier {
        async fn classify(&self, text: &str, _tone: &str) -> Result<ToneVerdict> {
            match text.split_whitespace().next() {
                Some("funny") => Ok(ToneVerdict {
                    matches: Some(true),
                }),
                Some("boring") => Ok(ToneVerdict {
                    matches: Some(false),
                }),
                Some("unsure") => Ok(ToneVerdict::default()),
                _ => anyhow::bail!("classifier unavailable"),
            }
        }
    }

    fn transcript() -> TranscriptIndex {
        TranscriptIndex::new(vec![
            TranscriptSegment::new(0.0, 10.0, "funny one two three four five"),
            TranscriptSegment::new(20.0, 30.0, "boring one two three four five"),
            TranscriptSegment::new(40.0, 50.0, "unsure one two three four five"),
            TranscriptSegment::new(60.0, 70.0, "broken one two three four five"),
            TranscriptSegment::new(80.0, 90.0, "boring but short"),
        ])
    }

    fn clips() -> Vec<Candidate> {
        [0.0, 20.0, 40.0, 60.0, 80.0]
            .iter()
            .map(|&s| Candidate::new(s, s + 10.0, 8.0))
            .collect()
    }

    #[tokio::test]
    async fn test_only_explicit_mismatch_rejects() {
        let result =
            execute_tone_verification(&KeywordClassifier, &transcript(), clips(), "comedy", 5, 2).await;

        let starts: Vec<f64> = result.kept.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0.0, 40.0, 60.0, 80.0]);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.failures, 1);

        assert_eq!(result.kept[0].tone_match, Some(true));
        assert_eq!(result.kept[1].tone_match, None);
        assert_eq!(result.kept[2].tone_match, None);
        assert_eq!(result.kept[3].tone_match, None);
    }

    #[tokio::test]
    async fn test_short_clip_skips_classifier() {
        let transcript = transcript();
        let clip = Candidate::new(80.0, 90.0, 8.0);

        let outcome = verify_candidate(&KeywordClassifier, &transcript, &clip, "comedy", 5).await;

        assert_eq!(outcome, ToneOutcome::TooShort);
        assert!(outcome.keep());
    }

    #[tokio::test]
    async fn test_classifier_error_fails_open() {
        let transcript = transcript();
        let clip = Candidate::new(60.0, 70.0, 8.0);

        let outcome = verify_candidate(&KeywordClassifier, &transcript, &clip, "comedy", 1).await;

        assert_eq!(outcome, ToneOutcome::ClassifierFailed);
        assert!(outcome.keep());
    }

    #[test]
    fn test_verdict_field_name() {
        let verdict: ToneVerdict = serde_json::from_str(r#"{"match": false}"#).unwrap();
        assert_eq!(verdict.matches, Some(false));

        let missing: ToneVerdict = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.matches, None);
    }
}
