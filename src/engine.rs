use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::ClipResult;
use crate::io::RunMetadata;
use crate::models::{Candidate, RawProposal, SideChannels, TranscriptIndex, WindowSet};
use crate::snap::Refiner;
use crate::stages::{
    build_windows, execute_merge, execute_proposals, execute_tone_verification, select,
    MergeResult, ProposalResult, ProposalSource, SelectionResult, ToneClassifier, ToneResult,
};

/// Selected clips plus the counters gathered along the way
#[derive(Debug)]
pub struct EngineOutput {
    pub candidates: Vec<Candidate>,
    pub metadata: RunMetadata,
}

/// The full clip pipeline over one transcript
///
/// Holds the immutable configuration and inputs; every stage borrows them.
pub struct ClipEngine {
    config: EngineConfig,
    transcript: TranscriptIndex,
    sides: SideChannels,
}

impl ClipEngine {
    pub fn new(config: EngineConfig, transcript: TranscriptIndex, sides: SideChannels) -> ClipResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transcript,
            sides,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transcript(&self) -> &TranscriptIndex {
        &self.transcript
    }

    /// Stage 0: proposal windows for this transcript
    pub fn windows(&self) -> WindowSet {
        build_windows(&self.transcript, &self.config.window)
    }

    /// Stage 1: gather proposals from every window
    pub async fn propose<S: ProposalSource + ?Sized>(
        &self,
        source: &S,
        windows: &WindowSet,
        cancel: &CancellationToken,
    ) -> ProposalResult {
        execute_proposals(
            source,
            &self.transcript,
            windows,
            &self.config.constraints,
            self.config.tone.tone.as_deref(),
            &self.config.proposals,
            cancel,
        )
        .await
    }

    /// Stage 2: adjacency merge and sweet-spot chaining
    pub fn merge(&self, proposals: Vec<RawProposal>) -> MergeResult {
        execute_merge(proposals, &self.config.constraints)
    }

    /// Stage 3: refine and select non-overlapping clips
    pub fn select(&self, candidates: Vec<Candidate>) -> SelectionResult {
        let refiner = Refiner::new(&self.transcript, &self.sides, &self.config.snap);
        select(candidates, &refiner, &self.config.constraints)
    }

    /// Stage 4: tone verification, or a pass-through when no tone is set
    pub async fn verify<C: ToneClassifier + ?Sized>(
        &self,
        classifier: Option<&C>,
        candidates: Vec<Candidate>,
    ) -> ToneResult {
        match (classifier, self.config.tone.tone.as_deref()) {
            (Some(classifier), Some(tone)) => {
                execute_tone_verification(
                    classifier,
                    &self.transcript,
                    candidates,
                    tone,
                    self.config.constraints.default_min_words,
                    self.config.tone.concurrency,
                )
                .await
            }
            _ => {
                info!("Stage 4: no tone configured, skipping verification");
                ToneResult {
                    kept: candidates,
                    ..Default::default()
                }
            }
        }
    }

    /// Run every stage against a live proposal source
    ///
    /// Cancelling `cancel` stops window calls; the proposals gathered so far
    /// still go through merge, selection and verification.
    pub async fn run<S, C>(
        &self,
        source: &S,
        classifier: Option<&C>,
        cancel: &CancellationToken,
    ) -> EngineOutput
    where
        S: ProposalSource + ?Sized,
        C: ToneClassifier + ?Sized,
    {
        let windows = self.windows();
        info!(
            "Stage 0: {} windows over {:.1}s",
            windows.total_windows(),
            self.transcript.duration()
        );

        let proposals = self.propose(source, &windows, cancel).await;
        let mut metadata = RunMetadata::new();
        metadata.windows_processed = proposals.windows_processed;
        metadata.windows_failed = proposals.windows_failed;

        let candidates = self
            .finish(proposals.proposals, classifier, &mut metadata)
            .await;
        EngineOutput {
            candidates,
            metadata,
        }
    }

    /// Run merge, selection and verification on proposals gathered elsewhere
    pub async fn run_offline<C: ToneClassifier + ?Sized>(
        &self,
        proposals: Vec<RawProposal>,
        classifier: Option<&C>,
    ) -> EngineOutput {
        let mut metadata = RunMetadata::new();
        let candidates = self.finish(proposals, classifier, &mut metadata).await;
        EngineOutput {
            candidates,
            metadata,
        }
    }

    async fn finish<C: ToneClassifier + ?Sized>(
        &self,
        proposals: Vec<RawProposal>,
        classifier: Option<&C>,
        metadata: &mut RunMetadata,
    ) -> Vec<Candidate> {
        metadata.proposals_received = proposals.len();

        let merged = self.merge(proposals);
        metadata.candidates_after_merge = merged.candidates.len();

        let selection = self.select(merged.candidates);
        metadata.candidates_folded = selection.folded;

        let verified = self.verify(classifier, selection.selected).await;
        metadata.tone_rejected = verified.rejected;
        metadata.candidates_selected = verified.kept.len();

        verified.kept
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::config::ClipConstraints;
    use crate::models::{TranscriptSegment, WindowConfig};
    use crate::stages::{ProposalRequest, ToneConfig, ToneVerdict};

    /// Proposes the same moments for every window
    struct FixedSource(serde_json::Value);

    #[async_trait]
    impl ProposalSource for FixedSource {
        async fn propose(&self, _request: &ProposalRequest) -> Result<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    /// Rejects any excerpt that mentions cooking
    struct NoCooking;

    #[async_trait]
    impl ToneClassifier for NoCooking {
        async fn classify(&self, text: &str, _tone: &str) -> Result<ToneVerdict> {
            Ok(ToneVerdict {
                matches: Some(!text.contains("cooking")),
            })
        }
    }

    fn transcript() -> TranscriptIndex {
        TranscriptIndex::new(
            (0..40)
                .map(|i| {
                    let t = i as f64 * 5.0;
                    let topic = if (20..30).contains(&i) { "cooking" } else { "football" };
                    TranscriptSegment::new(t, t + 5.0, format!("We talk about {} here.", topic))
                })
                .collect(),
        )
    }

    fn config(tone: Option<&str>) -> EngineConfig {
        EngineConfig {
            constraints: ClipConstraints {
                default_min_words: 5,
                ..Default::default()
            },
            window: WindowConfig {
                window_size_seconds: 100.0,
                overlap_seconds: 20.0,
                context_pct: 0.1,
            },
            tone: ToneConfig {
                tone: tone.map(str::to_string),
                concurrency: 2,
            },
            ..Default::default()
        }
    }

    fn moments() -> serde_json::Value {
        json!([
            {"start": 10.0, "end": 40.0, "rating": 9.0, "reason": "kickoff", "quote": ""},
            {"start": 100.0, "end": 130.0, "rating": 8.0, "reason": "recipe", "quote": ""}
        ])
    }

    #[tokio::test]
    async fn test_run_merges_duplicate_window_answers() {
        let engine = ClipEngine::new(config(None), transcript(), SideChannels::default()).unwrap();
        let source = FixedSource(moments());

        let output = engine
            .run::<_, NoCooking>(&source, None, &CancellationToken::new())
            .await;

        assert_eq!(output.metadata.windows_processed, 3);
        assert_eq!(output.metadata.proposals_received, 6);
        let bounds: Vec<(f64, f64)> = output.candidates.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(bounds, vec![(10.0, 40.0), (100.0, 130.0)]);
    }

    #[tokio::test]
    async fn test_run_offline_applies_tone() {
        let engine =
            ClipEngine::new(config(Some("sports talk")), transcript(), SideChannels::default()).unwrap();
        let proposals = vec![
            RawProposal {
                start: 10.0,
                end: 40.0,
                rating: 9.0,
                reason: "kickoff".to_string(),
                quote: String::new(),
            },
            RawProposal {
                start: 100.0,
                end: 130.0,
                rating: 8.0,
                reason: "recipe".to_string(),
                quote: String::new(),
            },
        ];

        let output = engine.run_offline(proposals, Some(&NoCooking)).await;

        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].reason, "kickoff");
        assert_eq!(output.candidates[0].tone_match, Some(true));
        assert_eq!(output.metadata.tone_rejected, 1);
        assert_eq!(output.metadata.candidates_selected, 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = config(None);
        config.constraints.min_duration_seconds = 100.0;

        assert!(ClipEngine::new(config, transcript(), SideChannels::default()).is_err());
    }
}
