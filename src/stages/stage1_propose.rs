use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClipConstraints;
use crate::llm::parse_proposals;
use crate::models::{RawProposal, TranscriptIndex, Window, WindowSet};
use crate::stages::format_segments;

/// Configuration for Stage 1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
    /// Maximum number of windows in flight at once
    pub concurrency: usize,
    /// Per-window time limit in seconds
    pub timeout_seconds: f64,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_seconds: 120.0,
        }
    }
}

/// Everything the proposal source needs to judge one window
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    pub window_id: String,
    pub window_start: f64,
    pub window_end: f64,
    /// Owned window lines, `[start -> end] text`
    pub window_text: String,
    /// Read-only padding before the window
    pub context_before: String,
    /// Read-only padding after the window
    pub context_after: String,
    /// Target tone or theme, if any
    pub tone: Option<String>,
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
    pub sweet_spot_min_seconds: f64,
    pub sweet_spot_max_seconds: f64,
    pub min_rating: f64,
}

impl ProposalRequest {
    pub fn for_window(
        transcript: &TranscriptIndex,
        window: &Window,
        constraints: &ClipConstraints,
        tone: Option<&str>,
    ) -> Self {
        Self {
            window_id: window.window_id.clone(),
            window_start: window.start,
            window_end: window.end,
            window_text: format_segments(transcript, &window.segment_indices),
            context_before: format_segments(transcript, &window.context_prefix_indices),
            context_after: format_segments(transcript, &window.context_suffix_indices),
            tone: tone.map(str::to_string),
            min_duration_seconds: constraints.min_duration_seconds,
            max_duration_seconds: constraints.max_duration_seconds,
            sweet_spot_min_seconds: constraints.sweet_spot_min_seconds,
            sweet_spot_max_seconds: constraints.sweet_spot_max_seconds,
            min_rating: constraints.default_min_rating,
        }
    }
}

/// Source of raw moment proposals for a window
///
/// Implementations return the raw JSON they received; validation into
/// [`RawProposal`] happens in this stage.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    async fn propose(&self, request: &ProposalRequest) -> Result<serde_json::Value>;
}

/// Result of Stage 1 processing
#[derive(Debug, Default)]
pub struct ProposalResult {
    /// Validated proposals from every window that answered
    pub proposals: Vec<RawProposal>,
    /// Windows that returned a usable answer
    pub windows_processed: usize,
    /// Windows that errored or timed out
    pub windows_failed: usize,
    /// Windows never issued because the job was cancelled
    pub windows_cancelled: usize,
    /// Proposal entries dropped during validation
    pub proposals_dropped: usize,
}

/// Execute Stage 1: collect proposals from every window
///
/// Windows are independent, so up to `concurrency` of them run at once and
/// answers are gathered in completion order. A failed or timed-out window
/// contributes nothing. Cancelling `cancel` stops issuing new windows; what
/// has been collected so far is returned as the complete result.
pub async fn execute_proposals<S: ProposalSource + ?Sized>(
    source: &S,
    transcript: &TranscriptIndex,
    windows: &WindowSet,
    constraints: &ClipConstraints,
    tone: Option<&str>,
    config: &ProposalConfig,
    cancel: &CancellationToken,
) -> ProposalResult {
    let time_range = transcript.time_range().unwrap_or((0.0, 0.0));
    let timeout = Duration::try_from_secs_f64(config.timeout_seconds.max(0.0)).unwrap_or(Duration::MAX);
    let requests: Vec<ProposalRequest> = windows
        .iter()
        .map(|w| ProposalRequest::for_window(transcript, w, constraints, tone))
        .collect();

    info!(
        "Stage 1: Requesting proposals for {} windows ({} at a time)",
        requests.len(),
        config.concurrency.max(1)
    );

    let outcomes = stream::iter(requests.iter())
        .map(|request| async move {
            let outcome = tokio::time::timeout(timeout, source.propose(request)).await;
            (request.window_id.as_str(), outcome)
        })
        .buffer_unordered(config.concurrency.max(1));
    let mut outcomes = std::pin::pin!(outcomes);

    let mut result = ProposalResult::default();
    let mut finished = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Stage 1: cancelled, keeping proposals from {} windows", result.windows_processed);
                break;
            }
            next = outcomes.next() => next,
        };
        let Some((window_id, outcome)) = next else {
            break;
        };
        finished += 1;

        match outcome {
            Ok(Ok(value)) => {
                let parsed = parse_proposals(&value, time_range, constraints.default_min_rating);
                debug!(
                    "Window {}: {} proposals, {} dropped",
                    window_id,
                    parsed.proposals.len(),
                    parsed.dropped
                );
                result.windows_processed += 1;
                result.proposals_dropped += parsed.dropped;
                result.proposals.extend(parsed.proposals);
            }
            Ok(Err(e)) => {
                warn!("Window {} failed: {}", window_id, e);
                result.windows_failed += 1;
            }
            Err(_) => {
                warn!("Window {} timed out after {:?}", window_id, timeout);
                result.windows_failed += 1;
            }
        }
    }

    result.windows_cancelled = requests.len() - finished;

    info!(
        "Stage 1: {} proposals from {} windows ({} failed, {} cancelled, {} dropped)",
        result.proposals.len(),
        result.windows_processed,
        result.windows_failed,
        result.windows_cancelled,
        result.proposals_dropped
    );

    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::models::{TranscriptSegment, WindowConfig};
    use crate::stages::build_windows;

    /// Answers by window id; unknown ids fail, `"slow"` answers hang
    struct ScriptedSource {
        answers: HashMap<String, serde_json::Value>,
    }

    #[async_trait]
    impl ProposalSource for ScriptedSource {
        async fn propose(&self, request: &ProposalRequest) -> Result<serde_json::Value> {
            match self.answers.get(&request.window_id) {
                Some(value) if value == "slow" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(json!([]))
                }
                Some(value) => Ok(value.clone()),
                None => anyhow::bail!("upstream error"),
            }
        }
    }

    fn transcript() -> TranscriptIndex {
        TranscriptIndex::new(
            (0..30)
                .map(|i| {
                    let t = i as f64 * 10.0;
                    TranscriptSegment::new(t, t + 9.0, format!("Line {}", i))
                })
                .collect(),
        )
    }

    fn windows(transcript: &TranscriptIndex) -> WindowSet {
        build_windows(
            transcript,
            &WindowConfig {
                window_size_seconds: 100.0,
                overlap_seconds: 0.0,
                context_pct: 0.1,
            },
        )
    }

    fn config() -> ProposalConfig {
        ProposalConfig {
            concurrency: 2,
            timeout_seconds: 0.2,
        }
    }

    #[tokio::test]
    async fn test_failed_and_slow_windows_are_isolated() {
        let transcript = transcript();
        let windows = windows(&transcript);
        assert_eq!(windows.total_windows(), 3);

        let source = ScriptedSource {
            answers: HashMap::from([
                (
                    "w_0".to_string(),
                    json!({"moments": [
                        {"start": 10.0, "end": 40.0, "rating": 8.0, "reason": "r", "quote": "q"},
                        {"start": 10.0, "end": 40.0, "rating": 2.0, "reason": "weak", "quote": ""}
                    ]}),
                ),
                ("w_1".to_string(), json!("slow")),
            ]),
        };

        let result = execute_proposals(
            &source,
            &transcript,
            &windows,
            &ClipConstraints::default(),
            None,
            &config(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.proposals.len(), 1);
        assert_eq!(result.proposals[0].rating, 8.0);
        assert_eq!(result.windows_processed, 1);
        assert_eq!(result.windows_failed, 2);
        assert_eq!(result.windows_cancelled, 0);
        assert_eq!(result.proposals_dropped, 1);
    }

    #[tokio::test]
    async fn test_cancelled_job_issues_nothing() {
        let transcript = transcript();
        let windows = windows(&transcript);
        let source = ScriptedSource {
            answers: HashMap::new(),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = execute_proposals(
            &source,
            &transcript,
            &windows,
            &ClipConstraints::default(),
            None,
            &config(),
            &cancel,
        )
        .await;

        assert!(result.proposals.is_empty());
        assert_eq!(result.windows_processed, 0);
        assert_eq!(result.windows_failed, 0);
        assert_eq!(result.windows_cancelled, 3);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_keeps_finished_windows() {
        let transcript = transcript();
        let windows = windows(&transcript);
        let source = ScriptedSource {
            answers: HashMap::from([
                (
                    "w_0".to_string(),
                    json!([{"start": 10.0, "end": 40.0, "rating": 8.0, "reason": "r", "quote": "q"}]),
                ),
                ("w_1".to_string(), json!("slow")),
                ("w_2".to_string(), json!("slow")),
            ]),
        };
        let config = ProposalConfig {
            concurrency: 2,
            timeout_seconds: 60.0,
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = execute_proposals(
            &source,
            &transcript,
            &windows,
            &ClipConstraints::default(),
            None,
            &config,
            &cancel,
        )
        .await;

        assert_eq!(result.windows_processed, 1);
        assert_eq!(result.proposals.len(), 1);
        assert_eq!(result.proposals[0].start, 10.0);
        assert_eq!(result.windows_failed, 0);
        assert_eq!(result.windows_cancelled, 2);
    }

    #[tokio::test]
    async fn test_huge_timeout_does_not_overflow() {
        let transcript = transcript();
        let windows = windows(&transcript);
        let source = ScriptedSource {
            answers: HashMap::from([(
                "w_0".to_string(),
                json!([{"start": 10.0, "end": 40.0, "rating": 8.0, "reason": "r", "quote": ""}]),
            )]),
        };
        let config = ProposalConfig {
            concurrency: 2,
            timeout_seconds: 1e20,
        };

        let result = execute_proposals(
            &source,
            &transcript,
            &windows,
            &ClipConstraints::default(),
            None,
            &config,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.windows_processed, 1);
        assert_eq!(result.windows_failed, 2);
    }

    #[test]
    fn test_request_carries_context_and_tone() {
        let transcript = transcript();
        let windows = windows(&transcript);

        let request = ProposalRequest::for_window(
            &transcript,
            &windows.windows[1],
            &ClipConstraints::default(),
            Some("humor"),
        );

        assert_eq!(request.window_id, "w_1");
        assert!(request.window_text.starts_with("[100.00 -> 109.00] Line 10"));
        assert_eq!(request.context_before, "[90.00 -> 99.00] Line 9");
        assert_eq!(request.context_after, "[200.00 -> 209.00] Line 20");
        assert_eq!(request.tone.as_deref(), Some("humor"));
    }
}
