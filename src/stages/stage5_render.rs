use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ClipResult;
use crate::io::{write_candidates_json, ClipReport, RunMetadata};
use crate::models::Candidate;

/// Result of Stage 5 rendering
#[derive(Debug, Default)]
pub struct RenderResult {
    /// Path to the JSON clip list (if written)
    pub clips_path: Option<PathBuf>,
    /// Path to the human-readable report (if written)
    pub report_path: Option<PathBuf>,
}

/// Execute Stage 5: write the selected clips
///
/// Produces two views:
/// 1. Clip list: JSON array of `{start, end, rating, reason, quote}`
/// 2. Report: run summary followed by one block per clip
pub fn execute_render(
    candidates: &[Candidate],
    metadata: &RunMetadata,
    clips_output: Option<&Path>,
    report_output: Option<&Path>,
) -> ClipResult<RenderResult> {
    let mut result = RenderResult::default();

    if let Some(path) = clips_output {
        info!("Writing {} clips to {:?}", candidates.len(), path);
        write_candidates_json(path, candidates)?;
        result.clips_path = Some(path.to_path_buf());
    }

    if let Some(path) = report_output {
        info!("Writing clip report to {:?}", path);
        ClipReport::new(candidates, metadata).write_file(path)?;
        result.report_path = Some(path.to_path_buf());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::import_candidates;

    #[test]
    fn test_render_writes_both_views() {
        let dir = tempfile::tempdir().unwrap();
        let clips_path = dir.path().join("clips.json");
        let report_path = dir.path().join("clips.txt");
        let clips = vec![Candidate::new(12.0, 40.5, 8.66).with_text("setup and payoff", "No way.")];

        let result = execute_render(
            &clips,
            &RunMetadata::new(),
            Some(&clips_path),
            Some(&report_path),
        )
        .unwrap();

        assert_eq!(result.clips_path.as_deref(), Some(clips_path.as_path()));
        assert_eq!(result.report_path.as_deref(), Some(report_path.as_path()));

        let imported = import_candidates(&clips_path).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].rating, 8.7);

        let report = std::fs::read_to_string(&report_path).unwrap();
        assert!(report.contains("No way."));
    }

    #[test]
    fn test_render_without_outputs_writes_nothing() {
        let result = execute_render(&[], &RunMetadata::new(), None, None).unwrap();
        assert!(result.clips_path.is_none());
        assert!(result.report_path.is_none());
    }
}
