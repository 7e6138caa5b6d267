use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{ClipError, ClipResult};
use crate::models::{Candidate, ExportedCandidate};

/// Convert final candidates to the export shape (rating rounded to one decimal)
pub fn export_candidates(candidates: &[Candidate]) -> Vec<ExportedCandidate> {
    candidates.iter().map(ExportedCandidate::from).collect()
}

/// Serialize final candidates as a flat JSON array
pub fn export_candidates_json(candidates: &[Candidate]) -> ClipResult<String> {
    serde_json::to_string_pretty(&export_candidates(candidates)).map_err(|source| ClipError::Json {
        context: "candidate export".to_string(),
        source,
    })
}

/// Write final candidates to a JSON file
pub fn write_candidates_json(path: &Path, candidates: &[Candidate]) -> ClipResult<()> {
    let file = std::fs::File::create(path).map_err(|source| ClipError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, &export_candidates(candidates)).map_err(|source| {
        ClipError::Json {
            context: path.display().to_string(),
            source,
        }
    })
}

/// Counters describing one engine run
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub windows_processed: usize,
    pub windows_failed: usize,
    pub proposals_received: usize,
    pub candidates_after_merge: usize,
    pub candidates_selected: usize,
    pub candidates_folded: usize,
    pub tone_rejected: usize,
}

impl RunMetadata {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            windows_processed: 0,
            windows_failed: 0,
            proposals_received: 0,
            candidates_after_merge: 0,
            candidates_selected: 0,
            candidates_folded: 0,
            tone_rejected: 0,
        }
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable clip listing
pub struct ClipReport<'a> {
    candidates: &'a [Candidate],
    metadata: &'a RunMetadata,
}

impl<'a> ClipReport<'a> {
    pub fn new(candidates: &'a [Candidate], metadata: &'a RunMetadata) -> Self {
        Self {
            candidates,
            metadata,
        }
    }

    /// Format the report as plain text
    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Run {}\n", self.metadata.run_id));
        output.push_str(&format!(
            "Generated {}\n",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "Windows: {} processed, {} failed | proposals: {} | merged: {} | selected: {} ({} folded) | tone rejected: {}\n\n",
            self.metadata.windows_processed,
            self.metadata.windows_failed,
            self.metadata.proposals_received,
            self.metadata.candidates_after_merge,
            self.metadata.candidates_selected,
            self.metadata.candidates_folded,
            self.metadata.tone_rejected
        ));

        for (i, clip) in self.candidates.iter().enumerate() {
            output.push_str(&format!(
                "#{} [{} - {}] {:.1}s rating {:.1}",
                i + 1,
                format_timestamp(clip.start),
                format_timestamp(clip.end),
                clip.duration(),
                clip.rating
            ));
            if clip.count > 1 {
                output.push_str(&format!(" (from {} proposals)", clip.count));
            }
            output.push('\n');

            if !clip.reason.is_empty() {
                output.push_str(&wrap_text(&clip.reason, 80));
                output.push('\n');
            }
            if !clip.quote.is_empty() {
                output.push_str(&wrap_text(&format!("\"{}\"", clip.quote), 80));
                output.push('\n');
            }
            output.push('\n');
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> ClipResult<()> {
        let mut file = std::fs::File::create(path).map_err(|source| ClipError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        write!(file, "{}", self.format()).map_err(|source| ClipError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Format seconds as MM:SS.mmm
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_ms % 1000;
    let secs = total_ms / 1000;
    format!("{:02}:{:02}.{:03}", secs / 60, secs % 60, millis)
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        if line_len + word.len() + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word.len();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::import_candidates_json;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00.000");
        assert_eq!(format_timestamp(1.5), "00:01.500");
        assert_eq!(format_timestamp(65.0), "01:05.000");
        assert_eq!(format_timestamp(3661.5), "61:01.500");
    }

    #[test]
    fn test_export_round_trip_rounds_rating() {
        let candidates = vec![Candidate::new(0.0, 1.0, 8.66).with_text("a", "b")];

        let json = export_candidates_json(&candidates).unwrap();
        let reimported = import_candidates_json(&json).unwrap();

        assert_eq!(reimported.len(), 1);
        assert_eq!(reimported[0].rating, 8.7);
        assert_eq!(reimported[0].start, 0.0);
        assert_eq!(reimported[0].end, 1.0);
        assert_eq!(reimported[0].reason, "a");
        assert_eq!(reimported[0].quote, "b");

        // A second export of the reimported list is stable
        assert_eq!(export_candidates_json(&reimported).unwrap(), json);
    }

    #[test]
    fn test_export_has_only_public_fields() {
        let mut candidate = Candidate::new(10.0, 40.0, 7.25);
        candidate.count = 3;
        candidate.tone_match = Some(true);

        let json = export_candidates_json(&[candidate]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value[0].as_object().unwrap();

        assert_eq!(object.len(), 5);
        assert!(object.contains_key("quote"));
        assert!(!object.contains_key("count"));
    }

    #[test]
    fn test_write_candidates_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.json");

        write_candidates_json(&path, &[Candidate::new(1.0, 20.0, 9.04)]).unwrap();

        let reimported = crate::io::import_candidates(&path).unwrap();
        assert_eq!(reimported[0].rating, 9.0);
    }

    #[test]
    fn test_report_lists_clips() {
        let mut clip = Candidate::new(61.0, 90.5, 8.3).with_text("Strong punchline", "It worked");
        clip.count = 2;
        let metadata = RunMetadata::new();

        let text = ClipReport::new(&[clip], &metadata).format();

        assert!(text.contains("#1 [01:01.000 - 01:30.500] 29.5s rating 8.3"));
        assert!(text.contains("(from 2 proposals)"));
        assert!(text.contains("\"It worked\""));
    }
}
