use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ClipError, ClipResult};
use crate::llm::parse_proposals;
use crate::models::{
    Candidate, ExportedCandidate, Interval, RawProposal, SideChannels, TranscriptIndex,
    TranscriptSegment, Word,
};

fn line_regex() -> &'static Regex {
    static LINE_REGEX: OnceLock<Regex> = OnceLock::new();
    LINE_REGEX.get_or_init(|| {
        Regex::new(r"^\s*\[\s*([0-9:.,]+)\s*-{1,2}>\s*([0-9:.,]+)\s*\]\s*(.*)$")
            .expect("Failed to compile transcript line regex")
    })
}

/// Parse a transcript file into a segment index
///
/// `.json` files hold an array of `{start, end, text}` objects; anything else
/// is read as `[start -> end] text` lines.
pub fn parse_transcript_file(path: &Path) -> ClipResult<TranscriptIndex> {
    let content = read_required(path)?;

    if has_json_extension(path) {
        let segments: Vec<TranscriptSegment> =
            serde_json::from_str(&content).map_err(|source| ClipError::Json {
                context: path.display().to_string(),
                source,
            })?;
        return Ok(TranscriptIndex::new(segments));
    }

    Ok(parse_transcript_str(&content))
}

/// Parse `[start -> end] text` lines, skipping anything unparsable
pub fn parse_transcript_str(content: &str) -> TranscriptIndex {
    let mut segments = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(segment) => segments.push(segment),
            None => {
                debug!("Skipping unparsable transcript line {}: {:?}", line_no + 1, line);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} unparsable transcript lines", skipped);
    }

    TranscriptIndex::new(segments)
}

fn parse_line(line: &str) -> Option<TranscriptSegment> {
    let caps = line_regex().captures(line)?;
    let start = parse_timestamp(caps.get(1)?.as_str())?;
    let end = parse_timestamp(caps.get(2)?.as_str())?;
    let text = caps.get(3)?.as_str().trim();

    if text.is_empty() || start >= end {
        return None;
    }
    Some(TranscriptSegment::new(start, end, text))
}

/// Parse `SS.fff`, `MM:SS.fff` or `HH:MM:SS.fff` (comma decimals accepted)
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    let mut total = 0.0;
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    for part in parts {
        let value: f64 = part.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(total)
}

/// Interval records come either as `[start, end]` pairs or `{start, end}` objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntervalRecord {
    Pair([f64; 2]),
    Object { start: f64, end: f64 },
}

impl From<IntervalRecord> for Interval {
    fn from(record: IntervalRecord) -> Self {
        match record {
            IntervalRecord::Pair([start, end]) => Interval::new(start, end),
            IntervalRecord::Object { start, end } => Interval::new(start, end),
        }
    }
}

/// Load an interval side-channel file (silences or dialog spans)
pub fn parse_intervals_file(path: &Path) -> ClipResult<Vec<Interval>> {
    let content = read_required(path)?;
    let records: Vec<IntervalRecord> =
        serde_json::from_str(&content).map_err(|source| ClipError::Json {
            context: path.display().to_string(),
            source,
        })?;
    Ok(records.into_iter().map(Interval::from).collect())
}

/// Load a word timestamp file
pub fn parse_words_file(path: &Path) -> ClipResult<Vec<Word>> {
    let content = read_required(path)?;
    serde_json::from_str(&content).map_err(|source| ClipError::Json {
        context: path.display().to_string(),
        source,
    })
}

/// Load whichever side-channels were supplied
pub fn load_side_channels(
    silences: Option<&Path>,
    dialog: Option<&Path>,
    words: Option<&Path>,
) -> ClipResult<SideChannels> {
    let silences = silences.map(parse_intervals_file).transpose()?.unwrap_or_default();
    let dialog = dialog.map(parse_intervals_file).transpose()?.unwrap_or_default();
    let words = words.map(parse_words_file).transpose()?.unwrap_or_default();
    Ok(SideChannels::new(silences, dialog, words))
}

/// Load raw proposals from a JSON file, validating each against the transcript
pub fn parse_proposals_file(
    path: &Path,
    transcript: &TranscriptIndex,
    min_rating: f64,
) -> ClipResult<Vec<RawProposal>> {
    let content = read_required(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| ClipError::Json {
            context: path.display().to_string(),
            source,
        })?;
    let time_range = transcript.time_range().unwrap_or((0.0, 0.0));
    let parsed = parse_proposals(&value, time_range, min_rating);
    if parsed.dropped > 0 {
        warn!(
            "Dropped {} of {} proposals from {:?}",
            parsed.dropped,
            parsed.dropped + parsed.proposals.len(),
            path
        );
    }
    Ok(parsed.proposals)
}

/// Re-import a previously exported candidate list
pub fn import_candidates(path: &Path) -> ClipResult<Vec<Candidate>> {
    let content = read_required(path)?;
    import_candidates_json(&content)
}

pub fn import_candidates_json(json: &str) -> ClipResult<Vec<Candidate>> {
    let exported: Vec<ExportedCandidate> =
        serde_json::from_str(json).map_err(|source| ClipError::Json {
            context: "exported candidates".to_string(),
            source,
        })?;
    Ok(exported.into_iter().map(Candidate::from).collect())
}

fn read_required(path: &Path) -> ClipResult<String> {
    if !path.exists() {
        return Err(ClipError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| ClipError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
