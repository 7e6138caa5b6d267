use serde_json::Value;
use tracing::debug;

use crate::io::parse_timestamp;
use crate::models::RawProposal;

/// Tolerance for proposals touching the edges of the transcript
const RANGE_TOLERANCE: f64 = 1e-6;

/// Keys a proposal list may be wrapped under
const LIST_KEYS: [&str; 4] = ["moments", "clips", "proposals", "candidates"];

/// Result of validating proposal-source output
#[derive(Debug, Clone, Default)]
pub struct ParsedProposals {
    /// Proposals that passed validation
    pub proposals: Vec<RawProposal>,
    /// Number of entries dropped as malformed, out of range or under-rated
    pub dropped: usize,
}

/// Why a single proposal entry was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalRejection {
    NotAnObject,
    MissingField(&'static str),
    InvertedBounds,
    OutOfRange,
    NegativeRating,
    BelowMinRating,
}

/// Validate raw proposal-source JSON into typed proposals
///
/// Accepts a bare array or an object wrapping the array under one of the
/// usual keys. Numbers may arrive as JSON numbers, numeric strings or clock
/// timestamps. Nothing here is fatal: bad entries are counted and skipped.
pub fn parse_proposals(value: &Value, time_range: (f64, f64), min_rating: f64) -> ParsedProposals {
    let Some(items) = proposal_list(value) else {
        debug!("Proposal output has no recognizable list");
        return ParsedProposals::default();
    };

    let mut parsed = ParsedProposals::default();
    for item in items {
        match validate_proposal(item, time_range, min_rating) {
            Ok(proposal) => parsed.proposals.push(proposal),
            Err(reason) => {
                debug!("Dropping proposal ({:?}): {}", reason, item);
                parsed.dropped += 1;
            }
        }
    }
    parsed
}

fn proposal_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// Validate a single proposal entry
///
/// Entries with inverted bounds, bounds outside `time_range`, a negative
/// rating or a rating below `min_rating` are rejected. A rating above 10 is
/// not rejected: it is clamped to 10.
pub fn validate_proposal(
    item: &Value,
    time_range: (f64, f64),
    min_rating: f64,
) -> Result<RawProposal, ProposalRejection> {
    let map = item.as_object().ok_or(ProposalRejection::NotAnObject)?;

    let start = field_f64(map, &["start", "start_time"]).ok_or(ProposalRejection::MissingField("start"))?;
    let end = field_f64(map, &["end", "end_time"]).ok_or(ProposalRejection::MissingField("end"))?;
    let rating = field_f64(map, &["rating", "score"]).ok_or(ProposalRejection::MissingField("rating"))?;

    if start >= end {
        return Err(ProposalRejection::InvertedBounds);
    }
    let (range_start, range_end) = time_range;
    if start < range_start - RANGE_TOLERANCE || end > range_end + RANGE_TOLERANCE {
        return Err(ProposalRejection::OutOfRange);
    }
    if rating < 0.0 {
        return Err(ProposalRejection::NegativeRating);
    }
    let rating = rating.min(10.0);
    if rating < min_rating {
        return Err(ProposalRejection::BelowMinRating);
    }

    Ok(RawProposal {
        start,
        end,
        rating,
        reason: field_str(map, &["reason", "why"]),
        quote: field_str(map, &["quote", "text"]),
    })
}

fn field_f64(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let value = keys.iter().find_map(|k| map.get(*k))?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().or_else(|| parse_timestamp(s)),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn field_str(map: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| map.get(*k))
        .map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}
