use crate::io::format_timestamp;
use crate::stages::ProposalRequest;

/// System prompt for moment proposals
pub const PROPOSAL_SYSTEM_PROMPT: &str = r#"You are selecting short-form clips from a long recording. You read a time-coded transcript window and propose self-contained moments that would work as standalone clips.

RULES:
1. Only propose moments whose start and end lie inside the EDITABLE window.
2. Use the timestamps exactly as they appear in the transcript (seconds).
3. Each moment must make sense without the surrounding context.
4. Segments marked as context are READ-ONLY: use them to understand continuity, never as clip bounds.
5. Rate each moment from 0 to 10. Be strict: a 9 or 10 is rare.
6. Quote the single most representative line verbatim from the transcript.

Submit your answer with the submit_moments tool. Return an empty list if nothing qualifies."#;

/// System prompt for tone verification
pub const TONE_SYSTEM_PROMPT: &str = r#"You judge whether a transcript excerpt matches a target tone or theme. Answer with the submit_verdict tool. Set "match" to true only if the excerpt clearly fits the target; set it to false if it clearly does not."#;

/// Build the user prompt for a proposal window
pub fn build_proposal_prompt(request: &ProposalRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Window: {}\n", request.window_id));
    prompt.push_str(&format!(
        "Time range: {:.2}s - {:.2}s ({} - {})\n",
        request.window_start,
        request.window_end,
        format_timestamp(request.window_start),
        format_timestamp(request.window_end)
    ));
    prompt.push_str(&format!(
        "Clip length: {:.0}-{:.0}s allowed, {:.0}-{:.0}s preferred\n",
        request.min_duration_seconds,
        request.max_duration_seconds,
        request.sweet_spot_min_seconds,
        request.sweet_spot_max_seconds
    ));
    prompt.push_str(&format!(
        "Only include moments rated {:.1} or higher.\n",
        request.min_rating
    ));
    if let Some(tone) = &request.tone {
        prompt.push_str(&format!("Target tone: {}\n", tone));
    }
    prompt.push('\n');

    if !request.context_before.is_empty() {
        prompt.push_str("## Context Before (READ-ONLY)\n");
        prompt.push_str(&request.context_before);
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Transcript (EDITABLE)\n");
    prompt.push_str(&request.window_text);
    prompt.push_str("\n\n");

    if !request.context_after.is_empty() {
        prompt.push_str("## Context After (READ-ONLY)\n");
        prompt.push_str(&request.context_after);
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Instructions\n");
    prompt.push_str("Propose the strongest moments in this window using the submit_moments tool.\n");
    prompt.push_str("Prefer moments that open with a hook and end on a complete thought.\n");

    prompt
}

/// Build the user prompt for a tone verdict
pub fn build_tone_prompt(text: &str, tone: &str) -> String {
    format!(
        "# Target tone\n{}\n\n# Excerpt\n{}\n\nDoes this excerpt match the target tone?",
        tone, text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProposalRequest {
        ProposalRequest {
            window_id: "w_3".to_string(),
            window_start: 600.0,
            window_end: 900.0,
            window_text: "[600.00 -> 604.00] Hello there".to_string(),
            context_before: String::new(),
            context_after: "[900.00 -> 902.00] Later".to_string(),
            tone: Some("humor".to_string()),
            min_duration_seconds: 15.0,
            max_duration_seconds: 60.0,
            sweet_spot_min_seconds: 20.0,
            sweet_spot_max_seconds: 45.0,
            min_rating: 7.0,
        }
    }

    #[test]
    fn test_proposal_prompt_sections() {
        let prompt = build_proposal_prompt(&request());

        assert!(prompt.contains("# Window: w_3"));
        assert!(prompt.contains("(10:00.000 - 15:00.000)"));
        assert!(prompt.contains("Target tone: humor"));
        assert!(!prompt.contains("Context Before"));
        assert!(prompt.contains("## Context After (READ-ONLY)"));
        assert!(prompt.contains("Hello there"));
    }

    #[test]
    fn test_tone_prompt() {
        let prompt = build_tone_prompt("some words", "inspiring");
        assert!(prompt.starts_with("# Target tone\ninspiring"));
        assert!(prompt.contains("some words"));
    }
}
