use tracing::debug;

use crate::models::{TranscriptIndex, Window, WindowConfig, WindowSet};

/// Perform Stage 0: split the transcript into overlapping proposal windows
///
/// Windows start at the first segment and advance by
/// `window_size - overlap`. A segment belongs to every window whose range
/// contains its start. Each window also records read-only context segments
/// within `context_pct * window_size` on either side, which only feed the
/// prompt. Windows without segments are not emitted.
pub fn build_windows(transcript: &TranscriptIndex, config: &WindowConfig) -> WindowSet {
    let mut windows = Vec::new();

    let Some((range_start, range_end)) = transcript.time_range() else {
        return WindowSet { windows };
    };

    let step = config.step_seconds();
    if step <= 0.0 || config.window_size_seconds <= 0.0 {
        return WindowSet { windows };
    }

    let context = config.context_seconds();
    let segments = &transcript.segments;
    let mut window_start = range_start;
    let mut window_id = 0u64;

    while window_start < range_end {
        let window_end = window_start + config.window_size_seconds;

        let segment_indices = indices_starting_in(transcript, window_start, window_end);

        if !segment_indices.is_empty() {
            let context_prefix_indices =
                indices_starting_in(transcript, window_start - context, window_start);
            let context_suffix_indices =
                indices_starting_in(transcript, window_end, window_end + context);

            windows.push(Window {
                window_id: format!("w_{}", window_id),
                start: window_start,
                end: window_end,
                segment_indices,
                context_prefix_indices,
                context_suffix_indices,
            });
            window_id += 1;
        }

        window_start += step;
    }

    debug!(
        "Built {} windows over {:.1}s ({} segments)",
        windows.len(),
        range_end - range_start,
        segments.len()
    );

    WindowSet { windows }
}

fn indices_starting_in(transcript: &TranscriptIndex, from: f64, to: f64) -> Vec<usize> {
    transcript
        .segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.start >= from && s.start < to)
        .map(|(i, _)| i)
        .collect()
}

/// Render segment lines as `[start -> end] text` for a prompt
pub fn format_segments(transcript: &TranscriptIndex, indices: &[usize]) -> String {
    indices
        .iter()
        .filter_map(|&i| transcript.segments.get(i))
        .map(|s| format!("[{:.2} -> {:.2}] {}", s.start, s.end, s.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
