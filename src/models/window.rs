use serde::{Deserialize, Serialize};

/// Configuration for window generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window size in seconds
    pub window_size_seconds: f64,
    /// Overlap between consecutive windows in seconds
    pub overlap_seconds: f64,
    /// Context padding on each side, as a fraction of the window size
    pub context_pct: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size_seconds: 300.0, // 5 minutes
            overlap_seconds: 30.0,
            context_pct: 0.1,
        }
    }
}

impl WindowConfig {
    /// Distance between consecutive window starts
    pub fn step_seconds(&self) -> f64 {
        self.window_size_seconds - self.overlap_seconds
    }

    /// Context padding applied on each side of a window
    pub fn context_seconds(&self) -> f64 {
        self.context_pct * self.window_size_seconds
    }
}

/// A proposal window over the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Unique identifier for this window
    pub window_id: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Indices of segments owned by this window
    pub segment_indices: Vec<usize>,
    /// Indices of read-only context segments before the window
    pub context_prefix_indices: Vec<usize>,
    /// Indices of read-only context segments after the window
    pub context_suffix_indices: Vec<usize>,
}

impl Window {
    /// Duration of this window in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Number of segments owned by this window (excluding context)
    pub fn segment_count(&self) -> usize {
        self.segment_indices.len()
    }
}

/// Result of window generation
#[derive(Debug, Clone, Default)]
pub struct WindowSet {
    pub windows: Vec<Window>,
}

impl WindowSet {
    pub fn total_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }
}
