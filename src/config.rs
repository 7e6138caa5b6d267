use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClipError, ClipResult};
use crate::models::WindowConfig;
use crate::snap::SnapConfig;
use crate::stages::{ProposalConfig, ToneConfig};

const DURATION_TOLERANCE: f64 = 1e-9;

/// Duration, rating and spacing constraints shared by the merge and select stages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConstraints {
    /// Shortest clip that may be exported
    pub min_duration_seconds: f64,
    /// Longest clip that may be exported
    pub max_duration_seconds: f64,
    /// Lower edge of the preferred duration band
    pub sweet_spot_min_seconds: f64,
    /// Upper edge of the preferred duration band
    pub sweet_spot_max_seconds: f64,
    /// Proposals rated below this are discarded
    pub default_min_rating: f64,
    /// Clips with fewer words skip tone verification
    pub default_min_words: usize,
    /// Disable to inspect every refined candidate without selection
    pub enforce_non_overlap: bool,
    /// Minimum distance between two selected clips
    pub min_gap: f64,
    /// Proposals closer than this are merged before selection
    pub merge_gap_seconds: f64,
}

impl Default for ClipConstraints {
    fn default() -> Self {
        Self {
            min_duration_seconds: 15.0,
            max_duration_seconds: 60.0,
            sweet_spot_min_seconds: 20.0,
            sweet_spot_max_seconds: 45.0,
            default_min_rating: 7.0,
            default_min_words: 12,
            enforce_non_overlap: true,
            min_gap: 1.0,
            merge_gap_seconds: 1.5,
        }
    }
}

impl ClipConstraints {
    /// Whether `duration` is inside the exportable range, allowing float noise
    pub fn duration_in_bounds(&self, duration: f64) -> bool {
        duration >= self.min_duration_seconds - DURATION_TOLERANCE
            && duration <= self.max_duration_seconds + DURATION_TOLERANCE
    }

    pub fn validate(&self) -> ClipResult<()> {
        if self.min_duration_seconds <= 0.0 || self.min_duration_seconds > self.max_duration_seconds {
            return Err(ClipError::InvalidConfig(format!(
                "duration bounds must satisfy 0 < min ({}) <= max ({})",
                self.min_duration_seconds, self.max_duration_seconds
            )));
        }
        if self.sweet_spot_min_seconds <= 0.0
            || self.sweet_spot_min_seconds > self.sweet_spot_max_seconds
        {
            return Err(ClipError::InvalidConfig(format!(
                "sweet spot must satisfy 0 < min ({}) <= max ({})",
                self.sweet_spot_min_seconds, self.sweet_spot_max_seconds
            )));
        }
        if !(0.0..=10.0).contains(&self.default_min_rating) {
            return Err(ClipError::InvalidConfig(format!(
                "min rating {} is outside 0-10",
                self.default_min_rating
            )));
        }
        if self.min_gap < 0.0 || self.merge_gap_seconds < 0.0 {
            return Err(ClipError::InvalidConfig(
                "gaps must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete engine configuration, loadable from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(flatten)]
    pub constraints: ClipConstraints,
    pub window: WindowConfig,
    pub snap: SnapConfig,
    pub proposals: ProposalConfig,
    pub tone: ToneConfig,
}

impl EngineConfig {
    /// Load configuration from a JSON file; missing fields take their defaults
    ///
    /// The result is not validated so that command-line overrides can still
    /// be applied. Call [`EngineConfig::validate`] once they are.
    pub fn from_file(path: &Path) -> ClipResult<Self> {
        if !path.exists() {
            return Err(ClipError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ClipError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ClipError::Json {
            context: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> ClipResult<()> {
        self.constraints.validate()?;
        if self.window.window_size_seconds <= 0.0 || self.window.step_seconds() <= 0.0 {
            return Err(ClipError::InvalidConfig(format!(
                "window size ({}) must exceed overlap ({})",
                self.window.window_size_seconds, self.window.overlap_seconds
            )));
        }
        if self.window.context_pct < 0.0 {
            return Err(ClipError::InvalidConfig(
                "context_pct must be non-negative".to_string(),
            ));
        }
        if self.proposals.concurrency == 0 || self.tone.concurrency == 0 {
            return Err(ClipError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        let timeout = self.proposals.timeout_seconds;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ClipError::InvalidConfig(format!(
                "proposal timeout ({}) must be a positive number of seconds",
                timeout
            )));
        }
        Ok(())
    }
}
