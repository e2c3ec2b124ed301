use serde::{Deserialize, Serialize};

/// Thresholds for the keypoint classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostureThresholds {
    /// Keypoints at or below this score are treated as absent
    pub min_keypoint_score: f32,

    /// Leaning: shoulder height difference above this fraction of shoulder width
    pub lean_ratio: f32,

    /// Slouching: ears ahead of shoulders by more than this fraction of shoulder width
    pub slouch_ratio: f32,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            min_keypoint_score: 0.3,
            lean_ratio: 0.15,
            slouch_ratio: 0.20,
        }
    }
}
