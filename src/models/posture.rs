use serde::{Deserialize, Serialize};

/// A named 2D body landmark produced by the pose estimator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Estimator confidence in `[0, 1]`.
    pub score: f32,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, score: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score,
        }
    }
}

/// Keypoints of the most recent pose estimate. Empty when no person was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
}

impl Frame {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PostureStatus {
    Good,
    Slouching,
    Leaning,
    Idle,
    #[default]
    Unknown,
}

impl PostureStatus {
    /// Slouching and leaning are the statuses that can raise an alert.
    pub fn is_bad(self) -> bool {
        matches!(self, PostureStatus::Slouching | PostureStatus::Leaning)
    }

    pub fn label(self) -> &'static str {
        match self {
            PostureStatus::Good => "Good Posture",
            PostureStatus::Slouching => "Slouching Detected",
            PostureStatus::Leaning => "Leaning Detected",
            PostureStatus::Idle => "Idle",
            PostureStatus::Unknown => "Analyzing...",
        }
    }
}

impl std::fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// User input that counts as "still at the desk".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    PointerMove,
    PointerPress,
    KeyPress,
    TouchStart,
    Scroll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_slouching_and_leaning_are_bad() {
        assert!(PostureStatus::Slouching.is_bad());
        assert!(PostureStatus::Leaning.is_bad());
        assert!(!PostureStatus::Good.is_bad());
        assert!(!PostureStatus::Idle.is_bad());
        assert!(!PostureStatus::Unknown.is_bad());
    }

    #[test]
    fn frame_without_keypoints_field_deserializes_empty() {
        let frame: Frame = serde_json::from_str("{}").unwrap();
        assert!(frame.keypoints.is_empty());
    }

    #[test]
    fn activity_kind_uses_camel_case() {
        let kind: ActivityKind = serde_json::from_str("\"pointerMove\"").unwrap();
        assert_eq!(kind, ActivityKind::PointerMove);
    }
}
