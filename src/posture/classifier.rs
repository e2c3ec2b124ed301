use std::collections::HashMap;

use crate::models::{Frame, Keypoint, PostureStatus};

use super::PostureThresholds;

const LEFT_SHOULDER: &str = "left_shoulder";
const RIGHT_SHOULDER: &str = "right_shoulder";
const LEFT_EAR: &str = "left_ear";
const RIGHT_EAR: &str = "right_ear";

/// Classify a single pose estimate.
///
/// Missing or low-confidence keypoints never fail: they degrade to
/// [`PostureStatus::Unknown`]. The leaning check wins over slouching.
///
/// The camera image is mirrored, so a smaller `x` means further forward.
pub fn classify(frame: &Frame, thresholds: &PostureThresholds) -> PostureStatus {
    let visible: HashMap<&str, &Keypoint> = frame
        .keypoints
        .iter()
        .filter(|kp| kp.score > thresholds.min_keypoint_score)
        .map(|kp| (kp.name.as_str(), kp))
        .collect();

    let (Some(left_shoulder), Some(right_shoulder), Some(left_ear), Some(right_ear)) = (
        visible.get(LEFT_SHOULDER),
        visible.get(RIGHT_SHOULDER),
        visible.get(LEFT_EAR),
        visible.get(RIGHT_EAR),
    ) else {
        return PostureStatus::Unknown;
    };

    let shoulder_y_diff = (left_shoulder.y - right_shoulder.y).abs();
    let shoulder_width = (left_shoulder.x - right_shoulder.x).abs();
    if shoulder_y_diff > shoulder_width * thresholds.lean_ratio {
        return PostureStatus::Leaning;
    }

    let ear_avg_x = (left_ear.x + right_ear.x) / 2.0;
    let shoulder_avg_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    if shoulder_avg_x - ear_avg_x > shoulder_width * thresholds.slouch_ratio {
        return PostureStatus::Slouching;
    }

    PostureStatus::Good
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(
        left_shoulder: (f32, f32),
        right_shoulder: (f32, f32),
        left_ear: (f32, f32),
        right_ear: (f32, f32),
    ) -> Frame {
        Frame::new(vec![
            Keypoint::new(LEFT_SHOULDER, left_shoulder.0, left_shoulder.1, 0.9),
            Keypoint::new(RIGHT_SHOULDER, right_shoulder.0, right_shoulder.1, 0.9),
            Keypoint::new(LEFT_EAR, left_ear.0, left_ear.1, 0.9),
            Keypoint::new(RIGHT_EAR, right_ear.0, right_ear.1, 0.9),
        ])
    }

    fn upright() -> Frame {
        // shoulder width 200, ears centred over shoulders
        make_frame((400.0, 300.0), (200.0, 300.0), (330.0, 200.0), (270.0, 200.0))
    }

    #[test]
    fn upright_pose_is_good() {
        assert_eq!(classify(&upright(), &PostureThresholds::default()), PostureStatus::Good);
    }

    #[test]
    fn empty_frame_is_unknown() {
        assert_eq!(
            classify(&Frame::empty(), &PostureThresholds::default()),
            PostureStatus::Unknown
        );
    }

    #[test]
    fn each_missing_required_keypoint_gives_unknown() {
        for missing in [LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_EAR, RIGHT_EAR] {
            let mut frame = upright();
            frame.keypoints.retain(|kp| kp.name != missing);
            assert_eq!(
                classify(&frame, &PostureThresholds::default()),
                PostureStatus::Unknown,
                "missing {missing}"
            );
        }
    }

    #[test]
    fn low_confidence_keypoint_counts_as_missing() {
        let mut frame = upright();
        frame.keypoints[2].score = 0.3;
        assert_eq!(
            classify(&frame, &PostureThresholds::default()),
            PostureStatus::Unknown
        );

        frame.keypoints[2].score = 0.31;
        assert_eq!(classify(&frame, &PostureThresholds::default()), PostureStatus::Good);
    }

    #[test]
    fn extra_keypoints_are_ignored() {
        let mut frame = upright();
        frame.keypoints.push(Keypoint::new("nose", 0.0, 0.0, 0.99));
        assert_eq!(classify(&frame, &PostureThresholds::default()), PostureStatus::Good);
    }

    #[test]
    fn tilted_shoulders_are_leaning_regardless_of_ears() {
        // y diff 40 > 0.15 * 200
        for ears in [(330.0, 270.0), (200.0, 140.0), (500.0, 450.0)] {
            let frame = make_frame(
                (400.0, 320.0),
                (200.0, 280.0),
                (ears.0, 200.0),
                (ears.1, 200.0),
            );
            assert_eq!(
                classify(&frame, &PostureThresholds::default()),
                PostureStatus::Leaning
            );
        }
    }

    #[test]
    fn shoulder_tilt_at_threshold_is_not_leaning() {
        // y diff exactly 0.15 * 200
        let frame = make_frame((400.0, 315.0), (200.0, 285.0), (330.0, 200.0), (270.0, 200.0));
        assert_eq!(classify(&frame, &PostureThresholds::default()), PostureStatus::Good);
    }

    #[test]
    fn ears_ahead_of_shoulders_is_slouching() {
        // shoulder avg 300, ear avg 250: offset 50 > 0.20 * 200
        let frame = make_frame((400.0, 300.0), (200.0, 300.0), (280.0, 200.0), (220.0, 200.0));
        assert_eq!(
            classify(&frame, &PostureThresholds::default()),
            PostureStatus::Slouching
        );
    }

    #[test]
    fn ear_offset_at_threshold_is_good() {
        // offset exactly 40 = 0.20 * 200
        let frame = make_frame((400.0, 300.0), (200.0, 300.0), (290.0, 200.0), (230.0, 200.0));
        assert_eq!(classify(&frame, &PostureThresholds::default()), PostureStatus::Good);
    }

    #[test]
    fn ears_behind_shoulders_is_good() {
        let frame = make_frame((400.0, 300.0), (200.0, 300.0), (380.0, 200.0), (320.0, 200.0));
        assert_eq!(classify(&frame, &PostureThresholds::default()), PostureStatus::Good);
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let strict = PostureThresholds {
            slouch_ratio: 0.05,
            ..PostureThresholds::default()
        };
        // offset 20 > 0.05 * 200
        let frame = make_frame((400.0, 300.0), (200.0, 300.0), (310.0, 200.0), (250.0, 200.0));
        assert_eq!(classify(&frame, &PostureThresholds::default()), PostureStatus::Good);
        assert_eq!(classify(&frame, &strict), PostureStatus::Slouching);
    }

    #[test]
    fn classification_is_deterministic() {
        let frame = upright();
        let thresholds = PostureThresholds::default();
        assert_eq!(classify(&frame, &thresholds), classify(&frame, &thresholds));
    }
}
