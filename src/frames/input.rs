//! Newline-delimited JSON input for the command-line tracker.
//!
//! ```text
//! {"type":"frame","keypoints":[{"name":"left_ear","x":310.0,"y":120.0,"score":0.8}]}
//! {"type":"activity","kind":"keyPress"}
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{ActivityKind, Frame};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputMessage {
    Frame(Frame),
    Activity { kind: ActivityKind },
}

/// Decode one input line. Blank lines yield `None`.
pub fn parse_input_line(line: &str) -> Result<Option<InputMessage>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .with_context(|| format!("invalid input line: {trimmed}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_line() {
        let line = r#"{"type":"frame","keypoints":[{"name":"left_ear","x":1.0,"y":2.0,"score":0.5}]}"#;
        let Some(InputMessage::Frame(frame)) = parse_input_line(line).unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(frame.keypoints.len(), 1);
        assert_eq!(frame.keypoints[0].name, "left_ear");
    }

    #[test]
    fn parses_activity_line() {
        let message = parse_input_line(r#"{"type":"activity","kind":"scroll"}"#).unwrap();
        assert_eq!(
            message,
            Some(InputMessage::Activity {
                kind: ActivityKind::Scroll
            })
        );
    }

    #[test]
    fn frame_without_keypoints_is_empty_frame() {
        let message = parse_input_line(r#"{"type":"frame"}"#).unwrap();
        assert_eq!(message, Some(InputMessage::Frame(Frame::empty())));
    }

    #[test]
    fn blank_line_is_skipped() {
        assert_eq!(parse_input_line("   ").unwrap(), None);
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(parse_input_line("{not json").is_err());
        assert!(parse_input_line(r#"{"type":"gesture"}"#).is_err());
    }
}
