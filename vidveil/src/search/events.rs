//! Tagged events flowing from engine tasks to the delivery layer.

use engines_parser::VideoResult;
use serde::Serialize;

/// One event on the scheduler's output channel.
///
/// The event model is transport-free: the SSE, JSON-batch and plain-text
/// adapters each render these however their format requires.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchEvent {
    Result(Box<VideoResult>),
    Done {
        done: bool,
        engine: String,
    },
    Failure {
        engine: String,
        reason: String,
    },
    /// All engines have signalled; the stream is finished.
    Complete {
        done: bool,
        engine: &'static str,
    },
}

impl SearchEvent {
    pub fn result(result: VideoResult) -> Self {
        Self::Result(Box::new(result))
    }

    pub fn done(engine: impl Into<String>) -> Self {
        Self::Done {
            done: true,
            engine: engine.into(),
        }
    }

    pub fn failure(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failure {
            engine: engine.into(),
            reason: reason.into(),
        }
    }

    pub fn complete() -> Self {
        Self::Complete {
            done: true,
            engine: "all",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_frame_shape() {
        let json = serde_json::to_string(&SearchEvent::complete()).unwrap();
        assert_eq!(json, r#"{"done":true,"engine":"all"}"#);
    }

    #[test]
    fn done_frame_carries_engine() {
        let json = serde_json::to_string(&SearchEvent::done("pornhub")).unwrap();
        assert_eq!(json, r#"{"done":true,"engine":"pornhub"}"#);
    }
}
