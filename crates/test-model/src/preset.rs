use itinera_model::ModelFinishReason;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "empty")]
    Empty,
}

/// The preset response for one turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the response fails after delivering this many events
    /// instead of completing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_after: Option<usize>,
    /// The reason reported when the response completes.
    #[serde(default = "default_finish_reason")]
    pub finish_reason: ModelFinishReason,
}

fn default_finish_reason() -> ModelFinishReason {
    ModelFinishReason::Stop
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            fail_after: None,
            finish_reason: ModelFinishReason::Stop,
        }
    }

    /// Creates a `PresetResponse` that streams the given text pieces.
    pub fn with_text<I, S>(pieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            pieces
                .into_iter()
                .map(|piece| PresetEvent::Text(piece.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Makes the response fail mid-stream after `count` events.
    #[inline]
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Sets the reason reported when the response completes.
    #[inline]
    pub fn with_finish_reason(mut self, reason: ModelFinishReason) -> Self {
        self.finish_reason = reason;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::Text("Day 1: Louvre".to_string()),
            PresetEvent::Empty,
        ])
        .failing_after(1)
        .with_finish_reason(ModelFinishReason::MaxTokens);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_deserialize_without_failure() {
        let response: PresetResponse = serde_json::from_str(
            r#"{"events":[{"type":"text","data":"Hi"},{"type":"empty"}]}"#,
        )
        .unwrap();
        assert_eq!(
            response,
            PresetResponse::with_events([
                PresetEvent::Text("Hi".to_string()),
                PresetEvent::Empty,
            ])
        );
    }
}
