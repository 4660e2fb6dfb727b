use itinera_model::{ModelFinishReason, ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<ApiError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

impl Candidate {
    /// Joins the text of all parts. Parts without text (function calls,
    /// inline data) are skipped, `None` means there was no text at all.
    pub fn text(&self) -> Option<String> {
        let content = self.content.as_ref()?;
        let mut texts = content.parts.iter().filter_map(|p| p.text.as_deref());
        let first = texts.next()?;
        Some(texts.fold(first.to_owned(), |mut acc, text| {
            acc.push_str(text);
            acc
        }))
    }
}

#[inline]
pub fn finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "MAX_TOKENS" => ModelFinishReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        | "SPII" => ModelFinishReason::Blocked,
        _ => ModelFinishReason::Stop,
    }
}

/// Extracts the message of an error body, if it has Gemini's shape.
pub fn parse_error_body(body: &str) -> Option<ApiError> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: req.messages.iter().map(create_content).collect(),
        system_instruction: req.system_instruction.as_ref().map(|text| {
            Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.clone()),
                }],
            }
        }),
    }
}

#[inline]
fn create_content(msg: &ModelMessage) -> Content {
    let role = match msg {
        ModelMessage::User(_) => "user",
        ModelMessage::Model(_) => "model",
    };
    Content {
        role: Some(role.to_owned()),
        parts: vec![Part {
            text: Some(msg.text().to_owned()),
        }],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            system_instruction: Some("You plan trips.".to_owned()),
            messages: vec![
                ModelMessage::User("Plan Paris".to_owned()),
                ModelMessage::Model("Day 1: Louvre".to_owned()),
                ModelMessage::User("Make it cheaper".to_owned()),
            ],
        };
        let expected = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Plan Paris" }] },
                { "role": "model", "parts": [{ "text": "Day 1: Louvre" }] },
                { "role": "user", "parts": [{ "text": "Make it cheaper" }] },
            ],
            "systemInstruction": { "parts": [{ "text": "You plan trips." }] },
        });
        assert_eq!(
            serde_json::to_value(create_request(&request)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_request_without_system_instruction() {
        let request = ModelRequest {
            system_instruction: None,
            messages: vec![ModelMessage::User("Hi".to_owned())],
        };
        let value = serde_json::to_value(create_request(&request)).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_candidate_text() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Day 1" }, {}, { "text": ", Day 2" }]
                },
                "index": 0
            }],
            "modelVersion": "gemini-2.0-flash"
        }))
        .unwrap();
        assert_eq!(chunk.candidates[0].text().as_deref(), Some("Day 1, Day 2"));

        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "STOP" }]
        }))
        .unwrap();
        assert_eq!(chunk.candidates[0].text(), None);
    }

    #[test]
    fn test_finish_reason() {
        assert_eq!(finish_reason("STOP"), ModelFinishReason::Stop);
        assert_eq!(finish_reason("MAX_TOKENS"), ModelFinishReason::MaxTokens);
        assert_eq!(finish_reason("SAFETY"), ModelFinishReason::Blocked);
        assert_eq!(
            finish_reason("FINISH_REASON_UNSPECIFIED"),
            ModelFinishReason::Stop
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        let error = parse_error_body(body).unwrap();
        assert_eq!(error.code, Some(400));
        assert_eq!(error.message.as_deref(), Some("API key not valid."));
        assert_eq!(parse_error_body("<html>"), None);
    }
}
