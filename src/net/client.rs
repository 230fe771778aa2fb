//! HTTP client for the assistant backend
//!
//! One endpoint, one verb: the capture goes up as multipart form data and
//! the backend answers with the transcription and an ordered list of dialogue
//! actions. Only the first action's text matters to this client.

use crate::{ParrotError, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Multipart field name the backend expects
const FILE_FIELD: &str = "file";
/// Filename reported for the uploaded capture
const FILE_NAME: &str = "audio.wav";
/// MIME type of the uploaded capture
const FILE_MIME: &str = "audio/wav";

/// One dialogue action returned by the backend
///
/// The dialogue engine may answer with non-text payloads (images, buttons),
/// so `text` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionItem {
    #[serde(default)]
    pub text: Option<String>,
}

/// Parsed outcome of one successful exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReply {
    /// What the backend heard
    pub transcription: String,
    /// Text of the first action, if the dialogue engine produced one
    pub response: Option<String>,
}

/// Raw wire shape of the backend reply
///
/// The backend returns `{"error": ...}` with HTTP 200 on internal failure,
/// so every field is optional until validated.
#[derive(Debug, Deserialize)]
struct RawReply {
    transcription: Option<String>,
    #[serde(default)]
    action: Vec<ActionItem>,
    error: Option<String>,
}

/// Client for the `/process-audio/` endpoint
pub struct BackendClient {
    client: reqwest::Client,
    endpoint: String,
}

impl BackendClient {
    /// Create a client for the given endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Get the configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload a capture file and parse the backend's reply
    ///
    /// Issues a single POST with the file as the `file` multipart field.
    /// No timeout, no retry: any transport error, non-success status,
    /// error-shaped body, or unparseable reply is returned as an error.
    pub async fn send(&self, path: &Path) -> Result<ExchangeReply> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ParrotError::UploadError(format!("Failed to read capture file: {}", e)))?;

        info!(
            "Uploading {} bytes from {:?} to {}",
            bytes.len(),
            path,
            self.endpoint
        );

        let part = Part::bytes(bytes)
            .file_name(FILE_NAME)
            .mime_str(FILE_MIME)
            .map_err(|e| ParrotError::UploadError(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ParrotError::UploadError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParrotError::ServerError(format!(
                "Backend returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ParrotError::UploadError(format!("Failed to read reply body: {}", e)))?;

        parse_reply(&body)
    }
}

/// Parse a reply body into an `ExchangeReply`
///
/// An `{"error": ...}` body is a backend failure even under HTTP 200; a
/// missing transcription is a malformed reply. An empty action list, or a
/// first action without text, is a success with transcription only.
pub fn parse_reply(body: &str) -> Result<ExchangeReply> {
    let raw: RawReply = serde_json::from_str(body)
        .map_err(|e| ParrotError::ReplyError(format!("Invalid JSON reply: {}", e)))?;

    if let Some(error) = raw.error {
        return Err(ParrotError::ServerError(format!(
            "Backend reported: {}",
            error
        )));
    }

    let transcription = raw
        .transcription
        .ok_or_else(|| ParrotError::ReplyError("Reply is missing the transcription".into()))?;

    let response = raw
        .action
        .first()
        .and_then(|a| a.text.clone())
        .filter(|t| !t.trim().is_empty());

    debug!(
        "Parsed reply: transcription {} chars, response: {}",
        transcription.len(),
        response.is_some()
    );

    Ok(ExchangeReply {
        transcription,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_reply() {
        let reply =
            parse_reply(r#"{"transcription": "hello", "action": [{"text": "hi"}]}"#).unwrap();
        assert_eq!(reply.transcription, "hello");
        assert_eq!(reply.response.as_deref(), Some("hi"));
    }

    #[test]
    fn test_parse_uses_only_first_action() {
        let reply = parse_reply(
            r#"{"transcription": "bonjour", "action": [{"text": "salut"}, {"text": "ignored"}]}"#,
        )
        .unwrap();
        assert_eq!(reply.response.as_deref(), Some("salut"));
    }

    #[test]
    fn test_parse_empty_action_list() {
        let reply = parse_reply(r#"{"transcription": "bonjour", "action": []}"#).unwrap();
        assert_eq!(reply.transcription, "bonjour");
        assert!(reply.response.is_none());
    }

    #[test]
    fn test_parse_action_without_text() {
        // Dialogue engines can answer with non-text payloads
        let reply =
            parse_reply(r#"{"transcription": "bonjour", "action": [{"image": "x.png"}]}"#).unwrap();
        assert!(reply.response.is_none());
    }

    #[test]
    fn test_parse_blank_action_text_is_no_response() {
        let reply =
            parse_reply(r#"{"transcription": "bonjour", "action": [{"text": "  "}]}"#).unwrap();
        assert!(reply.response.is_none());
    }

    #[test]
    fn test_parse_missing_action_field() {
        let reply = parse_reply(r#"{"transcription": "bonjour"}"#).unwrap();
        assert!(reply.response.is_none());
    }

    #[test]
    fn test_parse_error_body_is_server_error() {
        // The backend answers 200 with an error field on internal failure
        let err = parse_reply(r#"{"error": "whisper exploded"}"#).unwrap_err();
        assert!(matches!(err, ParrotError::ServerError(_)));
        assert!(err.to_string().contains("whisper exploded"));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_reply("<html>definitely not json</html>").unwrap_err();
        assert!(matches!(err, ParrotError::ReplyError(_)));
    }

    #[test]
    fn test_parse_missing_transcription() {
        let err = parse_reply(r#"{"action": [{"text": "hi"}]}"#).unwrap_err();
        assert!(matches!(err, ParrotError::ReplyError(_)));
    }

    #[test]
    fn test_client_keeps_endpoint() {
        let client = BackendClient::new("http://127.0.0.1:8000/process-audio/");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8000/process-audio/");
    }
}
