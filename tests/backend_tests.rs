//! Integration tests for the backend client against a local mock server
//!
//! The mock mirrors the real `/process-audio/` endpoint: it accepts a
//! multipart upload and answers with the JSON shapes the backend produces,
//! including its HTTP-200 error bodies.

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use parrot::audio::write_wav;
use parrot::net::BackendClient;
use parrot::ParrotError;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Bind the router on an ephemeral port and serve in the background
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve mock");
    });
    addr
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{}/process-audio/", addr)
}

/// Write a short sine capture to a temp file, as the recorder would
fn capture_fixture(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("capture.wav");
    let samples: Vec<f32> = (0..4410)
        .map(|i| (i as f32 * 0.05).sin() * 0.5)
        .collect();
    write_wav(&path, &samples, 44_100, 1).expect("write fixture");
    path
}

/// Handler asserting the multipart contract before answering
async fn process_audio_ok(mut multipart: Multipart) -> impl IntoResponse {
    while let Some(field) = multipart.next_field().await.expect("read field") {
        if field.name() == Some("file") {
            assert_eq!(field.file_name(), Some("audio.wav"));
            assert_eq!(field.content_type(), Some("audio/wav"));
            let bytes = field.bytes().await.expect("read bytes");
            assert!(!bytes.is_empty(), "upload carried no audio");
            // WAV magic: the client ships the file untouched
            assert_eq!(&bytes[..4], b"RIFF");

            return Json(json!({
                "transcription": "hello",
                "action": [{"text": "hi"}]
            }))
            .into_response();
        }
    }
    (StatusCode::BAD_REQUEST, "missing file field").into_response()
}

#[tokio::test]
async fn test_successful_exchange() {
    let addr = serve(Router::new().route("/process-audio/", post(process_audio_ok))).await;
    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let reply = client.send(&path).await.unwrap();

    assert_eq!(reply.transcription, "hello");
    assert_eq!(reply.response.as_deref(), Some("hi"));
}

#[tokio::test]
async fn test_empty_action_list_is_success_without_response() {
    let addr = serve(Router::new().route(
        "/process-audio/",
        post(|_: Multipart| async {
            Json(json!({"transcription": "bonjour", "action": []}))
        }),
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let reply = client.send(&path).await.unwrap();

    assert_eq!(reply.transcription, "bonjour");
    assert!(reply.response.is_none());
}

#[tokio::test]
async fn test_http_error_status_fails_the_exchange() {
    let addr = serve(Router::new().route(
        "/process-audio/",
        post(|_: Multipart| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "boom")
        }),
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let err = client.send(&path).await.unwrap_err();

    assert!(matches!(err, ParrotError::ServerError(_)));
    assert!(err.to_string().contains("500"));
    assert_eq!(err.user_message(), "Échec de l'envoi de l'audio au backend.");
}

#[tokio::test]
async fn test_malformed_json_reply_fails_without_panicking() {
    let addr = serve(Router::new().route(
        "/process-audio/",
        post(|_: Multipart| async { "<html>not json</html>" }),
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let err = client.send(&path).await.unwrap_err();

    assert!(matches!(err, ParrotError::ReplyError(_)));
}

#[tokio::test]
async fn test_error_body_under_http_200_is_a_failure() {
    // The real backend wraps internal failures in a 200 with an error field
    let addr = serve(Router::new().route(
        "/process-audio/",
        post(|_: Multipart| async {
            Json(json!({"error": "whisper failed"}))
        }),
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let err = client.send(&path).await.unwrap_err();

    assert!(matches!(err, ParrotError::ServerError(_)));
    assert!(err.to_string().contains("whisper failed"));
}

#[tokio::test]
async fn test_action_without_text_is_success_without_response() {
    let addr = serve(Router::new().route(
        "/process-audio/",
        post(|_: Multipart| async {
            Json(json!({"transcription": "bonjour", "action": [{"image": "x.png"}]}))
        }),
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let reply = client.send(&path).await.unwrap();

    assert!(reply.response.is_none());
}

#[tokio::test]
async fn test_unreachable_backend_is_an_upload_error() {
    // Bind a listener to reserve a port, then drop it before connecting
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let path = capture_fixture(&dir);

    let client = BackendClient::new(endpoint(addr));
    let err = client.send(&path).await.unwrap_err();

    assert!(matches!(err, ParrotError::UploadError(_)));
    assert_eq!(err.user_message(), "Échec de l'envoi de l'audio au backend.");
}

#[tokio::test]
async fn test_missing_capture_file_is_an_upload_error() {
    let client = BackendClient::new("http://127.0.0.1:1/process-audio/");
    let err = client
        .send(&PathBuf::from("/nonexistent/capture.wav"))
        .await
        .unwrap_err();

    assert!(matches!(err, ParrotError::UploadError(_)));
}
