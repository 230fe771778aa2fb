//! Backend exchange
//!
//! One multipart POST per utterance: the capture goes up as the `file`
//! field, transcription and response text come back as JSON. The upload
//! runs on its own worker thread so the UI never waits on the network.

pub mod client;
pub mod uploader;

pub use client::{parse_reply, ActionItem, BackendClient, ExchangeReply};
pub use uploader::{UploadCommand, UploadEvent, UploadHandle, Uploader, UploaderConfig};
