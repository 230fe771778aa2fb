//! Upload worker thread
//!
//! Owns a tokio runtime so the blocking orchestrator loop and the UI thread
//! never touch the network. One upload runs at a time; the orchestrator's
//! phase guard ensures no second capture arrives while one is in flight.

use crate::net::client::{BackendClient, ExchangeReply};
use crate::{ParrotError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// Configuration for the upload worker
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    /// Backend endpoint receiving the capture
    pub endpoint: String,
    /// Channel buffer size
    pub channel_buffer_size: usize,
}

impl UploaderConfig {
    /// Create a configuration for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel_buffer_size: 16,
        }
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

/// Commands sent to the upload worker
#[derive(Clone, Debug)]
pub enum UploadCommand {
    /// Upload the capture at the given path
    Upload(PathBuf),
    /// Shutdown the worker
    Shutdown,
}

/// Events emitted by the upload worker
#[derive(Clone, Debug)]
pub enum UploadEvent {
    /// Upload started
    Started,
    /// Exchange completed successfully
    Complete(ExchangeReply),
    /// Exchange failed
    Error(ParrotError),
    /// Worker shut down
    Shutdown,
}

/// Handle for interacting with a running upload worker
pub struct UploadHandle {
    command_tx: Sender<UploadCommand>,
    event_rx: Receiver<UploadEvent>,
    worker_handle: Option<JoinHandle<()>>,
}

impl UploadHandle {
    /// Request an upload of the given capture file
    pub fn upload(&self, path: PathBuf) -> Result<()> {
        self.command_tx
            .send(UploadCommand::Upload(path))
            .map_err(|e| ParrotError::ChannelError(format!("Failed to send upload command: {}", e)))
    }

    /// Get a receiver for worker events
    pub fn event_receiver(&self) -> Receiver<UploadEvent> {
        self.event_rx.clone()
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<UploadEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Shutdown the worker and join its thread
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.command_tx.send(UploadCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| ParrotError::ChannelError("Upload worker thread panicked".into()))?;
        }
        Ok(())
    }

    /// Get a sender for commands (used by the orchestrator's shutdown path)
    pub fn command_sender(&self) -> Sender<UploadCommand> {
        self.command_tx.clone()
    }
}

/// Upload worker that spawns a thread with its own tokio runtime
pub struct Uploader {
    config: UploaderConfig,
}

impl Uploader {
    /// Create a new uploader with the given configuration
    pub fn new(config: UploaderConfig) -> Self {
        Self { config }
    }

    /// Start the upload worker thread
    ///
    /// Returns a handle for sending commands and receiving events.
    pub fn start_worker(self) -> Result<UploadHandle> {
        let (command_tx, command_rx) = bounded::<UploadCommand>(self.config.channel_buffer_size);
        let (event_tx, event_rx) = bounded::<UploadEvent>(self.config.channel_buffer_size);

        let config = self.config.clone();

        let worker_handle = std::thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create tokio runtime: {}", e);
                    let _ = event_tx.send(UploadEvent::Error(ParrotError::ChannelError(format!(
                        "Failed to create runtime: {}",
                        e
                    ))));
                    let _ = event_tx.send(UploadEvent::Shutdown);
                    return;
                }
            };

            runtime.block_on(async move {
                worker_loop(config, command_rx, event_tx).await;
            });
        });

        Ok(UploadHandle {
            command_tx,
            event_rx,
            worker_handle: Some(worker_handle),
        })
    }
}

/// Main worker loop handling upload commands
async fn worker_loop(
    config: UploaderConfig,
    command_rx: Receiver<UploadCommand>,
    event_tx: Sender<UploadEvent>,
) {
    info!("Upload worker starting, endpoint: {}", config.endpoint);

    let client = BackendClient::new(config.endpoint);

    loop {
        let command = match command_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => {
                info!("Command channel closed, shutting down");
                break;
            }
        };

        match command {
            UploadCommand::Upload(path) => {
                if event_tx.send(UploadEvent::Started).is_err() {
                    error!("Event channel closed");
                    break;
                }

                let result = client.send(&path).await;

                // The capture is a throwaway artifact once the exchange ends
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Failed to remove capture file {:?}: {}", path, e);
                }

                let event = match result {
                    Ok(reply) => {
                        info!(
                            "Exchange complete: transcription {} chars, response: {}",
                            reply.transcription.len(),
                            reply.response.is_some()
                        );
                        UploadEvent::Complete(reply)
                    }
                    Err(e) => {
                        error!("Exchange failed: {}", e);
                        UploadEvent::Error(e)
                    }
                };

                if event_tx.send(event).is_err() {
                    error!("Event channel closed");
                    break;
                }
            }

            UploadCommand::Shutdown => {
                info!("Received shutdown command");
                break;
            }
        }
    }

    let _ = event_tx.send(UploadEvent::Shutdown);
    info!("Upload worker shutdown complete");
}
