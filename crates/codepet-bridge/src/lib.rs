//! Unix-socket event bridge.
//!
//! One listening endpoint, one accept loop, one cooperative task per
//! connection. Within a connection, frames are handled strictly in
//! arrival order: the next frame is read only after the previous reply is
//! fully written. Connections fail independently; the bridge itself
//! survives any client misbehavior.
//!
//! Swallowed per-connection failures go to an injected [`ErrorSink`]
//! rather than vanishing, so tests can assert on them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use codepet_protocol::{ClaudeEvent, WireMessage};
use codepet_wire::{FrameError, ReplyWriter, read_frame};

/// Receives wire events. May suspend; the bridge awaits completion before
/// acking, which is what serializes events within a connection.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, event: ClaudeEvent) -> anyhow::Result<()>;
}

/// Answers `QUERY` messages. Must return a JSON object; it is framed and
/// written back verbatim.
pub trait QueryHandler: Send + Sync {
    fn handle_query(&self, query: &str) -> Value;
}

/// Answers `ACTION` messages.
pub trait ActionHandler: Send + Sync {
    fn handle_action(&self, action: &str, data: &Value) -> Value;
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed binding socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(std::io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("event handler failed: {0}")]
    Handler(String),
}

/// Where swallowed connection errors go.
pub trait ErrorSink: Send + Sync {
    fn record(&self, error: &BridgeError);
}

/// Default sink: structured log, nothing else.
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn record(&self, error: &BridgeError) {
        warn!(%error, "connection error swallowed");
    }
}

/// Test-friendly sink that keeps every recorded error.
#[derive(Default)]
pub struct CollectingErrorSink {
    errors: parking_lot::Mutex<Vec<String>>,
}

impl CollectingErrorSink {
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.errors.lock())
    }
}

impl ErrorSink for CollectingErrorSink {
    fn record(&self, error: &BridgeError) {
        self.errors.lock().push(error.to_string());
    }
}

#[derive(Clone)]
struct Handlers {
    event: Option<Arc<dyn EventSink>>,
    query: Option<Arc<dyn QueryHandler>>,
    action: Option<Arc<dyn ActionHandler>>,
}

pub struct EventBridgeBuilder {
    socket_path: PathBuf,
    handlers: Handlers,
    errors: Arc<dyn ErrorSink>,
}

impl EventBridgeBuilder {
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.handlers.event = Some(sink);
        self
    }

    pub fn query_handler(mut self, handler: Arc<dyn QueryHandler>) -> Self {
        self.handlers.query = Some(handler);
        self
    }

    pub fn action_handler(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.handlers.action = Some(handler);
        self
    }

    pub fn error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.errors = sink;
        self
    }

    pub fn build(self) -> EventBridge {
        EventBridge {
            socket_path: self.socket_path,
            handlers: self.handlers,
            errors: self.errors,
        }
    }
}

pub struct EventBridge {
    socket_path: PathBuf,
    handlers: Handlers,
    errors: Arc<dyn ErrorSink>,
}

impl EventBridge {
    pub fn builder(socket_path: impl Into<PathBuf>) -> EventBridgeBuilder {
        EventBridgeBuilder {
            socket_path: socket_path.into(),
            handlers: Handlers {
                event: None,
                query: None,
                action: None,
            },
            errors: Arc::new(LogErrorSink),
        }
    }

    /// Bind and start serving. Any stale socket file is unlinked first;
    /// a crashed prior instance must not block startup. A second live
    /// instance therefore silently takes the path over; there is no
    /// single-instance lock.
    pub fn serve(self) -> Result<BridgeHandle, BridgeError> {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
        let listener =
            UnixListener::bind(&self.socket_path).map_err(|source| BridgeError::Bind {
                path: self.socket_path.clone(),
                source,
            })?;
        info!(path = %self.socket_path.display(), "event bridge listening");

        let (stop_tx, stop_rx) = watch::channel(false);
        let socket_path = self.socket_path.clone();
        let task = tokio::spawn(run_accept_loop(
            listener,
            self.handlers,
            self.errors,
            stop_rx,
            socket_path,
        ));

        Ok(BridgeHandle {
            stop: stop_tx,
            task,
            socket_path: self.socket_path,
        })
    }
}

/// Running bridge. Shutting down stops the accept loop, aborts live
/// connections, and unlinks the socket file.
pub struct BridgeHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
    socket_path: PathBuf,
}

impl BridgeHandle {
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

async fn run_accept_loop(
    listener: UnixListener,
    handlers: Handlers,
    errors: Arc<dyn ErrorSink>,
    mut stop: watch::Receiver<bool>,
    socket_path: PathBuf,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = stop.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let handlers = handlers.clone();
                    let errors = errors.clone();
                    connections.spawn(async move {
                        if let Err(error) = handle_connection(stream, handlers).await {
                            errors.record(&error);
                        }
                    });
                }
                Err(error) => errors.record(&BridgeError::Accept(error)),
            },
        }
    }

    connections.abort_all();
    while connections.join_next().await.is_some() {}
    drop(listener);
    let _ = std::fs::remove_file(&socket_path);
    info!(path = %socket_path.display(), "event bridge stopped");
}

async fn handle_connection(
    mut stream: UnixStream,
    handlers: Handlers,
) -> Result<(), BridgeError> {
    loop {
        let payload = match read_frame(&mut stream).await? {
            Some(payload) => payload,
            None => return Ok(()),
        };

        let mut reply = ReplyWriter::new(&mut stream);
        let value: Value = match serde_json::from_slice(&payload) {
            Ok(value) => value,
            Err(error) => {
                // Malformed payload: tell the client and keep the
                // connection alive for its next attempt.
                debug!(%error, "frame payload is not JSON");
                reply.write_err().await?;
                continue;
            }
        };

        match WireMessage::classify(value) {
            WireMessage::Query { query } => match &handlers.query {
                Some(handler) => {
                    let result = handler.handle_query(&query);
                    reply.write_framed(&result).await?;
                }
                None => reply.write_ack().await?,
            },
            WireMessage::Action { action, data } => match &handlers.action {
                Some(handler) => {
                    let result = handler.handle_action(&action, &data);
                    reply.write_framed(&result).await?;
                }
                None => reply.write_ack().await?,
            },
            WireMessage::Event(event) => {
                if let Some(sink) = &handlers.event {
                    sink.on_event(event)
                        .await
                        .map_err(|error| BridgeError::Handler(error.to_string()))?;
                }
                reply.write_ack().await?;
            }
        }
    }
}
