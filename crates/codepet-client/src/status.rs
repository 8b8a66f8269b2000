//! Status client: one QUERY or ACTION round trip.
//!
//! Unlike the hook client, failures here surface to the caller: a human
//! asked for the status and deserves the error.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::net::UnixStream;
use tokio::time::timeout;

use codepet_protocol::WireMessage;
use codepet_wire::{read_frame, write_frame};

use crate::{ClientError, STEP_TIMEOUT};

pub struct StatusClient {
    socket: PathBuf,
}

impl StatusClient {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
        }
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    pub async fn query(&self, query: &str) -> Result<Value, ClientError> {
        self.round_trip(WireMessage::Query {
            query: query.to_owned(),
        })
        .await
    }

    pub async fn action(&self, action: &str, data: Value) -> Result<Value, ClientError> {
        self.round_trip(WireMessage::Action {
            action: action.to_owned(),
            data,
        })
        .await
    }

    /// QUERY/ACTION responses are framed JSON, so a full length-prefixed
    /// read is correct here (the event path instead reads a raw ack).
    async fn round_trip(&self, message: WireMessage) -> Result<Value, ClientError> {
        if !self.socket.exists() {
            return Err(ClientError::NotRunning);
        }
        let mut stream = timeout(STEP_TIMEOUT, UnixStream::connect(&self.socket))
            .await
            .map_err(|_| ClientError::Timeout("connect"))??;

        let payload = serde_json::to_vec(&message.encode())?;
        timeout(STEP_TIMEOUT, write_frame(&mut stream, &payload))
            .await
            .map_err(|_| ClientError::Timeout("write"))??;

        let response = timeout(STEP_TIMEOUT, read_frame(&mut stream))
            .await
            .map_err(|_| ClientError::Timeout("response"))??;
        match response {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(ClientError::ClosedEarly),
        }
    }
}
