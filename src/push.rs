// src/push.rs

use crate::types::ChangeEvent;
use async_trait::async_trait;
use socketioxide::SocketIo;
use thiserror::Error;

pub const CONFIGURATION_UPDATE_EVENT: &str = "configuration_update";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Client {0} is no longer connected")]
    ClientGone(String),
    #[error("Failed to send: {0}")]
    Send(String),
}

/// Outbound path from the server to one connected client.
#[async_trait]
pub trait ClientChannel: Send + Sync {
    async fn send(&self, client_id: &str, event: &ChangeEvent) -> Result<(), PushError>;
}

/// Pushes over Socket.IO. Every socket joins a private room named after its
/// own id when it connects, so a client id doubles as a room name.
#[derive(Clone)]
pub struct SocketIoChannel {
    io: SocketIo,
}

impl SocketIoChannel {
    pub fn new(io: SocketIo) -> Self {
        Self { io }
    }
}

#[async_trait]
impl ClientChannel for SocketIoChannel {
    async fn send(&self, client_id: &str, event: &ChangeEvent) -> Result<(), PushError> {
        self.io
            .to(client_id.to_string())
            .emit(CONFIGURATION_UPDATE_EVENT, event)
            .await
            .map_err(|e| PushError::Send(e.to_string()))
    }
}
