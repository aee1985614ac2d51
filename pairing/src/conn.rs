//! Transport traits for the pairing handshake.

use async_trait::async_trait;

use crate::{Request, Response};

/// Error type for connection operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnError {
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    #[error("timeout")]
    Timeout,
}

/// Requester side: single-flight request/response calls.
#[async_trait]
pub trait RequesterConn: Send + Sync {
    /// Sends `request` and waits for its response. Calls never interleave.
    async fn call(&self, request: Request) -> Result<Response, ConnError>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), ConnError>;
}

/// Acceptor side: receives requests and answers each in turn.
#[async_trait]
pub trait AcceptorConn: Send + Sync {
    /// Receives the next request.
    /// Returns Ok(None) when the requester closed the connection normally.
    async fn recv_request(&self) -> Result<Option<Request>, ConnError>;

    /// Answers the most recently received request.
    async fn send_response(&self, response: Response) -> Result<(), ConnError>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), ConnError>;
}
