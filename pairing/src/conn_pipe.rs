//! In-memory pipe connection.
//!
//! Connects a requester and an acceptor in the same process without a
//! network, for tests and the CLI's local pairing mode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, mpsc};

use crate::{AcceptorConn, ConnError, Request, RequesterConn, Response};

/// Creates a connected pair of acceptor and requester connections.
pub fn new_pipe() -> (PipeAcceptorConn, PipeRequesterConn) {
    let (request_tx, request_rx) = mpsc::channel::<Request>(1);
    let (response_tx, response_rx) = mpsc::channel::<Response>(1);
    let shared = Arc::new(RwLock::new(PipeSharedState::default()));

    let acceptor = PipeAcceptorConn {
        requests: Mutex::new(request_rx),
        responses: Mutex::new(Some(response_tx)),
        shared: shared.clone(),
    };
    let requester = PipeRequesterConn {
        requests: Mutex::new(Some(request_tx)),
        responses: Mutex::new(response_rx),
        shared,
        timeout: None,
    };
    (acceptor, requester)
}

/// Close reasons recorded by either side.
#[derive(Default)]
struct PipeSharedState {
    acceptor_err: Option<String>,
    requester_err: Option<String>,
}

/// Acceptor side of a pipe connection.
pub struct PipeAcceptorConn {
    requests: Mutex<mpsc::Receiver<Request>>,
    responses: Mutex<Option<mpsc::Sender<Response>>>,
    shared: Arc<RwLock<PipeSharedState>>,
}

impl PipeAcceptorConn {
    /// Closes the connection, recording `err` for the requester's next call.
    pub async fn close_with_error(&self, err: Option<String>) -> Result<(), ConnError> {
        let mut responses = self.responses.lock().await;
        if responses.is_none() {
            return Ok(());
        }
        self.shared.write().await.acceptor_err = err;
        responses.take();
        Ok(())
    }
}

#[async_trait]
impl AcceptorConn for PipeAcceptorConn {
    async fn recv_request(&self) -> Result<Option<Request>, ConnError> {
        let mut rx = self.requests.lock().await;
        match rx.recv().await {
            Some(request) => Ok(Some(request)),
            None => {
                let shared = self.shared.read().await;
                match shared.requester_err {
                    Some(ref err) => Err(ConnError::ReceiveFailed(err.clone())),
                    None => Ok(None),
                }
            }
        }
    }

    async fn send_response(&self, response: Response) -> Result<(), ConnError> {
        let tx = self.responses.lock().await.clone().ok_or(ConnError::Closed)?;
        tx.send(response)
            .await
            .map_err(|e| ConnError::SendFailed(e.to_string()))
    }

    async fn close(&self) -> Result<(), ConnError> {
        self.close_with_error(None).await
    }
}

/// Requester side of a pipe connection.
pub struct PipeRequesterConn {
    requests: Mutex<Option<mpsc::Sender<Request>>>,
    responses: Mutex<mpsc::Receiver<Response>>,
    shared: Arc<RwLock<PipeSharedState>>,
    timeout: Option<Duration>,
}

impl PipeRequesterConn {
    /// Fails calls whose response takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Closes the connection, recording `err` for the acceptor's next receive.
    pub async fn close_with_error(&self, err: Option<String>) -> Result<(), ConnError> {
        let mut requests = self.requests.lock().await;
        if requests.is_none() {
            return Ok(());
        }
        self.shared.write().await.requester_err = err;
        requests.take();
        Ok(())
    }

    async fn closed_error(&self) -> ConnError {
        match self.shared.read().await.acceptor_err {
            Some(ref err) => ConnError::ReceiveFailed(err.clone()),
            None => ConnError::Closed,
        }
    }
}

#[async_trait]
impl RequesterConn for PipeRequesterConn {
    async fn call(&self, request: Request) -> Result<Response, ConnError> {
        // Holding the receiver for the whole call keeps calls single-flight.
        let mut rx = self.responses.lock().await;
        let tx = self.requests.lock().await.clone().ok_or(ConnError::Closed)?;
        tx.send(request)
            .await
            .map_err(|e| ConnError::SendFailed(e.to_string()))?;
        drop(tx);

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, rx.recv())
                .await
                .map_err(|_| ConnError::Timeout)?,
            None => rx.recv().await,
        };
        match response {
            Some(response) => Ok(response),
            None => Err(self.closed_error().await),
        }
    }

    async fn close(&self) -> Result<(), ConnError> {
        self.close_with_error(None).await
    }
}
