//! The responding side of a pairing session.

use std::collections::HashSet;
use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
use soundpair_fingerprint::{AudioSignal, CandidateGenerator};
use soundpair_fuzzy::{CommitmentBlob, FuzzyCommitment, SharedKey};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::audio::AudioSource;
use crate::clock::{AlwaysInSync, ClockSync};
use crate::logger::{Logger, default_logger, for_peer};
use crate::search::{Reconciliation, reconcile, worker_pool};
use crate::{
    AcceptorConn, ConnError, PairingError, PairingState, Request, Response, SecureChannel,
    SessionConfig, log_debug, log_error, log_info, log_warn,
};

/// Capacity of the decrypted message inbox.
const INBOX_CAPACITY: usize = 32;

type Handled = (Response, Option<PairingError>);

/// Answers one requester's handshake.
///
/// Only devices on the allow-list are accepted; the list starts empty.
/// Requests that do not fit the current state are answered with
/// [`Response::Rejected`] and leave the state unchanged.
pub struct Acceptor {
    config: SessionConfig,
    source: Arc<dyn AudioSource>,
    clock: Arc<dyn ClockSync>,
    logger: Arc<dyn Logger>,
    allowed: HashSet<String>,
    fuzzy: Arc<FuzzyCommitment>,
    generator: Arc<CandidateGenerator>,

    state: PairingState,
    peer: Option<String>,
    recording: Option<AudioSignal>,
    reconciliation: Option<Reconciliation>,
    key: Option<SharedKey>,
    channel: Option<SecureChannel>,

    inbox_tx: mpsc::Sender<Vec<u8>>,
    inbox_rx: Option<mpsc::Receiver<Vec<u8>>>,
}

impl Acceptor {
    pub fn new(config: SessionConfig, source: Arc<dyn AudioSource>) -> Result<Self, PairingError> {
        config.validate()?;
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        Ok(Self {
            fuzzy: Arc::new(config.commitment()?),
            generator: Arc::new(config.candidate_generator()?),
            config,
            source,
            clock: Arc::new(AlwaysInSync),
            logger: default_logger("acceptor"),
            allowed: HashSet::new(),
            state: PairingState::Init,
            peer: None,
            recording: None,
            reconciliation: None,
            key: None,
            channel: None,
            inbox_tx,
            inbox_rx: Some(inbox_rx),
        })
    }

    /// Adds devices to the allow-list.
    pub fn with_allowed_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed.extend(devices.into_iter().map(Into::into));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn ClockSync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    /// The accepted requester's device id.
    pub fn peer(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    pub fn shared_key(&self) -> Option<&SharedKey> {
        self.key.as_ref()
    }

    /// The candidate that opened the requester's commitment.
    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        self.reconciliation.as_ref()
    }

    pub fn channel(&self) -> Option<&SecureChannel> {
        self.channel.as_ref()
    }

    /// Takes the receiver of decrypted application messages.
    pub fn take_inbox(&mut self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.inbox_rx.take()
    }

    /// Serves requests until the requester closes, `cancel` fires, or the
    /// session reaches a failure exit.
    ///
    /// Returns the final state when the requester closes before connecting
    /// or after the session ended. Failure exits are reported as errors
    /// after the corresponding response was sent; a close in the middle of
    /// the handshake takes the current step's failure exit.
    pub async fn serve<C>(&mut self, conn: &C, cancel: CancellationToken) -> Result<PairingState, PairingError>
    where
        C: AcceptorConn + ?Sized,
    {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    log_info!(self.logger, "acceptor cancelled in state {}", self.state);
                    return Ok(self.state);
                }
                received = conn.recv_request() => received,
            };
            let request = match received {
                Ok(Some(request)) => request,
                Ok(None) if self.state == PairingState::Init || self.state.is_terminal() => {
                    log_info!(self.logger, "requester closed in state {}", self.state);
                    return Ok(self.state);
                }
                // Closing mid-handshake abandons the session.
                Ok(None) => return Err(self.fail(ConnError::Closed.into())),
                Err(e) => return Err(self.fail(e.into())),
            };

            log_debug!(self.logger, "received {} in state {}", request.name(), self.state);
            let (response, fatal) = self.handle(request).await;
            if let Err(e) = conn.send_response(response).await {
                return Err(self.fail(e.into()));
            }
            if let Some(err) = fatal {
                log_error!(self.logger, "acceptor stopped in state {}: {err}", self.state);
                return Err(err);
            }
        }
    }

    async fn handle(&mut self, request: Request) -> Handled {
        match request {
            Request::Connection { device_id } => self.on_connection(device_id).await,
            Request::Recording { start_time_ms } => self.on_recording(start_time_ms).await,
            Request::Agreement { blob } => self.on_agreement(blob).await,
            Request::OpenChannel => self.on_open_channel(),
            Request::Message {
                handle,
                nonce,
                ciphertext,
            } => self.on_message(handle, &nonce, &ciphertext),
        }
    }

    async fn on_connection(&mut self, device_id: String) -> Handled {
        if self.state != PairingState::Init {
            return self.out_of_order("connection");
        }
        self.advance(PairingState::Connecting);
        log_info!(self.logger, "1. connection request from {device_id}");

        if !self.allowed.contains(&device_id) {
            self.advance(PairingState::Denied);
            let err = PairingError::ConnectionDenied(format!("device {device_id} is not allowed"));
            return (Response::Connection { accepted: false }, Some(err));
        }
        if self.config.check_clock && !self.clock.in_sync().await {
            self.advance(PairingState::Denied);
            return (
                Response::Connection { accepted: false },
                Some(PairingError::ClockOutOfSync),
            );
        }
        self.logger = for_peer(self.logger.clone(), &device_id);
        self.peer = Some(device_id);
        (Response::Connection { accepted: true }, None)
    }

    async fn on_recording(&mut self, start_time_ms: i64) -> Handled {
        if self.state != PairingState::Connecting {
            return self.out_of_order("recording");
        }
        self.advance(PairingState::Recording);
        log_info!(
            self.logger,
            "2. recording from {start_time_ms} for {}ms",
            self.config.capture_duration_ms
        );

        let failed = |err: PairingError| (Response::Recording { success: false }, Some(err));
        let signal = match self
            .source
            .capture(start_time_ms, self.config.capture_duration())
            .await
        {
            Ok(signal) => signal,
            Err(e) => {
                self.advance(PairingState::RecordingFailed);
                return failed(PairingError::RecordingFailed(e.to_string()));
            }
        };

        let plan = match self.generator.extractor().plan(signal.sample_rate()) {
            Ok(plan) => plan,
            Err(e) => {
                self.advance(PairingState::RecordingFailed);
                return failed(PairingError::RecordingFailed(e.to_string()));
            }
        };
        let needed = self.generator.extractor().required_samples(&plan);
        if signal.len() < needed {
            self.advance(PairingState::RecordingFailed);
            return failed(PairingError::RecordingFailed(format!(
                "captured {} samples, need {needed}",
                signal.len()
            )));
        }

        self.recording = Some(signal);
        self.advance(PairingState::Agreeing);
        (Response::Recording { success: true }, None)
    }

    async fn on_agreement(&mut self, blob: CommitmentBlob) -> Handled {
        let signal = match (&self.recording, &self.reconciliation) {
            (Some(signal), None) if self.state == PairingState::Agreeing => signal.clone(),
            _ => return self.out_of_order("agreement"),
        };
        let failed = |err: PairingError| (Response::Agreement { accepted: false }, Some(err));

        if let Err(e) = blob.validate(&self.config.code) {
            self.advance(PairingState::AgreementFailed);
            return failed(e.into());
        }

        let count = self.generator.count();
        log_info!(self.logger, "3. searching {count} candidates");
        let fuzzy = self.fuzzy.clone();
        let generator = self.generator.clone();
        let logger = self.logger.clone();
        let workers = self.config.max_workers;
        let searched = tokio::task::spawn_blocking(move || {
            let pool = worker_pool(workers)?;
            reconcile(&pool, &*fuzzy, &*generator, &signal, &blob, &logger)
        })
        .await
        .unwrap_or_else(|e| Err(PairingError::WorkerPool(e.to_string())));

        let found = match searched {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.advance(PairingState::AgreementFailed);
                log_warn!(self.logger, "none of {count} candidates opened the commitment");
                return failed(PairingError::AgreementFailed);
            }
            Err(e) => {
                self.advance(PairingState::AgreementFailed);
                return failed(e);
            }
        };
        let key = match SharedKey::derive(&found.codeword) {
            Ok(key) => key,
            Err(e) => {
                self.advance(PairingState::AgreementFailed);
                return failed(e.into());
            }
        };

        log_info!(
            self.logger,
            "4. candidate {} (shift {}) opened the commitment with {} corrections",
            found.candidate,
            found.shift,
            found.corrected.len()
        );
        self.key = Some(key);
        self.reconciliation = Some(found);
        (Response::Agreement { accepted: true }, None)
    }

    fn on_open_channel(&mut self) -> Handled {
        let Some(key) = self.key.as_ref().filter(|_| self.state == PairingState::Agreeing) else {
            return self.out_of_order("open_channel");
        };
        let handle = OsRng.next_u64();
        self.channel = Some(SecureChannel::new(handle, key));
        self.advance(PairingState::Established);
        log_info!(self.logger, "5. established, channel {handle}");
        (Response::ChannelGranted { handle }, None)
    }

    fn on_message(&self, handle: u64, nonce: &[u8], ciphertext: &[u8]) -> Handled {
        let Some(channel) = self.channel.as_ref() else {
            return self.out_of_order("message");
        };
        let plaintext = match channel.open(handle, nonce, ciphertext) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                log_warn!(self.logger, "dropping message: {e}");
                return (Response::MessageAck { accepted: false }, None);
            }
        };
        match self.inbox_tx.try_send(plaintext) {
            Ok(()) => (Response::MessageAck { accepted: true }, None),
            Err(TrySendError::Full(_)) => {
                log_warn!(self.logger, "inbox full, dropping message");
                (Response::MessageAck { accepted: false }, None)
            }
            Err(TrySendError::Closed(_)) => {
                log_warn!(self.logger, "inbox closed, dropping message");
                (Response::MessageAck { accepted: false }, None)
            }
        }
    }

    fn out_of_order(&self, name: &str) -> Handled {
        log_warn!(self.logger, "rejecting {name} in state {}", self.state);
        (
            Response::rejected(format!("{name} is not valid in state {}", self.state)),
            None,
        )
    }

    fn advance(&mut self, next: PairingState) {
        debug_assert!(self.state.can_advance_to(next), "{} -> {next}", self.state);
        self.state = next;
    }

    fn fail(&mut self, err: PairingError) -> PairingError {
        if let Some(exit) = self.state.failure() {
            self.state = exit;
        }
        log_error!(self.logger, "acceptor stopped in state {}: {err}", self.state);
        err
    }
}
