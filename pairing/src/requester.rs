//! The initiating side of a pairing session.

use std::sync::Arc;

use soundpair_fingerprint::Extractor;
use soundpair_fuzzy::{Codeword, FuzzyCommitment, SharedKey};

use crate::audio::AudioSource;
use crate::clock::{AlwaysInSync, ClockSync, now_ms};
use crate::logger::{Logger, default_logger};
use crate::{
    PairingError, PairingState, Request, RequesterConn, Response, SecureChannel, SessionConfig,
    log_error, log_info,
};

/// Result of a successful pairing.
#[derive(Debug, Clone)]
pub struct Established {
    pub key: SharedKey,
    pub channel: SecureChannel,
}

/// Drives the handshake from the initiating device.
///
/// A requester is single-shot: once [`Requester::pair`] has run, the
/// session is in a terminal state and a new requester is needed to retry.
pub struct Requester {
    config: SessionConfig,
    device_id: String,
    source: Arc<dyn AudioSource>,
    clock: Arc<dyn ClockSync>,
    logger: Arc<dyn Logger>,
    extractor: Extractor,
    fuzzy: FuzzyCommitment,
    state: PairingState,
    codeword: Option<Codeword>,
}

impl Requester {
    pub fn new(
        config: SessionConfig,
        device_id: impl Into<String>,
        source: Arc<dyn AudioSource>,
    ) -> Result<Self, PairingError> {
        config.validate()?;
        Ok(Self {
            extractor: config.extractor()?,
            fuzzy: config.commitment()?,
            config,
            device_id: device_id.into(),
            source,
            clock: Arc::new(AlwaysInSync),
            logger: default_logger("requester"),
            state: PairingState::Init,
            codeword: None,
        })
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

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// The committed codeword, once the acceptor accepted the agreement.
    pub fn codeword(&self) -> Option<&Codeword> {
        self.codeword.as_ref()
    }

    /// Runs the handshake to completion.
    ///
    /// On error the session is left in the failure exit of the step that
    /// failed.
    pub async fn pair<C>(&mut self, conn: &C) -> Result<Established, PairingError>
    where
        C: RequesterConn + ?Sized,
    {
        if self.state != PairingState::Init {
            return Err(PairingError::AlreadyStarted(self.state));
        }
        match self.run(conn).await {
            Ok(established) => Ok(established),
            Err(err) => {
                if let Some(exit) = self.state.failure() {
                    self.state = exit;
                }
                log_error!(self.logger, "requester stopped in state {}: {err}", self.state);
                Err(err)
            }
        }
    }

    async fn run<C>(&mut self, conn: &C) -> Result<Established, PairingError>
    where
        C: RequesterConn + ?Sized,
    {
        if self.config.check_clock && !self.clock.in_sync().await {
            return Err(PairingError::ClockOutOfSync);
        }

        self.advance(PairingState::Connecting);
        log_info!(self.logger, "1. requesting connection as {}", self.device_id);
        match conn
            .call(Request::Connection {
                device_id: self.device_id.clone(),
            })
            .await?
        {
            Response::Connection { accepted: true } => {}
            Response::Connection { accepted: false } => {
                return Err(PairingError::ConnectionDenied(format!(
                    "acceptor denied {}",
                    self.device_id
                )));
            }
            other => return Err(unexpected("connection", other)),
        }

        self.advance(PairingState::Recording);
        let start_time_ms = now_ms() + self.config.lead_time().as_millis() as i64;
        log_info!(
            self.logger,
            "2. recording from {start_time_ms} for {}ms",
            self.config.capture_duration_ms
        );
        let (local, remote) = tokio::join!(
            self.source.capture(start_time_ms, self.config.capture_duration()),
            conn.call(Request::Recording { start_time_ms }),
        );
        let recording = local.map_err(|e| PairingError::RecordingFailed(e.to_string()))?;
        match remote? {
            Response::Recording { success: true } => {}
            Response::Recording { success: false } => {
                return Err(PairingError::RecordingFailed("acceptor failed to record".into()));
            }
            other => return Err(unexpected("recording", other)),
        }
        let fingerprint = self.extractor.extract(&recording)?;

        self.advance(PairingState::Agreeing);
        log_info!(self.logger, "3. committing to {}-bit fingerprint", fingerprint.len());
        let commitment = self.fuzzy.commit(&fingerprint.to_symbols())?;
        match conn
            .call(Request::Agreement {
                blob: commitment.blob,
            })
            .await?
        {
            Response::Agreement { accepted: true } => {}
            Response::Agreement { accepted: false } => return Err(PairingError::AgreementFailed),
            other => return Err(unexpected("agreement", other)),
        }
        let key = SharedKey::derive(&commitment.codeword)?;
        self.codeword = Some(commitment.codeword);

        log_info!(self.logger, "4. agreement accepted, opening channel");
        let handle = match conn.call(Request::OpenChannel).await? {
            Response::ChannelGranted { handle } => handle,
            other => return Err(unexpected("open_channel", other)),
        };
        self.advance(PairingState::Established);
        log_info!(self.logger, "5. established, channel {handle}");

        Ok(Established {
            channel: SecureChannel::new(handle, &key),
            key,
        })
    }

    /// Sends an encrypted application message over an established channel.
    pub async fn send_message<C>(
        &self,
        conn: &C,
        established: &Established,
        plaintext: &[u8],
    ) -> Result<(), PairingError>
    where
        C: RequesterConn + ?Sized,
    {
        if self.state != PairingState::Established {
            return Err(PairingError::InvalidChannel(format!(
                "session is {}, not established",
                self.state
            )));
        }
        let request = established.channel.seal(plaintext)?;
        match conn.call(request).await? {
            Response::MessageAck { accepted: true } => Ok(()),
            Response::MessageAck { accepted: false } => Err(PairingError::InvalidChannel(
                "acceptor rejected the message".into(),
            )),
            other => Err(unexpected("message", other)),
        }
    }

    fn advance(&mut self, next: PairingState) {
        debug_assert!(self.state.can_advance_to(next), "{} -> {next}", self.state);
        self.state = next;
    }
}

fn unexpected(request: &'static str, response: Response) -> PairingError {
    let response = match response {
        Response::Rejected { reason } => format!("rejected: {reason}"),
        other => format!("{other:?}"),
    };
    PairingError::UnexpectedResponse { request, response }
}
