//! Offline pairing between two recordings.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use soundpair_fuzzy::SharedKey;
use soundpair_pairing::{
    Acceptor, PairingState, Requester, RequesterConn, StaticSource, new_pipe,
};
use tokio_util::sync::CancellationToken;

use super::{get_config, load_wav, output_result, print_verbose};
use crate::Cli;

/// Pair two recordings over an in-process connection.
///
/// Runs the full handshake: connection, recording (replayed from the
/// files), agreement and channel setup.
#[derive(Args)]
pub struct PairCommand {
    /// Recording captured by the requesting device
    #[arg(long)]
    requester: String,

    /// Recording captured by the accepting device
    #[arg(long)]
    acceptor: String,

    /// Device id the requester announces
    #[arg(long, default_value = "soundpair-cli")]
    device_id: String,

    /// Device ids the acceptor admits (default: the requester's id)
    #[arg(long = "allow")]
    allowed: Vec<String>,

    /// Send this message over the established channel
    #[arg(long)]
    message: Option<String>,

    /// Include the derived key in the report
    #[arg(long)]
    show_key: bool,
}

#[derive(Serialize)]
struct PairReport {
    requester_state: PairingState,
    acceptor_state: PairingState,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    corrected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    received: Option<String>,
}

/// Short public identifier of a key: the first 8 bytes of its SHA-256.
fn key_id(key: &SharedKey) -> String {
    hex::encode(&Sha256::digest(key.as_bytes())[..8])
}

impl PairCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let heard_by_requester = load_wav(&self.requester)?;
        let heard_by_acceptor = load_wav(&self.acceptor)?;
        print_verbose(
            cli,
            &format!(
                "requester {:.2}s, acceptor {:.2}s at {} Hz",
                heard_by_requester.duration_secs(),
                heard_by_acceptor.duration_secs(),
                heard_by_acceptor.sample_rate()
            ),
        );

        let allowed = if self.allowed.is_empty() {
            vec![self.device_id.clone()]
        } else {
            self.allowed.clone()
        };
        let mut requester = Requester::new(
            cfg.clone(),
            self.device_id.clone(),
            Arc::new(StaticSource::new(heard_by_requester)),
        )?;
        let mut acceptor = Acceptor::new(cfg, Arc::new(StaticSource::new(heard_by_acceptor)))?
            .with_allowed_devices(allowed);
        let mut inbox = acceptor.take_inbox();

        let (acceptor_conn, conn) = new_pipe();
        let cancel = CancellationToken::new();
        let server = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let served = acceptor.serve(&acceptor_conn, cancel).await;
                (acceptor, served)
            })
        };

        let paired = requester.pair(&conn).await;
        let mut received = None;
        if let (Ok(established), Some(text)) = (&paired, &self.message) {
            requester
                .send_message(&conn, established, text.as_bytes())
                .await?;
            if let Some(inbox) = inbox.as_mut() {
                received = inbox
                    .recv()
                    .await
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
            }
        }
        conn.close().await?;

        let (acceptor, served) = server.await?;
        if let Err(err) = &served {
            print_verbose(cli, &format!("acceptor: {err}"));
        }

        let found = acceptor.reconciliation();
        let key = paired.as_ref().ok().map(|e| &e.key);
        output_result(
            &PairReport {
                requester_state: requester.state(),
                acceptor_state: acceptor.state(),
                error: paired.as_ref().err().map(|e| e.to_string()),
                candidate: found.map(|r| r.candidate),
                shift: found.map(|r| r.shift.to_string()),
                corrected: found.map(|r| r.corrected.len()),
                key_id: key.map(key_id),
                key: key.filter(|_| self.show_key).map(|k| hex::encode(k.as_bytes())),
                received,
            },
            cli.json,
        )?;

        if paired.is_err() {
            anyhow::bail!("pairing failed in state {}", requester.state());
        }
        Ok(())
    }
}
