//! End-to-end pairing at the default parameters: 44.1 kHz, 7 s captures,
//! a 512-symbol code and 351 shift candidates.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use soundpair_fingerprint::{AudioSignal, CandidateGenerator, Extractor, Shift};
use soundpair_fuzzy::{FuzzyCommitment, SharedKey};
use soundpair_pairing::logger::NopLogger;
use soundpair_pairing::{
    Acceptor, PairingState, Requester, RequesterConn, SessionConfig, StaticSource, new_pipe,
};
use tokio_util::sync::CancellationToken;

const RATE: u32 = 44100;
const OFFSET: usize = 300;

/// The same ambient sound as heard by both devices. The acceptor started
/// `OFFSET` samples late and its microphone adds white noise.
fn recordings() -> (AudioSignal, AudioSignal) {
    let len = 7 * RATE as usize;
    let mut rng = StdRng::seed_from_u64(2024);
    let ambient: Vec<f32> = (0..len + OFFSET).map(|_| rng.gen_range(-1.0f32..1.0)).collect();

    let requester = ambient[..len].to_vec();
    let acceptor = ambient[OFFSET..]
        .iter()
        .map(|s| s + 0.05 * rng.gen_range(-1.0f32..1.0))
        .collect();
    (
        AudioSignal::new(requester, RATE).unwrap(),
        AudioSignal::new(acceptor, RATE).unwrap(),
    )
}

fn config() -> SessionConfig {
    SessionConfig {
        lead_time_ms: 0,
        ..SessionConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pairing_over_pipe_yields_identical_keys() {
    let (heard_by_requester, heard_by_acceptor) = recordings();

    let mut requester = Requester::new(config(), "alice", Arc::new(StaticSource::new(heard_by_requester)))
        .unwrap()
        .with_logger(Arc::new(NopLogger));
    let mut acceptor = Acceptor::new(config(), Arc::new(StaticSource::new(heard_by_acceptor)))
        .unwrap()
        .with_allowed_devices(["alice"])
        .with_logger(Arc::new(NopLogger));
    let mut inbox = acceptor.take_inbox().unwrap();

    let (acceptor_conn, conn) = new_pipe();
    let server = tokio::spawn(async move {
        let served = acceptor.serve(&acceptor_conn, CancellationToken::new()).await;
        (acceptor, served)
    });

    let established = requester.pair(&conn).await.unwrap();
    requester
        .send_message(&conn, &established, b"paired by sound")
        .await
        .unwrap();
    assert_eq!(inbox.recv().await.unwrap(), b"paired by sound");
    conn.close().await.unwrap();

    let (acceptor, served) = server.await.unwrap();
    assert_eq!(served.unwrap(), PairingState::Established);
    assert_eq!(requester.state(), PairingState::Established);
    assert_eq!(acceptor.shared_key(), Some(&established.key));

    let found = acceptor.reconciliation().unwrap();
    assert_eq!(Some(&found.codeword), requester.codeword());
    // Candidates are tried nearest alignment first, so any candidate before
    // the exact realignment (right shift of 300 samples, index 6) that is
    // within the code's capacity wins; the unshifted one often does. The
    // shift-300 candidate itself is checked in the test below.
    assert!(found.candidate <= 6, "candidate {} ({})", found.candidate, found.shift);
    assert_eq!(found.shift, config().candidate_generator().unwrap().shift_at(found.candidate));
    assert!(found.corrected.len() <= config().code.capacity());
}

#[test]
fn shift_aligned_candidate_opens_the_commitment() {
    let (heard_by_requester, heard_by_acceptor) = recordings();
    let cfg = config();
    let extractor = Extractor::new(cfg.fingerprint.clone()).unwrap();
    let fuzzy = FuzzyCommitment::new(cfg.code).unwrap();

    let secret = extractor.extract(&heard_by_requester).unwrap();
    assert_eq!(secret.len(), 512);
    let commitment = fuzzy.commit(&secret.to_symbols()).unwrap();

    let generator = CandidateGenerator::with_defaults(extractor);
    assert_eq!(generator.count(), 351);
    let plan = generator.extractor().plan(RATE).unwrap();
    let aligned = generator.candidate(&plan, &heard_by_acceptor, 6).unwrap();
    assert_eq!(aligned.shift, Shift::Right(OFFSET));

    let distance = aligned.fingerprint.hamming_distance(&secret);
    assert!(distance < 64, "aligned distance {distance}");

    let opened = fuzzy
        .decommit(&commitment.blob, &aligned.fingerprint.to_symbols())
        .unwrap();
    assert_eq!(opened.codeword, commitment.codeword);
    assert_eq!(opened.corrected.len(), distance);
    assert_eq!(
        SharedKey::derive(&opened.codeword).unwrap(),
        SharedKey::derive(&commitment.codeword).unwrap()
    );
}

#[tokio::test]
async fn eavesdropper_recording_elsewhere_cannot_pair() {
    let (heard_by_requester, _) = recordings();
    let mut rng = StdRng::seed_from_u64(99);
    let elsewhere: Vec<f32> = (0..7 * RATE as usize).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    let cfg = SessionConfig {
        candidate_shifts: 8,
        ..config()
    };

    let mut requester = Requester::new(cfg.clone(), "alice", Arc::new(StaticSource::new(heard_by_requester)))
        .unwrap()
        .with_logger(Arc::new(NopLogger));
    let mut acceptor = Acceptor::new(
        cfg,
        Arc::new(StaticSource::new(AudioSignal::new(elsewhere, RATE).unwrap())),
    )
    .unwrap()
    .with_allowed_devices(["alice"])
    .with_logger(Arc::new(NopLogger));

    let (acceptor_conn, conn) = new_pipe();
    let server = tokio::spawn(async move {
        let served = acceptor.serve(&acceptor_conn, CancellationToken::new()).await;
        (acceptor, served)
    });
    assert!(requester.pair(&conn).await.is_err());
    conn.close().await.unwrap();

    let (acceptor, served) = server.await.unwrap();
    assert!(served.is_err());
    assert_eq!(requester.state(), PairingState::AgreementFailed);
    assert_eq!(acceptor.state(), PairingState::AgreementFailed);
    assert!(acceptor.shared_key().is_none());
}
