//! Encrypted messaging after a session is established.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use soundpair_fuzzy::SharedKey;

use crate::{PairingError, Request};

/// Length of a ChaCha20-Poly1305 nonce.
pub const NONCE_LEN: usize = 12;

/// A messaging handle bound to a shared key.
///
/// Messages are sealed with ChaCha20-Poly1305 under a random nonce; the
/// handle is authenticated as associated data.
#[derive(Clone)]
pub struct SecureChannel {
    handle: u64,
    cipher: ChaCha20Poly1305,
}

impl SecureChannel {
    pub fn new(handle: u64, key: &SharedKey) -> Self {
        Self {
            handle,
            cipher: ChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Seals `plaintext` into a message request.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Request, PairingError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let aad = self.handle.to_be_bytes();
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|e| PairingError::Cipher(e.to_string()))?;
        Ok(Request::Message {
            handle: self.handle,
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    /// Opens a sealed message addressed to this channel.
    pub fn open(&self, handle: u64, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PairingError> {
        if handle != self.handle {
            return Err(PairingError::InvalidChannel(format!(
                "message for handle {handle}, channel is {}",
                self.handle
            )));
        }
        if nonce.len() != NONCE_LEN {
            return Err(PairingError::Cipher(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce.len()
            )));
        }
        let aad = self.handle.to_be_bytes();
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|e| PairingError::Cipher(e.to_string()))
    }
}

impl fmt::Debug for SecureChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureChannel")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_request(channel: &SecureChannel, req: &Request) -> Result<Vec<u8>, PairingError> {
        match req {
            Request::Message {
                handle,
                nonce,
                ciphertext,
            } => channel.open(*handle, nonce, ciphertext),
            other => panic!("not a message: {other:?}"),
        }
    }

    #[test]
    fn seal_and_open() {
        let key = SharedKey::from_bytes([3; 32]);
        let a = SecureChannel::new(5, &key);
        let b = SecureChannel::new(5, &key);
        let req = a.seal(b"hello bob").unwrap();
        assert_eq!(open_request(&b, &req).unwrap(), b"hello bob");
    }

    #[test]
    fn wrong_key_fails() {
        let a = SecureChannel::new(5, &SharedKey::from_bytes([3; 32]));
        let b = SecureChannel::new(5, &SharedKey::from_bytes([4; 32]));
        let req = a.seal(b"hello").unwrap();
        assert!(matches!(open_request(&b, &req), Err(PairingError::Cipher(_))));
    }

    #[test]
    fn tampering_and_wrong_handle_fail() {
        let key = SharedKey::from_bytes([9; 32]);
        let channel = SecureChannel::new(1, &key);
        let Request::Message {
            handle,
            nonce,
            mut ciphertext,
        } = channel.seal(b"payload").unwrap()
        else {
            panic!("seal must produce a message");
        };

        assert!(matches!(
            channel.open(2, &nonce, &ciphertext),
            Err(PairingError::InvalidChannel(_))
        ));
        assert!(channel.open(handle, &nonce[..8], &ciphertext).is_err());
        ciphertext[0] ^= 1;
        assert!(channel.open(handle, &nonce, &ciphertext).is_err());

        // Same key, different handle: the associated data no longer matches.
        let other = SecureChannel::new(2, &key);
        let req = other.seal(b"payload").unwrap();
        if let Request::Message { nonce, ciphertext, .. } = req {
            assert!(channel.open(1, &nonce, &ciphertext).is_err());
        }
    }

    #[test]
    fn nonces_are_fresh() {
        let channel = SecureChannel::new(1, &SharedKey::from_bytes([0; 32]));
        assert_ne!(channel.seal(b"x").unwrap(), channel.seal(b"x").unwrap());
    }
}
