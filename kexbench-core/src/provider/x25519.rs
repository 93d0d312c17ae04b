// SPDX-License-Identifier: Apache-2.0

//! Classical ECDH provider: X25519 mutual key exchange.

use rand_core::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret};

use super::OperationProvider;
use crate::error::BackendError;

/// Generate a fresh ephemeral keypair.
pub fn keygen() -> (EphemeralSecret, PublicKey) {
    let secret = EphemeralSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (secret, public)
}

/// Derive the shared secret from our ephemeral secret and the peer's
/// public key. Consumes the secret; X25519 ephemeral keys are single-use.
pub fn exchange(secret: EphemeralSecret, peer_public: &PublicKey) -> SharedSecret {
    secret.diffie_hellman(peer_public)
}

/// One complete two-party exchange: two keypairs, both derivations, and an
/// equality check on the shared secrets.
pub fn exchange_cycle() -> Result<[u8; 32], BackendError> {
    let (a_secret, a_public) = keygen();
    let (b_secret, b_public) = keygen();

    let a_shared = exchange(a_secret, &b_public);
    let b_shared = exchange(b_secret, &a_public);

    if a_shared.as_bytes() != b_shared.as_bytes() {
        return Err(BackendError::SharedSecretMismatch {
            scheme: "x25519".to_string(),
        });
    }
    Ok(*a_shared.as_bytes())
}

/// Software X25519 exchange configuration. This is the designated baseline
/// the aggregator measures post-quantum overhead against.
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519Exchange;

impl X25519Exchange {
    pub const CONFIGURATION: &'static str = "classical_ecdh_software";
}

impl OperationProvider for X25519Exchange {
    fn configuration(&self) -> &str {
        Self::CONFIGURATION
    }

    fn run_cycle(&self) -> Result<(), BackendError> {
        exchange_cycle().map(|_| ())
    }
}
