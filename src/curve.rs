use crate::{Error, KeyPair, PrivateKey, PublicKey};
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::cmp::Ordering;
use zeroize::Zeroizing;

/// Generates a cryptographically secure random 32-byte seed.
pub(crate) fn generate_random_seed() -> Result<Box<[u8; 32]>, Error> {
    let mut seed = Box::new([0u8; 32]);
    OsRng
        .try_fill_bytes(seed.as_mut_slice())
        .map_err(|_| Error::Random)?;
    Ok(seed)
}

/// The elliptic-curve operations the ratchet depends on.
///
/// Everything that touches randomness or scalar multiplication goes through
/// this trait, so the session logic can run against a deterministic fake.
pub trait CurveProvider {
    /// Generates a fresh key pair.
    fn generate_key_pair(&self) -> Result<KeyPair, Error>;

    /// Decodes a serialized public key starting at `offset`.
    fn decode_point(&self, bytes: &[u8], offset: usize) -> Result<PublicKey, Error> {
        PublicKey::decode_point(bytes, offset)
    }

    /// Computes the Diffie-Hellman agreement between `public_key` and `private_key`.
    fn calculate_agreement(
        &self,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Zeroizing<[u8; 32]>, Error>;

    /// Total order over the canonical serialization of two public keys.
    fn compare(&self, first: &PublicKey, second: &PublicKey) -> Ordering {
        first.serialize().cmp(&second.serialize())
    }
}

/// Curve25519 backed by `x25519-dalek` and the operating system RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct Curve25519;

impl CurveProvider for Curve25519 {
    fn generate_key_pair(&self) -> Result<KeyPair, Error> {
        let seed = generate_random_seed()?;
        Ok(KeyPair::from(PrivateKey::from(seed)))
    }

    fn calculate_agreement(
        &self,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Zeroizing<[u8; 32]>, Error> {
        let shared = private_key.dh(public_key);

        // Low-order points force an all-zero output.
        if !shared.was_contributory() {
            return Err(Error::InvalidKey(
                "Public key produced a non-contributory agreement".to_string(),
            ));
        }

        Ok(Zeroizing::new(shared.to_bytes()))
    }
}
