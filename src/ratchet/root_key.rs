use crate::{ChainKey, CurveProvider, Error, KdfVersion, KeyPair, PublicKey};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const RATCHET_INFO: &[u8] = b"WhisperRatchet";

/// The root secret of the Double Ratchet.
///
/// Every DH ratchet step mixes a fresh agreement into the root key and splits
/// off a new chain key for one direction.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RootKey {
    #[zeroize(skip)]
    kdf: KdfVersion,
    key: [u8; 32],
}

impl RootKey {
    /// Wraps raw root key bytes.
    pub fn new(kdf: KdfVersion, key: [u8; 32]) -> Self {
        Self { kdf, key }
    }

    /// Returns the raw root key bytes.
    #[inline]
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Returns the KDF flavour this root key derives with.
    #[inline]
    pub fn kdf_version(&self) -> KdfVersion {
        self.kdf
    }

    /// Performs one DH ratchet step.
    ///
    /// Agrees `their_ratchet_key` with our ratchet private key and runs the
    /// result through the KDF salted with the current root key. The first half
    /// of the output becomes the next root key, the second half a chain key at
    /// index 0.
    pub fn create_chain(
        &self,
        curve: &impl CurveProvider,
        their_ratchet_key: &PublicKey,
        our_ratchet_key: &KeyPair,
    ) -> Result<(RootKey, ChainKey), Error> {
        let shared_secret =
            curve.calculate_agreement(their_ratchet_key, our_ratchet_key.private_key())?;
        let derived = self.kdf.derive_secrets(
            shared_secret.as_slice(),
            Some(self.key.as_slice()),
            RATCHET_INFO,
            64,
        )?;

        let mut root = Zeroizing::new([0u8; 32]);
        let mut chain = Zeroizing::new([0u8; 32]);
        root.copy_from_slice(&derived[0..32]);
        chain.copy_from_slice(&derived[32..64]);

        Ok((
            RootKey::new(self.kdf, *root),
            ChainKey::new(self.kdf, *chain, 0),
        ))
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootKey")
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}
