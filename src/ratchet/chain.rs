use crate::kdf::hmac_sha256;
use crate::{Error, KdfVersion, MessageKeys};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const MESSAGE_KEY_SEED: &[u8] = &[0x01];
const CHAIN_KEY_SEED: &[u8] = &[0x02];

const MESSAGE_KEYS_INFO: &[u8] = b"WhisperMessageKeys";

/// One direction's symmetric ratchet chain.
///
/// A chain key is never advanced in place: [`ChainKey::next_chain_key`]
/// returns the successor and leaves `self` untouched. The step is a one-way
/// HMAC, so holding chain key `i + 1` reveals nothing about chain key `i`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChainKey {
    #[zeroize(skip)]
    kdf: KdfVersion,
    key: [u8; 32],
    index: u32,
}

impl ChainKey {
    /// Creates a chain key at an explicit index.
    pub fn new(kdf: KdfVersion, key: [u8; 32], index: u32) -> Self {
        Self { kdf, key, index }
    }

    /// Returns the raw chain key bytes.
    #[inline]
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Returns the position of this key in its chain.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the KDF flavour this chain derives with.
    #[inline]
    pub fn kdf_version(&self) -> KdfVersion {
        self.kdf
    }

    /// Derives the next chain key.
    ///
    /// Fails once the index would overflow `u32`; indices are never reused.
    pub fn next_chain_key(&self) -> Result<ChainKey, Error> {
        let index = self
            .index
            .checked_add(1)
            .ok_or_else(|| Error::Crypto("Chain index exhausted".to_string()))?;
        let key = Zeroizing::new(hmac_sha256(&self.key, &[CHAIN_KEY_SEED])?);

        Ok(ChainKey {
            kdf: self.kdf,
            key: *key,
            index,
        })
    }

    /// Derives the message keys for this chain position.
    pub fn message_keys(&self) -> Result<MessageKeys, Error> {
        let mut seed = hmac_sha256(&self.key, &[MESSAGE_KEY_SEED])?;
        let material = self.kdf.derive_secrets(&seed, None, MESSAGE_KEYS_INFO, 80);
        seed.zeroize();
        let material = material?;

        let mut cipher_key = Zeroizing::new([0u8; 32]);
        let mut mac_key = Zeroizing::new([0u8; 32]);
        let mut iv = Zeroizing::new([0u8; 16]);
        cipher_key.copy_from_slice(&material[0..32]);
        mac_key.copy_from_slice(&material[32..64]);
        iv.copy_from_slice(&material[64..80]);

        Ok(MessageKeys::new(*cipher_key, *mac_key, *iv, self.index))
    }
}

impl fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainKey")
            .field("kdf", &self.kdf)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
