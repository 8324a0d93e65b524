use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Keys for exactly one message, derived from one [`crate::ChainKey`] position.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MessageKeys {
    cipher_key: [u8; 32],
    mac_key: [u8; 32],
    iv: [u8; 16],
    counter: u32,
}

impl MessageKeys {
    /// Bundles already-derived message keys.
    pub fn new(cipher_key: [u8; 32], mac_key: [u8; 32], iv: [u8; 16], counter: u32) -> Self {
        Self {
            cipher_key,
            mac_key,
            iv,
            counter,
        }
    }

    /// Symmetric cipher key.
    #[inline]
    pub fn cipher_key(&self) -> &[u8; 32] {
        &self.cipher_key
    }

    /// Message authentication key.
    #[inline]
    pub fn mac_key(&self) -> &[u8; 32] {
        &self.mac_key
    }

    /// Cipher initialization vector.
    #[inline]
    pub fn iv(&self) -> &[u8; 16] {
        &self.iv
    }

    /// Index of the chain key these keys came from.
    #[inline]
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl fmt::Debug for MessageKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageKeys")
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}
