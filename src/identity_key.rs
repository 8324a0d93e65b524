use crate::{CurveProvider, Error, KeyPair, PrivateKey, PublicKey};

/// The public half of a long-term identity key.
///
/// Serializes exactly like a [`PublicKey`]; the newtype keeps identity keys
/// from being mixed up with base or ratchet keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(PublicKey);

impl IdentityKey {
    /// Decodes an identity key from `bytes`, starting at `offset`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self, Error> {
        PublicKey::decode_point(bytes, offset).map(Self)
    }

    /// Returns the underlying curve public key.
    #[inline]
    pub fn public_key(&self) -> &PublicKey {
        &self.0
    }

    /// Serializes the identity key into its canonical 33-byte form.
    pub fn serialize(&self) -> [u8; 33] {
        self.0.serialize()
    }
}

impl From<PublicKey> for IdentityKey {
    fn from(public_key: PublicKey) -> Self {
        Self(public_key)
    }
}

/// A long-term identity key pair.
#[derive(Clone, Debug)]
pub struct IdentityKeyPair {
    public_key: IdentityKey,
    private_key: PrivateKey,
}

impl IdentityKeyPair {
    /// Generates a new identity key pair with the given curve.
    pub fn generate(curve: &impl CurveProvider) -> Result<Self, Error> {
        curve.generate_key_pair().map(Self::from)
    }

    /// Returns the public identity key.
    #[inline]
    pub fn public_key(&self) -> &IdentityKey {
        &self.public_key
    }

    /// Returns the private half of the identity key pair.
    #[inline]
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl From<KeyPair> for IdentityKeyPair {
    fn from(key_pair: KeyPair) -> Self {
        Self {
            public_key: IdentityKey(*key_pair.public_key()),
            private_key: key_pair.private_key().clone(),
        }
    }
}

impl From<PrivateKey> for IdentityKeyPair {
    fn from(private_key: PrivateKey) -> Self {
        Self {
            public_key: IdentityKey(private_key.public_key()),
            private_key,
        }
    }
}
