use crate::Error;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use x25519_dalek::{SharedSecret, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Type byte prefixed to every serialized curve point.
pub const DJB_TYPE: u8 = 0x05;

/// Length of a serialized public key: type byte plus 32-byte coordinate.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// An X25519 public key.
///
/// Equality, hashing and ordering all work on the canonical serialization, so
/// two peers comparing the same pair of keys always reach the same answer.
#[derive(Clone, Copy)]
pub struct PublicKey(x25519_dalek::PublicKey);

impl PublicKey {
    /// Decodes a public key from `bytes`, starting at `offset`.
    ///
    /// The encoding is the `0x05` type byte followed by the 32-byte Montgomery
    /// u-coordinate.
    pub fn decode_point(bytes: &[u8], offset: usize) -> Result<Self, Error> {
        let Some(&key_type) = bytes.get(offset) else {
            return Err(Error::InvalidKey("No key type identifier".to_string()));
        };

        if key_type != DJB_TYPE {
            return Err(Error::InvalidKey(format!("Bad key type: {key_type:#04x}")));
        }

        let end = offset
            .checked_add(PUBLIC_KEY_LENGTH)
            .ok_or_else(|| Error::InvalidKey("Key offset overflows".to_string()))?;

        let coordinate: [u8; 32] = bytes
            .get(offset + 1..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| {
                Error::InvalidKey(format!(
                    "Expected {PUBLIC_KEY_LENGTH} key bytes, got {}",
                    bytes.len().saturating_sub(offset)
                ))
            })?;

        Ok(Self::from(coordinate))
    }

    /// Serializes the key into its canonical 33-byte form.
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes[0] = DJB_TYPE;
        bytes[1..].copy_from_slice(self.0.as_bytes());

        bytes
    }

    /// Returns the raw 32-byte coordinate, without the type byte.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub(crate) fn as_dalek(&self) -> &x25519_dalek::PublicKey {
        &self.0
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(x25519_dalek::PublicKey::from(bytes))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serialize().cmp(&other.serialize())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// An X25519 private key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(Box<StaticSecret>);

impl PrivateKey {
    pub(crate) fn dh(&self, public_key: &PublicKey) -> SharedSecret {
        self.0.diffie_hellman(public_key.as_dalek())
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(self.0.as_ref()))
    }
}

impl From<[u8; 32]> for PrivateKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(Box::new(StaticSecret::from(bytes)))
    }
}

impl From<Box<[u8; 32]>> for PrivateKey {
    fn from(mut bytes: Box<[u8; 32]>) -> Self {
        let secret = StaticSecret::from(*bytes);
        bytes.zeroize();
        Self(Box::new(secret))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A public/private X25519 key pair.
///
/// Two key pairs are equal when their public halves are equal.
#[derive(Clone, Debug)]
pub struct KeyPair {
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Returns the public half of the pair.
    #[inline]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the private half of the pair.
    #[inline]
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private_key: PrivateKey) -> Self {
        Self {
            public_key: private_key.public_key(),
            private_key,
        }
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for KeyPair {}
