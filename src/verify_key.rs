use crate::kdf::hmac_sha256;
use crate::{Error, IdentityKey, PublicKey};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERIFICATION_INFO: &[u8] = b"TextSecure Verification Tag";

/// Length of the verification tag.
pub const VERIFICATION_TAG_LENGTH: usize = 8;

/// Key for the short tag both peers can compare out of band.
///
/// The tag is computed over the handshake's public keys in a fixed
/// Alice-then-Bob order, so both sides must pass their keys into the slots
/// matching their role rather than as "ours" and "theirs".
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VerifyKey {
    key: [u8; 32],
}

impl VerifyKey {
    /// Wraps raw verify key bytes.
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Returns the raw verify key bytes.
    #[inline]
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Computes the verification tag.
    ///
    /// Absent pre-keys are left out of the MAC input entirely. Both peers have
    /// to agree on which pre-keys were present, otherwise the tags differ.
    pub fn generate_verification(
        &self,
        alice_base_key: &PublicKey,
        alice_pre_key: Option<&PublicKey>,
        alice_identity_key: &IdentityKey,
        bob_base_key: &PublicKey,
        bob_pre_key: Option<&PublicKey>,
        bob_identity_key: &IdentityKey,
    ) -> Result<[u8; VERIFICATION_TAG_LENGTH], Error> {
        let alice_pre_key = alice_pre_key.map(PublicKey::serialize);
        let bob_pre_key = bob_pre_key.map(PublicKey::serialize);

        let mut input: Vec<&[u8]> = Vec::with_capacity(7);
        let alice_base_key = alice_base_key.serialize();
        let alice_identity_key = alice_identity_key.serialize();
        let bob_base_key = bob_base_key.serialize();
        let bob_identity_key = bob_identity_key.serialize();

        input.push(VERIFICATION_INFO);
        input.push(&alice_base_key);
        if let Some(ref key) = alice_pre_key {
            input.push(key);
        }
        input.push(&alice_identity_key);
        input.push(&bob_base_key);
        if let Some(ref key) = bob_pre_key {
            input.push(key);
        }
        input.push(&bob_identity_key);

        let mut mac = hmac_sha256(&self.key, &input)?;
        let mut tag = [0u8; VERIFICATION_TAG_LENGTH];
        tag.copy_from_slice(&mac[..VERIFICATION_TAG_LENGTH]);
        mac.zeroize();

        Ok(tag)
    }
}

impl fmt::Debug for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyKey").finish_non_exhaustive()
    }
}
