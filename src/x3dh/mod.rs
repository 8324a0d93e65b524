mod parameters;
pub use parameters::*;

use crate::{
    ChainKey, Curve25519, CurveProvider, Error, KdfVersion, KeyPair, RatchetConfig, RootKey,
    SessionInitResult, SessionState, VerifyKey,
};
use std::cmp::Ordering;
use zeroize::Zeroizing;

/// Prefix mixed into version 3 secrets so they can never collide with a
/// version 2 derivation over the same agreements.
const DISCONTINUITY: [u8; 32] = [0xff; 32];

const TEXT_INFO: &[u8] = b"WhisperText";

/// Keys split off the combined handshake secret.
#[derive(Clone, Debug)]
pub struct DerivedKeys {
    root_key: RootKey,
    chain_key: ChainKey,
    verify_key: VerifyKey,
}

impl DerivedKeys {
    /// The initial root key.
    #[inline]
    pub fn root_key(&self) -> &RootKey {
        &self.root_key
    }

    /// The initial chain key, at index 0.
    #[inline]
    pub fn chain_key(&self) -> &ChainKey {
        &self.chain_key
    }

    /// Key for the out-of-band verification tag.
    #[inline]
    pub fn verify_key(&self) -> &VerifyKey {
        &self.verify_key
    }
}

/// Turns a completed key exchange into the first ratchet state of a session.
///
/// All derivation happens before anything is written: a failing agreement or
/// key generation leaves the target [`SessionState`] untouched.
///
/// # Pre-keys
///
/// For version 3 the one-time pre-key agreement is mixed in only when both
/// `our_pre_key` and `their_pre_key` are present. The peer makes the same
/// decision from its own view of the handshake, and nothing here can check
/// that the two views match. Callers must make sure both sides agree on
/// whether a pre-key was used, otherwise each side silently ends up with a
/// different session.
#[derive(Clone, Debug, Default)]
pub struct RatchetingSession<C = Curve25519> {
    curve: C,
    config: RatchetConfig,
}

impl RatchetingSession<Curve25519> {
    /// Creates a ratcheting session over Curve25519.
    pub fn new(config: RatchetConfig) -> Self {
        Self::with_curve(Curve25519, config)
    }
}

impl<C: CurveProvider> RatchetingSession<C> {
    /// Creates a ratcheting session over the given curve.
    pub fn with_curve(curve: C, config: RatchetConfig) -> Self {
        Self { curve, config }
    }

    /// Returns the curve this session derives with.
    pub fn curve(&self) -> &C {
        &self.curve
    }

    /// Returns the configuration for this session.
    pub fn config(&self) -> &RatchetConfig {
        &self.config
    }

    /// Decides whether we play Alice for a symmetric handshake.
    ///
    /// A side whose ephemeral key equals its base key is Bob. Otherwise, if
    /// the peer looks like Bob we are Alice. When both sides sent fresh
    /// ephemeral keys at the same time, the side with the lower base key is
    /// Alice; both peers compare the same two keys and reach opposite answers.
    pub fn is_alice(&self, parameters: &SymmetricParameters) -> bool {
        let keys = parameters.keys();

        if keys.our_ephemeral_key() == keys.our_base_key() {
            return false;
        }

        if keys.their_ephemeral_key() == keys.their_base_key() {
            return true;
        }

        self.curve
            .compare(keys.our_base_key().public_key(), keys.their_base_key())
            == Ordering::Less
    }

    /// Resolves our role and initializes `state`.
    pub fn initialize_session<S: SessionState + ?Sized>(
        &self,
        state: &mut S,
        version: u32,
        parameters: SymmetricParameters,
    ) -> Result<(), Error> {
        let is_alice = self.is_alice(&parameters);
        tracing::debug!(is_alice, "resolved handshake role");
        let role = parameters.into_role(is_alice);

        self.initialize_session_for_role(state, version, &role)
    }

    /// Initializes `state` for an already resolved role.
    pub fn initialize_session_for_role<S: SessionState + ?Sized>(
        &self,
        state: &mut S,
        version: u32,
        role: &Role,
    ) -> Result<(), Error> {
        self.derive_session(version, role)?.commit(state);
        Ok(())
    }

    /// Initializes `state` as Alice.
    pub fn initialize_session_as_alice<S: SessionState + ?Sized>(
        &self,
        state: &mut S,
        version: u32,
        parameters: &AliceParameters,
    ) -> Result<(), Error> {
        self.derive_alice_session(version, parameters)?.commit(state);
        Ok(())
    }

    /// Initializes `state` as Bob.
    pub fn initialize_session_as_bob<S: SessionState + ?Sized>(
        &self,
        state: &mut S,
        version: u32,
        parameters: &BobParameters,
    ) -> Result<(), Error> {
        self.derive_bob_session(version, parameters)?.commit(state);
        Ok(())
    }

    /// Computes the initial session for a resolved role without committing it.
    pub fn derive_session(&self, version: u32, role: &Role) -> Result<SessionInitResult, Error> {
        match role {
            Role::Alice(parameters) => self.derive_alice_session(version, parameters),
            Role::Bob(parameters) => self.derive_bob_session(version, parameters),
        }
    }

    /// Computes Alice's initial session.
    ///
    /// Alice immediately ratchets past the handshake root with a fresh sending
    /// key, and keeps the handshake chain as the receiver chain for Bob's
    /// ephemeral key.
    pub fn derive_alice_session(
        &self,
        version: u32,
        parameters: &AliceParameters,
    ) -> Result<SessionInitResult, Error> {
        let keys = parameters.keys();
        tracing::debug!(version, role = "alice", "deriving session keys");

        let DerivedKeys {
            root_key,
            chain_key,
            verify_key,
        } = self.calculate_4dhe(true, version, keys)?;

        let sending_key = self.curve.generate_key_pair()?;
        let (root_key, sender_chain_key) =
            root_key.create_chain(&self.curve, keys.their_ephemeral_key(), &sending_key)?;

        let verification = if version >= 3 {
            Some(verify_key.generate_verification(
                keys.our_base_key().public_key(),
                keys.our_pre_key().map(KeyPair::public_key),
                keys.our_identity_key().public_key(),
                keys.their_base_key(),
                keys.their_pre_key(),
                keys.their_identity_key(),
            )?)
        } else {
            None
        };

        Ok(SessionInitResult {
            version,
            local_identity_key: *keys.our_identity_key().public_key(),
            remote_identity_key: *keys.their_identity_key(),
            root_key,
            sender_ratchet_key: sending_key,
            sender_chain_key,
            receiver_chain: Some((*keys.their_ephemeral_key(), chain_key)),
            verification,
        })
    }

    /// Computes Bob's initial session.
    ///
    /// Bob sends on the handshake chain with his ephemeral key as the ratchet
    /// key; his first DH ratchet step happens when Alice's sending key arrives.
    pub fn derive_bob_session(
        &self,
        version: u32,
        parameters: &BobParameters,
    ) -> Result<SessionInitResult, Error> {
        let keys = parameters.keys();
        tracing::debug!(version, role = "bob", "deriving session keys");

        let DerivedKeys {
            root_key,
            chain_key,
            verify_key,
        } = self.calculate_4dhe(false, version, keys)?;

        let verification = if version >= 3 {
            Some(verify_key.generate_verification(
                keys.their_base_key(),
                keys.their_pre_key(),
                keys.their_identity_key(),
                keys.our_base_key().public_key(),
                keys.our_pre_key().map(KeyPair::public_key),
                keys.our_identity_key().public_key(),
            )?)
        } else {
            None
        };

        Ok(SessionInitResult {
            version,
            local_identity_key: *keys.our_identity_key().public_key(),
            remote_identity_key: *keys.their_identity_key(),
            root_key,
            sender_ratchet_key: keys.our_ephemeral_key().clone(),
            sender_chain_key: chain_key,
            receiver_chain: None,
            verification,
        })
    }

    /// Derives root, chain and verify keys from the combined handshake secret.
    ///
    /// The secret is the concatenation of
    /// - 32 `0xff` bytes (version 3 and later),
    /// - the two identity/base agreements, Alice's order first,
    /// - the base/base agreement,
    /// - the pre-key agreement (version 3 and later, both pre-keys present).
    pub fn calculate_4dhe(
        &self,
        is_alice: bool,
        version: u32,
        keys: &HandshakeKeys,
    ) -> Result<DerivedKeys, Error> {
        let kdf = self.kdf_for(version)?;

        let mut secrets = Zeroizing::new(Vec::with_capacity(32 * 5));
        if version >= 3 {
            secrets.extend_from_slice(&DISCONTINUITY);
        }

        let our_identity_key = keys.our_identity_key().private_key();
        let our_base_key = keys.our_base_key().private_key();

        let identity_base = self
            .curve
            .calculate_agreement(keys.their_base_key(), our_identity_key)?;
        let base_identity = self
            .curve
            .calculate_agreement(keys.their_identity_key().public_key(), our_base_key)?;

        if is_alice {
            secrets.extend_from_slice(identity_base.as_slice());
            secrets.extend_from_slice(base_identity.as_slice());
        } else {
            secrets.extend_from_slice(base_identity.as_slice());
            secrets.extend_from_slice(identity_base.as_slice());
        }

        let base_base = self
            .curve
            .calculate_agreement(keys.their_base_key(), our_base_key)?;
        secrets.extend_from_slice(base_base.as_slice());

        if version >= 3 {
            match (keys.their_pre_key(), keys.our_pre_key()) {
                (Some(their_pre_key), Some(our_pre_key)) => {
                    let pre_pre = self
                        .curve
                        .calculate_agreement(their_pre_key, our_pre_key.private_key())?;
                    secrets.extend_from_slice(pre_pre.as_slice());
                }
                (None, None) => {}
                _ => tracing::warn!(
                    version,
                    "only one side of the handshake has a one-time pre-key; skipping its agreement"
                ),
            }
        }

        let derived = kdf.derive_secrets(&secrets, None, TEXT_INFO, 96)?;

        let mut root = Zeroizing::new([0u8; 32]);
        let mut chain = Zeroizing::new([0u8; 32]);
        let mut verify = Zeroizing::new([0u8; 32]);
        root.copy_from_slice(&derived[0..32]);
        chain.copy_from_slice(&derived[32..64]);
        verify.copy_from_slice(&derived[64..96]);

        Ok(DerivedKeys {
            root_key: RootKey::new(kdf, *root),
            chain_key: ChainKey::new(kdf, *chain, 0),
            verify_key: VerifyKey::new(*verify),
        })
    }

    fn kdf_for(&self, version: u32) -> Result<KdfVersion, Error> {
        if !self.config.supports(version) {
            return Err(Error::UnsupportedVersion(version));
        }

        KdfVersion::for_session_version(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityKey, IdentityKeyPair, PrivateKey, PublicKey, SessionStructure};
    use hex_literal::hex;

    const ALICE_IDENTITY: [u8; 32] =
        hex!("c806439dc9d2c476ffed8f2580c0888d58ab406bf7ae3698879021b96bb4bf59");
    const ALICE_BASE: [u8; 32] =
        hex!("1118b31e7f3cb5b0f1a6d7e2a5cc52f8b15d9d0e6a3f4e2b1c0d9e8f7a6b5c4d");
    const ALICE_PRE: [u8; 32] =
        hex!("5831a2b4c6d8e0f21324354657687980a1b2c3d4e5f60718293a4b5c6d7e8f60");
    const BOB_IDENTITY: [u8; 32] =
        hex!("4876ae4f8da25bc4eaaf30f8e3f2c3b72bd1ee5b9c8b4a0d2e4f6a8c0e2d4f51");
    const BOB_BASE: [u8; 32] =
        hex!("583990e2c4c40f1e2a3b4c5d6e7f80912a3b4c5d6e7f8091a2b3c4d5e6f70866");
    const BOB_PRE: [u8; 32] =
        hex!("684d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a7b");

    fn key_pair(private: [u8; 32]) -> KeyPair {
        KeyPair::from(PrivateKey::from(private))
    }

    fn public(private: [u8; 32]) -> PublicKey {
        *key_pair(private).public_key()
    }

    fn bob_parameters(with_pre_keys: bool) -> BobParameters {
        let (ours, theirs) = if with_pre_keys {
            (Some(key_pair(BOB_PRE)), Some(public(ALICE_PRE)))
        } else {
            (None, None)
        };

        BobParameters::builder()
            .our_identity_key(IdentityKeyPair::from(PrivateKey::from(BOB_IDENTITY)))
            .our_base_key(key_pair(BOB_BASE))
            .our_pre_key(ours)
            .their_identity_key(IdentityKey::from(public(ALICE_IDENTITY)))
            .their_base_key(public(ALICE_BASE))
            .their_ephemeral_key(public(ALICE_BASE))
            .their_pre_key(theirs)
            .build_bob()
            .unwrap()
    }

    fn random_symmetric_pair() -> (SymmetricParameters, SymmetricParameters) {
        let curve = Curve25519;
        let alice_identity = IdentityKeyPair::generate(&curve).unwrap();
        let bob_identity = IdentityKeyPair::generate(&curve).unwrap();
        let alice_base = curve.generate_key_pair().unwrap();
        let bob_base = curve.generate_key_pair().unwrap();
        let alice_ephemeral = curve.generate_key_pair().unwrap();
        let bob_ephemeral = curve.generate_key_pair().unwrap();

        let alice = SymmetricParameters::builder()
            .our_identity_key(alice_identity.clone())
            .our_base_key(alice_base.clone())
            .our_ephemeral_key(alice_ephemeral.clone())
            .their_identity_key(*bob_identity.public_key())
            .their_base_key(*bob_base.public_key())
            .their_ephemeral_key(*bob_ephemeral.public_key())
            .build_symmetric()
            .unwrap();
        let bob = SymmetricParameters::builder()
            .our_identity_key(bob_identity)
            .our_base_key(bob_base)
            .our_ephemeral_key(bob_ephemeral)
            .their_identity_key(*alice_identity.public_key())
            .their_base_key(*alice_base.public_key())
            .their_ephemeral_key(*alice_ephemeral.public_key())
            .build_symmetric()
            .unwrap();

        (alice, bob)
    }

    #[test]
    fn test_bob_derived_keys_v3() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let parameters = bob_parameters(true);

        let derived = session.calculate_4dhe(false, 3, parameters.keys()).unwrap();

        assert_eq!(
            derived.root_key().key(),
            &hex!("3a0a8a24f38d38ee7ee0a0aa96b0617bae0194af7eb98de67407008a6b58a8c9")
        );
        assert_eq!(
            derived.chain_key().key(),
            &hex!("3915c6da8bbad413cf44ad622c17a5433b9820e03a34082e9afd368041cfb629")
        );
        assert_eq!(derived.chain_key().index(), 0);
        assert_eq!(derived.root_key().kdf_version(), KdfVersion::V3);
    }

    #[test]
    fn test_derived_verify_key_signs_handshake() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let parameters = bob_parameters(true);
        let keys = parameters.keys();

        let derived = session.calculate_4dhe(false, 3, keys).unwrap();
        let tag = derived
            .verify_key()
            .generate_verification(
                keys.their_base_key(),
                keys.their_pre_key(),
                keys.their_identity_key(),
                keys.our_base_key().public_key(),
                keys.our_pre_key().map(KeyPair::public_key),
                keys.our_identity_key().public_key(),
            )
            .unwrap();

        assert_eq!(tag, hex!("48fc3d2dafd945e2"));
    }

    #[test]
    fn test_session_exposes_curve_and_config() {
        let session = RatchetingSession::with_curve(
            Curve25519,
            RatchetConfig {
                min_version: 3,
                max_version: 3,
            },
        );

        assert_eq!(session.config().min_version, 3);
        assert!(session.config().supports(3));
        assert!(!session.config().supports(2));

        let alice = public(ALICE_BASE);
        let bob = public(BOB_BASE);
        let decoded = session.curve().decode_point(&alice.serialize(), 0).unwrap();
        assert_eq!(decoded, alice);
        assert_eq!(session.curve().compare(&alice, &alice), Ordering::Equal);
        assert_eq!(
            session.curve().compare(&alice, &bob),
            session.curve().compare(&bob, &alice).reverse()
        );
    }

    #[test]
    fn test_pre_keys_change_v3_secret_only() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let with = bob_parameters(true);
        let without = bob_parameters(false);

        let v3_with = session.calculate_4dhe(false, 3, with.keys()).unwrap();
        let v3_without = session.calculate_4dhe(false, 3, without.keys()).unwrap();
        assert_ne!(v3_with.root_key().key(), v3_without.root_key().key());

        let v2_with = session.calculate_4dhe(false, 2, with.keys()).unwrap();
        let v2_without = session.calculate_4dhe(false, 2, without.keys()).unwrap();
        assert_eq!(v2_with.root_key().key(), v2_without.root_key().key());
        assert_eq!(
            v2_with.root_key().key(),
            &hex!("59a370cc5754ea763ee338478acd920f33e6801d2c6c9b89bce8143e42293678")
        );
        assert_eq!(v2_with.root_key().kdf_version(), KdfVersion::V2);
    }

    #[test]
    fn test_one_sided_pre_key_is_skipped() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let without = bob_parameters(false);
        let one_sided = BobParameters::builder()
            .our_identity_key(IdentityKeyPair::from(PrivateKey::from(BOB_IDENTITY)))
            .our_base_key(key_pair(BOB_BASE))
            .our_pre_key(Some(key_pair(BOB_PRE)))
            .their_identity_key(IdentityKey::from(public(ALICE_IDENTITY)))
            .their_base_key(public(ALICE_BASE))
            .build_bob()
            .unwrap();

        let expected = session.calculate_4dhe(false, 3, without.keys()).unwrap();
        let actual = session.calculate_4dhe(false, 3, one_sided.keys()).unwrap();

        assert_eq!(expected.root_key().key(), actual.root_key().key());
    }

    #[test]
    fn test_unsupported_versions() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let parameters = bob_parameters(false);

        for version in [0, 1, 4, u32::MAX] {
            assert_eq!(
                session.calculate_4dhe(false, version, parameters.keys()).unwrap_err(),
                Error::UnsupportedVersion(version)
            );
        }

        let v3_only = RatchetingSession::new(RatchetConfig {
            min_version: 3,
            max_version: 3,
        });
        let mut state = SessionStructure::new();
        assert_eq!(
            v3_only
                .initialize_session_as_bob(&mut state, 2, &parameters)
                .unwrap_err(),
            Error::UnsupportedVersion(2)
        );
        assert!(!state.is_initialized());
    }

    #[test]
    fn test_bob_session_reuses_ephemeral_as_ratchet_key() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let parameters = bob_parameters(true);

        let result = session.derive_bob_session(3, &parameters).unwrap();

        assert_eq!(result.sender_ratchet_key(), parameters.keys().our_ephemeral_key());
        assert!(result.receiver_chain().is_none());
        assert_eq!(result.verification(), Some(&hex!("48fc3d2dafd945e2")));
        assert_eq!(
            result.sender_chain_key().key(),
            &hex!("3915c6da8bbad413cf44ad622c17a5433b9820e03a34082e9afd368041cfb629")
        );
    }

    #[test]
    fn test_v2_session_has_no_verification() {
        let session = RatchetingSession::new(RatchetConfig::default());

        let result = session.derive_bob_session(2, &bob_parameters(true)).unwrap();

        assert!(result.verification().is_none());
        assert_eq!(result.version(), 2);
    }

    #[test]
    fn test_role_when_our_ephemeral_is_base() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let (alice, _) = random_symmetric_pair();
        let base = alice.keys().our_base_key().clone();

        let parameters = SymmetricParameters::builder()
            .our_identity_key(alice.keys().our_identity_key().clone())
            .our_base_key(base.clone())
            .our_ephemeral_key(base)
            .their_identity_key(*alice.keys().their_identity_key())
            .their_base_key(*alice.keys().their_base_key())
            .their_ephemeral_key(*alice.keys().their_base_key())
            .build_symmetric()
            .unwrap();

        // Our own equality wins over the peer's.
        assert!(!session.is_alice(&parameters));
    }

    #[test]
    fn test_role_when_their_ephemeral_is_base() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let (alice, _) = random_symmetric_pair();

        let parameters = SymmetricParameters::builder()
            .our_identity_key(alice.keys().our_identity_key().clone())
            .our_base_key(alice.keys().our_base_key().clone())
            .our_ephemeral_key(alice.keys().our_ephemeral_key().clone())
            .their_identity_key(*alice.keys().their_identity_key())
            .their_base_key(*alice.keys().their_base_key())
            .their_ephemeral_key(*alice.keys().their_base_key())
            .build_symmetric()
            .unwrap();

        assert!(session.is_alice(&parameters));
    }

    #[test]
    fn test_role_tie_break_is_antisymmetric() {
        let session = RatchetingSession::new(RatchetConfig::default());

        for _ in 0..16 {
            let (alice, bob) = random_symmetric_pair();
            assert_ne!(session.is_alice(&alice), session.is_alice(&bob));

            let lower = alice.keys().our_base_key().public_key()
                < bob.keys().our_base_key().public_key();
            assert_eq!(session.is_alice(&alice), lower);
        }
    }

    #[test]
    fn test_symmetric_initialization_agrees() {
        let session = RatchetingSession::new(RatchetConfig::default());
        let (first, second) = random_symmetric_pair();
        let first_is_alice = session.is_alice(&first);

        let mut first_state = SessionStructure::new();
        let mut second_state = SessionStructure::new();
        session
            .initialize_session(&mut first_state, 3, first.clone())
            .unwrap();
        session
            .initialize_session(&mut second_state, 3, second.clone())
            .unwrap();

        let (alice_state, bob_state, bob) = if first_is_alice {
            (&first_state, &second_state, &second)
        } else {
            (&second_state, &first_state, &first)
        };

        let bob_ephemeral = bob.keys().our_ephemeral_key().public_key();
        assert_eq!(
            alice_state.receiver_chain_key(bob_ephemeral).unwrap().key(),
            bob_state.sender_chain_key().unwrap().key()
        );
        assert_eq!(alice_state.verification(), bob_state.verification());
        assert_eq!(bob_state.sender_ratchet_key(), Some(bob.keys().our_ephemeral_key()));
    }
}
