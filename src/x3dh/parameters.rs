use crate::{Error, IdentityKey, IdentityKeyPair, KeyPair, PublicKey};
use std::marker::PhantomData;

/// The complete key set for one side of a handshake.
///
/// Only reachable through [`ParametersBuilder`], which refuses to produce a
/// set with a required key missing.
#[derive(Clone, Debug)]
pub struct HandshakeKeys {
    our_identity_key: IdentityKeyPair,
    our_base_key: KeyPair,
    our_ephemeral_key: KeyPair,
    our_pre_key: Option<KeyPair>,
    their_identity_key: IdentityKey,
    their_base_key: PublicKey,
    their_ephemeral_key: PublicKey,
    their_pre_key: Option<PublicKey>,
}

impl HandshakeKeys {
    /// Our long-term identity key pair.
    #[inline]
    pub fn our_identity_key(&self) -> &IdentityKeyPair {
        &self.our_identity_key
    }

    /// Our base key pair.
    #[inline]
    pub fn our_base_key(&self) -> &KeyPair {
        &self.our_base_key
    }

    /// Our ephemeral (ratchet) key pair.
    #[inline]
    pub fn our_ephemeral_key(&self) -> &KeyPair {
        &self.our_ephemeral_key
    }

    /// Our one-time pre-key, if one takes part in this handshake.
    #[inline]
    pub fn our_pre_key(&self) -> Option<&KeyPair> {
        self.our_pre_key.as_ref()
    }

    /// The peer's long-term identity key.
    #[inline]
    pub fn their_identity_key(&self) -> &IdentityKey {
        &self.their_identity_key
    }

    /// The peer's base key.
    #[inline]
    pub fn their_base_key(&self) -> &PublicKey {
        &self.their_base_key
    }

    /// The peer's ephemeral (ratchet) key.
    #[inline]
    pub fn their_ephemeral_key(&self) -> &PublicKey {
        &self.their_ephemeral_key
    }

    /// The peer's one-time pre-key, if one takes part in this handshake.
    #[inline]
    pub fn their_pre_key(&self) -> Option<&PublicKey> {
        self.their_pre_key.as_ref()
    }
}

/// Handshake keys for the side playing Alice.
#[derive(Clone, Debug)]
pub struct AliceParameters {
    keys: HandshakeKeys,
}

impl AliceParameters {
    /// Starts building Alice's parameters.
    pub fn builder() -> ParametersBuilder<ForAlice> {
        ParametersBuilder::default()
    }

    /// The validated key set.
    #[inline]
    pub fn keys(&self) -> &HandshakeKeys {
        &self.keys
    }
}

/// Handshake keys for the side playing Bob.
#[derive(Clone, Debug)]
pub struct BobParameters {
    keys: HandshakeKeys,
}

impl BobParameters {
    /// Starts building Bob's parameters.
    pub fn builder() -> ParametersBuilder<ForBob> {
        ParametersBuilder::default()
    }

    /// The validated key set.
    #[inline]
    pub fn keys(&self) -> &HandshakeKeys {
        &self.keys
    }
}

/// Handshake keys for a side that does not yet know its role.
///
/// Used when both peers may have initiated at the same time; the role is
/// resolved from the keys themselves.
#[derive(Clone, Debug)]
pub struct SymmetricParameters {
    keys: HandshakeKeys,
}

impl SymmetricParameters {
    /// Starts building symmetric parameters.
    pub fn builder() -> ParametersBuilder<ForSymmetric> {
        ParametersBuilder::default()
    }

    /// The validated key set.
    #[inline]
    pub fn keys(&self) -> &HandshakeKeys {
        &self.keys
    }

    /// Commits to a role once it has been resolved.
    pub fn into_role(self, is_alice: bool) -> Role {
        if is_alice {
            Role::Alice(AliceParameters { keys: self.keys })
        } else {
            Role::Bob(BobParameters { keys: self.keys })
        }
    }
}

/// A parameter bundle whose handshake role is known.
#[derive(Clone, Debug)]
pub enum Role {
    /// We initiate and run the first DH ratchet step ourselves.
    Alice(AliceParameters),
    /// We respond and reuse our ephemeral key as the first ratchet key.
    Bob(BobParameters),
}

impl Role {
    /// The key set behind either role.
    pub fn keys(&self) -> &HandshakeKeys {
        match self {
            Role::Alice(parameters) => parameters.keys(),
            Role::Bob(parameters) => parameters.keys(),
        }
    }

    /// Whether this is the Alice role.
    pub fn is_alice(&self) -> bool {
        matches!(self, Role::Alice(_))
    }
}

/// Marks a [`ParametersBuilder`] that produces [`AliceParameters`].
#[derive(Clone, Copy, Debug)]
pub enum ForAlice {}

/// Marks a [`ParametersBuilder`] that produces [`BobParameters`].
#[derive(Clone, Copy, Debug)]
pub enum ForBob {}

/// Marks a [`ParametersBuilder`] that produces [`SymmetricParameters`].
#[derive(Clone, Copy, Debug)]
pub enum ForSymmetric {}

/// Collects handshake keys and validates them into a parameter bundle.
///
/// The type parameter fixes which bundle the builder can produce, so a
/// builder started for one role cannot finish as another:
///
/// ```compile_fail
/// let _ = axolotl::AliceParameters::builder().build_bob();
/// ```
///
/// # Pre-keys
///
/// The one-time pre-key agreement is only included when *both* pre-keys are
/// present, and both peers must make the same decision. Nothing in a single
/// bundle can tell whether the peer supplied a matching pre-key: a mismatch
/// silently yields different secrets on each side.
#[derive(Clone, Debug)]
pub struct ParametersBuilder<R> {
    our_identity_key: Option<IdentityKeyPair>,
    our_base_key: Option<KeyPair>,
    our_ephemeral_key: Option<KeyPair>,
    our_pre_key: Option<KeyPair>,
    their_identity_key: Option<IdentityKey>,
    their_base_key: Option<PublicKey>,
    their_ephemeral_key: Option<PublicKey>,
    their_pre_key: Option<PublicKey>,
    role: PhantomData<fn() -> R>,
}

impl<R> Default for ParametersBuilder<R> {
    fn default() -> Self {
        Self {
            our_identity_key: None,
            our_base_key: None,
            our_ephemeral_key: None,
            our_pre_key: None,
            their_identity_key: None,
            their_base_key: None,
            their_ephemeral_key: None,
            their_pre_key: None,
            role: PhantomData,
        }
    }
}

impl<R> ParametersBuilder<R> {
    /// Sets our long-term identity key pair.
    pub fn our_identity_key(mut self, key: IdentityKeyPair) -> Self {
        self.our_identity_key = Some(key);
        self
    }

    /// Sets our base key pair.
    pub fn our_base_key(mut self, key: KeyPair) -> Self {
        self.our_base_key = Some(key);
        self
    }

    /// Sets our ephemeral key pair.
    pub fn our_ephemeral_key(mut self, key: KeyPair) -> Self {
        self.our_ephemeral_key = Some(key);
        self
    }

    /// Sets or clears our one-time pre-key.
    pub fn our_pre_key(mut self, key: Option<KeyPair>) -> Self {
        self.our_pre_key = key;
        self
    }

    /// Sets the peer's identity key.
    pub fn their_identity_key(mut self, key: IdentityKey) -> Self {
        self.their_identity_key = Some(key);
        self
    }

    /// Sets the peer's base key.
    pub fn their_base_key(mut self, key: PublicKey) -> Self {
        self.their_base_key = Some(key);
        self
    }

    /// Sets the peer's ephemeral key.
    pub fn their_ephemeral_key(mut self, key: PublicKey) -> Self {
        self.their_ephemeral_key = Some(key);
        self
    }

    /// Sets or clears the peer's one-time pre-key.
    pub fn their_pre_key(mut self, key: Option<PublicKey>) -> Self {
        self.their_pre_key = key;
        self
    }

    fn build_keys(self) -> Result<HandshakeKeys, Error> {
        Ok(HandshakeKeys {
            our_identity_key: self
                .our_identity_key
                .ok_or(Error::MissingParameter("our_identity_key"))?,
            our_base_key: self
                .our_base_key
                .ok_or(Error::MissingParameter("our_base_key"))?,
            our_ephemeral_key: self
                .our_ephemeral_key
                .ok_or(Error::MissingParameter("our_ephemeral_key"))?,
            our_pre_key: self.our_pre_key,
            their_identity_key: self
                .their_identity_key
                .ok_or(Error::MissingParameter("their_identity_key"))?,
            their_base_key: self
                .their_base_key
                .ok_or(Error::MissingParameter("their_base_key"))?,
            their_ephemeral_key: self
                .their_ephemeral_key
                .ok_or(Error::MissingParameter("their_ephemeral_key"))?,
            their_pre_key: self.their_pre_key,
        })
    }
}

impl ParametersBuilder<ForAlice> {
    /// Builds Alice's parameters.
    ///
    /// The peer is Bob, so a missing peer ephemeral key defaults to the peer's
    /// base key.
    pub fn build_alice(mut self) -> Result<AliceParameters, Error> {
        if self.their_ephemeral_key.is_none() {
            self.their_ephemeral_key = self.their_base_key;
        }

        Ok(AliceParameters {
            keys: self.build_keys()?,
        })
    }
}

impl ParametersBuilder<ForBob> {
    /// Builds Bob's parameters.
    ///
    /// Bob's signed pre-key serves as both base and ephemeral key, so a
    /// missing ephemeral key defaults to the base key.
    pub fn build_bob(mut self) -> Result<BobParameters, Error> {
        if self.our_ephemeral_key.is_none() {
            self.our_ephemeral_key = self.our_base_key.clone();
        }

        Ok(BobParameters {
            keys: self.build_keys()?,
        })
    }
}

impl ParametersBuilder<ForSymmetric> {
    /// Builds symmetric parameters. Every required key must be set explicitly.
    pub fn build_symmetric(self) -> Result<SymmetricParameters, Error> {
        Ok(SymmetricParameters {
            keys: self.build_keys()?,
        })
    }
}
