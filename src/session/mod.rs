mod structure;
pub use structure::SessionStructure;

use crate::{ChainKey, IdentityKey, KeyPair, PublicKey, RootKey};

/// Sink for the results of session initialization.
///
/// Setters are infallible: by the time any of them is called the whole result
/// has already been computed, so a session is either fully initialized or not
/// touched at all.
pub trait SessionState {
    /// Records our identity key.
    fn set_local_identity_key(&mut self, identity_key: IdentityKey);

    /// Records the peer's identity key.
    fn set_remote_identity_key(&mut self, identity_key: IdentityKey);

    /// Replaces the root key.
    fn set_root_key(&mut self, root_key: RootKey);

    /// Replaces the sender chain and its ratchet key pair.
    fn set_sender_chain(&mut self, sender_ratchet_key: KeyPair, chain_key: ChainKey);

    /// Adds a receiver chain for messages ratcheted with `sender_ratchet_key`.
    fn add_receiver_chain(&mut self, sender_ratchet_key: PublicKey, chain_key: ChainKey);

    /// Records the protocol version the session runs at.
    fn set_session_version(&mut self, version: u32);

    /// Records the out-of-band verification tag.
    fn set_verification(&mut self, tag: [u8; 8]);
}

/// Everything session initialization produces, computed before any of it is
/// written to a [`SessionState`].
#[derive(Clone, Debug)]
pub struct SessionInitResult {
    pub(crate) version: u32,
    pub(crate) local_identity_key: IdentityKey,
    pub(crate) remote_identity_key: IdentityKey,
    pub(crate) root_key: RootKey,
    pub(crate) sender_ratchet_key: KeyPair,
    pub(crate) sender_chain_key: ChainKey,
    pub(crate) receiver_chain: Option<(PublicKey, ChainKey)>,
    pub(crate) verification: Option<[u8; 8]>,
}

impl SessionInitResult {
    /// Protocol version of the new session.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Root key the session continues ratcheting from.
    #[inline]
    pub fn root_key(&self) -> &RootKey {
        &self.root_key
    }

    /// Our first sending ratchet key pair.
    #[inline]
    pub fn sender_ratchet_key(&self) -> &KeyPair {
        &self.sender_ratchet_key
    }

    /// Chain key for our first outgoing messages.
    #[inline]
    pub fn sender_chain_key(&self) -> &ChainKey {
        &self.sender_chain_key
    }

    /// Receiver chain for the peer's first ratchet key, when we played Alice.
    #[inline]
    pub fn receiver_chain(&self) -> Option<&(PublicKey, ChainKey)> {
        self.receiver_chain.as_ref()
    }

    /// Out-of-band verification tag, for version 3 and later.
    #[inline]
    pub fn verification(&self) -> Option<&[u8; 8]> {
        self.verification.as_ref()
    }

    /// Writes the result into `state`.
    pub fn commit<S: SessionState + ?Sized>(self, state: &mut S) {
        let Self {
            version,
            local_identity_key,
            remote_identity_key,
            root_key,
            sender_ratchet_key,
            sender_chain_key,
            receiver_chain,
            verification,
        } = self;

        state.set_local_identity_key(local_identity_key);
        state.set_remote_identity_key(remote_identity_key);
        if let Some((their_ratchet_key, chain_key)) = receiver_chain {
            state.add_receiver_chain(their_ratchet_key, chain_key);
        }
        state.set_sender_chain(sender_ratchet_key, sender_chain_key);
        state.set_root_key(root_key);
        if let Some(tag) = verification {
            state.set_verification(tag);
        }
        state.set_session_version(version);

        tracing::debug!(version, "committed session state");
    }
}
