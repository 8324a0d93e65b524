use crate::{ChainKey, IdentityKey, KeyPair, PublicKey, RootKey, SessionState};
use std::collections::HashMap;

/// An in-memory [`SessionState`].
///
/// Holds exactly what initialization writes and nothing more; persistence is
/// left to whoever owns the session.
#[derive(Clone, Debug, Default)]
pub struct SessionStructure {
    session_version: Option<u32>,
    local_identity_key: Option<IdentityKey>,
    remote_identity_key: Option<IdentityKey>,
    root_key: Option<RootKey>,
    sender_chain: Option<(KeyPair, ChainKey)>,
    receiver_chains: HashMap<PublicKey, ChainKey>,
    verification: Option<[u8; 8]>,
}

impl SessionStructure {
    /// Creates an empty, uninitialized session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether initialization has been committed.
    pub fn is_initialized(&self) -> bool {
        self.session_version.is_some()
    }

    /// Protocol version, once initialized.
    pub fn session_version(&self) -> Option<u32> {
        self.session_version
    }

    /// Our identity key.
    pub fn local_identity_key(&self) -> Option<&IdentityKey> {
        self.local_identity_key.as_ref()
    }

    /// The peer's identity key.
    pub fn remote_identity_key(&self) -> Option<&IdentityKey> {
        self.remote_identity_key.as_ref()
    }

    /// Current root key.
    pub fn root_key(&self) -> Option<&RootKey> {
        self.root_key.as_ref()
    }

    /// Our current sending ratchet key pair.
    pub fn sender_ratchet_key(&self) -> Option<&KeyPair> {
        self.sender_chain.as_ref().map(|(key_pair, _)| key_pair)
    }

    /// Our current sending chain key.
    pub fn sender_chain_key(&self) -> Option<&ChainKey> {
        self.sender_chain.as_ref().map(|(_, chain_key)| chain_key)
    }

    /// The receiver chain for messages ratcheted with `sender_ratchet_key`.
    pub fn receiver_chain_key(&self, sender_ratchet_key: &PublicKey) -> Option<&ChainKey> {
        self.receiver_chains.get(sender_ratchet_key)
    }

    /// Number of receiver chains held.
    pub fn receiver_chain_count(&self) -> usize {
        self.receiver_chains.len()
    }

    /// Out-of-band verification tag.
    pub fn verification(&self) -> Option<&[u8; 8]> {
        self.verification.as_ref()
    }
}

impl SessionState for SessionStructure {
    fn set_local_identity_key(&mut self, identity_key: IdentityKey) {
        self.local_identity_key = Some(identity_key);
    }

    fn set_remote_identity_key(&mut self, identity_key: IdentityKey) {
        self.remote_identity_key = Some(identity_key);
    }

    fn set_root_key(&mut self, root_key: RootKey) {
        self.root_key = Some(root_key);
    }

    fn set_sender_chain(&mut self, sender_ratchet_key: KeyPair, chain_key: ChainKey) {
        self.sender_chain = Some((sender_ratchet_key, chain_key));
    }

    fn add_receiver_chain(&mut self, sender_ratchet_key: PublicKey, chain_key: ChainKey) {
        self.receiver_chains.insert(sender_ratchet_key, chain_key);
    }

    fn set_session_version(&mut self, version: u32) {
        self.session_version = Some(version);
    }

    fn set_verification(&mut self, tag: [u8; 8]) {
        self.verification = Some(tag);
    }
}
