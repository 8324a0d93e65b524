mod chain;
mod message_keys;
mod root_key;

pub use chain::ChainKey;
pub use message_keys::MessageKeys;
pub use root_key::RootKey;
