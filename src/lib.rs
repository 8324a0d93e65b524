mod types;
pub use types::*;

mod curve;
pub use curve::{Curve25519, CurveProvider};

mod kdf;
pub use kdf::KdfVersion;

mod identity_key;
pub use identity_key::*;

mod ratchet;
pub use ratchet::*;

mod verify_key;
pub use verify_key::*;

mod x3dh;
pub use x3dh::*;

mod session;
pub use session::*;

mod error;
pub use error::Error;

mod config;
pub use config::*;
