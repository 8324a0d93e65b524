#[macro_use]
extern crate afl;
use axolotl::{IdentityKey, PublicKey};

fn main() {
    fuzz!(|data: &[u8]| {
        let offset = data.first().map_or(0, |byte| usize::from(*byte));
        if let Ok(key) = PublicKey::decode_point(data, offset) {
            assert_eq!(PublicKey::decode_point(&key.serialize(), 0), Ok(key));
        }
        let _ = IdentityKey::decode(data, 0);
    });
}
