#[macro_use]
extern crate afl;
use axolotl::{
    BobParameters, Curve25519, CurveProvider, IdentityKey, IdentityKeyPair, PublicKey,
    RatchetConfig, RatchetingSession, SessionStructure,
};

fn main() {
    // Bob's side stays fixed; the attacker controls everything Alice sends.
    let curve = Curve25519;
    let bob_identity = IdentityKeyPair::generate(&curve).expect("Setup failed");
    let bob_base = curve.generate_key_pair().expect("Setup failed");
    let session = RatchetingSession::new(RatchetConfig::default());

    fuzz!(|data: &[u8]| {
        let Some((&version, keys)) = data.split_first() else {
            return;
        };
        let (Ok(identity), Ok(base)) = (
            PublicKey::decode_point(keys, 0),
            PublicKey::decode_point(keys, 33),
        ) else {
            return;
        };

        let Ok(parameters) = BobParameters::builder()
            .our_identity_key(bob_identity.clone())
            .our_base_key(bob_base.clone())
            .their_identity_key(IdentityKey::from(identity))
            .their_base_key(base)
            .their_ephemeral_key(base)
            .their_pre_key(PublicKey::decode_point(keys, 66).ok())
            .build_bob()
        else {
            return;
        };

        let mut state = SessionStructure::new();
        let result = session.initialize_session_as_bob(&mut state, u32::from(version), &parameters);
        assert_eq!(result.is_ok(), state.is_initialized());
    });
}
