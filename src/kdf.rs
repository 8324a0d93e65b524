use crate::Error;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

const HASH_OUTPUT_SIZE: usize = 32;

/// Computes `HMAC-SHA256(key, parts[0] || parts[1] || ...)`.
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], Error> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)?;
    for part in parts {
        mac.update(part);
    }

    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}

/// Which flavour of HKDF a session derives its keys with.
///
/// Version 2 sessions number their expand blocks from 0, version 3 sessions
/// follow RFC 5869 and number them from 1. Everything else is identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KdfVersion {
    /// Legacy expansion with a zero-based block counter.
    V2,
    /// RFC 5869 HKDF.
    V3,
}

impl KdfVersion {
    /// Selects the KDF used by a given protocol version.
    pub fn for_session_version(version: u32) -> Result<Self, Error> {
        match version {
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    /// HKDF extract-then-expand over HMAC-SHA256.
    ///
    /// A missing `salt` is treated as 32 zero bytes.
    pub fn derive_secrets(
        &self,
        input_key_material: &[u8],
        salt: Option<&[u8]>,
        info: &[u8],
        output_length: usize,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let mut okm = Zeroizing::new(vec![0u8; output_length]);

        match self {
            Self::V3 => {
                let hkdf = Hkdf::<Sha256>::new(salt, input_key_material);
                hkdf.expand(info, okm.as_mut_slice())?;
            }
            Self::V2 => {
                let (output, _) = Hkdf::<Sha256>::extract(salt, input_key_material);
                let mut prk = Zeroizing::new([0u8; HASH_OUTPUT_SIZE]);
                prk.copy_from_slice(&output);
                Self::expand_from_zero(prk.as_slice(), info, okm.as_mut_slice())?;
            }
        }

        Ok(okm)
    }

    fn expand_from_zero(prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error> {
        if okm.len() > 255 * HASH_OUTPUT_SIZE {
            return Err(Error::from(hkdf::InvalidLength));
        }

        let mut previous = Zeroizing::new([0u8; HASH_OUTPUT_SIZE]);
        for (index, block) in okm.chunks_mut(HASH_OUTPUT_SIZE).enumerate() {
            let counter = u8::try_from(index).map_err(|_| hkdf::InvalidLength)?;
            let last: &[u8] = if counter == 0 { &[] } else { previous.as_slice() };
            let next = Zeroizing::new(hmac_sha256(prk, &[last, info, &[counter]])?);
            block.copy_from_slice(&next[..block.len()]);
            previous = next;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 5869, test case 1.
    const IKM: [u8; 22] = [0x0b; 22];
    const SALT: [u8; 13] = hex!("000102030405060708090a0b0c");
    const INFO: [u8; 10] = hex!("f0f1f2f3f4f5f6f7f8f9");

    #[test]
    fn test_v3_matches_rfc_5869() {
        let okm = KdfVersion::V3
            .derive_secrets(&IKM, Some(SALT.as_slice()), &INFO, 42)
            .unwrap();

        assert_eq!(
            okm.as_slice(),
            hex!(
                "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf"
                "34007208d5b887185865"
            )
        );
    }

    #[test]
    fn test_v2_counts_blocks_from_zero() {
        let okm = KdfVersion::V2
            .derive_secrets(&IKM, Some(SALT.as_slice()), &INFO, 42)
            .unwrap();

        assert_eq!(
            okm.as_slice(),
            hex!(
                "6ec2556d5d7b1d81dee4222ad7483695ddc98f4f5fabc0e0205dc2ef8752d41e"
                "04e2e21101c68ff09394"
            )
        );
    }

    #[test]
    fn test_missing_salt_equals_zero_salt() {
        for kdf in [KdfVersion::V2, KdfVersion::V3] {
            let without = kdf.derive_secrets(b"ikm", None, b"info", 64).unwrap();
            let zeroed = kdf
                .derive_secrets(b"ikm", Some([0u8; 32].as_slice()), b"info", 64)
                .unwrap();
            assert_eq!(without.as_slice(), zeroed.as_slice());
        }
    }

    #[test]
    fn test_output_length_limit() {
        for kdf in [KdfVersion::V2, KdfVersion::V3] {
            let result = kdf.derive_secrets(b"ikm", None, b"info", 255 * 32 + 1);
            assert!(matches!(result, Err(Error::Crypto(_))));
        }
    }

    #[test]
    fn test_version_selection() {
        assert_eq!(KdfVersion::for_session_version(2), Ok(KdfVersion::V2));
        assert_eq!(KdfVersion::for_session_version(3), Ok(KdfVersion::V3));
        assert_eq!(
            KdfVersion::for_session_version(4),
            Err(Error::UnsupportedVersion(4))
        );
    }
}
