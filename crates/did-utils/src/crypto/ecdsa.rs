//! ECDSA key pairs over the NIST P-256, secp256k1 and NIST P-384 curves.
//!
//! Signatures are the fixed-size `r || s` concatenation. Nonces are derived
//! deterministically (RFC 6979), so signing the same payload twice with the
//! same key yields the same signature.

use multibase::Base::Base58Btc;

use super::{
    alg::Algorithm,
    errors::Error,
    traits::{CoreSign, Generate, KeyMaterial, ToMultikey},
    utils::generate_seed,
    AsymmetricKey,
};

/// A wrapper struct for a P-256 asymmetric key pair.
pub type P256KeyPair = AsymmetricKey<p256::ecdsa::VerifyingKey, p256::ecdsa::SigningKey>;

/// A wrapper struct for a secp256k1 asymmetric key pair.
pub type Secp256k1KeyPair = AsymmetricKey<k256::ecdsa::VerifyingKey, k256::ecdsa::SigningKey>;

/// A wrapper struct for a P-384 asymmetric key pair.
pub type P384KeyPair = AsymmetricKey<p384::ecdsa::VerifyingKey, p384::ecdsa::SigningKey>;

// Random scalars fall outside the curve order with negligible probability,
// a handful of draws is enough.
const MAX_GENERATION_ATTEMPTS: usize = 8;

macro_rules! impl_ecdsa_key_pair {
    ($pair:ty, $curve:ident, $alg:expr, $scalar_len:expr, $low_s:expr) => {
        impl std::fmt::Debug for $pair {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_fmt(format_args!("{:?}", self.public_key))
            }
        }

        impl KeyMaterial for $pair {
            fn public_key_bytes(&self) -> Result<Vec<u8>, Error> {
                use $curve::elliptic_curve::sec1::ToEncodedPoint;
                Ok(self.public_key.to_encoded_point(true).as_bytes().to_vec())
            }

            fn private_key_bytes(&self) -> Result<Vec<u8>, Error> {
                match &self.secret_key {
                    Some(sk) => Ok(sk.to_bytes().to_vec()),
                    None => Err(Error::MissingSecretKey),
                }
            }
        }

        impl Generate for $pair {
            fn new() -> Result<Self, Error> {
                Self::new_with_seed(&[])
            }

            fn new_with_seed(seed: &[u8]) -> Result<Self, Error> {
                let attempts = if seed.is_empty() { MAX_GENERATION_ATTEMPTS } else { 1 };
                for _ in 0..attempts {
                    let secret = generate_seed::<$scalar_len>(seed)?;
                    if let Ok(keypair) = Self::from_secret_key(&secret) {
                        return Ok(keypair);
                    }
                }
                Err(Error::InvalidSeed)
            }

            fn from_public_key(public_key: &[u8]) -> Result<Self, Error> {
                let vk = $curve::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|_| Error::InvalidPublicKey)?;
                Ok(Self {
                    public_key: vk,
                    secret_key: None,
                })
            }

            fn from_secret_key(secret_key: &[u8]) -> Result<Self, Error> {
                if secret_key.len() != $scalar_len {
                    return Err(Error::InvalidKeyLength);
                }
                let sk = $curve::ecdsa::SigningKey::from_slice(secret_key).map_err(|_| Error::InvalidSecretKey)?;
                Ok(Self {
                    public_key: $curve::ecdsa::VerifyingKey::from(&sk),
                    secret_key: Some(sk),
                })
            }
        }

        impl CoreSign for $pair {
            fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
                use $curve::ecdsa::signature::Signer;

                match &self.secret_key {
                    Some(sk) => {
                        let signature: $curve::ecdsa::Signature = sk.try_sign(payload).map_err(|_| Error::SignatureError)?;
                        Ok(signature.to_bytes().to_vec())
                    }
                    None => Err(Error::MissingSecretKey),
                }
            }

            fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), Error> {
                use $curve::ecdsa::signature::Verifier;

                let sig = $curve::ecdsa::Signature::from_slice(signature).map_err(|_| Error::CanNotRetrieveSignature)?;
                self.public_key.verify(payload, &sig).map_err(|_| Error::VerificationError)
            }
        }

        impl ToMultikey for $pair {
            fn to_multikey(&self) -> String {
                let prefix = $alg.multicodec_prefix();
                // Compressed SEC1 encoding never fails for a valid verifying key.
                let bytes = self.public_key_bytes().unwrap_or_default();
                multibase::encode(Base58Btc, [&prefix[..], &bytes[..]].concat())
            }
        }

        impl $pair {
            /// Affine `(x, y)` coordinates of the public key, as used by JWKs.
            pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
                use $curve::elliptic_curve::sec1::ToEncodedPoint;

                let point = self.public_key.to_encoded_point(false);
                let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
                let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
                (x, y)
            }

            /// Builds a public-only key pair from affine coordinates.
            pub fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, Error> {
                if x.len() != $scalar_len || y.len() != $scalar_len {
                    return Err(Error::InvalidKeyLength);
                }
                let uncompressed = [&[0x04][..], x, y].concat();
                Self::from_public_key(&uncompressed)
            }

            /// Parses a fixed-size `r || s` signature and returns it in canonical form.
            ///
            /// Curves whose verifiers reject high-S signatures get the low-S twin.
            pub fn normalize_signature(signature: &[u8]) -> Result<Vec<u8>, Error> {
                let sig = $curve::ecdsa::Signature::from_slice(signature).map_err(|_| Error::CanNotRetrieveSignature)?;
                let sig = if $low_s { sig.normalize_s().unwrap_or(sig) } else { sig };
                Ok(sig.to_bytes().to_vec())
            }
        }
    };
}

impl_ecdsa_key_pair!(P256KeyPair, p256, Algorithm::P256, 32, false);
impl_ecdsa_key_pair!(Secp256k1KeyPair, k256, Algorithm::Secp256k1, 32, true);
impl_ecdsa_key_pair!(P384KeyPair, p384, Algorithm::P384, 48, false);

#[cfg(test)]
mod tests {
    use super::*;
    use multibase::Base::Base64Url;

    #[test]
    fn test_new_keys_have_expected_lengths() {
        let p256 = P256KeyPair::new().unwrap();
        assert_eq!(p256.public_key_bytes().unwrap().len(), 33);
        assert_eq!(p256.private_key_bytes().unwrap().len(), 32);

        let k256 = Secp256k1KeyPair::new().unwrap();
        assert_eq!(k256.public_key_bytes().unwrap().len(), 33);

        let p384 = P384KeyPair::new().unwrap();
        assert_eq!(p384.public_key_bytes().unwrap().len(), 49);
        assert_eq!(p384.private_key_bytes().unwrap().len(), 48);
    }

    #[test]
    fn test_sign_verify_is_deterministic() {
        let seed = b"Sample seed bytes of thirtytwo!b";
        let keypair = P256KeyPair::new_with_seed(seed).unwrap();

        let first = keypair.sign(b"payload").unwrap();
        let second = keypair.sign(b"payload").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(keypair.verify(b"payload", &first).is_ok());
        assert_eq!(keypair.verify(b"other", &first), Err(Error::VerificationError));
    }

    #[test]
    fn test_p384_signature_length() {
        let keypair = P384KeyPair::new().unwrap();
        let signature = keypair.sign(b"payload").unwrap();
        assert_eq!(signature.len(), 96);
        assert!(keypair.verify(b"payload", &signature).is_ok());
    }

    #[test]
    fn test_secp256k1_to_multikey() {
        let public = hex::decode("03874c15c7fda20e539c6e5ba573c139884c351188799f5458b4b41f7924f235cd").unwrap();
        let keypair = Secp256k1KeyPair::from_public_key(&public).unwrap();
        assert_eq!(keypair.to_multikey(), "zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme");

        let (x, y) = keypair.coordinates();
        assert_eq!(Base64Url.encode(x), "h0wVx_2iDlOcblulc8E5iEw1EYh5n1RYtLQfeSTyNc0");
        assert_eq!(Base64Url.encode(y), "O2EATIGbu6DezKFptj5scAIRntgfecanVNXxat1rnwE");
    }

    #[test]
    fn test_p256_from_coordinates() {
        let x = Base64Url.decode("fyNYMN0976ci7xqiSdag3buk-ZCwgXU4kz9XNkBlNUI").unwrap();
        let y = Base64Url.decode("hW2ojTNfH7Jbi8--CJUo3OCbH3y5n91g-IMA9MLMbTU").unwrap();

        let keypair = P256KeyPair::from_coordinates(&x, &y).unwrap();
        assert_eq!(keypair.to_multikey(), "zDnaerDaTF5BXEavCrfRZEk316dpbLsfPDZ3WJ5hRTPFU2169");
        assert_eq!(P256KeyPair::from_coordinates(&x[1..], &y).unwrap_err(), Error::InvalidKeyLength);
    }

    #[test]
    fn test_public_only_key_cannot_sign() {
        let keypair = P384KeyPair::new().unwrap();
        let public = P384KeyPair::from_public_key(&keypair.public_key_bytes().unwrap()).unwrap();
        assert_eq!(public.sign(b"payload"), Err(Error::MissingSecretKey));
    }
}
