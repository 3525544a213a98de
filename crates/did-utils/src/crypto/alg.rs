use multibase::Base;
use thiserror::Error;

/// Supported cryptographic algorithms.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Ed25519,
    X25519,
    Secp256k1,
    P256,
    P384,
}

use Algorithm::*;

// See:
// - https://w3c-ccg.github.io/did-method-key/#signature-method-creation-algorithm
// - https://github.com/multiformats/multicodec/blob/master/table.csv
impl Algorithm {
    /// Returns the varint-encoded multicodec prefix associated with the algorithm.
    pub fn multicodec_prefix(&self) -> [u8; 2] {
        match self {
            Ed25519 => [0xed, 0x01],
            X25519 => [0xec, 0x01],
            Secp256k1 => [0xe7, 0x01],
            P256 => [0x80, 0x24],
            P384 => [0x81, 0x24],
        }
    }

    /// Creates an `Algorithm` from the given multicodec prefix.
    pub fn from_multicodec_prefix(prefix: &[u8; 2]) -> Option<Self> {
        match prefix {
            [0xed, 0x01] => Some(Ed25519),
            [0xec, 0x01] => Some(X25519),
            [0xe7, 0x01] => Some(Secp256k1),
            [0x80, 0x24] => Some(P256),
            [0x81, 0x24] => Some(P384),
            _ => None,
        }
    }

    /// Returns the length in bytes of the (compressed) public key for the algorithm.
    pub fn public_key_length(&self) -> usize {
        match self {
            Ed25519 | X25519 => 32,
            Secp256k1 | P256 => 33,
            P384 => 49,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeMultikeyError {
    #[error("error to decode multibase")]
    MultibaseDecodeError,
    #[error("not base58btc encoded")]
    NotBase58BtcEncoded,
    #[error("error to identify algorithm")]
    ErrorIdentifyingAlgorithm,
    #[error("public key length mismatch for {0:?}")]
    AssertionFailedOnPubKeyLength(Algorithm),
}

/// Decodes algorithm and key bytes from a multibase-encoded multikey.
pub fn decode_multikey(multikey: &str) -> Result<(Algorithm, Vec<u8>), DecodeMultikeyError> {
    let (base, multicodec) = multibase::decode(multikey).map_err(|_| DecodeMultikeyError::MultibaseDecodeError)?;

    // Assert decoded multibase encoding
    if base != Base::Base58Btc {
        return Err(DecodeMultikeyError::NotBase58BtcEncoded);
    }

    // Partition multicodec prefix from key bytes
    if multicodec.len() < 2 {
        return Err(DecodeMultikeyError::ErrorIdentifyingAlgorithm);
    }
    let (prefix, key) = multicodec.split_at(2);
    let prefix: [u8; 2] = [prefix[0], prefix[1]];

    let alg = Algorithm::from_multicodec_prefix(&prefix).ok_or(DecodeMultikeyError::ErrorIdentifyingAlgorithm)?;

    if key.len() != alg.public_key_length() {
        return Err(DecodeMultikeyError::AssertionFailedOnPubKeyLength(alg));
    }

    Ok((alg, key.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_multikey() {
        let multikey = "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";
        let (alg, bytes) = decode_multikey(multikey).unwrap();
        assert_eq!(alg, Ed25519);
        assert_eq!(bytes.len(), 32);

        let multikey = "zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme";
        let (alg, bytes) = decode_multikey(multikey).unwrap();
        assert_eq!(alg, Secp256k1);
        assert_eq!(hex::encode(bytes), "03874c15c7fda20e539c6e5ba573c139884c351188799f5458b4b41f7924f235cd");

        let multikey = "zDnaerDaTF5BXEavCrfRZEk316dpbLsfPDZ3WJ5hRTPFU2169";
        let (alg, bytes) = decode_multikey(multikey).unwrap();
        assert_eq!(alg, P256);
        assert_eq!(bytes.len(), 33);
    }

    #[test]
    fn test_decode_multikey_negative_cases() {
        let short_ed25519 = multibase::encode(Base::Base58Btc, [&[0xed, 0x01][..], &[1u8; 31]].concat());

        let cases = [
            ("!6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp", DecodeMultikeyError::MultibaseDecodeError),
            ("mO2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik", DecodeMultikeyError::NotBase58BtcEncoded),
            ("z1111", DecodeMultikeyError::ErrorIdentifyingAlgorithm),
            (&short_ed25519, DecodeMultikeyError::AssertionFailedOnPubKeyLength(Ed25519)),
        ];

        for (multikey, expected) in cases {
            assert_eq!(decode_multikey(multikey).unwrap_err(), expected, "{multikey}");
        }
    }
}
