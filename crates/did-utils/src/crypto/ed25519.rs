use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use multibase::Base::Base58Btc;

use super::{
    alg::Algorithm,
    errors::Error,
    traits::{CoreSign, Generate, KeyMaterial, ToMultikey},
    utils::generate_seed,
    AsymmetricKey,
};

/// A wrapper struct for an Ed25519 asymmetric key pair.
pub type Ed25519KeyPair = AsymmetricKey<VerifyingKey, SigningKey>;

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self.public_key))
    }
}

impl KeyMaterial for Ed25519KeyPair {
    fn public_key_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.public_key.as_bytes().to_vec())
    }

    fn private_key_bytes(&self) -> Result<Vec<u8>, Error> {
        match &self.secret_key {
            Some(sk) => Ok(sk.to_bytes().to_vec()),
            None => Err(Error::MissingSecretKey),
        }
    }
}

impl Generate for Ed25519KeyPair {
    fn new() -> Result<Ed25519KeyPair, Error> {
        Self::new_with_seed(&[])
    }

    fn new_with_seed(seed: &[u8]) -> Result<Ed25519KeyPair, Error> {
        let secret_seed = generate_seed::<SECRET_KEY_LENGTH>(seed)?;
        let sk = SigningKey::from_bytes(&secret_seed);
        Ok(Ed25519KeyPair {
            public_key: sk.verifying_key(),
            secret_key: Some(sk),
        })
    }

    fn from_public_key(public_key: &[u8]) -> Result<Ed25519KeyPair, Error> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = public_key.try_into().map_err(|_| Error::InvalidKeyLength)?;
        let vk = VerifyingKey::from_bytes(&bytes).map_err(|_| Error::InvalidPublicKey)?;

        Ok(Ed25519KeyPair {
            public_key: vk,
            secret_key: None,
        })
    }

    fn from_secret_key(secret_key: &[u8]) -> Result<Ed25519KeyPair, Error> {
        let bytes: [u8; SECRET_KEY_LENGTH] = secret_key.try_into().map_err(|_| Error::InvalidKeyLength)?;
        let sk = SigningKey::from_bytes(&bytes);

        Ok(Ed25519KeyPair {
            public_key: sk.verifying_key(),
            secret_key: Some(sk),
        })
    }
}

impl CoreSign for Ed25519KeyPair {
    /// Signs the given payload and returns the signature.
    ///
    /// # Example
    ///
    /// ```
    /// use did_utils::crypto::{CoreSign, Ed25519KeyPair, Generate};
    ///
    /// let kp = Ed25519KeyPair::new().unwrap();
    /// let signature = kp.sign(b"Hello, World!").unwrap();
    /// assert_eq!(signature.len(), 64);
    /// ```
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        match &self.secret_key {
            Some(sk) => sk
                .try_sign(payload)
                .map(|signature| signature.to_bytes().to_vec())
                .map_err(|_| Error::SignatureError),
            None => Err(Error::MissingSecretKey),
        }
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), Error> {
        let sig = Signature::try_from(signature).map_err(|_| Error::CanNotRetrieveSignature)?;
        self.public_key.verify(payload, &sig).map_err(|_| Error::VerificationError)
    }
}

impl ToMultikey for Ed25519KeyPair {
    fn to_multikey(&self) -> String {
        let prefix = &Algorithm::Ed25519.multicodec_prefix();
        let bytes = &self.public_key.as_bytes()[..];
        multibase::encode(Base58Btc, [prefix, bytes].concat())
    }
}

impl Ed25519KeyPair {
    /// Derives the X25519 public key matching this Ed25519 public key.
    ///
    /// The Edwards point is converted to its birationally equivalent
    /// Montgomery form, as done for `did:key` key agreement derivation.
    pub fn x25519_public_key(&self) -> Result<[u8; 32], Error> {
        CompressedEdwardsY(self.public_key.to_bytes())
            .decompress()
            .map(|point| point.to_montgomery().to_bytes())
            .ok_or(Error::InvalidPublicKey)
    }

    /// Multikey encoding of the derived X25519 public key.
    pub fn x25519_multikey(&self) -> Result<String, Error> {
        let prefix = Algorithm::X25519.multicodec_prefix();
        let bytes = self.x25519_public_key()?;
        Ok(multibase::encode(Base58Btc, [&prefix[..], &bytes[..]].concat()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Generate a new Ed25519KeyPair with a seed and check that bytes of both private and public key
    // are equal to the expected hex strings.
    #[test]
    fn test_new_with_seed() {
        let seed = b"Sample seed bytes of thirtytwo!b";
        let keypair = Ed25519KeyPair::new_with_seed(seed).unwrap();
        let pub_key_hex = hex::encode(keypair.public_key_bytes().unwrap());
        let pri_key_hex = hex::encode(keypair.private_key_bytes().unwrap());
        assert_eq!(pub_key_hex, "412328b0201b71d0144a27d028057b6fdf58d22e0f3baaebaa5388140e57bbbd");
        assert_eq!(pri_key_hex, "53616d706c652073656564206279746573206f662074686972747974776f2162");
    }

    #[test]
    fn test_sign_verify() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let payload = br#"{"hello":"world"}"#;

        let signature = keypair.sign(payload).unwrap();
        assert!(keypair.verify(payload, &signature).is_ok());
        assert_eq!(keypair.verify(b"tampered", &signature), Err(Error::VerificationError));
        assert_eq!(keypair.verify(payload, &signature[1..]), Err(Error::CanNotRetrieveSignature));
    }

    #[test]
    fn test_public_only_key_cannot_sign() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let public = Ed25519KeyPair::from_public_key(&keypair.public_key_bytes().unwrap()).unwrap();

        assert_eq!(public.sign(b"payload"), Err(Error::MissingSecretKey));
        assert_eq!(public.private_key_bytes(), Err(Error::MissingSecretKey));
    }

    #[test]
    fn test_ed25519_keypair_to_multikey() {
        let bytes = multibase::Base::Base64Url.decode("O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik").unwrap();
        let keypair = Ed25519KeyPair::from_public_key(&bytes).unwrap();

        assert_eq!(&keypair.to_multikey(), "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");
        assert!(keypair.x25519_multikey().unwrap().starts_with("z6LS"));
    }
}
