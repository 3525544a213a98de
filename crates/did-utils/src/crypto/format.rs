/// Representation of public keys inside generated verification methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicKeyFormat {
    /// `Multikey` type with a `publicKeyMultibase` property.
    #[default]
    Multikey,
    /// `JsonWebKey2020` type with a `publicKeyJwk` property.
    Jwk,
}

impl PublicKeyFormat {
    /// Verification method type associated with the format.
    pub fn verification_method_type(&self) -> &'static str {
        match self {
            PublicKeyFormat::Multikey => "Multikey",
            PublicKeyFormat::Jwk => "JsonWebKey2020",
        }
    }

    /// JSON-LD context defining the verification method type.
    pub fn context(&self) -> &'static str {
        match self {
            PublicKeyFormat::Multikey => "https://w3id.org/security/multikey/v1",
            PublicKeyFormat::Jwk => "https://w3id.org/security/suites/jws-2020/v1",
        }
    }
}
