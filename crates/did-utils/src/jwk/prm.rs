use serde::{Deserialize, Serialize};

/// JWK parameters unrelated to the key implementation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// The key identifier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// The algorithm used with this key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alg: Option<String>,

    /// The intended public key use, `sig` or `enc`.
    #[serde(skip_serializing_if = "Option::is_none", default, rename = "use")]
    pub cls: Option<String>,
}
