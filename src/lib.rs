/*! # vc-toolkit

Issue, prepare and verify Verifiable Credentials and Presentations secured
with Data Integrity proofs or as VC-JWTs, and derive and resolve the DIDs
behind them.

The Rust API returns [`Result`]s. The [`api`] module exposes the same
operations over JSON strings, reporting failures through a per-thread
status slot.

## Example

```no_run
use vc_toolkit::{
    derivation::{generate_key, key_to_did, MethodPattern},
    issuer::issue_credential,
    ContextLoader, ProofOptions,
};
use serde_json::json;

# fn main() -> vc_toolkit::Result<()> {
let key = generate_key("Ed25519")?;
let did = key_to_did(MethodPattern::Key, &key)?;

let credential = json!({
    "@context": ["https://www.w3.org/ns/credentials/v2"],
    "type": ["VerifiableCredential"],
    "issuer": did,
    "credentialSubject": {"id": "did:example:subject"}
});
let secured = issue_credential(&credential, &ProofOptions::default(), &key, &ContextLoader::new())?;
# Ok(())
# }
```
*/

pub mod api;
pub mod config;
pub mod context;
pub mod derivation;
pub mod error;
pub mod issuer;
pub mod jwt;
pub mod options;
pub mod report;
pub mod resolution;
mod status;
pub mod token;
pub mod verifier;

pub use config::EngineConfig;
pub use did_utils::{crypto::KeyPair, ldmodel::ContextLoader};
pub use error::{Error, ErrorKind, Result};
pub use options::{Check, ProofFormat, ProofOptions};
pub use report::VerificationReport;
pub use token::{DocumentKind, PreparedProof};
