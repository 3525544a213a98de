/*! # did-utils

Building blocks for Decentralized Identifiers (DIDs) and Verifiable Credentials.

## Features

- **Key material**: Ed25519, P-256, secp256k1 and P-384 key pairs, JSON Web Keys and multikeys.
- **DID methods**: `did:key`, `did:jwk`, `did:peer` (numalgo 0) and `did:web` resolvers behind a method registry.
- **Linked data**: JSON-LD `@context` handling with an offline context loader.
- **Proofs**: Data Integrity proofs over JCS-canonicalized documents (`eddsa-jcs-2022`, `ecdsa-jcs-2019`, `ecdsa-secp256k1-jcs-2019`).
- **Verifiable Credentials**: structural models for credentials and presentations.

*/
pub mod crypto;
pub mod didcore;
pub mod jwk;
pub mod ldmodel;
pub mod methods;
pub mod proof;
pub mod vc;
