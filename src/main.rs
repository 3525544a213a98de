use std::{fs, io::Read, path::PathBuf, process::ExitCode};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use did_utils::{didcore::VerificationRelationship, methods::DIDResolutionOptions};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn, Level};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use vc_toolkit::{
    context::{self, ContextBundle},
    derivation::{self, MethodPattern},
    issuer, jwt, resolution, verifier, Check, ContextLoader, DocumentKind, EngineConfig, KeyPair, PreparedProof,
    ProofFormat, ProofOptions, Result,
};

/// Issue and verify Verifiable Credentials, derive and resolve DIDs.
///
/// Documents are read from stdin, results written to stdout as JSON, or as
/// compact JWS for the `jwt` proof format.
#[derive(Parser, Debug)]
#[command(name = "vc-toolkit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key and print it as a private JWK
    GenerateKey {
        /// Ed25519, P-256, secp256k1 or P-384
        #[arg(short, long, default_value = "Ed25519")]
        curve: String,
    },
    /// Print the DID of a key
    KeyToDid {
        /// key, jwk or peer
        #[arg(default_value = "key")]
        pattern: String,
        #[command(flatten)]
        key: KeyArg,
    },
    /// Print the verification method of a key
    KeyToVerificationMethod {
        /// key, jwk or peer
        #[arg(default_value = "key")]
        pattern: String,
        #[command(flatten)]
        key: KeyArg,
    },
    /// Issue or verify a credential
    #[command(subcommand)]
    Credential(DocumentCmd),
    /// Issue or verify a presentation
    #[command(subcommand)]
    Presentation(DocumentCmd),
    /// Prepare a proof for an external signer
    #[command(subcommand)]
    Prepare(PrepareCmd),
    /// Embed an externally produced signature
    #[command(subcommand)]
    Complete(CompleteCmd),
    /// Resolve a DID into its DID document
    DidResolve {
        did: String,
        #[command(flatten)]
        resolver: ResolverArgs,
    },
    /// Dereference a DID URL
    DidDereference {
        did_url: String,
        #[command(flatten)]
        resolver: ResolverArgs,
    },
    /// Issue a DID authentication presentation
    DidAuth {
        /// DID of the holder
        #[arg(short = 'H', long)]
        holder: String,
        #[command(flatten)]
        key: KeyArg,
        #[command(flatten)]
        proof_options: ProofOptionArgs,
        #[command(flatten)]
        contexts: ContextArgs,
    },
    /// Validate a context document and print its bundle entry
    CreateContext {
        /// URL the context is published at
        url: String,
        /// File holding the context document, read from stdin when absent
        #[arg(short = 'f', long, value_name = "FILE")]
        document_path: Option<PathBuf>,
    },
    /// Build a context bundle from a JSON array of entries read from stdin
    CreateContextMap,
}

#[derive(Subcommand, Debug)]
enum DocumentCmd {
    /// Sign the document read from stdin
    Issue {
        #[command(flatten)]
        key: KeyArg,
        #[command(flatten)]
        proof_options: ProofOptionArgs,
        #[command(flatten)]
        contexts: ContextArgs,
    },
    /// Verify the document read from stdin, exiting with status 2 on errors
    Verify {
        #[command(flatten)]
        proof_options: ProofOptionArgs,
        /// Verify against this public JWK instead of resolving the verification method
        #[arg(long)]
        public_key_jwk: Option<String>,
        #[command(flatten)]
        contexts: ContextArgs,
    },
}

#[derive(Subcommand, Debug)]
enum PrepareCmd {
    /// Prepare a credential read from stdin
    Credential(PrepareArgs),
    /// Prepare a presentation read from stdin
    Presentation(PrepareArgs),
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Public JWK or verification method of the signer
    #[arg(short, long)]
    descriptor: String,
    #[command(flatten)]
    proof_options: ProofOptionArgs,
    #[command(flatten)]
    contexts: ContextArgs,
}

#[derive(Subcommand, Debug)]
enum CompleteCmd {
    /// Complete a credential read from stdin
    Credential(CompleteArgs),
    /// Complete a presentation read from stdin
    Presentation(CompleteArgs),
}

#[derive(Args, Debug)]
struct CompleteArgs {
    /// File holding the token printed by `prepare`
    #[arg(short, long, value_name = "FILE")]
    token_path: PathBuf,
    /// Multibase signature over the token's signing input
    #[arg(short, long)]
    signature: String,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct KeyArg {
    /// File holding a JWK
    #[arg(short, long, value_name = "FILE")]
    key_path: Option<PathBuf>,
    /// JWK given inline
    #[arg(short, long)]
    jwk: Option<String>,
}

impl KeyArg {
    fn load(&self) -> Result<KeyPair> {
        match (&self.key_path, &self.jwk) {
            (Some(path), _) => derivation::parse_jwk(&fs::read_to_string(path)?),
            (None, Some(jwk)) => derivation::parse_jwk(jwk),
            (None, None) => derivation::parse_jwk(""),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CheckArg {
    Proof,
    Validity,
}

impl From<CheckArg> for Check {
    fn from(check: CheckArg) -> Self {
        match check {
            CheckArg::Proof => Check::Proof,
            CheckArg::Validity => Check::Validity,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum FormatArg {
    /// Embedded Data Integrity proof
    #[default]
    Ldp,
    /// VC-JWT
    Jwt,
}

impl From<FormatArg> for ProofFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Ldp => ProofFormat::Ldp,
            FormatArg::Jwt => ProofFormat::Jwt,
        }
    }
}

#[derive(Args, Debug)]
struct ProofOptionArgs {
    #[arg(short, long)]
    proof_purpose: Option<VerificationRelationship>,
    #[arg(short, long)]
    verification_method: Option<String>,
    #[arg(short = 'C', long)]
    challenge: Option<String>,
    #[arg(short = 'D', long)]
    domain: Option<String>,
    #[arg(long)]
    nonce: Option<String>,
    /// RFC 3339 creation time of the proof
    #[arg(long)]
    created: Option<DateTime<Utc>>,
    /// RFC 3339 expiry of the proof
    #[arg(long)]
    expires: Option<DateTime<Utc>>,
    #[arg(long)]
    cryptosuite: Option<String>,
    /// Checks to run when verifying
    #[arg(long, value_enum)]
    check: Vec<CheckArg>,
    /// How the document is secured
    #[arg(long, value_enum, default_value_t)]
    proof_format: FormatArg,
}

impl From<ProofOptionArgs> for ProofOptions {
    fn from(args: ProofOptionArgs) -> Self {
        ProofOptions {
            proof_purpose: args.proof_purpose,
            verification_method: args.verification_method,
            created: args.created,
            challenge: args.challenge,
            domain: args.domain,
            nonce: args.nonce,
            expires: args.expires,
            cryptosuite: args.cryptosuite,
            checks: (!args.check.is_empty()).then(|| args.check.into_iter().map(Check::from).collect()),
            proof_format: Some(args.proof_format.into()),
            public_key_jwk: None,
        }
    }
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Context bundle, as built by `create_context_map`
    #[arg(long, value_name = "FILE")]
    context_bundle: Option<PathBuf>,
}

impl ContextArgs {
    fn loader(&self) -> Result<ContextLoader> {
        match &self.context_bundle {
            Some(path) => ContextBundle::from_json(&fs::read_to_string(path)?)?.loader(),
            None => Ok(ContextLoader::new()),
        }
    }
}

#[derive(Args, Debug)]
struct ResolverArgs {
    /// Bypass the resolution cache
    #[arg(long)]
    no_cache: bool,
}

impl From<ResolverArgs> for DIDResolutionOptions {
    fn from(args: ResolverArgs) -> Self {
        DIDResolutionOptions {
            no_cache: args.no_cache.then_some(true),
            ..DIDResolutionOptions::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = EngineConfig::load();

    // Enable logging
    config_tracing(config.log_level);

    let cli = Cli::parse();
    match run(cli.command, &config).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!(code = err.code(), "{err}");
            ExitCode::from(1)
        }
    }
}

async fn run(command: Command, config: &EngineConfig) -> Result<u8> {
    match command {
        Command::GenerateKey { curve } => {
            let key = derivation::generate_key(&curve)?;
            print_json(&derivation::key_to_jwk(&key, true)?)?;
        }
        Command::KeyToDid { pattern, key } => {
            let pattern: MethodPattern = pattern.parse()?;
            println!("{}", derivation::key_to_did(pattern, &key.load()?)?);
        }
        Command::KeyToVerificationMethod { pattern, key } => {
            let pattern: MethodPattern = pattern.parse()?;
            print_json(&derivation::key_to_verification_method(pattern, &key.load()?)?)?;
        }
        Command::Credential(cmd) => return document(DocumentKind::Credential, cmd, config).await,
        Command::Presentation(cmd) => return document(DocumentKind::Presentation, cmd, config).await,
        Command::Prepare(cmd) => {
            let (kind, args) = match cmd {
                PrepareCmd::Credential(args) => (DocumentKind::Credential, args),
                PrepareCmd::Presentation(args) => (DocumentKind::Presentation, args),
            };
            let descriptor: Value = serde_json::from_str(args.descriptor.trim())?;
            let (key, verification_method) = derivation::parse_key_descriptor(&descriptor)?;
            let contexts = args.contexts.loader()?;

            let token = issuer::prepare(
                kind,
                &read_document()?,
                &args.proof_options.into(),
                &key,
                verification_method.as_deref(),
                &contexts,
            )?;
            println!("{}", token.to_json()?);
        }
        Command::Complete(cmd) => {
            let (kind, args) = match cmd {
                CompleteCmd::Credential(args) => (DocumentKind::Credential, args),
                CompleteCmd::Presentation(args) => (DocumentKind::Presentation, args),
            };
            let token = PreparedProof::from_json(&fs::read_to_string(&args.token_path)?)?;
            print_json(&issuer::complete(kind, &read_document()?, token, &args.signature)?)?;
        }
        Command::DidResolve { did, resolver } => {
            let registry = config.method_registry();
            let output = resolution::resolve_did(&registry, &did, &resolver.into()).await?;
            print_json(&output.did_document)?;
        }
        Command::DidDereference { did_url, resolver } => {
            let registry = config.method_registry();
            let content = resolution::dereference_did_url(&registry, &did_url, &resolver.into()).await?;
            print_json(&content)?;
        }
        Command::DidAuth {
            holder,
            key,
            proof_options,
            contexts,
        } => {
            let options = ProofOptions::from(proof_options);
            let (key, contexts) = (key.load()?, contexts.loader()?);
            match options.proof_format() {
                ProofFormat::Ldp => print_json(&issuer::did_auth(&holder, &options, &key, &contexts)?)?,
                ProofFormat::Jwt => {
                    let (presentation, options) = issuer::authentication_presentation(&holder, &options, &key)?;
                    print!("{}", jwt::issue(DocumentKind::Presentation, &presentation, &options, &key, &contexts)?);
                }
            }
        }
        Command::CreateContext { url, document_path } => {
            let json = match document_path {
                Some(path) => fs::read_to_string(path)?,
                None => read_input()?,
            };
            println!("{}", context::create_context(&url, &json)?.to_canonical_string()?);
        }
        Command::CreateContextMap => {
            let entries: Vec<Value> = serde_json::from_str(&read_input()?)?;
            print_json(&context::create_context_map(&entries)?)?;
        }
    }
    Ok(0)
}

async fn document(kind: DocumentKind, cmd: DocumentCmd, config: &EngineConfig) -> Result<u8> {
    match cmd {
        DocumentCmd::Issue {
            key,
            proof_options,
            contexts,
        } => {
            let options = ProofOptions::from(proof_options);
            let (document, key, contexts) = (read_document()?, key.load()?, contexts.loader()?);
            match options.proof_format() {
                ProofFormat::Ldp => print_json(&issuer::issue(kind, &document, &options, &key, &contexts)?)?,
                ProofFormat::Jwt => print!("{}", jwt::issue(kind, &document, &options, &key, &contexts)?),
            }
            Ok(0)
        }
        DocumentCmd::Verify {
            proof_options,
            public_key_jwk,
            contexts,
        } => {
            let mut options = ProofOptions::from(proof_options);
            if let Some(jwk) = public_key_jwk {
                options.public_key_jwk = Some(derivation::key_to_jwk(&derivation::parse_jwk(&jwk)?, false)?);
            }

            let registry = config.method_registry();
            let contexts = contexts.loader()?;
            let report = match options.proof_format() {
                ProofFormat::Ldp => verifier::verify(kind, &read_document()?, &options, &contexts, &registry).await?,
                ProofFormat::Jwt => jwt::verify(kind, &read_input()?, &options, &contexts, &registry).await?,
            };
            print_json(&report)?;

            Ok(if report.errors.is_empty() { 0 } else { 2 })
        }
    }
}

fn read_document() -> Result<Value> {
    Ok(serde_json::from_str(&read_input()?)?)
}

fn read_input() -> Result<String> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let trimmed = input.trim();
    if trimmed.len() != input.len() {
        warn!("input was trimmed of surrounding whitespace");
    }
    Ok(trimmed.to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn config_tracing(level: Level) {
    let tracing_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let filter = filter::Targets::new()
        .with_target("hyper", Level::INFO)
        .with_target("hyper_util", Level::INFO)
        .with_default(level);

    tracing_subscriber::registry()
        .with(tracing_layer)
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_context_commands() {
        let cli = Cli::try_parse_from(["vc-toolkit", "create-context", "https://example.org/ctx/v1", "-f", "ctx.json"]).unwrap();
        match cli.command {
            Command::CreateContext { url, document_path } => {
                assert_eq!(url, "https://example.org/ctx/v1");
                assert_eq!(document_path, Some(PathBuf::from("ctx.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["vc-toolkit", "create-context-map"]).unwrap();
        assert!(matches!(cli.command, Command::CreateContextMap));

        assert!(Cli::try_parse_from(["vc-toolkit", "create-context"]).is_err());
    }

    #[test]
    fn test_proof_format_flag() {
        let cli = Cli::try_parse_from(["vc-toolkit", "credential", "issue", "--jwk", "{}", "--proof-format", "jwt"]).unwrap();
        let Command::Credential(DocumentCmd::Issue { proof_options, .. }) = cli.command else {
            panic!("expected credential issue");
        };
        assert_eq!(ProofOptions::from(proof_options).proof_format(), ProofFormat::Jwt);

        let cli = Cli::try_parse_from(["vc-toolkit", "presentation", "verify"]).unwrap();
        let Command::Presentation(DocumentCmd::Verify { proof_options, .. }) = cli.command else {
            panic!("expected presentation verify");
        };
        assert_eq!(ProofOptions::from(proof_options).proof_format(), ProofFormat::Ldp);

        assert!(Cli::try_parse_from(["vc-toolkit", "credential", "verify", "--proof-format", "cwt"]).is_err());
    }
}
