use anyhow::{bail, Context, Result};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use clap::{Args, Parser, Subcommand};
use rand::rngs::OsRng;

use keysmith::config::{Algorithm, Bech32Config, KeyConfig, Network};
use keysmith::crypto::{self, ethereum, Secp256k1Curve, SignatureScheme};
use keysmith::encoding::{self, hex::decode_hex, CosmosPublicKey, KeyFormat};
use keysmith::error::KeysmithError;
use keysmith::report::{labels, Report};
use keysmith::utils::logging::{self, LogLevel};
use keysmith::wallet::{self, Chain, DerivationPath, ExtendedKey, KeyPair};

#[derive(Parser, Debug)]
#[command(name = "keysmith", version, about = "Multi-chain key generation, derivation and signing")]
struct Cli {
    /// debug | info | warn | error
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bitcoin keys, P2PKH addresses and secp256k1 signatures
    Bitcoin(ChainCommand),
    /// Ethereum keys, EIP-55 addresses and recoverable signatures
    Ethereum(ChainCommand),
    /// Cosmos-SDK keys and Bech32 addresses
    Cosmos(ChainCommand),
    /// ECDSA over P-256 (default) or secp256k1
    Ecdsa {
        /// p256 | secp256k1
        #[arg(long, global = true, default_value = "p256")]
        curve: String,
        #[command(subcommand)]
        action: AlgorithmAction,
    },
    /// BIP-340 Schnorr signatures
    Schnorr {
        #[command(subcommand)]
        action: AlgorithmAction,
    },
    /// BLS12-381 signatures
    Bls {
        #[command(subcommand)]
        action: AlgorithmAction,
    },
    /// BIP-39 mnemonics and BIP-44 account derivation
    Bip44 {
        #[command(subcommand)]
        action: Bip44Action,
    },
    /// BIP-32 extended keys
    Hd {
        #[command(subcommand)]
        action: HdAction,
    },
    /// Convert a private key between hex and WIF
    Convert {
        #[arg(long)]
        private_key: String,
        #[command(flatten)]
        network: NetworkArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct NetworkArgs {
    #[arg(long, global = true)]
    testnet: bool,
    #[arg(long, global = true)]
    uncompressed: bool,
}

#[derive(Args, Debug)]
struct ChainCommand {
    #[command(flatten)]
    network: NetworkArgs,

    /// Bech32 account prefix for Cosmos-SDK chains
    #[arg(long, global = true, default_value = "cosmos")]
    cosmos_prefix: String,

    #[command(subcommand)]
    action: ChainAction,
}

#[derive(Subcommand, Debug)]
enum ChainAction {
    /// New random key pair and address
    Generate {
        /// Cosmos only: emit an ed25519 key
        #[arg(long)]
        ed25519: bool,
    },
    /// Public key of a private key (hex or WIF)
    Pubkey {
        #[arg(long)]
        private_key: String,
    },
    /// Address of a private or public key
    Address {
        #[arg(long, conflicts_with = "public_key")]
        private_key: Option<String>,
        #[arg(long)]
        public_key: Option<String>,
    },
    Sign(SignArgs),
    Verify(VerifyArgs),
    /// Ethereum only: public key and address that produced a signature
    Recover {
        #[arg(long)]
        message: String,
        #[arg(long)]
        signature: String,
    },
    /// Keys at m/44'/coin'/0'/0/index from a mnemonic
    Derive(DeriveArgs),
}

#[derive(Subcommand, Debug)]
enum AlgorithmAction {
    Generate,
    Pubkey {
        #[arg(long)]
        private_key: String,
    },
    Sign(SignArgs),
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct SignArgs {
    #[arg(long)]
    private_key: String,
    #[arg(long)]
    message: Option<String>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[arg(long)]
    public_key: String,
    #[arg(long)]
    message: Option<String>,
    #[arg(long, conflicts_with_all = ["r", "s"])]
    signature: Option<String>,
    #[arg(long, requires = "s")]
    r: Option<String>,
    #[arg(long, requires = "r")]
    s: Option<String>,
}

#[derive(Args, Debug)]
struct DeriveArgs {
    #[arg(long)]
    mnemonic: String,
    #[arg(long, default_value = "")]
    passphrase: String,
    #[arg(long, default_value_t = 0)]
    index: u32,
    /// Number of consecutive indices
    #[arg(long, default_value_t = 1)]
    count: u32,
}

#[derive(Subcommand, Debug)]
enum Bip44Action {
    /// New random mnemonic
    Mnemonic {
        /// 12 | 15 | 18 | 21 | 24
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    /// BIP-39 seed of a mnemonic
    Seed {
        #[arg(long)]
        mnemonic: String,
        #[arg(long, default_value = "")]
        passphrase: String,
    },
    /// Account keys for one chain
    Derive {
        #[arg(long)]
        chain: Chain,
        #[command(flatten)]
        network: NetworkArgs,
        #[arg(long, default_value = "cosmos")]
        cosmos_prefix: String,
        #[command(flatten)]
        derive: DeriveArgs,
    },
}

#[derive(Subcommand, Debug)]
enum HdAction {
    /// Master extended key from a mnemonic or a hex seed
    Master {
        #[arg(long, required_unless_present = "seed")]
        mnemonic: Option<String>,
        #[arg(long, default_value = "")]
        passphrase: String,
        #[arg(long, conflicts_with = "mnemonic")]
        seed: Option<String>,
        #[arg(long)]
        testnet: bool,
    },
    /// Walk a derivation path from an extended key
    Derive {
        #[arg(long)]
        xkey: String,
        #[arg(long)]
        path: DerivationPath,
    },
    /// Public counterpart of an extended private key
    Neuter {
        #[arg(long)]
        xkey: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::set_level(cli.log_level);

    let report = run(cli.command)?;
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn run(command: Command) -> Result<Report> {
    match command {
        Command::Bitcoin(cmd) => chain_command(Chain::Bitcoin, cmd),
        Command::Ethereum(cmd) => chain_command(Chain::Ethereum, cmd),
        Command::Cosmos(cmd) => chain_command(Chain::Cosmos, cmd),
        Command::Ecdsa { curve, action } => {
            let algorithm = match curve.parse::<Algorithm>()? {
                a @ (Algorithm::Ecdsa | Algorithm::Secp256k1) => a,
                other => bail!(KeysmithError::unsupported_algorithm(other.name())),
            };
            algorithm_command(algorithm, action)
        }
        Command::Schnorr { action } => algorithm_command(Algorithm::Schnorr, action),
        Command::Bls { action } => algorithm_command(Algorithm::Bls, action),
        Command::Bip44 { action } => bip44_command(action),
        Command::Hd { action } => hd_command(action),
        Command::Convert {
            private_key,
            network,
        } => convert_command(&private_key, network),
    }
}

fn key_config(network: NetworkArgs, cosmos_prefix: &str) -> Result<KeyConfig> {
    let bech32 = Bech32Config::new(cosmos_prefix);
    bech32.validate()?;
    Ok(KeyConfig::default()
        .with_network(Network::from_testnet_flag(network.testnet))
        .with_compressed(!network.uncompressed)
        .with_bech32(bech32))
}

fn message_bytes(message: &Option<String>) -> &[u8] {
    message.as_deref().map(str::as_bytes).unwrap_or_default()
}

// MARK: - Chains

fn chain_command(chain: Chain, cmd: ChainCommand) -> Result<Report> {
    let mut config = key_config(cmd.network, &cmd.cosmos_prefix)?;

    match cmd.action {
        ChainAction::Generate { ed25519 } if ed25519 => {
            if chain != Chain::Cosmos {
                bail!(KeysmithError::validation("--ed25519 is only available for cosmos"));
            }
            let signing = ed25519_dalek::SigningKey::generate(&mut OsRng);
            let public = CosmosPublicKey::Ed25519(signing.verifying_key());
            Ok(Report::new()
                .line(labels::PRIVATE_KEY, hex::encode(signing.to_bytes()))
                .line(labels::PUBLIC_KEY, hex::encode(public.to_bytes()))
                .line(labels::ADDRESS, encoding::cosmos_address(&public, &config.bech32)?))
        }
        ChainAction::Generate { .. } => {
            let (sk, _) = Secp256k1Curve::generate_keypair()?;
            let pair = KeyPair::from_secret_key(SecretKey::from_slice(sk.as_ref())?);
            key_report(chain, &pair, &config)
        }
        ChainAction::Pubkey { private_key } => {
            let pair = parse_chain_key(&private_key, &mut config)?;
            Ok(Report::new().line(
                labels::PUBLIC_KEY,
                chain.encode_public_key(&pair.public_key, &config),
            ))
        }
        ChainAction::Address {
            private_key,
            public_key,
        } => {
            let public = match (private_key, public_key) {
                (Some(sk), _) => parse_chain_key(&sk, &mut config)?.public_key,
                (None, Some(pk)) => PublicKey::from_slice(&decode_hex(&pk)?)?,
                (None, None) => bail!(KeysmithError::validation(
                    "either --private-key or --public-key is required"
                )),
            };
            Ok(Report::new().line(labels::ADDRESS, chain.encode_address(&public, &config)?))
        }
        ChainAction::Sign(args) => {
            let pair = parse_chain_key(&args.private_key, &mut config)?;
            let secret = pair.secret_key.secret_bytes();
            let message = message_bytes(&args.message);
            let signature = match chain {
                Chain::Ethereum => ethereum::sign_message(&secret, message)?.to_vec(),
                _ => Secp256k1Curve::sign(&secret, message)?.to_vec(),
            };
            Ok(Report::new().line(labels::SIGNATURE, hex::encode(signature)))
        }
        ChainAction::Verify(args) => {
            let public_key = decode_hex(&args.public_key)?;
            let message = message_bytes(&args.message);
            let signature = args.signature.as_deref().map(decode_hex).transpose()?;
            let valid = match signature {
                // 65-byte r ∥ s ∥ v from `ethereum sign`
                Some(sig) if chain == Chain::Ethereum && sig.len() == ethereum::SIGNATURE_LEN => {
                    ethereum::verify_message(&public_key, message, &sig)?
                }
                _ => verify_ecdsa(Algorithm::Secp256k1, &public_key, message, &args)?,
            };
            Ok(Report::new().line(labels::SIGNATURE_VALID, valid))
        }
        ChainAction::Recover { message, signature } => {
            if chain != Chain::Ethereum {
                bail!(KeysmithError::validation("recover is only available for ethereum"));
            }
            let recovered = ethereum::recover_public_key(message.as_bytes(), &decode_hex(&signature)?)?;
            let public = PublicKey::from_slice(&recovered)?;
            Ok(Report::new()
                .line(labels::PUBLIC_KEY, hex::encode(recovered))
                .line(labels::ADDRESS, encoding::ethereum_address(&public)))
        }
        ChainAction::Derive(args) => derive_report(chain, &args, &config),
    }
}

/// Hex or WIF; a WIF key's own network and compression override the flags.
fn parse_chain_key(input: &str, config: &mut KeyConfig) -> Result<KeyPair> {
    let parsed = encoding::parse_private_key(input)?;
    if parsed.format == KeyFormat::Wif {
        if let Some(network) = parsed.network {
            config.network = network;
        }
        config.compressed = parsed.compressed;
    }
    Ok(KeyPair::from_secret_key(parsed.secret_key))
}

fn key_report(chain: Chain, pair: &KeyPair, config: &KeyConfig) -> Result<Report> {
    Ok(Report::new()
        .line(labels::PRIVATE_KEY, chain.encode_key(&pair.secret_key, config))
        .line(labels::PUBLIC_KEY, chain.encode_public_key(&pair.public_key, config))
        .line(labels::ADDRESS, chain.encode_address(&pair.public_key, config)?))
}

fn derive_report(chain: Chain, args: &DeriveArgs, config: &KeyConfig) -> Result<Report> {
    if args.count == 0 {
        bail!(KeysmithError::validation("--count must be at least 1"));
    }
    let seed = wallet::seed_from_phrase(&args.mnemonic, &args.passphrase)?;
    let master = ExtendedKey::from_seed(&seed, config.network)?;

    let mut report = Report::new();
    for offset in 0..args.count {
        let index = args
            .index
            .checked_add(offset)
            .context("derivation index overflow")?;
        let account = wallet::account_from_master(&master, chain, index, config)?;
        report.push(labels::PATH, &account.path);
        report.extend(key_report(chain, &account.key_pair, config)?);
    }
    Ok(report)
}

// MARK: - Signature algorithms

fn algorithm_command(algorithm: Algorithm, action: AlgorithmAction) -> Result<Report> {
    match action {
        AlgorithmAction::Generate => {
            let key = crypto::generate(algorithm)?;
            Ok(Report::new()
                .line(labels::PRIVATE_KEY, hex::encode(&*key.private_key))
                .line(labels::PUBLIC_KEY, hex::encode(&key.public_key)))
        }
        AlgorithmAction::Pubkey { private_key } => {
            let public = crypto::public_key_from_private(algorithm, &decode_hex(&private_key)?)?;
            Ok(Report::new().line(labels::PUBLIC_KEY, hex::encode(public)))
        }
        AlgorithmAction::Sign(args) => {
            let signature = crypto::sign(
                algorithm,
                &decode_hex(&args.private_key)?,
                message_bytes(&args.message),
            )?;
            let mut report = Report::new().line(labels::SIGNATURE, hex::encode(&signature));
            if matches!(algorithm, Algorithm::Ecdsa | Algorithm::Secp256k1) {
                report.push("r", hex::encode(&signature[..32]));
                report.push("s", hex::encode(&signature[32..]));
            }
            Ok(report)
        }
        AlgorithmAction::Verify(args) => {
            let public_key = decode_hex(&args.public_key)?;
            let message = message_bytes(&args.message);
            let valid = match algorithm {
                Algorithm::Ecdsa | Algorithm::Secp256k1 => {
                    verify_ecdsa(algorithm, &public_key, message, &args)?
                }
                _ => {
                    let signature = args
                        .signature
                        .as_deref()
                        .ok_or_else(|| KeysmithError::validation("--signature is required"))?;
                    crypto::verify(algorithm, &public_key, message, &decode_hex(signature)?)?
                }
            };
            Ok(Report::new().line(labels::SIGNATURE_VALID, valid))
        }
    }
}

/// Accepts `--signature` (r ∥ s) or separate `--r` / `--s`.
fn verify_ecdsa(algorithm: Algorithm, public_key: &[u8], message: &[u8], args: &VerifyArgs) -> Result<bool> {
    Ok(match (&args.signature, &args.r, &args.s) {
        (Some(sig), _, _) => crypto::verify(algorithm, public_key, message, &decode_hex(sig)?)?,
        (None, Some(r), Some(s)) => {
            crypto::verify_components(algorithm, public_key, message, &decode_hex(r)?, &decode_hex(s)?)?
        }
        _ => bail!(KeysmithError::validation("--signature or both --r and --s are required")),
    })
}

// MARK: - Mnemonics and extended keys

fn bip44_command(action: Bip44Action) -> Result<Report> {
    match action {
        Bip44Action::Mnemonic { words } => {
            let bits = words * 32 / 3;
            let mnemonic = wallet::generate_mnemonic(bits)?;
            Ok(Report::new().line(labels::MNEMONIC, mnemonic))
        }
        Bip44Action::Seed {
            mnemonic,
            passphrase,
        } => {
            let seed = wallet::seed_from_phrase(&mnemonic, &passphrase)?;
            Ok(Report::new().line(labels::SEED, seed.to_hex().as_str()))
        }
        Bip44Action::Derive {
            chain,
            network,
            cosmos_prefix,
            derive,
        } => derive_report(chain, &derive, &key_config(network, &cosmos_prefix)?),
    }
}

fn hd_command(action: HdAction) -> Result<Report> {
    match action {
        HdAction::Master {
            mnemonic,
            passphrase,
            seed,
            testnet,
        } => {
            let network = Network::from_testnet_flag(testnet);
            let master = match (mnemonic, seed) {
                (Some(phrase), _) => {
                    ExtendedKey::from_seed(&wallet::seed_from_phrase(&phrase, &passphrase)?, network)?
                }
                (None, Some(seed)) => ExtendedKey::new_master(&decode_hex(&seed)?, network)?,
                (None, None) => bail!(KeysmithError::validation("--mnemonic or --seed is required")),
            };
            Ok(extended_report(&master))
        }
        HdAction::Derive { xkey, path } => {
            let parent: ExtendedKey = xkey.parse()?;
            let child = parent.derive_path(&path)?;
            let mut report = Report::new().line(labels::PATH, &path);
            report.extend(extended_report(&child));
            Ok(report)
        }
        HdAction::Neuter { xkey } => {
            let key: ExtendedKey = xkey.parse()?;
            Ok(Report::new().line(labels::EXTENDED_PUBLIC_KEY, key.neuter().to_base58()))
        }
    }
}

fn extended_report(key: &ExtendedKey) -> Report {
    let mut report = Report::new();
    if key.is_private() {
        report.push(labels::EXTENDED_PRIVATE_KEY, key.to_base58());
    }
    report.push(labels::EXTENDED_PUBLIC_KEY, key.neuter().to_base58());
    report.push(labels::PUBLIC_KEY, hex::encode(key.public_key().serialize()));
    report
}

// MARK: - Conversion

fn convert_command(private_key: &str, network: NetworkArgs) -> Result<Report> {
    let config = key_config(network, "cosmos")?;
    let parsed = encoding::parse_private_key(private_key)?;
    let converted = encoding::convert_key_with(private_key, &config)?;

    // Address follows the WIF's own flags, or the command flags for hex input
    let network = parsed.network.unwrap_or(config.network);
    let compressed = match parsed.format {
        KeyFormat::Wif => parsed.compressed,
        KeyFormat::Hex => config.compressed,
    };
    let public = PublicKey::from_secret_key(&Secp256k1::new(), &parsed.secret_key);

    let label = match parsed.format {
        KeyFormat::Hex => labels::WIF,
        KeyFormat::Wif => labels::HEX,
    };
    Ok(Report::new()
        .line(label, converted)
        .line(labels::NETWORK, network)
        .line(labels::ADDRESS, encoding::bitcoin_address(&public, network, compressed)))
}
