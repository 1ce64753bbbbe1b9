use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::debug;
use ucoin_bma::{BmaClient, ClientConfig};
use ucoin_crypto::{save_async, KeyMaterial, SecretRecord};
use ucoin_documents::{Document, Identity, SignedDocument};
use ucoin_merkle::{LeafDigest, MerkleLeafEnumerator, ReportedDigest, Sha1Digest, Sha256Digest};
use ucoin_types::PublicKey;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.endpoint.as_deref())?;
    match cli.command {
        Command::Request(_) => cmd_request(&config, cli.format).await,
        Command::Keys(KeysArgs { action }) => match action {
            KeysAction::Save {
                credentials,
                pubkey,
                output,
                seed,
            } => cmd_keys_save(&config, credentials, &pubkey, output, seed).await,
        },
        Command::Identity(IdentityArgs { action }) => match action {
            IdentityAction::Publish {
                uid,
                credentials,
                dry_run,
            } => cmd_identity_publish(&config, &uid, credentials, dry_run).await,
        },
        Command::Leaves(args) => cmd_leaves(&config, args, cli.format).await,
        Command::Verify(args) => cmd_verify(args),
        Command::History(args) => cmd_history(&config, args, cli.format).await,
    }
}

fn load_config(path: Option<&Path>, endpoint: Option<&str>) -> anyhow::Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    debug!(endpoint = %config.endpoint, "using endpoint");
    Ok(config)
}

/// Read `(salt, password)` from a file holding one per line.
fn read_credentials(path: &Path) -> anyhow::Result<(String, String)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read credentials from {}", path.display()))?;
    let mut lines = text.lines();
    match (lines.next(), lines.next()) {
        (Some(salt), Some(password)) => Ok((salt.trim().to_string(), password.trim().to_string())),
        _ => bail!("{}: expected the salt on the first line and the password on the second", path.display()),
    }
}

fn credentials_path(config: &ClientConfig, flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match flag.or_else(|| config.credentials_file.clone()) {
        Some(path) => Ok(path),
        None => bail!("no credentials file: pass --credentials or set credentials_file in the config"),
    }
}

/// Derive off the async scheduler; scrypt is deliberately slow.
async fn derive_key(salt: String, password: String) -> anyhow::Result<KeyMaterial> {
    let key = tokio::task::spawn_blocking(move || KeyMaterial::from_credentials(&salt, &password))
        .await
        .context("key derivation task failed")??;
    Ok(key)
}

async fn cmd_request(config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let client = BmaClient::from_config(config)?;
    let summary = client.node_summary().await?;
    let current = client.current_block().await?;
    let genesis = client.block(0).await?;

    if format == OutputFormat::Json {
        let all = serde_json::json!({
            "summary": summary,
            "current": current,
            "genesis": genesis,
        });
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }
    println!(
        "Node {} {}",
        summary.ucoin.software.bold(),
        summary.ucoin.version.cyan()
    );
    println!("  Currency: {}", current.currency.yellow());
    println!("  Current:  {}", current.blockstamp().to_string().green());
    println!("  Members:  {}", current.members_count);
    println!("  Genesis:  {}", genesis.blockstamp());
    Ok(())
}

async fn cmd_keys_save(
    config: &ClientConfig,
    credentials: Option<PathBuf>,
    pubkey: &str,
    output: PathBuf,
    seed: bool,
) -> anyhow::Result<()> {
    let expected: PublicKey = pubkey.parse()?;
    let (salt, password) = read_credentials(&credentials_path(config, credentials)?)?;
    let key = derive_key(salt.clone(), password.clone()).await?;
    if let Err(err) = key.ensure_public_key(&expected) {
        println!("{} Bad credentials", "✗".red().bold());
        return Err(err.into());
    }

    let record = if seed {
        SecretRecord::from_seed(&key)
    } else {
        SecretRecord::from_credentials(&salt, &password, &key)
    };
    save_async(output.clone(), record).await?;
    println!(
        "{} Private keys for public key {} saved in {}",
        "✓".green().bold(),
        expected.to_string().cyan(),
        output.display()
    );
    Ok(())
}

async fn cmd_identity_publish(
    config: &ClientConfig,
    uid: &str,
    credentials: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let (salt, password) = read_credentials(&credentials_path(config, credentials)?)?;
    let client = BmaClient::from_config(config)?;
    let current = client.current_block().await?;
    let key = derive_key(salt, password).await?;

    let identity = Identity::new(current.currency.as_str(), key.public_key(), uid, current.blockstamp())?
        .add_signature(&key);

    if dry_run {
        print!("{}", identity.signed_raw());
        return Ok(());
    }
    let answer = client.wot_add(&identity).await?;
    println!(
        "{} Identity {} published for {}",
        "✓".green().bold(),
        uid.yellow(),
        key.public_key().to_string().cyan()
    );
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

async fn cmd_leaves(config: &ClientConfig, args: LeavesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let client = BmaClient::from_config(config)?;
    match args.digest {
        DigestArg::Reported => print_leaves(&client, &args, ReportedDigest, format).await,
        DigestArg::Sha1 => print_leaves(&client, &args, Sha1Digest, format).await,
        DigestArg::Sha256 => print_leaves(&client, &args, Sha256Digest, format).await,
    }
}

async fn print_leaves<D: LeafDigest>(
    client: &BmaClient,
    args: &LeavesArgs,
    digest: D,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut enumerator = MerkleLeafEnumerator::open_with(client, &args.path, digest).await?;
    if format == OutputFormat::Text {
        println!(
            "Tree {} depth {}, {} leaves",
            args.path.bold(),
            enumerator.depth(),
            enumerator.leaf_hashes().len()
        );
    }
    let limit = args.limit.unwrap_or(usize::MAX);
    let mut shown = 0;
    while shown < limit {
        let Some(leaf) = enumerator.next(client).await? else {
            break;
        };
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&leaf)?),
            OutputFormat::Text => println!("  {} {}", leaf.hash.yellow(), leaf.value),
        }
        shown += 1;
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let doc = Document::parse(&text)?;
    let checks = if args.keys.is_empty() {
        doc.verify_all()?
    } else {
        let keys = args
            .keys
            .iter()
            .map(|k| k.parse::<PublicKey>())
            .collect::<Result<Vec<_>, _>>()?;
        doc.verify_with(&keys)?
    };

    println!("{} document, currency {}", doc.kind(), doc.currency().yellow());
    if checks.is_empty() {
        println!("  {}", "unsigned".dimmed());
    }
    for check in &checks {
        let signer = check
            .signer
            .map(|k| k.to_string())
            .unwrap_or_else(|| "(no key)".into());
        let verdict = if check.valid { "valid".green() } else { "INVALID".red().bold() };
        println!("  #{} {} {}", check.signer_index, signer, verdict);
    }
    let invalid = checks.iter().filter(|c| !c.valid).count();
    if invalid > 0 {
        bail!("{invalid} of {} signatures invalid", checks.len());
    }
    Ok(())
}

async fn cmd_history(config: &ClientConfig, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pubkey: PublicKey = args.pubkey.parse()?;
    let client = BmaClient::from_config(config)?;
    let history = client.tx_history_blocks(&pubkey, args.from, args.to).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    println!(
        "History of {} on {} (blocks {}..={})",
        pubkey.to_string().cyan(),
        history.currency.yellow(),
        args.from,
        args.to
    );
    for (label, txs) in [("sent", &history.history.sent), ("received", &history.history.received)] {
        println!("  {label}: {}", txs.len());
        for tx in txs {
            let block = tx.block_number.map(|n| n.to_string()).unwrap_or_else(|| "?".into());
            println!("    {} block {} {}", tx.hash.dimmed(), block, tx.comment);
        }
    }
    Ok(())
}
