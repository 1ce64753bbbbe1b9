use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ucoin",
    about = "uCoin client: sign ledger documents and query nodes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Node endpoint, e.g. "BASIC_MERKLED_API cgeek.fr 9330"
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// TOML client configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the node summary, current block and genesis block
    Request(RequestArgs),
    /// Manage private keys
    Keys(KeysArgs),
    /// Create and publish identities
    Identity(IdentityArgs),
    /// Enumerate the leaves of a merkle tree
    Leaves(LeavesArgs),
    /// Check the signatures of a signed raw document
    Verify(VerifyArgs),
    /// Show the transaction history of a public key
    History(HistoryArgs),
}

#[derive(Args)]
pub struct RequestArgs {}

#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub action: KeysAction,
}

#[derive(Subcommand)]
pub enum KeysAction {
    /// Check credentials against a known public key, then save them
    Save {
        /// Salt on the first line, password on the second
        #[arg(long)]
        credentials: Option<PathBuf>,
        /// Expected public key (base58)
        #[arg(long)]
        pubkey: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Store the raw seed instead of the credentials
        #[arg(long)]
        seed: bool,
    },
}

#[derive(Args)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub action: IdentityAction,
}

#[derive(Subcommand)]
pub enum IdentityAction {
    /// Sign an identity anchored on the current block and submit it
    Publish {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        credentials: Option<PathBuf>,
        /// Print the signed document without submitting it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args)]
pub struct LeavesArgs {
    /// Tree path, e.g. network/peering/peers
    pub path: String,
    /// How leaf content is checked against the root listing
    #[arg(long, default_value = "reported")]
    pub digest: DigestArg,
    /// Stop after this many leaves
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DigestArg {
    Reported,
    Sha1,
    Sha256,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub file: PathBuf,
    /// Check signature i against the i-th key instead of the declared signers
    #[arg(long = "key")]
    pub keys: Vec<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub pubkey: String,
    #[arg(long, default_value = "0")]
    pub from: u64,
    #[arg(long)]
    pub to: u64,
}
