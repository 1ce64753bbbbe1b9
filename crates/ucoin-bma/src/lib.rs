//! HTTP client for a uCoin node's `BASIC_MERKLED_API`.
//!
//! Reads node state (summary, blocks, transaction history), submits signed
//! identities, and implements the merkle fetchers so a
//! [`ucoin_merkle::MerkleLeafEnumerator`] can walk a node's trees.
//!
//! Sessions are explicit: each [`BmaClient`] owns its `reqwest::Client`.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod types;

pub use client::BmaClient;
pub use config::ClientConfig;
pub use endpoint::{paths, BmaEndpoint, ConnectionHandler, BMA_API};
pub use error::{BmaError, BmaResult, STATUS_BODY_LIMIT};
pub use types::{Block, HistoryTransaction, NodeSummary, SoftwareInfo, TxHistory, TxHistoryEntries};
