use async_trait::async_trait;

use crate::types::{MerkleLeaf, MerkleRoot};

/// Fetches the root listing of a tree.
///
/// `tree` is the node-side path of the tree, e.g. `network/peering/peers`.
#[async_trait]
pub trait RootFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_root(&self, tree: &str) -> Result<MerkleRoot, Self::Error>;
}

/// Fetches a single leaf of a tree by its digest.
#[async_trait]
pub trait LeafFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_leaf(&self, tree: &str, hash: &str) -> Result<MerkleLeaf, Self::Error>;
}
