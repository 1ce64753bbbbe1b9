use futures::stream::{self, Stream};
use tracing::{debug, warn};
use ucoin_types::excerpt;

use crate::digest::{LeafDigest, ReportedDigest};
use crate::error::MerkleError;
use crate::fetcher::{LeafFetcher, RootFetcher};
use crate::types::MerkleLeaf;

/// Ordered, checked traversal of one snapshot of a node's merkle tree.
///
/// [`open`](Self::open) captures the leaf digests once. Each
/// [`next`](Self::next) fetches the leaf under the cursor and checks it
/// against the captured digest, so a tree that changes mid-way is reported
/// instead of silently mixing two snapshots. Enumeration is not restartable;
/// open again for a fresh pass.
///
/// A transport error leaves the cursor in place, so the same leaf can be
/// requested again. A consistency violation ends the enumeration.
#[derive(Debug)]
pub struct MerkleLeafEnumerator<D = ReportedDigest> {
    tree: String,
    depth: u32,
    root: String,
    leaf_hashes: Vec<String>,
    cursor: usize,
    digest: D,
}

impl MerkleLeafEnumerator<ReportedDigest> {
    /// Fetch the root listing of `tree`. An empty tree is not an error.
    pub async fn open<R>(fetcher: &R, tree: &str) -> Result<Self, MerkleError<R::Error>>
    where
        R: RootFetcher + ?Sized,
    {
        Self::open_with(fetcher, tree, ReportedDigest).await
    }

    /// Like [`open`](Self::open), but fails with
    /// [`MerkleError::EmptyTree`] when the tree has no leaves.
    pub async fn open_non_empty<R>(fetcher: &R, tree: &str) -> Result<Self, MerkleError<R::Error>>
    where
        R: RootFetcher + ?Sized,
    {
        let enumerator = Self::open(fetcher, tree).await?;
        if enumerator.leaf_hashes.is_empty() {
            return Err(MerkleError::EmptyTree {
                tree: enumerator.tree,
                depth: enumerator.depth,
            });
        }
        Ok(enumerator)
    }
}

impl<D: LeafDigest> MerkleLeafEnumerator<D> {
    /// Fetch the root listing, checking leaves with a custom digest strategy.
    pub async fn open_with<R>(fetcher: &R, tree: &str, digest: D) -> Result<Self, MerkleError<R::Error>>
    where
        R: RootFetcher + ?Sized,
    {
        let listing = fetcher.fetch_root(tree).await.map_err(MerkleError::Transport)?;
        debug!(
            tree,
            depth = listing.depth,
            leaves = listing.leaves.len(),
            root = %listing.root,
            "merkle root fetched"
        );
        Ok(Self {
            tree: tree.to_string(),
            depth: listing.depth,
            root: listing.root,
            leaf_hashes: listing.leaves,
            cursor: 0,
            digest,
        })
    }

    pub fn tree(&self) -> &str {
        &self.tree
    }

    /// Tree depth at the time of the root fetch.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Leaf digests captured at open time, in tree order.
    pub fn leaf_hashes(&self) -> &[String] {
        &self.leaf_hashes
    }

    /// Index of the next leaf to fetch.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.leaf_hashes.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.leaf_hashes.len()
    }

    /// Fetch and check the leaf under the cursor.
    ///
    /// Returns `Ok(None)` once every leaf captured at open time has been
    /// returned.
    pub async fn next<L>(&mut self, fetcher: &L) -> Result<Option<MerkleLeaf>, MerkleError<L::Error>>
    where
        L: LeafFetcher + ?Sized,
    {
        let Some(expected) = self.leaf_hashes.get(self.cursor) else {
            return Ok(None);
        };
        let leaf = fetcher
            .fetch_leaf(&self.tree, expected)
            .await
            .map_err(MerkleError::Transport)?;

        let actual = self.digest.digest(&leaf);
        if !actual.eq_ignore_ascii_case(expected) {
            let position = self.cursor;
            warn!(
                tree = %self.tree,
                position,
                expected = %expected,
                actual = %actual,
                "merkle leaf does not match root listing"
            );
            let expected = expected.clone();
            self.cursor = self.leaf_hashes.len();
            return Err(MerkleError::TreeConsistencyViolation {
                tree: self.tree.clone(),
                position,
                expected,
                actual: excerpt(&actual),
            });
        }

        self.cursor += 1;
        Ok(Some(leaf))
    }

    /// Adapt into a lazy stream of leaves that ends after the last leaf or
    /// the first error.
    pub fn into_stream<'a, L>(
        self,
        fetcher: &'a L,
    ) -> impl Stream<Item = Result<MerkleLeaf, MerkleError<L::Error>>> + 'a
    where
        L: LeafFetcher + ?Sized + 'a,
        D: 'a,
    {
        stream::unfold(Some(self), move |state| async move {
            let mut enumerator = state?;
            match enumerator.next(fetcher).await {
                Ok(Some(leaf)) => Some((Ok(leaf), Some(enumerator))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Fetch every remaining leaf.
    pub async fn collect<L>(mut self, fetcher: &L) -> Result<Vec<MerkleLeaf>, MerkleError<L::Error>>
    where
        L: LeafFetcher + ?Sized,
    {
        let mut leaves = Vec::with_capacity(self.remaining());
        while let Some(leaf) = self.next(fetcher).await? {
            leaves.push(leaf);
        }
        Ok(leaves)
    }
}
