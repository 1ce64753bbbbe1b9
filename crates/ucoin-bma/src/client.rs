use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use ucoin_documents::{Identity, SignedDocument};
use ucoin_merkle::{LeafFetcher, MerkleLeaf, MerkleLeafResponse, MerkleRoot, RootFetcher};
use ucoin_types::{excerpt, PublicKey};

use crate::config::ClientConfig;
use crate::endpoint::{paths, ConnectionHandler};
use crate::error::{BmaError, BmaResult};
use crate::types::{Block, NodeSummary, TxHistory};

/// HTTP client for one node.
///
/// The underlying `reqwest::Client` is owned by the caller-visible value
/// and may be shared by cloning; there is no process-wide session.
#[derive(Clone, Debug)]
pub struct BmaClient {
    http: reqwest::Client,
    handler: ConnectionHandler,
}

impl BmaClient {
    pub fn new(handler: ConnectionHandler) -> Self {
        Self::with_client(handler, reqwest::Client::new())
    }

    /// Reuse an existing HTTP client, e.g. to share its connection pool.
    pub fn with_client(handler: ConnectionHandler, http: reqwest::Client) -> Self {
        Self { http, handler }
    }

    /// Build from config: endpoint, timeout and response signing.
    pub fn from_config(config: &ClientConfig) -> BmaResult<Self> {
        let handler = config.endpoint()?.conn_handler()?;
        let mut headers = HeaderMap::new();
        if config.signed_responses {
            headers.insert(ACCEPT, HeaderValue::from_static("multipart/signed"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;
        Ok(Self::with_client(handler, http))
    }

    pub fn handler(&self) -> &ConnectionHandler {
        &self.handler
    }

    pub async fn node_summary(&self) -> BmaResult<NodeSummary> {
        self.get_json(paths::NODE_SUMMARY, &[]).await
    }

    pub async fn current_block(&self) -> BmaResult<Block> {
        self.get_json(paths::CURRENT_BLOCK, &[]).await
    }

    pub async fn block(&self, number: u64) -> BmaResult<Block> {
        self.get_json(&format!("{}/{number}", paths::BLOCK), &[]).await
    }

    /// Transactions of `pubkey` written between blocks `from` and `to`.
    pub async fn tx_history_blocks(&self, pubkey: &PublicKey, from: u64, to: u64) -> BmaResult<TxHistory> {
        let path = format!("{}/{pubkey}/blocks/{from}/{to}", paths::TX_HISTORY);
        self.get_json(&path, &[]).await
    }

    /// Submit a signed identity. Returns the node's JSON answer.
    pub async fn wot_add(&self, identity: &Identity) -> BmaResult<serde_json::Value> {
        let raw = identity.signed_raw();
        info!(uid = identity.uid(), pubkey = %identity.pubkey(), "submitting identity");
        self.post_form(paths::WOT_ADD, &[("identity", raw.as_str())]).await
    }

    pub async fn merkle_root(&self, tree: &str) -> BmaResult<MerkleRoot> {
        self.get_json(tree, &[("leaves", "true")]).await
    }

    pub async fn merkle_leaf(&self, tree: &str, hash: &str) -> BmaResult<MerkleLeafResponse> {
        self.get_json(tree, &[("leaf", hash)]).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> BmaResult<T> {
        let url = self.handler.url(path)?;
        debug!(%url, ?query, "GET");
        let response = self.http.get(url.clone()).query(query).send().await?;
        Self::decode(url.as_str(), response).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> BmaResult<T> {
        let url = self.handler.url(path)?;
        debug!(%url, "POST");
        let response = self.http.post(url.clone()).form(form).send().await?;
        Self::decode(url.as_str(), response).await
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> BmaResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "request failed");
            return Err(BmaError::status(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| BmaError::Decode {
            url: url.to_string(),
            reason: format!("{e} in {}", excerpt(&body)),
        })
    }
}

#[async_trait]
impl RootFetcher for BmaClient {
    type Error = BmaError;

    async fn fetch_root(&self, tree: &str) -> BmaResult<MerkleRoot> {
        self.merkle_root(tree).await
    }
}

#[async_trait]
impl LeafFetcher for BmaClient {
    type Error = BmaError;

    async fn fetch_leaf(&self, tree: &str, hash: &str) -> BmaResult<MerkleLeaf> {
        Ok(self.merkle_leaf(tree, hash).await?.leaf)
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};
    use ucoin_crypto::KeyMaterial;
    use ucoin_merkle::{MerkleError, MerkleLeafEnumerator};
    use ucoin_types::{BlockHash, BlockStamp};

    use super::*;

    fn client_for(server: &ServerGuard) -> BmaClient {
        BmaClient::new(ConnectionHandler::from_url(&server.url()).unwrap())
    }

    fn block_json(number: u64) -> String {
        format!(
            r#"{{"version": 2, "currency": "test_currency", "number": {number}, "hash": "{}",
                "issuer": "HnFcSms8jzwngtVomTTnzudZx7SHUQY8sVE1y8yBmULk"}}"#,
            "0A".repeat(32)
        )
    }

    #[tokio::test]
    async fn reads_current_block() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/blockchain/current")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(block_json(77))
            .create_async()
            .await;

        let block = client_for(&server).current_block().await.unwrap();
        assert_eq!(block.currency, "test_currency");
        assert_eq!(block.blockstamp(), BlockStamp::new(77, BlockHash::from_bytes([0x0A; 32])));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reads_block_by_number() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/blockchain/block/0")
            .with_status(200)
            .with_body(block_json(0))
            .create_async()
            .await;
        assert_eq!(client_for(&server).block(0).await.unwrap().number, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reads_tx_history() {
        let key = KeyMaterial::from_seed([1; 32]).public_key();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", format!("/tx/history/{key}/blocks/10/20").as_str())
            .with_status(200)
            .with_body(format!(r#"{{"currency": "c", "pubkey": "{key}", "history": {{}}}}"#))
            .create_async()
            .await;
        let history = client_for(&server).tx_history_blocks(&key, 10, 20).await.unwrap();
        assert_eq!(history.pubkey, key.to_string());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_keeps_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/node/summary")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;
        match client_for(&server).node_summary().await {
            Err(BmaError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/node/summary")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;
        assert!(matches!(
            client_for(&server).node_summary().await,
            Err(BmaError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn wot_add_posts_signed_raw() {
        let key = KeyMaterial::from_seed([2; 32]);
        let identity = Identity::new("test_currency", key.public_key(), "Alice", BlockStamp::empty())
            .unwrap()
            .add_signature(&key);

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/wot/add")
            .match_body(Matcher::UrlEncoded("identity".into(), identity.signed_raw()))
            .with_status(200)
            .with_body(format!(r#"{{"pubkey": "{}", "uids": []}}"#, key.public_key()))
            .create_async()
            .await;

        let answer = client_for(&server).wot_add(&identity).await.unwrap();
        assert_eq!(answer["pubkey"], key.public_key().to_string());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn enumerates_merkle_tree_over_http() {
        let mut server = Server::new_async().await;
        let hashes = ["AAAA", "BBBB"];
        server
            .mock("GET", "/network/peering/peers")
            .match_query(Matcher::UrlEncoded("leaves".into(), "true".into()))
            .with_status(200)
            .with_body(r#"{"depth": 1, "nodesCount": 3, "leavesCount": 2, "root": "RR", "leaves": ["AAAA", "BBBB"]}"#)
            .create_async()
            .await;
        for hash in hashes {
            server
                .mock("GET", "/network/peering/peers")
                .match_query(Matcher::UrlEncoded("leaf".into(), hash.into()))
                .with_status(200)
                .with_body(format!(
                    r#"{{"depth": 1, "nodesCount": 3, "leavesCount": 2, "root": "RR",
                        "leaf": {{"hash": "{hash}", "value": {{"id": "{hash}"}}}}}}"#
                ))
                .create_async()
                .await;
        }

        let client = client_for(&server);
        let enumerator = MerkleLeafEnumerator::open(&client, paths::PEERS).await.unwrap();
        let leaves = enumerator.collect(&client).await.unwrap();
        let ids: Vec<_> = leaves.iter().map(|l| l.value["id"].clone()).collect();
        assert_eq!(ids, vec!["AAAA", "BBBB"]);
    }

    #[tokio::test]
    async fn merkle_transport_error_keeps_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/wot/members")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;
        let client = client_for(&server);
        match MerkleLeafEnumerator::open(&client, "wot/members").await {
            Err(MerkleError::Transport(BmaError::Status { status, .. })) => assert_eq!(status, 404),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn signed_responses_config_builds() {
        let config = ClientConfig {
            signed_responses: true,
            ..ClientConfig::default()
        };
        let client = BmaClient::from_config(&config).unwrap();
        assert_eq!(client.handler().server(), "localhost");
    }
}
