use serde::{Deserialize, Serialize};
use ucoin_types::{BlockHash, BlockStamp};

/// `GET node/summary`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Keyed `ucoin` by older nodes and `duniter` by newer ones.
    #[serde(alias = "duniter")]
    pub ucoin: SoftwareInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareInfo {
    pub software: String,
    pub version: String,
    #[serde(default)]
    pub fork_window_size: Option<u64>,
}

/// The subset of a block a client needs to anchor documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub version: u32,
    pub currency: String,
    pub number: u64,
    pub hash: BlockHash,
    #[serde(default)]
    pub previous_hash: Option<BlockHash>,
    pub issuer: String,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub median_time: u64,
    #[serde(default)]
    pub members_count: u64,
    #[serde(default)]
    pub monetary_mass: u64,
    #[serde(default)]
    pub dividend: Option<u64>,
    #[serde(default)]
    pub signature: String,
}

impl Block {
    /// Stamp that anchors documents to this block.
    pub fn blockstamp(&self) -> BlockStamp {
        BlockStamp::new(self.number, self.hash)
    }
}

/// `GET tx/history/{pubkey}/blocks/{from}/{to}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHistory {
    pub currency: String,
    pub pubkey: String,
    pub history: TxHistoryEntries,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxHistoryEntries {
    pub sent: Vec<HistoryTransaction>,
    pub received: Vec<HistoryTransaction>,
    pub sending: Vec<HistoryTransaction>,
    pub receiving: Vec<HistoryTransaction>,
    pub pending: Vec<HistoryTransaction>,
}

/// A transaction as listed in history, with its inputs and outputs in
/// their inline text forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTransaction {
    pub version: u32,
    #[serde(default)]
    pub locktime: u64,
    pub issuers: Vec<String>,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub unlocks: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default)]
    pub comment: String,
    pub signatures: Vec<String>,
    pub hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub time: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_accepts_both_keys() {
        let old: NodeSummary =
            serde_json::from_str(r#"{"ucoin": {"software": "ucoin", "version": "0.13.0"}}"#).unwrap();
        let new: NodeSummary = serde_json::from_str(
            r#"{"duniter": {"software": "duniter", "version": "0.20.0", "forkWindowSize": 100}}"#,
        )
        .unwrap();
        assert_eq!(old.ucoin.software, "ucoin");
        assert_eq!(new.ucoin.fork_window_size, Some(100));
    }

    #[test]
    fn block_yields_blockstamp() {
        let json = format!(
            r#"{{"version": 2, "currency": "meta_brouzouf", "number": 15, "hash": "{}",
                "issuer": "HnFcSms8jzwngtVomTTnzudZx7SHUQY8sVE1y8yBmULk", "medianTime": 1443096870,
                "unknownField": [1, 2]}}"#,
            "ab".repeat(32)
        );
        let block: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block.blockstamp().to_string(), format!("15-{}", "AB".repeat(32)));
        assert_eq!(block.median_time, 1443096870);
        assert!(block.previous_hash.is_none());
    }

    #[test]
    fn history_with_missing_sections() {
        let json = r#"{"currency": "c", "pubkey": "pk", "history": {"sent": [{
            "version": 2, "issuers": ["pk"], "inputs": ["D:pk:1"], "outputs": ["10:SIG(x)"],
            "signatures": ["sig"], "hash": "H", "block_number": 3
        }]}}"#;
        let history: TxHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.history.sent.len(), 1);
        assert!(history.history.received.is_empty());
    }
}
