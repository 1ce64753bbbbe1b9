use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root listing returned by `GET {tree}?leaves=true`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRoot {
    pub depth: u32,
    pub nodes_count: u64,
    pub leaves_count: u64,
    /// Root digest; empty for an empty tree.
    pub root: String,
    /// Leaf digests in tree order.
    #[serde(default)]
    pub leaves: Vec<String>,
}

/// One leaf: its digest and the node state it addresses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MerkleLeaf {
    pub hash: String,
    pub value: Value,
}

/// Response to `GET {tree}?leaf={hash}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleLeafResponse {
    pub depth: u32,
    pub nodes_count: u64,
    pub leaves_count: u64,
    pub root: String,
    pub leaf: MerkleLeaf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_listing_from_node_json() {
        let json = r#"{
            "depth": 1,
            "nodesCount": 3,
            "leavesCount": 2,
            "root": "114B6E61CB5BB93D862CA3C1DFA8B99E313E66E9",
            "leaves": ["2E69197FAB029D8669EF85E82457A1587CA0ED9C", "C73882B64B7E72237A2F460CE9CAB76D19A8651E"]
        }"#;
        let root: MerkleRoot = serde_json::from_str(json).unwrap();
        assert_eq!(root.depth, 1);
        assert_eq!(root.leaves_count, 2);
        assert_eq!(root.leaves.len(), 2);
    }

    #[test]
    fn root_listing_without_leaves() {
        let json = r#"{"depth": 0, "nodesCount": 0, "leavesCount": 0, "root": ""}"#;
        let root: MerkleRoot = serde_json::from_str(json).unwrap();
        assert!(root.leaves.is_empty());
    }

    #[test]
    fn leaf_response_keeps_structured_value() {
        let json = r#"{
            "depth": 0, "nodesCount": 1, "leavesCount": 1, "root": "AB",
            "leaf": {"hash": "AB", "value": {"pubkey": "HsLShA", "uid": "cat"}}
        }"#;
        let response: MerkleLeafResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.leaf.value["uid"], "cat");
    }
}
