//! Record types persisted by the tracker.
//!
//! Both `Log` and `Block` are stored as JSON, camelCase, the way an
//! Ethereum JSON-RPC node reports them.

use serde::{Deserialize, Serialize};

use crate::codec::{Codec, CodecError};

/// A single contract log emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract, `0x`-prefixed hex.
    pub address: String,
    pub topics: Vec<String>,
    /// ABI-encoded payload, `0x`-prefixed hex.
    pub data: String,
    pub block_number: u64,
    pub block_hash: String,
    pub transaction_hash: String,
    pub transaction_index: u64,
    pub log_index: u64,
    /// Set by the node when the log was dropped by a reorg.
    #[serde(default)]
    pub removed: bool,
}

/// Header of the last block the tracker fully processed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: u64,
}

impl Codec for Log {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Codec for Block {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One step of upstream tracking output.
///
/// `index` is the first log index invalidated by a reorganization; every
/// stored log at or above it is rolled back before `added` is appended.
/// Zero means nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEvent {
    pub index: u64,
    pub added: Vec<Log>,
    /// Logs the upstream dropped. Informational only; the store rolls back
    /// by `index`, not by matching these.
    pub removed: Vec<Log>,
    pub block: Option<Block>,
}

impl TrackerEvent {
    /// Truncation boundary implied by this event, if any.
    pub fn rollback_from(&self) -> Option<u64> {
        (self.index > 0).then_some(self.index)
    }
}
