//! Key layout. Must stay bit-compatible with existing store files.

/// Prefix of every namespace table name.
pub const NAMESPACE_PREFIX: &str = "logs";

/// Prefix of every log record key within a namespace.
pub const LOG_PREFIX: &[u8] = b"logs-";

/// First key past the log record range (`-` + 1 = `.`).
pub const LOG_PREFIX_END: &[u8] = b"logs.";

/// Key holding the checkpoint within a namespace.
pub const CHECKPOINT_KEY: &[u8] = b"last-block";

/// Length of a log record key: prefix + 8 byte index.
pub const LOG_KEY_LEN: usize = 5 + 8;

/// Table name for a stream. The empty id maps to the default namespace.
pub fn namespace_name(stream_id: &str) -> String {
    format!("{NAMESPACE_PREFIX}{stream_id}")
}

/// Inverse of [`namespace_name`].
pub fn stream_id(namespace: &str) -> Option<&str> {
    namespace.strip_prefix(NAMESPACE_PREFIX)
}

/// Build a log record key: prefix + index (big-endian so key order is index order).
pub fn log_key(index: u64) -> [u8; LOG_KEY_LEN] {
    let mut key = [0u8; LOG_KEY_LEN];
    key[..LOG_PREFIX.len()].copy_from_slice(LOG_PREFIX);
    key[LOG_PREFIX.len()..].copy_from_slice(&index.to_be_bytes());
    key
}

/// Decode the index out of a log record key.
pub fn index_from_key(key: &[u8]) -> Option<u64> {
    let raw = key.strip_prefix(LOG_PREFIX)?;
    let bytes: [u8; 8] = raw.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
