//! Key encoding for the graph trees.
//!
//! Name index: `[kind tag][name][0x00][guid]`.
//! Edge index: `[from guid][0x00][label tag][to guid]` in the out tree and
//! the mirror image in the in tree, so both directions are prefix scans.

use super::vertex::{EdgeLabel, VertexKind};

/// Separator between variable-length key components.
pub const SEPARATOR: u8 = 0;

/// Name index key for a vertex.
pub fn name_key(kind: VertexKind, name: &str, guid: &str) -> Vec<u8> {
    let mut key = name_prefix(kind, name);
    key.extend_from_slice(guid.as_bytes());
    key
}

/// Prefix of every name index key for `name` within `kind`.
pub fn name_prefix(kind: VertexKind, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len() + 1);
    key.push(kind.tag());
    key.extend_from_slice(name.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Prefix of every name index key within `kind`.
pub fn kind_prefix(kind: VertexKind) -> [u8; 1] {
    [kind.tag()]
}

/// Edge index key for `near -> far` (or its mirror in the in tree).
pub fn edge_key(near: &str, label: EdgeLabel, far: &str) -> Vec<u8> {
    let mut key = edge_prefix(near, label);
    key.extend_from_slice(far.as_bytes());
    key
}

/// Prefix of every edge key leaving `near` with `label`.
pub fn edge_prefix(near: &str, label: EdgeLabel) -> Vec<u8> {
    let mut key = Vec::with_capacity(near.len() + 2);
    key.extend_from_slice(near.as_bytes());
    key.push(SEPARATOR);
    key.push(label.tag());
    key
}

/// Decode the trailing guid after a known prefix.
pub fn suffix_guid(key: &[u8], prefix_len: usize) -> Option<String> {
    key.get(prefix_len..)
        .and_then(|tail| std::str::from_utf8(tail).ok())
        .map(str::to_string)
}

/// Get current timestamp in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
