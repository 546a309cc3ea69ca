//! Composite key encoding.

use bytes::BufMut;

/// Encodes a table name and row key into one composite byte key.
///
/// The encoding is a 4-byte big-endian table length, the table bytes,
/// then the row-key bytes. Length-prefixing makes it injective: no
/// (table, key) pair shares an encoding with a different pair, even
/// when the names contain each other or any separator character. All
/// composite keys of one table share a common prefix, so store
/// iteration groups by table and then sorts by row key.
#[must_use]
pub fn composite_key(table: &str, key: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + table.len() + key.len());
    buf.put_u32(table.len() as u32);
    buf.put_slice(table.as_bytes());
    buf.put_slice(key.as_bytes());
    buf
}
