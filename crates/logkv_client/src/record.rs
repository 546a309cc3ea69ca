//! Field-map serialization and projection.
//!
//! A record is a flat name -> value map serialized as a sequence of
//! length-prefixed pairs: 4-byte LE name length, name bytes, 4-byte LE
//! value length, value bytes. Field order in the blob is not
//! significant. Decoding can project to a requested field subset,
//! skipping unrequested values without copying them.

use std::collections::{HashMap, HashSet};

use bytes::{Buf, BufMut};

use crate::error::{ClientError, ClientResult};

/// One logical row: a field-name to value mapping.
pub type FieldMap = HashMap<String, Vec<u8>>;

/// Serializes a full field map into one opaque blob.
#[must_use]
pub fn encode_record(fields: &FieldMap) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, value) in fields {
        buf.put_u32_le(name.len() as u32);
        buf.put_slice(name.as_bytes());
        buf.put_u32_le(value.len() as u32);
        buf.put_slice(value);
    }
    buf
}

/// Deserializes a record blob, optionally projecting to a field subset.
///
/// With `fields = None` all fields are returned. With `Some(set)` only
/// fields named in the set are materialized; requested names absent
/// from the blob are simply omitted, and an empty set yields an empty
/// map.
///
/// # Errors
///
/// Returns [`ClientError::Corrupt`] if the blob is truncated or a
/// field name is not valid UTF-8.
pub fn decode_record(
    mut blob: &[u8],
    fields: Option<&HashSet<String>>,
) -> ClientResult<FieldMap> {
    let mut result = FieldMap::new();

    while blob.has_remaining() {
        let name = read_chunk(&mut blob, "field name")?;
        let name = std::str::from_utf8(name)
            .map_err(|_| ClientError::corrupt("field name is not UTF-8"))?;

        let wanted = fields.map_or(true, |set| set.contains(name));
        let name = wanted.then(|| name.to_string());

        let value = read_chunk(&mut blob, "field value")?;
        if let Some(name) = name {
            result.insert(name, value.to_vec());
        }
    }

    Ok(result)
}

/// Reads one length-prefixed chunk, advancing the blob cursor.
fn read_chunk<'a>(blob: &mut &'a [u8], what: &str) -> ClientResult<&'a [u8]> {
    if blob.remaining() < 4 {
        return Err(ClientError::corrupt(format!("truncated {what} length")));
    }
    let len = blob.get_u32_le() as usize;
    if blob.remaining() < len {
        return Err(ClientError::corrupt(format!("truncated {what}")));
    }
    let chunk = &blob[..len];
    blob.advance(len);
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_row() -> FieldMap {
        (0..10)
            .map(|i| {
                (
                    format!("field-{i}"),
                    format!("value-{i}").into_bytes(),
                )
            })
            .collect()
    }

    #[test]
    fn roundtrip_all_fields() {
        let row = sample_row();
        let blob = encode_record(&row);
        assert_eq!(decode_record(&blob, None).unwrap(), row);
    }

    #[test]
    fn roundtrip_empty_map() {
        let row = FieldMap::new();
        let blob = encode_record(&row);
        assert!(blob.is_empty());
        assert!(decode_record(&blob, None).unwrap().is_empty());
    }

    #[test]
    fn projection_returns_requested_subset() {
        let row = sample_row();
        let blob = encode_record(&row);

        let wanted: HashSet<String> =
            ["field-1".to_string(), "field-7".to_string()].into();
        let decoded = decode_record(&blob, Some(&wanted)).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded["field-1"], row["field-1"]);
        assert_eq!(decoded["field-7"], row["field-7"]);
    }

    #[test]
    fn projection_with_empty_set_yields_no_fields() {
        let blob = encode_record(&sample_row());
        let wanted = HashSet::new();
        assert!(decode_record(&blob, Some(&wanted)).unwrap().is_empty());
    }

    #[test]
    fn projecting_absent_field_is_not_an_error() {
        let blob = encode_record(&sample_row());
        let wanted: HashSet<String> =
            ["field-1".to_string(), "no-such-field".to_string()].into();

        let decoded = decode_record(&blob, Some(&wanted)).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(decoded.contains_key("field-1"));
    }

    #[test]
    fn binary_values_roundtrip() {
        let mut row = FieldMap::new();
        row.insert("blob".to_string(), vec![0, 255, 1, 254, 0, 0]);
        row.insert("empty".to_string(), Vec::new());

        let blob = encode_record(&row);
        assert_eq!(decode_record(&blob, None).unwrap(), row);
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let blob = encode_record(&sample_row());
        let result = decode_record(&blob[..blob.len() - 3], None);
        assert!(matches!(result, Err(ClientError::Corrupt { .. })));
    }

    #[test]
    fn garbage_length_is_corrupt() {
        // Claims a 4 GiB field name in a 8-byte blob.
        let blob = [255u8, 255, 255, 255, 0, 0, 0, 0];
        let result = decode_record(&blob, None);
        assert!(matches!(result, Err(ClientError::Corrupt { .. })));
    }

    proptest! {
        #[test]
        fn roundtrip_law(
            row in proptest::collection::hash_map(
                "[a-z0-9-]{1,16}",
                proptest::collection::vec(any::<u8>(), 0..64),
                0..16,
            )
        ) {
            let blob = encode_record(&row);
            prop_assert_eq!(decode_record(&blob, None).unwrap(), row);
        }

        #[test]
        fn projection_law(
            row in proptest::collection::hash_map(
                "[a-z0-9-]{1,16}",
                proptest::collection::vec(any::<u8>(), 0..64),
                1..16,
            ),
            mask in proptest::collection::vec(any::<bool>(), 16),
        ) {
            let wanted: HashSet<String> = row
                .keys()
                .zip(mask.iter().cycle())
                .filter(|(_, keep)| **keep)
                .map(|(name, _)| name.clone())
                .collect();

            let blob = encode_record(&row);
            let decoded = decode_record(&blob, Some(&wanted)).unwrap();

            let expected: FieldMap = row
                .iter()
                .filter(|(name, _)| wanted.contains(*name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            prop_assert_eq!(decoded, expected);
        }
    }
}
