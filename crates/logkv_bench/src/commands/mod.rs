//! Benchmark command implementations.

pub mod load;
pub mod run;

use logkv_client::FieldMap;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Formats the zero-padded row key for `row_id`.
pub fn row_key(row_id: usize) -> String {
    format!("key-{row_id:06}")
}

/// Builds a row of `fields` random alphanumeric values.
pub fn random_row<R: Rng>(rng: &mut R, fields: usize, field_len: usize) -> FieldMap {
    (0..fields)
        .map(|f| {
            let value: Vec<u8> = (0..field_len).map(|_| rng.sample(Alphanumeric)).collect();
            (format!("field-{f}"), value)
        })
        .collect()
}

/// Splits `total` work items into per-thread shares.
pub fn shares(total: usize, threads: usize) -> Vec<usize> {
    let threads = threads.max(1);
    let base = total / threads;
    let extra = total % threads;
    (0..threads)
        .map(|t| base + usize::from(t < extra))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_keys_are_zero_padded_and_ordered() {
        assert_eq!(row_key(0), "key-000000");
        assert_eq!(row_key(50), "key-000050");
        assert!(row_key(99) < row_key(100));
    }

    #[test]
    fn shares_cover_the_total() {
        assert_eq!(shares(10, 3), vec![4, 3, 3]);
        assert_eq!(shares(9, 3), vec![3, 3, 3]);
        assert_eq!(shares(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(shares(5, 0), vec![5]);
    }

    #[test]
    fn random_rows_have_the_requested_shape() {
        let mut rng = rand::thread_rng();
        let row = random_row(&mut rng, 10, 100);
        assert_eq!(row.len(), 10);
        assert!(row.values().all(|v| v.len() == 100));
        assert!(row.contains_key("field-0"));
        assert!(row.contains_key("field-9"));
    }
}
