//! Contiguous splitting of a dataset into shard pieces.

use crate::error::{Result, ShardError};

/// Split `data` into `count` contiguous pieces.
///
/// Every piece gets `len / count` bytes; the `len % count` leftover bytes
/// at the tail are appended to the last piece. Concatenating the pieces
/// reproduces `data`.
///
/// Fails when `count` is 0 or larger than `data.len()`.
pub fn split(data: &[u8], count: usize) -> Result<Vec<&[u8]>> {
    if count == 0 || count > data.len() {
        return Err(ShardError::InvalidShardCount {
            requested: count,
            len: data.len(),
        });
    }

    let base = data.len() / count;
    let mut pieces: Vec<&[u8]> = data.chunks_exact(base).take(count).collect();
    let last_start = base * (count - 1);
    pieces[count - 1] = &data[last_start..];
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_remainder_goes_to_last() {
        let pieces = split(b"abcdefghij", 3).unwrap();
        assert_eq!(pieces, vec![&b"abc"[..], &b"def"[..], &b"ghij"[..]]);
    }

    #[test]
    fn test_split_even() {
        let pieces = split(b"abcdef", 2).unwrap();
        assert_eq!(pieces, vec![&b"abc"[..], &b"def"[..]]);
    }

    #[test]
    fn test_split_one_byte_per_shard() {
        let pieces = split(b"xyz", 3).unwrap();
        assert_eq!(pieces, vec![&b"x"[..], &b"y"[..], &b"z"[..]]);
    }

    #[test]
    fn test_split_rejects_zero_count() {
        let err = split(b"abc", 0).unwrap_err();
        assert!(matches!(err, ShardError::InvalidShardCount { requested: 0, len: 3 }));
    }

    #[test]
    fn test_split_rejects_more_shards_than_bytes() {
        assert!(split(b"abc", 4).is_err());
        assert!(split(b"", 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_pieces_concatenate_to_input(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            count_seed in any::<usize>(),
        ) {
            let count = count_seed % data.len() + 1;
            let pieces = split(&data, count).unwrap();

            prop_assert_eq!(pieces.len(), count);
            prop_assert_eq!(pieces.concat(), data.clone());

            let base = data.len() / count;
            for piece in &pieces[..count - 1] {
                prop_assert_eq!(piece.len(), base);
            }
            prop_assert_eq!(pieces[count - 1].len(), base + data.len() % count);
        }
    }
}
