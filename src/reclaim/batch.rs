//! Order-preserving batching

use crate::chain::constants::MAX_ACCOUNTS_PER_TX;

/// Split `items` into contiguous batches of at most `max_size`.
///
/// Empty input yields no batches. A `max_size` of zero is treated as one.
pub fn make_batches<T: Clone>(items: &[T], max_size: usize) -> Vec<Vec<T>> {
    items.chunks(max_size.max(1)).map(|c| c.to_vec()).collect()
}

/// [`make_batches`] with the default transaction limit
pub fn make_default_batches<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    make_batches(items, MAX_ACCOUNTS_PER_TX)
}

/// Number of batches `make_batches` would produce
pub fn batch_count(len: usize, max_size: usize) -> usize {
    len.div_ceil(max_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_batches() {
        let batches = make_batches::<u32>(&[], 20);
        assert!(batches.is_empty());
        assert_eq!(batch_count(0, 20), 0);
    }

    #[test]
    fn test_forty_five_into_twenty() {
        let items: Vec<u32> = (0..45).collect();
        let batches = make_default_batches(&items);

        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(batch_count(45, 20), 3);
    }

    #[test]
    fn test_concat_reconstructs_input() {
        for len in [1usize, 2, 19, 20, 21, 40, 57] {
            for max in [1usize, 3, 20, 100] {
                let items: Vec<usize> = (0..len).collect();
                let batches = make_batches(&items, max);

                assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= max));
                assert_eq!(batches.len(), batch_count(len, max));
                assert_eq!(batches.concat(), items);
            }
        }
    }

    #[test]
    fn test_zero_max_is_clamped() {
        let batches = make_batches(&[1, 2, 3], 0);
        assert_eq!(batches, vec![vec![1], vec![2], vec![3]]);
    }
}
