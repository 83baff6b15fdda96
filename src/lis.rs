//! Longest increasing subsequence, used to tell moved siblings from stationary ones.
//!
//! Patience sorting with predecessor links, O(n log n). `tails[k]` holds the
//! input position of the smallest tail value seen so far for an increasing
//! run of length `k + 1`.

/// Returns the positions (ascending) of a longest strictly increasing
/// subsequence of `sequence`.
///
/// Zero marks an unmatched slot and never takes part in the subsequence.
/// When several subsequences share the maximal length, the one produced by
/// the greedy patience rule is returned: a later candidate with an equal or
/// smaller value always replaces the current tail.
///
/// # Examples
///
/// ```
/// use tdiff_rs::lis::longest_increasing_subsequence;
///
/// assert_eq!(longest_increasing_subsequence(&[2, 1, 3]), vec![1, 2]);
/// assert_eq!(longest_increasing_subsequence(&[0, 5, 0, 6]), vec![1, 3]);
/// assert!(longest_increasing_subsequence(&[0, 0]).is_empty());
/// ```
pub fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; sequence.len()];

    for (position, &value) in sequence.iter().enumerate() {
        if value == 0 {
            continue;
        }

        let slot = tails.partition_point(|&tail| sequence[tail] < value);
        predecessors[position] = slot.checked_sub(1).map(|prev| tails[prev]);
        if slot == tails.len() {
            tails.push(position);
        } else {
            tails[slot] = position;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        result.push(position);
        cursor = predecessors[position];
    }
    result.reverse();
    result
}
