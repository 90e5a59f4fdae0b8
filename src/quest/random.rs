//! Weighted random selection.

use rand::Rng;

/// Pick one element with probability proportional to its weight.
///
/// Uses a cumulative-weight table and a binary search over a single roll.
/// Zero-weight elements are never picked. Returns `None` when the slice is
/// empty or every weight is zero.
pub fn pick_weighted<'a, T, R, F>(items: &'a [T], weight: F, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> u32,
{
    let mut cumulative = Vec::with_capacity(items.len());
    let mut total: u64 = 0;
    for item in items {
        total += u64::from(weight(item));
        cumulative.push(total);
    }
    if total == 0 {
        return None;
    }

    let roll = rng.random_range(0..total);
    let index = cumulative.partition_point(|&bound| bound <= roll);
    items.get(index)
}
