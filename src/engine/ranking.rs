/// Stable top-down merge sort by a computed key.
///
/// Deterministic by construction: midpoint split, left element wins ties.
/// Keys only need `PartialOrd` so float-valued keys (prices) work; a NaN
/// key is a caller contract violation.
pub fn merge_sort_by_key<T, K, F>(mut items: Vec<T>, key: &F) -> Vec<T>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by_key(items, key);
    let right = merge_sort_by_key(right, key);
    merge(left, right, key)
}

fn merge<T, K, F>(left: Vec<T>, right: Vec<T>, key: &F) -> Vec<T>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // `<=` keeps the left run's elements ahead on equal keys.
        if key(l) <= key(r) {
            merged.extend(left.next());
        } else {
            merged.extend(right.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_integers() {
        let sorted = merge_sort_by_key(vec![5, 1, 4, 2, 3], &|&x| x);
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_and_single() {
        assert_eq!(merge_sort_by_key(Vec::<i32>::new(), &|&x| x), Vec::<i32>::new());
        assert_eq!(merge_sort_by_key(vec![7], &|&x| x), vec![7]);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let items = vec![(1, 5), (2, 5), (3, 3)];
        let sorted = merge_sort_by_key(items, &|&(_, k)| k);
        assert_eq!(sorted, vec![(3, 3), (1, 5), (2, 5)]);
    }

    #[test]
    fn all_equal_keys_is_identity() {
        let items = vec!["a", "b", "c", "d", "e"];
        let sorted = merge_sort_by_key(items.clone(), &|_| 0);
        assert_eq!(sorted, items);
    }

    #[test]
    fn float_keys() {
        let sorted = merge_sort_by_key(vec![2.5_f64, 0.1, 1.75, 0.1], &|&x| x);
        assert_eq!(sorted, vec![0.1, 0.1, 1.75, 2.5]);
    }

    #[test]
    fn tuple_keys_rank_descending_priority_then_price() {
        let spots = vec![("S1", 3, 8.0), ("P2", 4, 14.0), ("P1", 5, 15.0), ("P3", 4, 13.0)];
        let sorted = merge_sort_by_key(spots, &|&(_, priority, price)| (-priority, price));
        let ids: Vec<_> = sorted.iter().map(|&(id, _, _)| id).collect();
        assert_eq!(ids, vec!["P1", "P3", "P2", "S1"]);
    }

    #[test]
    fn agrees_with_std_sort_on_random_ints() {
        // Fixed pseudo-random sequence, no rng dependency.
        let mut seed = 0x2545_F491u64;
        let items: Vec<u64> = (0..200)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                seed % 1_000
            })
            .collect();
        let mut expected = items.clone();
        expected.sort_unstable();
        assert_eq!(merge_sort_by_key(items, &|&x| x), expected);
    }
}
