use std::collections::BTreeMap;

/// 合併兩個以 ID 為鍵的集合：後寫入者勝出
///
/// Every non-null entry of `source` is written into `target`, replacing any
/// existing value under the same key. Null entries are skipped, so a venue
/// that reports `null` for a key never erases data from an earlier visit.
/// An absent `source` merges nothing. Returns the number of entries written.
pub fn merge_keyed<K, V>(target: &mut BTreeMap<K, Option<V>>, source: Option<BTreeMap<K, Option<V>>>) -> usize
where
    K: Ord,
{
    let Some(source) = source else {
        return 0;
    };

    let mut written = 0;
    for (key, value) in source {
        if let Some(value) = value {
            target.insert(key, Some(value));
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(entries: &[(&str, Option<i32>)]) -> BTreeMap<String, Option<i32>> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_merge_adds_new_keys_and_overwrites_existing() {
        let mut target = keyed(&[("a", Some(1)), ("b", Some(2))]);
        let written = merge_keyed(&mut target, Some(keyed(&[("b", Some(20)), ("c", Some(3))])));

        assert_eq!(written, 2);
        assert_eq!(target, keyed(&[("a", Some(1)), ("b", Some(20)), ("c", Some(3))]));
    }

    #[test]
    fn test_merge_skips_null_values() {
        let mut target = keyed(&[("a", Some(1))]);
        let written = merge_keyed(&mut target, Some(keyed(&[("a", None), ("b", None)])));

        assert_eq!(written, 0);
        assert_eq!(target, keyed(&[("a", Some(1))]));
    }

    #[test]
    fn test_merge_absent_source_is_noop() {
        let mut target = keyed(&[("a", Some(1))]);
        assert_eq!(merge_keyed(&mut target, None), 0);
        assert_eq!(target, keyed(&[("a", Some(1))]));
    }

    #[test]
    fn test_disjoint_merges_commute() {
        let first = keyed(&[("s1", Some(1))]);
        let second = keyed(&[("s2", Some(2))]);

        let mut forward = BTreeMap::new();
        merge_keyed(&mut forward, Some(first.clone()));
        merge_keyed(&mut forward, Some(second.clone()));

        let mut backward = BTreeMap::new();
        merge_keyed(&mut backward, Some(second));
        merge_keyed(&mut backward, Some(first));

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_later_merge_wins_on_overlap() {
        let mut target = BTreeMap::new();
        merge_keyed(&mut target, Some(keyed(&[("s1", Some(1))])));
        merge_keyed(&mut target, Some(keyed(&[("s1", Some(2))])));
        assert_eq!(target, keyed(&[("s1", Some(2))]));
    }
}
