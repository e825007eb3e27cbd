use crate::constants::{HYBRID_DISC_FILESYSTEMS, HYBRID_DISC_RESOLUTION};

/// Reduce the filesystem names reported for a volume to the one to extract.
///
/// A single name resolves to itself. The ISO9660/UDF/HFS Plus triple of a
/// hybrid optical disc resolves to ISO9660. Anything else is unidentifiable.
pub fn resolve_filesystem(names: &[String]) -> Option<String> {
    match names {
        [single] => Some(single.clone()),
        [_, _, _] => {
            let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            if sorted == HYBRID_DISC_FILESYSTEMS {
                Some(HYBRID_DISC_RESOLUTION.to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_name() {
        assert_eq!(resolve_filesystem(&names(&["fat12"])), Some("fat12".to_string()));
    }

    #[test]
    fn test_empty_and_pairs_fail() {
        assert_eq!(resolve_filesystem(&[]), None);
        assert_eq!(resolve_filesystem(&names(&["iso9660", "udf"])), None);
        assert_eq!(resolve_filesystem(&names(&["iso9660", "udf", "hfs"])), None);
        assert_eq!(resolve_filesystem(&names(&["iso9660", "udf", "udf", "hfs plus"])), None);
    }

    proptest! {
        #[test]
        fn hybrid_triple_resolves_to_iso9660_in_any_order(order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
            let list: Vec<String> = order.iter().map(|&i| HYBRID_DISC_FILESYSTEMS[i].to_string()).collect();
            prop_assert_eq!(resolve_filesystem(&list), Some("iso9660".to_string()));
        }

        #[test]
        fn singleton_resolves_to_itself(name in "[a-z0-9 ]{1,12}") {
            prop_assert_eq!(resolve_filesystem(&[name.clone()]), Some(name));
        }

        #[test]
        fn other_sizes_never_resolve(list in prop::collection::vec("[a-z]{1,8}", 4..8)) {
            prop_assert_eq!(resolve_filesystem(&list), None);
        }
    }
}
