//! Friend recommendation ranking.
//!
//! Scores each friend by the number of hobbies shared with the caller and
//! returns the best `top_k`. Pure computation over already-fetched relation
//! state; the handler in `friends` does the fetching.

use std::collections::HashSet;

pub const DEFAULT_TOP_K: i64 = 10;

/// Ranks `friends` by hobby overlap with `my_hobbies`, highest first.
///
/// The score is the plain intersection size. The sort is stable, so ties
/// keep the underlying enumeration order. A non-positive `top_k` yields an
/// empty result; a `top_k` beyond the friend count returns everyone ranked.
pub fn rank_by_overlap<T>(
    my_hobbies: &HashSet<String>,
    friends: Vec<(T, HashSet<String>)>,
    top_k: i64,
) -> Vec<(T, usize)> {
    if top_k <= 0 {
        return vec![];
    }

    let mut ranked: Vec<(T, usize)> = friends
        .into_iter()
        .map(|(friend, hobbies)| {
            let score = hobbies.intersection(my_hobbies).count();
            (friend, score)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top_k as usize);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hobbies(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scores_are_exact_intersection_sizes() {
        let mine = hobbies(&["chess", "hiking", "cooking"]);
        let friends = vec![
            ("ann", hobbies(&["chess", "hiking", "stamps"])),
            ("ben", hobbies(&["stamps"])),
            ("cat", hobbies(&["chess", "hiking", "cooking"])),
        ];

        let ranked = rank_by_overlap(&mine, friends, 10);
        assert_eq!(ranked, vec![("cat", 3), ("ann", 2), ("ben", 0)]);
    }

    #[test]
    fn order_is_non_increasing_and_ties_are_stable() {
        let mine = hobbies(&["chess"]);
        let friends = vec![
            ("ann", hobbies(&["chess"])),
            ("ben", hobbies(&["chess"])),
            ("cat", hobbies(&[])),
            ("dan", hobbies(&["chess"])),
        ];

        let ranked = rank_by_overlap(&mine, friends, 10);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        // Equal scores keep enumeration order
        assert_eq!(ranked, vec![("ann", 1), ("ben", 1), ("dan", 1), ("cat", 0)]);
    }

    #[test]
    fn truncates_to_top_k() {
        let mine = hobbies(&["chess"]);
        let friends = vec![
            ("ann", hobbies(&["chess"])),
            ("ben", hobbies(&[])),
            ("cat", hobbies(&["chess"])),
        ];

        let ranked = rank_by_overlap(&mine, friends, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].1, 1);
    }

    #[test]
    fn top_k_beyond_friend_count_returns_everyone() {
        let mine = hobbies(&["chess"]);
        let friends = vec![("ann", hobbies(&["chess"]))];
        assert_eq!(rank_by_overlap(&mine, friends, 100).len(), 1);
    }

    #[test]
    fn no_friends_yields_empty() {
        let mine = hobbies(&["chess"]);
        let ranked = rank_by_overlap::<&str>(&mine, vec![], 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn non_positive_top_k_yields_empty() {
        let mine = hobbies(&["chess"]);
        let friends = vec![("ann", hobbies(&["chess"]))];
        assert!(rank_by_overlap(&mine, friends.clone(), 0).is_empty());
        assert!(rank_by_overlap(&mine, friends, -3).is_empty());
    }
}
