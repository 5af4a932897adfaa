//! String similarity used for fuzzy card-name lookup.
//!
//! The base metric is the classic diff ratio `2 * M / (len(a) + len(b))`,
//! where `M` is the number of characters covered by the longest-matching-block
//! decomposition of the two strings.

use std::collections::HashMap;

use crate::db::helpers::normalize_key;

/// Floor applied when one normalized string contains the other.
pub const SUBSTRING_FLOOR: f64 = 0.7;

/// Case-insensitive similarity in `[0, 1]` with the default substring floor.
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_with_floor(a, b, SUBSTRING_FLOOR)
}

/// Same as [`similarity`] with a caller-chosen substring floor.
///
/// Inputs are lowercased and trimmed. Two empty strings are identical; an
/// empty string against a non-empty one shares nothing and scores 0.
pub fn similarity_with_floor(a: &str, b: &str, floor: f64) -> f64 {
    let a = normalize_key(a);
    let b = normalize_key(b);
    normalized_similarity(&a, &b, floor)
}

/// Similarity of two strings that are already normalized.
pub(crate) fn normalized_similarity(a: &str, b: &str, floor: f64) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let base = ratio(a, b);
    if a.contains(b) || b.contains(a) {
        base.max(floor)
    } else {
        base
    }
}

/// Diff ratio, symmetric in its arguments.
///
/// The block decomposition is greedy and can cover a different number of
/// characters depending on which side is scanned first, so both directions
/// are computed and the larger one wins.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = matching_characters(&a, &b).max(matching_characters(&b, &a));
    2.0 * matches as f64 / total as f64
}

/// Characters covered by the longest-matching-block decomposition of `a`
/// against `b`.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        b2j.entry(*ch).or_default().push(j);
    }

    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`, as
/// `(start_in_a, start_in_b, len)`. Ties go to the earliest block in `a`,
/// then the earliest in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_j2len = HashMap::new();
        if let Some(positions) = b2j.get(ch) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let len = j
                    .checked_sub(1)
                    .and_then(|prev| j2len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_j2len.insert(j, len);
                if len > best_len {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_len = len;
                }
            }
        }
        j2len = next_j2len;
    }

    (best_i, best_j, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_after_normalization() {
        for s in ["Pikachu", "  mr. mime ", "", "Ho-Oh"] {
            assert_eq!(similarity(s, s), 1.0);
        }
        assert_eq!(similarity("PIKACHU", " pikachu "), 1.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("charzrd", "charizard"),
            ("pika", "pikachu"),
            ("abcd", "bcda"),
            ("mewtwo ex", "mew"),
            ("squirtle", "wartortle"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn nothing_in_common_scores_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("", "pikachu"), 0.0);
    }

    #[test]
    fn diff_ratio_values() {
        // "char" + "z" + "rd" = 7 matching chars over 7 + 9.
        assert!(approx(ratio("charzrd", "charizard"), 14.0 / 16.0));
        assert!(approx(ratio("abcd", "abce"), 0.75));
    }

    #[test]
    fn substring_gets_floor() {
        let score = similarity("Pika", "Pikachu");
        assert!(score >= 0.7);
        assert!(approx(score, 8.0 / 11.0));

        // "mew" inside "mewtwo gx" would otherwise score 0.5.
        assert!(approx(ratio("mew", "mewtwo gx"), 0.5));
        assert_eq!(similarity("mew", "mewtwo gx"), 0.7);
        assert_eq!(similarity("mewtwo gx", "MEW"), 0.7);
    }

    #[test]
    fn custom_floor() {
        assert_eq!(similarity_with_floor("mew", "mewtwo gx", 0.9), 0.9);
        assert!(approx(similarity_with_floor("mew", "mewtwo gx", 0.0), 0.5));
    }

    #[test]
    fn results_stay_in_unit_range() {
        let words = ["a", "ab", "ba", "pikachu", "raichu", "pichu", ""];
        for a in words {
            for b in words {
                let s = similarity(a, b);
                assert!((0.0..=1.0).contains(&s), "{a} vs {b} = {s}");
            }
        }
    }
}
