//! Fuzzy resolution of misspelled response keys.
//!
//! Models occasionally misspell field names (`exlanation`, `improvedCode`).
//! A key is accepted as a substitute only when it is close in both edit
//! distance and length, so unrelated fields never borrow each other's values.

use crate::config::RepairConfig;

/// A present key accepted as the substitute for an expected field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMatch<'a> {
    /// The key as it appears in the first-pass object.
    pub key: &'a str,
    /// Case-insensitive edit distance to the expected name.
    pub distance: usize,
}

/// Case-insensitive Levenshtein distance between `a` and `b`.
///
/// Counts single-character insertions, deletions and substitutions.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row DP: row[j] is the distance between a[..i] and b[..j].
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diag + cost);
            diag = above;
        }
    }
    row[b.len()]
}

/// Best substitute for `expected` among `keys`, if any is close enough.
///
/// A candidate qualifies when its distance is within
/// [`RepairConfig::distance_threshold`] for the expected name's length and
/// the lengths differ by at most [`RepairConfig::max_length_diff`]. The
/// lowest distance wins; ties go to the earliest key in `keys`.
pub fn best_key_match<'a, I>(expected: &str, keys: I, config: &RepairConfig) -> Option<KeyMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let expected_len = expected.chars().count();
    let threshold = config.distance_threshold(expected_len);

    let mut best: Option<KeyMatch<'a>> = None;
    for key in keys {
        if expected_len.abs_diff(key.chars().count()) > config.max_length_diff {
            continue;
        }
        let distance = edit_distance(expected, key);
        if distance > threshold {
            continue;
        }
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(KeyMatch { key, distance });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("", "ab"), 2);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn distance_ignores_case() {
        assert_eq!(edit_distance("commentedCode", "commentedcode"), 0);
        assert_eq!(edit_distance("CODE", "code"), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(
            edit_distance("explanation", "exlanation"),
            edit_distance("exlanation", "explanation")
        );
    }

    #[test]
    fn accepts_single_typo() {
        let config = RepairConfig::default();
        let m = best_key_match("explanation", ["exlanation"], &config).unwrap();
        assert_eq!(m.key, "exlanation");
        assert_eq!(m.distance, 1);
    }

    #[test]
    fn rejects_unrelated_key() {
        let config = RepairConfig::default();
        assert!(best_key_match("code", ["summary"], &config).is_none());
    }

    #[test]
    fn rejects_large_length_difference() {
        let config = RepairConfig::default();
        // "code" -> "codes!!" is 3 inserts, also 3 chars longer.
        assert!(best_key_match("code", ["codes!!"], &config).is_none());
    }

    #[test]
    fn long_names_allow_three_edits() {
        let config = RepairConfig::default();
        // 13 chars: threshold 3.
        let m = best_key_match("commentedCode", ["comentedCod"], &config).unwrap();
        assert_eq!(m.distance, 2);
        let m = best_key_match("improved_code", ["improvedcde"], &config).unwrap();
        assert_eq!(m.distance, 2);
        assert!(best_key_match("optimizedCode", ["optmzdCod"], &config).is_none());
    }

    #[test]
    fn short_names_allow_two_edits() {
        let config = RepairConfig::default();
        assert!(best_key_match("roast", ["rost"], &config).is_some());
        assert!(best_key_match("roast", ["rxxst"], &config).is_some());
        assert!(best_key_match("roast", ["rxxxt"], &config).is_none());
    }

    #[test]
    fn lowest_distance_wins() {
        let config = RepairConfig::default();
        let m = best_key_match("summary", ["sumary_", "summry"], &config).unwrap();
        assert_eq!(m.key, "summry");
        assert_eq!(m.distance, 1);
    }

    #[test]
    fn ties_keep_first_key() {
        let config = RepairConfig::default();
        let m = best_key_match("code", ["cade", "codx"], &config).unwrap();
        assert_eq!(m.key, "cade");
    }

    #[test]
    fn no_keys_no_match() {
        let config = RepairConfig::default();
        assert!(best_key_match("code", std::iter::empty(), &config).is_none());
    }
}
