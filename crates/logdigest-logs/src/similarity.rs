//! Normalized indel similarity between two strings.
//!
//! The score is `100 * (1 - indel / (len_a + len_b))`, where `indel` is the
//! minimum number of single-character insertions and deletions turning one
//! string into the other. Equivalently `200 * lcs / (len_a + len_b)`.
//! Lengths count Unicode scalar values; comparison is case- and
//! whitespace-sensitive.

/// Similarity in `[0, 100]`; two empty strings score 100
pub fn ratio(a: &str, b: &str) -> f64 {
    ratio_with_cutoff(a, b, 0.0)
}

/// Like [`ratio`], but returns 0 as soon as the score provably falls below `cutoff`
pub fn ratio_with_cutoff(a: &str, b: &str, cutoff: f64) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    char_ratio(&a, &b, cutoff)
}

pub(crate) fn char_ratio(a: &[char], b: &[char], cutoff: f64) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    // Best case: the shorter string is a subsequence of the longer one
    let upper_bound = score(a.len().min(b.len()), total);
    if upper_bound < cutoff {
        return 0.0;
    }

    let result = score(lcs_len(a, b), total);
    if result < cutoff { 0.0 } else { result }
}

fn score(lcs: usize, total: usize) -> f64 {
    100.0 * (2 * lcs) as f64 / total as f64
}

/// Longest common subsequence length
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    if a.is_empty() || b.is_empty() {
        return prefix + suffix;
    }

    // Single-row dynamic programming over the shorter string
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; inner.len() + 1];
    for &x in outer {
        let mut diagonal = 0;
        for (j, &y) in inner.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    prefix + suffix + row[inner.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(ratio("disk full", "disk full"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_unrelated() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_known_scores() {
        // lcs("this is a test", "this is a test!") = 14, total 29
        assert!((ratio("this is a test", "this is a test!") - 2800.0 / 29.0).abs() < 1e-9);
        // lcs("kitten", "sitting") = 4 ("ittn"), total 13
        assert!((ratio("kitten", "sitting") - 800.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let a = "connection refused to 10.0.0.1:443";
        let b = "connection reset by 10.0.0.7:8443";
        assert_eq!(ratio(a, b), ratio(b, a));
    }

    #[test]
    fn test_case_and_whitespace_sensitive() {
        assert!(ratio("ERROR disk full", "error disk full") < 100.0);
        assert!(ratio("disk full", "disk  full") < 100.0);
    }

    #[test]
    fn test_single_char_timestamp_difference() {
        // 40 chars each, one substitution: lcs 39, score 97.5
        let a = "2024-01-01T00:00:00.000Z ERROR disk full";
        let b = "2024-01-01T00:00:01.000Z ERROR disk full";
        assert_eq!(ratio(a, b), 97.5);
    }

    #[test]
    fn test_cutoff() {
        assert_eq!(ratio_with_cutoff("a", "abcdefghij", 50.0), 0.0);
        assert_eq!(ratio_with_cutoff("kitten", "sitting", 70.0), 0.0);
        assert!(ratio_with_cutoff("kitten", "sitting", 60.0) > 60.0);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 'é' is two bytes but one character
        assert_eq!(ratio("café", "cafe"), 75.0);
    }
}
