//! Partial-ratio similarity scoring.

/// Highest possible similarity score.
pub const MAX_SCORE: u8 = 100;

/// Scores how well the shorter string matches its best-aligned substring of the longer one.
///
/// Each candidate window of the longer string is compared to the shorter one with
/// the Indel ratio `2 * LCS / (len_a + len_b)`, where LCS is the longest common
/// subsequence. Candidates are every window as wide as the shorter string, plus
/// the shorter prefixes and suffixes of the longer string, so a keyword hanging
/// off either end still aligns. The best ratio is scaled to `0..=100` and rounded.
///
/// An exact substring scores 100. A score of 0 means the strings share no
/// character; any shared character scores at least 1.
///
/// Two empty strings score 100; an empty string against a non-empty one scores 0.
///
/// # Examples
///
/// ```
/// use linkdl_core::matcher::partial_ratio;
///
/// assert_eq!(partial_ratio("mario", "super mario bros (usa).zip"), 100);
/// assert_eq!(partial_ratio("xy", "y http://q"), 67);
/// assert_eq!(partial_ratio("xyz", "abc"), 0);
/// ```
#[must_use]
pub fn partial_ratio(left: &str, right: &str) -> u8 {
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let (needle, haystack) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };

    if needle.is_empty() {
        return if haystack.is_empty() { MAX_SCORE } else { 0 };
    }

    let mut best = best_alignment(&needle, &haystack);
    // Equal lengths align both ways round.
    if best < 1.0 && needle.len() == haystack.len() {
        best = best.max(best_alignment(&haystack, &needle));
    }

    to_score(best)
}

/// Best Indel ratio of `needle` against the windows of `haystack`.
///
/// `needle` must not be longer than `haystack`.
fn best_alignment(needle: &[char], haystack: &[char]) -> f64 {
    let width = needle.len();
    let len = haystack.len();

    let prefixes = (1..width).map(|k| &haystack[..k]);
    let full = (0..=len - width).map(|start| &haystack[start..start + width]);
    let suffixes = (len - width + 1..len).map(|start| &haystack[start..]);

    let mut best = 0.0_f64;
    for window in prefixes.chain(full).chain(suffixes) {
        let ratio = indel_ratio(needle, window);
        if ratio > best {
            best = ratio;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}

/// Indel similarity `2 * LCS / (len_a + len_b)` in `0.0..=1.0`.
#[allow(clippy::cast_precision_loss)]
fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(a, b)) as f64 / total as f64
}

/// Length of the longest common subsequence, one DP row at a time.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0_usize; b.len() + 1];
    for ca in a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(similarity: f64) -> u8 {
    let score = (similarity.clamp(0.0, 1.0) * f64::from(MAX_SCORE)).round() as u8;
    // Keep "some similarity" distinguishable from none after rounding.
    if score == 0 && similarity > 0.0 { 1 } else { score }
}
