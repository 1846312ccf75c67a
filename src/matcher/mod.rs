//! Fuzzy ranking of page links against keywords.
//!
//! Each candidate [`Link`] is compared to a keyword through the lower-cased string
//! `text + " " + href` using [`partial_ratio`]. Links with no similarity are
//! dropped and the rest are ordered best match first; ties keep the order in
//! which the links were extracted.
//!
//! # Example
//!
//! ```
//! use linkdl_core::matcher::{Link, rank};
//!
//! let links = vec![
//!     Link::new("https://example.com/a.zip", "Super Mario Bros (USA).zip"),
//!     Link::new("https://example.com/b.zip", "Tetris (World).zip"),
//! ];
//! let ranked = rank(&links, "mario", Some(1));
//! assert_eq!(ranked, vec!["https://example.com/a.zip".to_string()]);
//! ```

mod score;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

pub use score::{MAX_SCORE, partial_ratio};

/// A hyperlink found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute URL the link points to.
    pub href: String,
    /// Visible label of the link.
    pub text: String,
}

impl Link {
    /// Creates a link from an absolute href and its label.
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }

    /// Lower-cased `text + " " + href`, the string keywords are scored against.
    #[must_use]
    pub fn comparison_text(&self) -> String {
        format!("{} {}", self.text, self.href).to_lowercase()
    }
}

/// A link href together with its similarity score for one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredLink {
    /// Similarity in `0..=100`.
    pub score: u8,
    /// The scored link's href.
    pub href: String,
}

/// Matched hrefs per keyword, in the order keywords were supplied.
pub type KeywordResults = IndexMap<String, Vec<String>>;

/// Ranking settings shared by every keyword of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    top_n: Option<usize>,
    min_score: u8,
}

impl Matcher {
    /// Creates a matcher that keeps every link with a non-zero score.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits each keyword's result to its best `top_n` links (`None` keeps all).
    #[must_use]
    pub fn with_top_n(mut self, top_n: Option<usize>) -> Self {
        self.top_n = top_n;
        self
    }

    /// Drops links scoring below `min_score`. Zero scores are always dropped.
    #[must_use]
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score.min(MAX_SCORE);
        self
    }

    /// Returns the configured top-N cutoff.
    #[must_use]
    pub fn top_n(&self) -> Option<usize> {
        self.top_n
    }

    /// Returns the configured score floor.
    #[must_use]
    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// Scores every link against `keyword`, keeping matches in rank order.
    ///
    /// The result is not truncated to `top_n`.
    #[must_use]
    pub fn score_links(&self, links: &[Link], keyword: &str) -> Vec<ScoredLink> {
        let keyword = keyword.to_lowercase();
        let mut scored: Vec<ScoredLink> = links
            .iter()
            .filter_map(|link| {
                let score = partial_ratio(&keyword, &link.comparison_text());
                trace!(href = %link.href, score, "scored link");
                (score > 0 && score >= self.min_score).then(|| ScoredLink {
                    score,
                    href: link.href.clone(),
                })
            })
            .collect();

        // `sort_by` is stable, so equal scores keep extraction order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Returns the hrefs matching `keyword`, best match first.
    #[instrument(level = "debug", skip(self, links), fields(candidates = links.len()))]
    #[must_use]
    pub fn rank(&self, links: &[Link], keyword: &str) -> Vec<String> {
        let mut scored = self.score_links(links, keyword);
        if let Some(top_n) = self.top_n {
            scored.truncate(top_n);
        }
        debug!(
            matches = scored.len(),
            best = scored.first().map(|s| s.score),
            "ranked links"
        );
        scored.into_iter().map(|s| s.href).collect()
    }

    /// Ranks `links` against each keyword in turn.
    ///
    /// A keyword supplied more than once keeps the position of its first occurrence.
    #[must_use]
    pub fn rank_keywords<S: AsRef<str>>(&self, links: &[Link], keywords: &[S]) -> KeywordResults {
        let mut results = KeywordResults::with_capacity(keywords.len());
        for keyword in keywords {
            let keyword = keyword.as_ref();
            results.insert(keyword.to_string(), self.rank(links, keyword));
        }
        results
    }
}

/// Returns the hrefs of `links` matching `keyword`, best match first.
///
/// Shorthand for `Matcher::new().with_top_n(top_n).rank(links, keyword)`.
#[must_use]
pub fn rank(links: &[Link], keyword: &str, top_n: Option<usize>) -> Vec<String> {
    Matcher::new().with_top_n(top_n).rank(links, keyword)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_links() -> Vec<Link> {
        vec![
            Link::new(
                "https://files.example.com/Super%20Mario%20Bros%20(USA).zip",
                "Super Mario Bros (USA).zip",
            ),
            Link::new(
                "https://files.example.com/Unrelated%20File.zip",
                "Unrelated File.zip",
            ),
            Link::new(
                "https://files.example.com/Super%20Mario%20World%20(USA).zip",
                "Super Mario World (USA).zip",
            ),
        ]
    }

    #[test]
    fn test_comparison_text_is_lowercased_label_then_href() {
        let link = Link::new("https://EXAMPLE.com/A.zip", "Some Label");
        assert_eq!(link.comparison_text(), "some label https://example.com/a.zip");
    }

    #[test]
    fn test_rank_puts_best_match_first() {
        let ranked = rank(&sample_links(), "Mario", None);
        assert!(!ranked.is_empty());
        assert!(ranked[0].contains("Mario"), "got {ranked:?}");
    }

    #[test]
    fn test_rank_no_overlap_returns_empty() {
        let links = vec![Link::new("http://a.b/c", "abc")];
        assert!(rank(&links, "xyz", None).is_empty());
    }

    #[test]
    fn test_rank_keeps_link_sharing_a_single_char() {
        let links = vec![Link::new("http://q", "Y")];
        assert_eq!(rank(&links, "xy", None), vec!["http://q"]);
        assert_eq!(Matcher::new().score_links(&links, "xy")[0].score, 67);
    }

    #[test]
    fn test_rank_ties_keep_extraction_order() {
        let links = vec![
            Link::new("https://x.test/1", "mario one"),
            Link::new("https://x.test/2", "mario two"),
            Link::new("https://x.test/3", "mario three"),
        ];
        let ranked = rank(&links, "mario", None);
        assert_eq!(
            ranked,
            vec!["https://x.test/1", "https://x.test/2", "https://x.test/3"]
        );
    }

    #[test]
    fn test_rank_echoes_duplicates() {
        let link = Link::new("https://x.test/mario.zip", "mario");
        let ranked = rank(&[link.clone(), link], "mario", None);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], ranked[1]);
    }

    #[test]
    fn test_rank_top_n_is_prefix_of_full_ranking() {
        let links = sample_links();
        let full = rank(&links, "mario", None);
        for k in 0..=full.len() + 1 {
            let limited = rank(&links, "mario", Some(k));
            assert_eq!(limited.len(), k.min(full.len()));
            assert_eq!(limited.as_slice(), &full[..limited.len()]);
        }
    }

    #[test]
    fn test_score_links_sorted_descending() {
        let scored = Matcher::new().score_links(&sample_links(), "mario world");
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(scored[0].href.contains("World"));
    }

    #[test]
    fn test_min_score_filters_weak_matches() {
        let matcher = Matcher::new().with_min_score(70);
        let ranked = matcher.rank(&sample_links(), "zelda");
        assert!(ranked.is_empty(), "got {ranked:?}");
    }

    #[test]
    fn test_min_score_is_capped() {
        assert_eq!(Matcher::new().with_min_score(250).min_score(), MAX_SCORE);
    }

    #[test]
    fn test_rank_keywords_preserves_keyword_order() {
        let results = Matcher::new()
            .with_min_score(70)
            .rank_keywords(&sample_links(), &["zelda", "mario", "zelda"]);
        let keys: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zelda", "mario"]);
        assert!(results["zelda"].is_empty());
        assert_eq!(results["mario"].len(), 2);
    }
}
