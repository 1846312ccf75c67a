//! Ranking scenarios over links extracted from a directory-listing page.

use linkdl_core::matcher::{Link, Matcher, rank};
use linkdl_core::page::extract_links;
use url::Url;

const LISTING: &str = r#"<html><body><table>
<tr><td><a href="../">Parent directory/</a></td></tr>
<tr><td><a href="Super%20Mario%20Bros%20(USA).zip">Super Mario Bros (USA).zip</a></td></tr>
<tr><td><a href="Unrelated%20File.zip">Unrelated File.zip</a></td></tr>
<tr><td><a href="Super%20Mario%20World%20(USA).zip">Super Mario World (USA).zip</a></td></tr>
<tr><td><a href="Tetris%20(World).zip">Tetris (World).zip</a></td></tr>
</table></body></html>"#;

fn listing_links() -> Vec<Link> {
    let base = Url::parse("https://dl.test/roms/nintendo/").unwrap();
    extract_links(LISTING, &base)
}

#[test]
fn test_mario_ranks_mario_links_first_and_zelda_finds_nothing() {
    let links = listing_links();
    let keywords = ["mario", "zelda"];

    let results = Matcher::new()
        .with_min_score(70)
        .rank_keywords(&links, &keywords);

    let keys: Vec<&str> = results.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["mario", "zelda"]);

    let mario = &results["mario"];
    assert_eq!(mario.len(), 2);
    assert!(mario[0].contains("Super%20Mario%20Bros"));
    assert!(mario[1].contains("Super%20Mario%20World"));
    assert!(results["zelda"].is_empty());
}

#[test]
fn test_mario_link_scores_above_zero_with_default_floor() {
    let links = listing_links();
    let scored = Matcher::new().score_links(&links, "Mario");
    assert!(scored[0].score > 0);
    assert!(scored[0].href.contains("Mario"));
    assert_eq!(scored[0].score, 100);
}

#[test]
fn test_rank_output_is_subset_of_input_hrefs() {
    let links = listing_links();
    let hrefs: Vec<&str> = links.iter().map(|l| l.href.as_str()).collect();

    for keyword in ["mario", "tetris", "usa", "zip", "qqqq"] {
        for href in rank(&links, keyword, None) {
            assert!(hrefs.contains(&href.as_str()), "{keyword}: {href}");
        }
    }
}

#[test]
fn test_top_n_is_prefix_of_unbounded_ranking() {
    let links = listing_links();
    let full = rank(&links, "usa", None);
    for k in 0..=full.len() + 2 {
        let top = rank(&links, "usa", Some(k));
        assert_eq!(top.len(), k.min(full.len()));
        assert_eq!(top, full[..top.len()]);
    }
}

#[test]
fn test_keyword_with_no_shared_characters_matches_nothing() {
    let links = vec![Link::new("https://a.test/abc", "abc")];
    assert!(rank(&links, "xyz", None).is_empty());
}
