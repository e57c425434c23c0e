use std::sync::OnceLock;

use regex::Regex;

use crate::platform::DirectMessage;

/// Matches a Tweet permalink: scheme, optional www, fixed domain and a
/// numeric status id path segment.
fn permalink_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://(www\.)?twitter\.com/.*/status/[0-9]+")
            .expect("permalink pattern is valid")
    })
}

/// Extract the Tweet permalinks embedded in a DM, preserving their
/// original order. Pure; never touches the network.
pub fn tweet_links(dm: &DirectMessage) -> Vec<String> {
    dm.links
        .iter()
        .filter(|url| permalink_re().is_match(url))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dm_with_links(links: &[&str]) -> DirectMessage {
        DirectMessage {
            id: "1".to_string(),
            text: "hello".to_string(),
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_entities_yields_empty() {
        assert!(tweet_links(&dm_with_links(&[])).is_empty());
    }

    #[test]
    fn test_matching_links_kept_in_order() {
        let dm = dm_with_links(&[
            "https://twitter.com/acme/status/12345",
            "https://example.com/not-a-tweet",
            "http://www.twitter.com/other/status/999",
        ]);

        assert_eq!(
            tweet_links(&dm),
            vec![
                "https://twitter.com/acme/status/12345".to_string(),
                "http://www.twitter.com/other/status/999".to_string(),
            ]
        );
    }

    #[test]
    fn test_wrong_domain_excluded() {
        let dm = dm_with_links(&["https://twitterx.com/acme/status/12345"]);
        assert!(tweet_links(&dm).is_empty());
    }

    #[test]
    fn test_non_numeric_id_excluded() {
        let dm = dm_with_links(&["https://twitter.com/acme/status/latest"]);
        assert!(tweet_links(&dm).is_empty());
    }

    #[test]
    fn test_query_string_after_id_still_matches() {
        let dm = dm_with_links(&["https://twitter.com/acme/status/12345?s=20"]);
        assert_eq!(tweet_links(&dm).len(), 1);
    }
}
