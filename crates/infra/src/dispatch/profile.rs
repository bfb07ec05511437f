//! Request shaping: URLs, referrers, and browser headers

use chaff_core::random::{self, RandomSource};
use chaff_domain::SearchEngine;
use url::Url;

/// News-site referrers, used for a slice of the referrer mix.
const NEWS_REFERRERS: &[&str] = &[
    "https://news.google.com/",
    "https://www.bbc.com/news",
    "https://www.cnn.com/",
    "https://www.nytimes.com/",
    "https://www.theguardian.com/",
];

/// Social-media referrers for the remaining slice.
const SOCIAL_REFERRERS: &[&str] = &[
    "https://twitter.com/",
    "https://www.reddit.com/",
    "https://www.facebook.com/",
    "https://www.linkedin.com/",
];

/// Domains whose presence in a referrer marks it as same-origin traffic.
const ENGINE_DOMAINS: &[&str] = &["google.com", "bing.com", "duckduckgo.com"];

/// Plausible content hosts for simulated result clicks.
const RESULT_DOMAINS: &[&str] = &[
    "wikipedia.org",
    "reddit.com",
    "youtube.com",
    "amazon.com",
    "stackoverflow.com",
    "medium.com",
    "github.com",
    "nytimes.com",
    "bbc.com",
    "cnn.com",
];

pub(crate) fn homepage(engine: SearchEngine) -> &'static str {
    match engine {
        SearchEngine::Google => "https://www.google.com",
        SearchEngine::Bing => "https://www.bing.com",
        SearchEngine::Duckduckgo => "https://duckduckgo.com",
    }
}

/// Engine-specific query URL with the query percent-encoded.
pub(crate) fn search_url(engine: SearchEngine, query: &str) -> String {
    let encoded = urlencoding::encode(query);
    match engine {
        SearchEngine::Google => format!("https://www.google.com/search?q={encoded}"),
        SearchEngine::Bing => format!("https://www.bing.com/search?q={encoded}"),
        SearchEngine::Duckduckgo => format!("https://duckduckgo.com/?q={encoded}"),
    }
}

/// Sample a referrer the way organic searches arrive: mostly direct
/// navigation, often a previous search, occasionally an outside site.
pub(crate) fn referrer(rng: &mut dyn RandomSource, engine: SearchEngine) -> String {
    let rand = rng.next_f64();
    if rand < 0.60 {
        homepage(engine).to_string()
    } else if rand < 0.85 {
        format!("{}/search?q=previous+query", homepage(engine))
    } else if rand < 0.95 {
        (*random::pick(rng, NEWS_REFERRERS)).to_string()
    } else {
        (*random::pick(rng, SOCIAL_REFERRERS)).to_string()
    }
}

/// `Sec-Fetch-Site` value implied by the referrer.
pub(crate) fn sec_fetch_site(referrer: Option<&str>) -> &'static str {
    let Some(referrer) = referrer else {
        return "none";
    };

    match Url::parse(referrer).ok().and_then(|url| url.host_str().map(str::to_string)) {
        Some(host) => {
            if ENGINE_DOMAINS.iter().any(|domain| host.contains(domain)) {
                "same-origin"
            } else {
                "cross-site"
            }
        }
        None => "none",
    }
}

/// The fixed navigation header set, plus referrer-derived fields.
pub(crate) fn navigation_headers(referrer: Option<&str>) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language", "en-US,en;q=0.5".to_string()),
        ("Accept-Encoding", "gzip, deflate, br".to_string()),
        ("DNT", "1".to_string()),
        ("Connection", "keep-alive".to_string()),
        ("Upgrade-Insecure-Requests", "1".to_string()),
        ("Sec-Fetch-Dest", "document".to_string()),
        ("Sec-Fetch-Mode", "navigate".to_string()),
        ("Sec-Fetch-Site", sec_fetch_site(referrer).to_string()),
        ("Sec-Fetch-User", "?1".to_string()),
        ("Cache-Control", "max-age=0".to_string()),
    ];

    if let Some(referrer) = referrer {
        headers.push(("Referer", referrer.to_string()));
    }

    headers
}

/// Plausible destination for a simulated result click.
///
/// `position` is the sampled rank; it is accepted for parity with the click
/// model but does not shape the URL.
pub(crate) fn mock_result_url(rng: &mut dyn RandomSource, query: &str, _position: u32) -> String {
    let domain = random::pick(rng, RESULT_DOMAINS);
    let slug: String = query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(chaff_domain::constants::RESULT_SLUG_MAX_LEN)
        .collect();
    format!("https://www.{domain}/{slug}")
}

/// Rank draw for result clicks, heavily favoring the top of the page.
pub(crate) fn result_position(rng: &mut dyn RandomSource) -> u32 {
    let rand = rng.next_f64();
    if rand < 0.50 {
        1
    } else if rand < 0.70 {
        2
    } else if rand < 0.82 {
        3
    } else if rand < 0.90 {
        4
    } else if rand < 0.95 {
        5
    } else {
        // Remaining 5% split uniformly across ranks 6-10.
        random::pick_index(rng, 5) as u32 + 6
    }
}

#[cfg(test)]
mod tests {
    use chaff_core::random::SequenceSource;

    use super::*;

    #[test]
    fn search_urls_percent_encode_queries() {
        assert_eq!(
            search_url(SearchEngine::Google, "best pizza near me"),
            "https://www.google.com/search?q=best%20pizza%20near%20me"
        );
        assert_eq!(
            search_url(SearchEngine::Duckduckgo, "a&b"),
            "https://duckduckgo.com/?q=a%26b"
        );
        assert!(search_url(SearchEngine::Bing, "x").starts_with("https://www.bing.com/search?q="));
    }

    #[test]
    fn referrer_mix_follows_cumulative_weights() {
        let mut rng = SequenceSource::new(vec![0.1]);
        assert_eq!(referrer(&mut rng, SearchEngine::Google), "https://www.google.com");

        let mut rng = SequenceSource::new(vec![0.7]);
        assert_eq!(
            referrer(&mut rng, SearchEngine::Bing),
            "https://www.bing.com/search?q=previous+query"
        );

        let mut rng = SequenceSource::new(vec![0.90, 0.0]);
        assert_eq!(referrer(&mut rng, SearchEngine::Google), NEWS_REFERRERS[0]);

        let mut rng = SequenceSource::new(vec![0.99, 0.0]);
        assert_eq!(referrer(&mut rng, SearchEngine::Google), SOCIAL_REFERRERS[0]);
    }

    #[test]
    fn sec_fetch_site_tracks_referrer_host() {
        assert_eq!(sec_fetch_site(None), "none");
        assert_eq!(sec_fetch_site(Some("https://www.google.com")), "same-origin");
        assert_eq!(sec_fetch_site(Some("https://duckduckgo.com/?q=x")), "same-origin");
        assert_eq!(sec_fetch_site(Some("https://www.cnn.com/")), "cross-site");
        assert_eq!(sec_fetch_site(Some("not a url")), "none");
    }

    #[test]
    fn referer_header_present_only_with_referrer() {
        let with = navigation_headers(Some("https://www.google.com"));
        assert!(with.iter().any(|(name, _)| *name == "Referer"));

        let without = navigation_headers(None);
        assert!(!without.iter().any(|(name, _)| *name == "Referer"));
        assert!(without
            .iter()
            .any(|(name, value)| *name == "Sec-Fetch-Site" && value == "none"));
    }

    #[test]
    fn result_position_covers_all_ranks() {
        let mut rng = SequenceSource::new(vec![0.49]);
        assert_eq!(result_position(&mut rng), 1);
        let mut rng = SequenceSource::new(vec![0.69]);
        assert_eq!(result_position(&mut rng), 2);
        let mut rng = SequenceSource::new(vec![0.81]);
        assert_eq!(result_position(&mut rng), 3);
        let mut rng = SequenceSource::new(vec![0.89]);
        assert_eq!(result_position(&mut rng), 4);
        let mut rng = SequenceSource::new(vec![0.94]);
        assert_eq!(result_position(&mut rng), 5);
        let mut rng = SequenceSource::new(vec![0.96, 0.99]);
        let tail = result_position(&mut rng);
        assert!((6..=10).contains(&tail));
    }

    #[test]
    fn mock_result_urls_slugify_and_truncate() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let url = mock_result_url(&mut rng, "Best Pizza NEAR me", 1);
        assert_eq!(url, "https://www.wikipedia.org/best-pizza-near-me");

        let mut rng = SequenceSource::new(vec![0.0]);
        let long_query = "word ".repeat(30);
        let url = mock_result_url(&mut rng, &long_query, 3);
        let slug = url.rsplit('/').next().expect("slug");
        assert_eq!(slug.chars().count(), 50);
    }
}
