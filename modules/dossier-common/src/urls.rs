use regex::Regex;
use std::sync::LazyLock;

static TWITTER_PROFILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?(?:twitter|x)\.com/([a-zA-Z0-9_]+)/?$").unwrap()
});
static LINKEDIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/").unwrap());
static GITHUB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/").unwrap());

/// True for bare Twitter/X profile URLs. Tweet and media paths do not count.
pub fn is_twitter_url(url: &str) -> bool {
    TWITTER_PROFILE_RE.is_match(url)
}

/// LinkedIn blocks scraping, so these URLs are filtered before any fetch.
pub fn is_linkedin_url(url: &str) -> bool {
    LINKEDIN_RE.is_match(url)
}

pub fn is_github_url(url: &str) -> bool {
    GITHUB_RE.is_match(url)
}

pub fn extract_twitter_username(url: &str) -> Option<String> {
    TWITTER_PROFILE_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Prepend https:// when the scheme is missing.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Last path segment of a URL, used to pull a username out of a profile link.
pub fn last_path_segment(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twitter_profile_urls() {
        assert!(is_twitter_url("https://twitter.com/alice"));
        assert!(is_twitter_url("https://www.x.com/bob_99/"));
        assert!(is_twitter_url("twitter.com/alice"));
        assert!(!is_twitter_url("https://twitter.com/alice/status/123"));
        assert!(!is_twitter_url("https://example.com/twitter.com/alice"));
    }

    #[test]
    fn test_extract_twitter_username() {
        assert_eq!(
            extract_twitter_username("https://x.com/bob_99/"),
            Some("bob_99".to_string())
        );
        assert_eq!(extract_twitter_username("https://example.com/page"), None);
    }

    #[test]
    fn test_linkedin_and_github_urls() {
        assert!(is_linkedin_url("https://www.linkedin.com/in/alice"));
        assert!(is_linkedin_url("LINKEDIN.COM/in/alice"));
        assert!(!is_linkedin_url("https://example.com/about"));
        assert!(is_github_url("https://github.com/alice/repo"));
        assert!(!is_github_url("https://gitlab.com/alice"));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("https://github.com/octocat/"),
            Some("octocat".to_string())
        );
        assert_eq!(
            last_path_segment("octocat"),
            Some("octocat".to_string())
        );
        assert_eq!(last_path_segment(""), None);
    }
}
