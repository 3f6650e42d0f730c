use url::{Host, Url};

/// Prefix ignored when grouping hosts
const WWW_PREFIX: &str = "www.";

/// Extracts the coarse site group of a URL's host
///
/// The group is the last two labels of the lowercase host after stripping a
/// leading `www.`. IP addresses form their own group. This does not consult a
/// public-suffix list: `a.example.co.uk` and `b.other.co.uk` share the group
/// `co.uk`.
///
/// # Arguments
///
/// * `url` - The URL to extract the group from
///
/// # Returns
///
/// * `Some(String)` - The host group
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use kgs_crawl::url::host_group;
///
/// let url = Url::parse("https://www.blog.example.com/post").unwrap();
/// assert_eq!(host_group(&url), Some("example.com".to_string()));
/// ```
pub fn host_group(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            let domain = domain.strip_prefix(WWW_PREFIX).unwrap_or(&domain);
            let mut labels: Vec<&str> = domain
                .trim_end_matches('.')
                .rsplit('.')
                .take(2)
                .collect();
            labels.reverse();
            Some(labels.join("."))
        }
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

/// Returns true if both URLs belong to the same host group
///
/// A URL without a host never matches anything, so following a link to it
/// counts as a hop.
pub fn same_host_group(a: &Url, b: &Url) -> bool {
    match (host_group(a), host_group(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(s: &str) -> Option<String> {
        host_group(&Url::parse(s).unwrap())
    }

    fn same(a: &str, b: &str) -> bool {
        same_host_group(&Url::parse(a).unwrap(), &Url::parse(b).unwrap())
    }

    #[test]
    fn test_simple_domain() {
        assert_eq!(group("http://example.com/"), Some("example.com".to_string()));
    }

    #[test]
    fn test_www_is_stripped() {
        assert_eq!(group("http://www.example.com/"), Some("example.com".to_string()));
    }

    #[test]
    fn test_subdomains_collapse() {
        assert_eq!(
            group("https://api.v2.example.com/x"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_single_label_host() {
        assert_eq!(group("http://localhost:8080/"), Some("localhost".to_string()));
    }

    #[test]
    fn test_ip_host_is_its_own_group() {
        assert_eq!(group("http://127.0.0.1:9000/"), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_no_host() {
        assert_eq!(group("mailto:someone@example.com"), None);
    }

    #[test]
    fn test_same_site() {
        assert!(same("http://example.com/a", "https://www.example.com/b"));
        assert!(same("http://blog.example.com/", "http://shop.example.com/"));
        assert!(same("http://127.0.0.1:1000/", "http://127.0.0.1:2000/"));
    }

    #[test]
    fn test_different_site() {
        assert!(!same("http://example.com/", "http://other.com/"));
        assert!(!same("http://example.com/", "http://example.org/"));
        assert!(!same("http://example.com/", "mailto:a@example.com"));
    }

    #[test]
    fn test_multi_level_suffix_is_coarse() {
        // Two unrelated sites under a two-label public suffix share a group
        assert!(same("http://a.example.co.uk/", "http://b.other.co.uk/"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(same("http://EXAMPLE.com/", "http://example.COM/"));
    }
}
