use sha2::{Digest, Sha256};
use url::Url;

/// Hex digits of the URL hash appended to snapshot names
const SNAPSHOT_HASH_LEN: usize = 12;

/// Derives a snapshot slug from the last non-empty path segment of a URL
///
/// Falls back to the host for root URLs. The result only contains
/// lowercase ASCII alphanumerics, `-`, `_` and `.`.
///
/// # Examples
///
/// ```
/// use page_harvest::url::slug_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/events/community-day/").unwrap();
/// assert_eq!(slug_from_url(&url), "community-day");
/// ```
pub fn slug_from_url(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_default();

    let slug = sanitize(&last);
    if slug.is_empty() {
        "index".to_string()
    } else {
        slug
    }
}

/// Derives a unique file stem for a URL's snapshot
///
/// The readable slug is followed by a short SHA-256 of the full URL, so
/// `/x/a/` and `/y/a/` never share a file.
///
/// ```
/// use page_harvest::url::snapshot_name;
/// use url::Url;
///
/// let x = Url::parse("https://example.com/x/a/").unwrap();
/// let y = Url::parse("https://example.com/y/a/").unwrap();
/// assert!(snapshot_name(&x).starts_with("a-"));
/// assert_ne!(snapshot_name(&x), snapshot_name(&y));
/// ```
pub fn snapshot_name(url: &Url) -> String {
    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    format!("{}-{}", slug_from_url(url), &digest[..SNAPSHOT_HASH_LEN])
}

/// Derives a relative cache path (without extension) for a URL
///
/// Unlike [`slug_from_url`] the whole path and query take part, so two
/// targets on the same host never collide.
pub fn cache_key(url: &Url) -> String {
    let host = sanitize(url.host_str().unwrap_or("local"));

    let mut parts: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(sanitize)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        parts.push(sanitize(query));
    }

    if parts.is_empty() {
        format!("{}/index", host)
    } else {
        format!("{}/{}", host, parts.join("_"))
    }
}

fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_dash = false;

    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_matches(|c| c == '-' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_slug_uses_last_segment() {
        assert_eq!(
            slug_from_url(&url("https://leekduck.com/events/spotlight-hour/")),
            "spotlight-hour"
        );
        assert_eq!(slug_from_url(&url("https://example.com/a/b")), "b");
    }

    #[test]
    fn test_slug_root_falls_back_to_host() {
        assert_eq!(slug_from_url(&url("https://example.com/")), "example.com");
    }

    #[test]
    fn test_slug_sanitizes() {
        assert_eq!(
            slug_from_url(&url("https://example.com/Pok%C3%A9mon%20Day")),
            "pok-c3-a9mon-20day"
        );
    }

    #[test]
    fn test_snapshot_name_is_unique_per_url() {
        let x = snapshot_name(&url("https://example.com/x/a/"));
        let y = snapshot_name(&url("https://example.com/y/a/"));

        assert_ne!(x, y);
        assert!(x.starts_with("a-") && y.starts_with("a-"));
        assert_eq!(x.len(), "a-".len() + SNAPSHOT_HASH_LEN);
        assert_eq!(x, snapshot_name(&url("https://example.com/x/a/")));
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            cache_key(&url("https://example.com/events/")),
            "example.com/events"
        );
        assert_eq!(
            cache_key(&url("https://example.com/a/b?page=2")),
            "example.com/a_b_page-2"
        );
        assert_eq!(cache_key(&url("https://example.com")), "example.com/index");
    }
}
