use url::Url;

/// Resolves an image reference to a direct, absolute image URL
///
/// Image optimizer wrappers such as `/_next/image?url=%2Fimages%2Fa.webp&w=96`
/// are unwrapped to the underlying image.
///
/// # Examples
///
/// ```
/// use page_harvest::url::clean_image_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/events/").unwrap();
/// let url = clean_image_url("/_next/image?url=%2Fimages%2Fa.webp&w=96", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/images/a.webp");
/// ```
pub fn clean_image_url(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }

    let resolved = base.join(raw).ok()?;

    if resolved.path().ends_with("/_next/image") {
        let inner = resolved
            .query_pairs()
            .find(|(key, _)| key == "url")
            .map(|(_, value)| value.into_owned())?;
        return base.join(&inner).ok();
    }

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/events/raid/").unwrap()
    }

    #[test]
    fn test_absolute_is_kept() {
        let url = clean_image_url("https://cdn.example.com/a.png", &base()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_relative_is_resolved() {
        let url = clean_image_url("/assets/a.png", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/assets/a.png");
    }

    #[test]
    fn test_optimizer_is_unwrapped() {
        let url = clean_image_url(
            "https://example.com/_next/image?url=%2Fimages%2Fbanner.webp&w=256&q=75",
            &base(),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://example.com/images/banner.webp");
    }

    #[test]
    fn test_rejects_data_and_empty() {
        assert!(clean_image_url("data:image/png;base64,AAAA", &base()).is_none());
        assert!(clean_image_url("  ", &base()).is_none());
        assert!(clean_image_url("/_next/image?w=96", &base()).is_none());
    }
}
