// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Pagination forms of a listing or item URL.
///
/// `root` is the URL without pagination or extension, `first_page` is the
/// canonical `root.html` form and `deep_link` is either the original numbered
/// page or `root/1.html` when the input was already canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEnd {
    pub root: String,
    pub first_page: String,
    pub deep_link: String,
}

impl PageEnd {
    /// The three forms in `[root, first_page, deep_link]` order.
    pub fn as_array(&self) -> [&str; 3] {
        [&self.root, &self.first_page, &self.deep_link]
    }
}

/// Split a URL into its pagination forms.
///
/// # Examples
/// ```
/// use pagemirror::utils::url::extract_page_end;
///
/// let page = extract_page_end("https://xchina.co/photos/model-42/3.html");
/// assert_eq!(page.root, "https://xchina.co/photos/model-42");
/// assert_eq!(page.first_page, "https://xchina.co/photos/model-42.html");
/// assert_eq!(page.deep_link, "https://xchina.co/photos/model-42/3.html");
/// ```
pub fn extract_page_end(url: &str) -> PageEnd {
    let slash = url.rfind('/').map(|i| i + 1).unwrap_or(0);
    let last = &url[slash..];
    let stem = match last.rfind('.') {
        Some(dot) => &last[..dot],
        None => last,
    };

    if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
        let root = url[..slash].trim_end_matches('/').to_string();
        return PageEnd {
            first_page: format!("{root}.html"),
            deep_link: url.to_string(),
            root,
        };
    }

    let root = format!("{}{}", &url[..slash], stem);
    PageEnd {
        first_page: format!("{root}.html"),
        deep_link: format!("{root}/1.html"),
        root,
    }
}

/// `scheme://host/` of a URL, used as the downloader's referer.
pub fn referer(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("{}://{}/", parsed.scheme(), host))
}

/// Clean an archive entry: trim whitespace and drop literal `\n` artifacts.
///
/// Returns `None` when nothing is left.
pub fn clean_entry(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace("\\n", "");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Append `key=value` pairs to a URL as a form-encoded query string.
pub fn with_query(url: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return url.to_string();
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", serializer.finish())
}
