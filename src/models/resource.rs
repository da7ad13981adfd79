//! Resource URL classification.
//!
//! Each recognised site has an ordered list of path-prefix rules; the first
//! matching rule decides the resource kind. Longer, more specific prefixes
//! come first so that precedence is visible in the table itself.

use serde::Serialize;

use crate::utils::url::{PageEnd, extract_page_end};

/// Root of the gallery site.
pub const ROOT_XCHINA: &str = "https://xchina.co/";

/// Root of the forum site.
pub const ROOT_XBBS: &str = "https://xbbs.me/";

/// Prefixes that identify a URL as belonging to a model.
const MODEL_URL_PREFIXES: [&str; 3] = [
    "https://xchina.co/model/id-",
    "https://xchina.co/photos/model-",
    "https://xchina.co/videos/model-",
];

/// Recognised source sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Site {
    Xchina,
    Xbbs,
}

impl Site {
    /// Root URL of the site, including the trailing slash.
    pub fn root(self) -> &'static str {
        match self {
            Site::Xchina => ROOT_XCHINA,
            Site::Xbbs => ROOT_XBBS,
        }
    }

    /// Ordered `(path prefix, kind)` rules for this site.
    fn rules(self) -> &'static [(&'static str, ResourceKind)] {
        match self {
            Site::Xchina => &[
                ("photos/", ResourceKind::PhotoCollection),
                ("videos/", ResourceKind::VideoCollection),
                ("model/", ResourceKind::Model),
                ("photo/", ResourceKind::PhotoItem),
                ("video/", ResourceKind::VideoItem),
            ],
            Site::Xbbs => &[
                ("thread/", ResourceKind::Thread),
                ("forum/", ResourceKind::ForumOrUser),
                ("user/", ResourceKind::ForumOrUser),
            ],
        }
    }

    fn from_url(url: &str) -> Option<Self> {
        [Site::Xchina, Site::Xbbs]
            .into_iter()
            .find(|site| url.starts_with(site.root()))
    }
}

/// What a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Model,
    PhotoCollection,
    VideoCollection,
    PhotoItem,
    VideoItem,
    Thread,
    ForumOrUser,
}

impl ResourceKind {
    /// Listings that are paginated and tracked in the lists archive.
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            ResourceKind::PhotoCollection
                | ResourceKind::VideoCollection
                | ResourceKind::ForumOrUser
        )
    }
}

/// A classified resource URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: String,
    pub site: Site,
    pub kind: ResourceKind,
    /// Model id when the URL belongs to a model.
    pub model_id: Option<String>,
    /// Page number of a numbered deep link.
    pub page: Option<u32>,
}

impl Resource {
    /// Pagination forms of this resource's URL.
    pub fn page_end(&self) -> PageEnd {
        extract_page_end(&self.url)
    }

    /// Canonical model URL, if the resource belongs to a model.
    pub fn model_url(&self) -> Option<String> {
        self.model_id.as_deref().map(model_url)
    }
}

/// Classify a URL, returning `None` for anything unsupported.
pub fn classify(url: &str) -> Option<Resource> {
    let site = Site::from_url(url)?;
    let path = &url[site.root().len()..];
    let kind = site
        .rules()
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, kind)| *kind)?;

    let model_id = get_model_id(url);
    if kind == ResourceKind::Model && model_id.is_none() {
        return None;
    }

    Some(Resource {
        url: url.to_string(),
        site,
        kind,
        model_id,
        page: page_number(url),
    })
}

/// Extract the model id from a model URL.
///
/// # Examples
/// ```
/// use pagemirror::models::get_model_id;
///
/// assert_eq!(get_model_id("https://xchina.co/model/id-abc.html"), Some("abc".into()));
/// assert_eq!(get_model_id("https://xchina.co/photos/model-abc/2.html"), Some("abc".into()));
/// assert_eq!(get_model_id("https://xchina.co/photos/kind-1.html"), None);
/// ```
pub fn get_model_id(url: &str) -> Option<String> {
    let rest = MODEL_URL_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))?;

    let id = match rest.find('/') {
        Some(slash) => &rest[..slash],
        None => match rest.rfind(".html") {
            Some(end) => &rest[..end],
            None => rest,
        },
    };

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Canonical URL of a model page.
pub fn model_url(model_id: &str) -> String {
    format!("{ROOT_XCHINA}model/id-{model_id}.html")
}

/// Photo and video listing URLs of a model.
pub fn get_model_pv_urls(model_id: &str) -> (String, String) {
    (
        format!("{ROOT_XCHINA}photos/model-{model_id}.html"),
        format!("{ROOT_XCHINA}videos/model-{model_id}.html"),
    )
}

fn page_number(url: &str) -> Option<u32> {
    let last = url.rsplit('/').next()?;
    let stem = last.split('.').next()?;
    stem.parse().ok()
}
