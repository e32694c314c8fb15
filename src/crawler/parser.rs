//! Listing page parser
//!
//! This module extracts the child items of a document center folder. A
//! listing page marks its anchors with one of two classes:
//! - `folder-link` for sub-folders (further listing pages)
//! - `document-link` for downloadable files

use crate::state::{DocumentRef, FolderRef, ItemRef, ItemRole};
use scraper::{Html, Selector};
use url::{Position, Url};

/// Items found on one folder's listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Sub-folders in page order
    pub folders: Vec<FolderRef>,

    /// Documents in page order
    pub documents: Vec<DocumentRef>,
}

/// Extracts the items of one role from a listing page
///
/// Items come back in document order and are not deduplicated. Anchors
/// without an `href`, or whose `href` does not resolve to an HTTP(S) URL,
/// are skipped.
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `role` - Which anchors to select
/// * `page_url` - Absolute URL the page was fetched from, used to resolve links
/// * `parent_url` - URL of the folder the page belongs to
/// * `parent_path` - Path handed to every extracted item
///
/// # Example
///
/// ```
/// use civicweb_harvester::crawler::extract_items;
/// use civicweb_harvester::state::ItemRole;
/// use url::Url;
///
/// let page = Url::parse("https://springfield.civicweb.net/filepro/documents/").unwrap();
/// let html = r#"<a class="folder-link" href="12/"> Agendas </a>"#;
/// let items = extract_items(html, ItemRole::Folder, &page, "/filepro/documents/", &[]);
/// assert_eq!(items[0].name, "Agendas");
/// assert_eq!(items[0].url, "/filepro/documents/12/");
/// ```
pub fn extract_items(
    html: &str,
    role: ItemRole,
    page_url: &Url,
    parent_url: &str,
    parent_path: &[String],
) -> Vec<ItemRef> {
    let document = Html::parse_document(html);
    select_items(&document, role, page_url, parent_url, parent_path)
}

/// Parses a folder's listing page into its sub-folders and documents
///
/// Every item gets the folder's child path and the folder's URL as parent.
pub fn parse_listing(html: &str, folder: &FolderRef, page_url: &Url) -> Listing {
    let document = Html::parse_document(html);
    let child_path = folder.child_path();

    Listing {
        folders: select_items(
            &document,
            ItemRole::Folder,
            page_url,
            &folder.url,
            &child_path,
        ),
        documents: select_items(
            &document,
            ItemRole::Document,
            page_url,
            &folder.url,
            &child_path,
        ),
    }
}

/// Resolves a link found on a page
///
/// Relative links are joined against the page URL. Links on the page's own
/// site come back site-relative (path and query), others absolute. Returns
/// `None` for empty, fragment-only and non-HTTP(S) links.
///
/// # Example
///
/// ```
/// use civicweb_harvester::crawler::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://springfield.civicweb.net/filepro/documents/12/").unwrap();
/// assert_eq!(resolve_link(&page, "../7/").as_deref(), Some("/filepro/documents/7/"));
/// assert_eq!(resolve_link(&page, "mailto:clerk@example.com"), None);
/// ```
pub fn resolve_link(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut joined = page_url.join(href).ok()?;
    if joined.scheme() != "http" && joined.scheme() != "https" {
        return None;
    }
    joined.set_fragment(None);

    if joined.origin() == page_url.origin() {
        Some(joined[Position::BeforePath..].to_string())
    } else {
        Some(joined.to_string())
    }
}

fn select_items(
    document: &Html,
    role: ItemRole,
    page_url: &Url,
    parent_url: &str,
    parent_path: &[String],
) -> Vec<ItemRef> {
    let Ok(selector) = Selector::parse(&format!("a.{}", role.marker_class())) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let Some(href) = element.value().attr("href") else {
                tracing::debug!(
                    "Skipping {} anchor without href under {}",
                    role.marker_class(),
                    parent_url
                );
                return None;
            };

            let Some(url) = resolve_link(page_url, href) else {
                tracing::debug!("Skipping unresolvable link {:?} on {}", href, page_url);
                return None;
            };

            Some(ItemRef {
                name: element.text().collect::<String>().trim().to_string(),
                url,
                parent_path: parent_path.to_vec(),
                parent_url: parent_url.to_string(),
            })
        })
        .collect()
}
