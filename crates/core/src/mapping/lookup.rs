//! Containing-page lookups.
//!
//! The content system knows which renderable page encloses a changed node.
//! [`PageLookup`] abstracts that capability; the daemon uses
//! [`FixedPageLookup`] when an event names its page and falls back to
//! [`JcrPageLookup`], which derives the page from the path shape.

/// Resolve the nearest enclosing page of a repository path.
pub trait PageLookup: Send + Sync {
    /// Return the page path, or `None` when no enclosing page exists.
    fn containing_page(&self, path: &str) -> Option<String>;
}

impl<F> PageLookup for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn containing_page(&self, path: &str) -> Option<String> {
        self(path)
    }
}

/// Always answers with a page supplied up front.
#[derive(Debug, Clone)]
pub struct FixedPageLookup {
    page: String,
}

impl FixedPageLookup {
    pub fn new(page: impl Into<String>) -> Self {
        Self { page: page.into() }
    }
}

impl PageLookup for FixedPageLookup {
    fn containing_page(&self, _path: &str) -> Option<String> {
        if self.page.is_empty() {
            None
        } else {
            Some(self.page.clone())
        }
    }
}

/// Derives the page from a JCR-style path.
///
/// - everything from the first `/jcr:content` segment on is dropped;
/// - selectors and extension are stripped from the last segment
///   (`about.print.html` -> `about`);
/// - the result must still lie under `content_root`.
#[derive(Debug, Clone)]
pub struct JcrPageLookup {
    content_root: String,
}

impl JcrPageLookup {
    pub fn new(content_root: impl Into<String>) -> Self {
        Self {
            content_root: content_root.into().trim_end_matches('/').to_string(),
        }
    }
}

impl PageLookup for JcrPageLookup {
    fn containing_page(&self, path: &str) -> Option<String> {
        let page = match path.find("/jcr:content") {
            Some(idx) => &path[..idx],
            None => path,
        };
        let page = page.trim_end_matches('/');

        let (parent, last) = match page.rfind('/') {
            Some(idx) => (&page[..idx], &page[idx + 1..]),
            None => return None,
        };
        let name = last.split('.').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        let page = format!("{}/{}", parent, name);

        let under_root = page
            .strip_prefix(&self.content_root)
            .is_some_and(|rest| rest.starts_with('/'));
        if under_root {
            Some(page)
        } else {
            None
        }
    }
}
