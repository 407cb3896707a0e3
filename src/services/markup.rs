//! Read-only markup tree queries.
//!
//! Extractors only need three things from a parsed page: find elements by
//! tag name, read their text, and read an attribute. `MarkupNode` is that
//! capability; `HtmlDocument`/`HtmlNode` provide it on top of `scraper`.

use scraper::{ElementRef, Html, Selector};

use crate::utils::normalize_whitespace;

/// A queryable element of a parsed document.
pub trait MarkupNode: Sized {
    /// All descendant elements whose tag is one of `tags`, in document order.
    fn find_all(&self, tags: &[&str]) -> Vec<Self>;

    /// Visible text: trimmed text segments joined by one space.
    fn text(&self) -> String;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// First descendant element whose tag is one of `tags`.
    fn find_first(&self, tags: &[&str]) -> Option<Self> {
        self.find_all(tags).into_iter().next()
    }
}

/// A parsed HTML page.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// The document's root element.
    pub fn root(&self) -> HtmlNode<'_> {
        HtmlNode(self.html.root_element())
    }
}

/// An element of an `HtmlDocument`.
#[derive(Clone, Copy)]
pub struct HtmlNode<'a>(ElementRef<'a>);

impl<'a> MarkupNode for HtmlNode<'a> {
    fn find_all(&self, tags: &[&str]) -> Vec<Self> {
        let Ok(selector) = Selector::parse(&tags.join(", ")) else {
            log::debug!("Unusable tag list {:?}", tags);
            return Vec::new();
        };
        self.0
            .select(&selector)
            .filter(|el| el.id() != self.0.id())
            .map(HtmlNode)
            .collect()
    }

    fn text(&self) -> String {
        let joined = self
            .0
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        normalize_whitespace(&joined)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.0.value().attr(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_in_document_order() {
        let doc = HtmlDocument::parse(
            r#"<div><a href="/one">One</a><p><a href="/two">Two</a></p></div>"#,
        );
        let links = doc.root().find_all(&["a"]);
        let hrefs: Vec<_> = links.iter().filter_map(|a| a.attr("href")).collect();
        assert_eq!(hrefs, vec!["/one", "/two"]);
    }

    #[test]
    fn test_text_joins_segments() {
        let doc = HtmlDocument::parse("<a> 1 <span>Alpha\n  App</span><b>View</b></a>");
        let link = doc.root().find_first(&["a"]).unwrap();
        assert_eq!(link.text(), "1 Alpha App View");
    }

    #[test]
    fn test_find_all_multiple_tags() {
        let doc = HtmlDocument::parse("<table><tr><th>Date</th><td>1</td></tr></table>");
        let row = doc.root().find_first(&["tr"]).unwrap();
        let cells: Vec<_> = row.find_all(&["td", "th"]).iter().map(|c| c.text()).collect();
        assert_eq!(cells, vec!["Date", "1"]);
    }

    #[test]
    fn test_missing_attr() {
        let doc = HtmlDocument::parse("<a>No link</a>");
        assert!(doc.root().find_first(&["a"]).unwrap().attr("href").is_none());
    }
}
