//! Rendered document capability
//!
//! Extraction code only ever sees a [`Document`]: a small query/read interface
//! over a rendered page. Markup-specific selectors are passed in by the caller,
//! so discovery and extraction logic never depend on one catalog's DOM.

use scraper::{ElementRef, Html, Selector};

/// Read-only queries over a rendered page or a fragment of one
pub trait Document {
    /// Trimmed text of the first match; `None` when absent or empty
    fn text(&self, selector: &str) -> Option<String>;

    /// Attribute of the first match; `None` when absent or empty
    fn attr(&self, selector: &str, attr: &str) -> Option<String>;

    /// Non-empty attribute values of every match, in document order
    fn attrs(&self, selector: &str, attr: &str) -> Vec<String>;

    /// Number of elements matching `selector`
    fn count(&self, selector: &str) -> usize;

    /// Attribute on the root element of this fragment
    fn own_attr(&self, attr: &str) -> Option<String>;

    /// Every match of `selector` as its own fragment
    fn each(&self, selector: &str) -> Vec<Box<dyn Document + '_>>;
}

/// Parses a selector, treating invalid CSS as matching nothing
fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("Ignoring invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    non_empty(element.text().collect::<String>().trim().to_string())
}

fn element_attr(element: ElementRef<'_>, attr: &str) -> Option<String> {
    element
        .value()
        .attr(attr)
        .map(|value| value.trim().to_string())
        .and_then(non_empty)
}

/// A full rendered page, parsed with `scraper`
pub struct HtmlDocument {
    url: String,
    html: Html,
}

impl HtmlDocument {
    /// Parses rendered markup captured from `url`
    pub fn parse(url: &str, content: &str) -> Self {
        Self {
            url: url.to_string(),
            html: Html::parse_document(content),
        }
    }

    /// The URL the markup was captured from
    pub fn url(&self) -> &str {
        &self.url
    }

    fn select_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(parsed) => self.html.select(&parsed).collect(),
            None => Vec::new(),
        }
    }
}

impl Document for HtmlDocument {
    fn text(&self, selector: &str) -> Option<String> {
        self.select_all(selector).into_iter().next().and_then(element_text)
    }

    fn attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.select_all(selector)
            .into_iter()
            .next()
            .and_then(|el| element_attr(el, attr))
    }

    fn attrs(&self, selector: &str, attr: &str) -> Vec<String> {
        self.select_all(selector)
            .into_iter()
            .filter_map(|el| element_attr(el, attr))
            .collect()
    }

    fn count(&self, selector: &str) -> usize {
        self.select_all(selector).len()
    }

    fn own_attr(&self, attr: &str) -> Option<String> {
        element_attr(self.html.root_element(), attr)
    }

    fn each(&self, selector: &str) -> Vec<Box<dyn Document + '_>> {
        self.select_all(selector)
            .into_iter()
            .map(|element| Box::new(HtmlFragment { element }) as Box<dyn Document + '_>)
            .collect()
    }
}

/// One element of an [`HtmlDocument`] and its subtree
pub struct HtmlFragment<'a> {
    element: ElementRef<'a>,
}

impl<'a> HtmlFragment<'a> {
    fn select_all(&self, selector: &str) -> Vec<ElementRef<'a>> {
        match parse_selector(selector) {
            Some(parsed) => self.element.select(&parsed).collect(),
            None => Vec::new(),
        }
    }
}

impl Document for HtmlFragment<'_> {
    fn text(&self, selector: &str) -> Option<String> {
        self.select_all(selector).into_iter().next().and_then(element_text)
    }

    fn attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.select_all(selector)
            .into_iter()
            .next()
            .and_then(|el| element_attr(el, attr))
    }

    fn attrs(&self, selector: &str, attr: &str) -> Vec<String> {
        self.select_all(selector)
            .into_iter()
            .filter_map(|el| element_attr(el, attr))
            .collect()
    }

    fn count(&self, selector: &str) -> usize {
        self.select_all(selector).len()
    }

    fn own_attr(&self, attr: &str) -> Option<String> {
        element_attr(self.element, attr)
    }

    fn each(&self, selector: &str) -> Vec<Box<dyn Document + '_>> {
        self.select_all(selector)
            .into_iter()
            .map(|element| Box::new(HtmlFragment { element }) as Box<dyn Document + '_>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <h1 class="name">  Old Vine Red  </h1>
        <span class="empty">   </span>
        <div class="links">
            <a href="/product/1">One</a>
            <a href="">Blank</a>
            <a href="/product/2">Two</a>
        </div>
        <ul>
            <li class="store" data-store-id="17"><span class="qty">4 left</span></li>
            <li class="store" data-store-id="">no id</li>
        </ul>
    </body></html>"#;

    #[test]
    fn test_text_is_trimmed() {
        let doc = HtmlDocument::parse("https://example.com/", PAGE);
        assert_eq!(doc.text(".name"), Some("Old Vine Red".to_string()));
    }

    #[test]
    fn test_blank_text_is_absent() {
        let doc = HtmlDocument::parse("https://example.com/", PAGE);
        assert_eq!(doc.text(".empty"), None);
        assert_eq!(doc.text(".missing"), None);
    }

    #[test]
    fn test_attrs_skip_empty_values() {
        let doc = HtmlDocument::parse("https://example.com/", PAGE);
        assert_eq!(doc.attrs(".links a", "href"), vec!["/product/1", "/product/2"]);
        assert_eq!(doc.count(".links a"), 3);
    }

    #[test]
    fn test_fragments() {
        let doc = HtmlDocument::parse("https://example.com/", PAGE);
        let stores = doc.each("li.store");
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].own_attr("data-store-id"), Some("17".to_string()));
        assert_eq!(stores[0].text(".qty"), Some("4 left".to_string()));
        assert_eq!(stores[1].own_attr("data-store-id"), None);
    }

    #[test]
    fn test_document_own_attr_reads_root_element() {
        let doc = HtmlDocument::parse(
            "https://example.com/",
            r#"<html lang="en" data-store-id="9"><body></body></html>"#,
        );
        assert_eq!(doc.own_attr("lang"), Some("en".to_string()));
        assert_eq!(doc.own_attr("data-store-id"), Some("9".to_string()));
        assert_eq!(doc.own_attr("missing"), None);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = HtmlDocument::parse("https://example.com/", PAGE);
        assert_eq!(doc.count("[[["), 0);
        assert_eq!(doc.text("[[["), None);
    }
}
