//! Printable content
//!
//! The orchestrator only ever reads the caller's node: it takes a deep copy
//! and serializes the copy's inner markup into the staged document.

use crate::error::PrintError;

/// A DOM-like node that can be copied and serialized for printing
pub trait ContentNode {
    /// Deep copy of the subtree. The original must not be mutated.
    fn deep_clone(&self) -> Result<Self, PrintError>
    where
        Self: Sized;

    /// Markup of the node's children
    fn inner_html(&self) -> String;
}

/// Anything that may resolve to a content node, passed by value: a node
/// reference (`&node`), an optional node, or a [`NodeRef`] container
/// (`&slot`).
pub trait ContentSource<N> {
    fn resolve(&self) -> Option<&N>;
}

impl<N: ContentNode> ContentSource<N> for &N {
    fn resolve(&self) -> Option<&N> {
        Some(*self)
    }
}

impl<N: ContentNode> ContentSource<N> for Option<N> {
    fn resolve(&self) -> Option<&N> {
        self.as_ref()
    }
}

impl<N: ContentNode> ContentSource<N> for Option<&N> {
    fn resolve(&self) -> Option<&N> {
        *self
    }
}

/// Host-ref style slot holding the node currently rendered for printing
#[derive(Debug, Clone)]
pub struct NodeRef<N> {
    current: Option<N>,
}

impl<N> NodeRef<N> {
    /// Empty slot (nothing rendered yet)
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Slot already holding a node
    pub fn attached(node: N) -> Self {
        Self {
            current: Some(node),
        }
    }

    pub fn set(&mut self, node: N) {
        self.current = Some(node);
    }

    /// Detach the node, leaving the slot empty
    pub fn take(&mut self) -> Option<N> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&N> {
        self.current.as_ref()
    }
}

impl<N> Default for NodeRef<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ContentNode> ContentSource<N> for NodeRef<N> {
    fn resolve(&self) -> Option<&N> {
        self.current()
    }
}

impl<N: ContentNode> ContentSource<N> for &NodeRef<N> {
    fn resolve(&self) -> Option<&N> {
        self.current()
    }
}

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Child of an [`HtmlElement`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlChild {
    Element(HtmlElement),
    Text(String),
}

/// Owned element tree usable as print content outside a browser
///
/// ```ignore
/// let receipt = HtmlElement::new("div")
///     .attr("class", "thermal-content")
///     .child(HtmlElement::new("h1").text("Mesa 12"))
///     .child(HtmlElement::new("p").text("Total: 24,00 €"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<HtmlChild>,
}

impl HtmlElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an existing value of the same name
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn child(mut self, element: HtmlElement) -> Self {
        self.children.push(HtmlChild::Element(element));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(HtmlChild::Text(text.to_string()));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[HtmlChild] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<HtmlChild> {
        &mut self.children
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    /// Markup of the element itself, including its children
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_outer(&mut out);
        out
    }

    fn write_outer(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(value, true, out);
            out.push('"');
        }
        out.push('>');

        if self.is_void() {
            return;
        }

        self.write_inner(out);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    fn write_inner(&self, out: &mut String) {
        for child in &self.children {
            match child {
                HtmlChild::Element(el) => el.write_outer(out),
                HtmlChild::Text(text) => escape_into(text, false, out),
            }
        }
    }
}

impl ContentNode for HtmlElement {
    fn deep_clone(&self) -> Result<Self, PrintError> {
        Ok(self.clone())
    }

    fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_inner(&mut out);
        out
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> HtmlElement {
        HtmlElement::new("div")
            .attr("class", "thermal-content")
            .child(HtmlElement::new("h1").text("Mesa 12"))
            .child(HtmlElement::new("br"))
            .child(HtmlElement::new("p").attr("class", "no-print").text("Draft"))
    }

    #[test]
    fn test_inner_html() {
        assert_eq!(
            receipt().inner_html(),
            "<h1>Mesa 12</h1><br><p class=\"no-print\">Draft</p>"
        );
    }

    #[test]
    fn test_outer_html_wraps_inner() {
        let html = receipt().outer_html();
        assert!(html.starts_with("<div class=\"thermal-content\">"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_escaping() {
        let el = HtmlElement::new("p")
            .attr("title", "a \"quoted\" <b>")
            .text("1 < 2 & 3 > 2");
        assert_eq!(
            el.outer_html(),
            "<p title=\"a &quot;quoted&quot; &lt;b&gt;\">1 &lt; 2 &amp; 3 &gt; 2</p>"
        );
    }

    #[test]
    fn test_attr_replaces_existing() {
        let el = HtmlElement::new("td").attr("class", "a").attr("class", "b");
        assert_eq!(el.attribute("class"), Some("b"));
        assert_eq!(el.outer_html(), "<td class=\"b\"></td>");
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let original = receipt();
        let mut copy = original.deep_clone().unwrap();
        copy.children_mut().clear();

        assert_eq!(original.children().len(), 3);
        assert!(copy.children().is_empty());
    }

    fn resolves<S: ContentSource<HtmlElement>>(source: S) -> Option<String> {
        source.resolve().map(|n| n.tag().to_string())
    }

    #[test]
    fn test_sources_resolve() {
        let node = receipt();
        assert_eq!(resolves(&node).as_deref(), Some("div"));
        assert_eq!(resolves(Some(&node)).as_deref(), Some("div"));
        assert_eq!(resolves(Some(node.clone())).as_deref(), Some("div"));
        assert!(resolves(None::<HtmlElement>).is_none());

        let mut slot = NodeRef::<HtmlElement>::new();
        assert!(resolves(&slot).is_none());
        slot.set(node);
        assert_eq!(resolves(&slot).as_deref(), Some("div"));
        assert!(slot.take().is_some());
        assert!(slot.current().is_none());
        assert!(resolves(slot).is_none());
    }
}
