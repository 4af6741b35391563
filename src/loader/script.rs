//! Script descriptors: extraction from spliced markup and re-creation of
//! executable elements in the execution region.

use xinclude_types::ScriptKind;

use crate::dom::{Attribute, Document, NodeId};

/// Where a script's code comes from. Exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptBody {
    External(String),
    Inline(String),
}

/// Metadata and content of one embedded script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub body: ScriptBody,
    /// Attributes in source order, without `src`.
    pub attributes: Vec<Attribute>,
    pub kind: ScriptKind,
}

impl ScriptDescriptor {
    pub fn has_external_source(&self) -> bool {
        matches!(self.body, ScriptBody::External(_))
    }

    pub fn source_url(&self) -> Option<&str> {
        match &self.body {
            ScriptBody::External(url) => Some(url),
            ScriptBody::Inline(_) => None,
        }
    }

    pub fn inline_body(&self) -> Option<&str> {
        match &self.body {
            ScriptBody::Inline(code) => Some(code),
            ScriptBody::External(_) => None,
        }
    }

    /// Build a descriptor from a parsed `<script>` element.
    pub fn from_element(document: &Document, element: NodeId) -> Self {
        // An empty src behaves like no src at all
        let src = document
            .attr(element, "src")
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let body = match src {
            Some(url) => ScriptBody::External(url.to_string()),
            None => ScriptBody::Inline(document.text_content(element)),
        };

        let attributes = document
            .attributes(element)
            .iter()
            .filter(|a| !a.name.eq_ignore_ascii_case("src"))
            .cloned()
            .collect();

        Self {
            body,
            attributes,
            kind: ScriptKind::from_type_attr(document.attr(element, "type")),
        }
    }
}

/// Pull every `<script>` below `scope` out of the tree, in document order.
pub fn extract_scripts(document: &mut Document, scope: NodeId) -> Vec<ScriptDescriptor> {
    let elements = document.select_by_tag(scope, "script");
    let descriptors = elements
        .iter()
        .map(|&element| ScriptDescriptor::from_element(document, element))
        .collect();
    for element in elements {
        document.detach(element);
    }
    descriptors
}

/// Node that receives re-created scripts: `<head>`, else `<html>`, else the root.
pub fn execution_region(document: &Document) -> NodeId {
    document
        .head()
        .or_else(|| document.document_element())
        .unwrap_or_else(|| document.root())
}

// Re-created external scripts run in order, so the loading hints are dropped
const ORDERING_ATTRIBUTES: &[&str] = &["async", "defer"];

/// Create a fresh `<script>` element for `descriptor`. The element is detached.
pub fn synthesize(document: &mut Document, descriptor: &ScriptDescriptor) -> NodeId {
    let element = document.create_element("script");
    let external = descriptor.has_external_source();
    if let ScriptBody::External(url) = &descriptor.body {
        document.set_attr(element, "src", url);
    }
    for attr in &descriptor.attributes {
        let ordering = ORDERING_ATTRIBUTES
            .iter()
            .any(|name| attr.name.eq_ignore_ascii_case(name));
        if external && ordering {
            continue;
        }
        document.set_attr(element, &attr.name, &attr.value);
    }
    if let ScriptBody::Inline(code) = &descriptor.body {
        document.set_text_content(element, code);
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(html: &str) -> (Document, NodeId) {
        let mut doc = Document::parse("<html><head></head><body><div id=\"p\"></div></body></html>");
        let point = doc.get_element_by_id("p").unwrap();
        let nodes = doc.parse_fragment(html, "div");
        doc.replace_children(point, &nodes);
        (doc, point)
    }

    #[test]
    fn test_descriptor_invariant() {
        let (mut doc, point) = fragment(
            r#"<script src="/a.js" defer data-k="v"></script><script type="text/javascript">run()</script>"#,
        );
        let scripts = extract_scripts(&mut doc, point);
        assert_eq!(scripts.len(), 2);

        assert!(scripts[0].has_external_source());
        assert_eq!(scripts[0].source_url(), Some("/a.js"));
        assert_eq!(scripts[0].inline_body(), None);
        let names: Vec<&str> = scripts[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["defer", "data-k"]);

        assert!(!scripts[1].has_external_source());
        assert_eq!(scripts[1].source_url(), None);
        assert_eq!(scripts[1].inline_body(), Some("run()"));
        assert_eq!(scripts[1].kind, ScriptKind::Classic);
    }

    #[test]
    fn test_extraction_removes_scripts_in_document_order() {
        let (mut doc, point) =
            fragment("<script>one()</script><div><script>two()</script></div><script>three()</script>");
        let scripts = extract_scripts(&mut doc, point);
        let bodies: Vec<&str> = scripts.iter().filter_map(|s| s.inline_body()).collect();
        assert_eq!(bodies, vec!["one()", "two()", "three()"]);
        assert!(doc.select_by_tag(point, "script").is_empty());
        assert_eq!(doc.inner_html(point), "<div></div>");
    }

    #[test]
    fn test_empty_src_is_inline() {
        let (mut doc, point) = fragment(r#"<script src="  ">x()</script>"#);
        let scripts = extract_scripts(&mut doc, point);
        assert_eq!(scripts[0].inline_body(), Some("x()"));
    }

    #[test]
    fn test_synthesize_external_puts_src_first() {
        let (mut doc, point) = fragment(r#"<script type="text/javascript" src="/a.js" nonce="n"></script>"#);
        let scripts = extract_scripts(&mut doc, point);
        let element = synthesize(&mut doc, &scripts[0]);
        assert_eq!(
            doc.outer_html(element),
            r#"<script src="/a.js" type="text/javascript" nonce="n"></script>"#
        );
    }

    #[test]
    fn test_synthesize_external_is_not_deferred() {
        let (mut doc, point) =
            fragment(r#"<script async src="/a.js" defer nonce="n"></script><script defer>x()</script>"#);
        let scripts = extract_scripts(&mut doc, point);
        let external = synthesize(&mut doc, &scripts[0]);
        assert_eq!(doc.outer_html(external), r#"<script src="/a.js" nonce="n"></script>"#);
        // The descriptor still carries what the fragment said
        let names: Vec<&str> = scripts[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["async", "defer", "nonce"]);

        let inline = synthesize(&mut doc, &scripts[1]);
        assert!(doc.has_attr(inline, "defer"));
    }

    #[test]
    fn test_synthesize_inline_copies_text() {
        let (mut doc, point) = fragment(r#"<script id="s">if (a < b) go();</script>"#);
        let scripts = extract_scripts(&mut doc, point);
        let element = synthesize(&mut doc, &scripts[0]);
        assert_eq!(
            doc.outer_html(element),
            r#"<script id="s">if (a < b) go();</script>"#
        );
    }

    #[test]
    fn test_execution_region_falls_back() {
        let doc = Document::parse("<p>x</p>");
        assert_eq!(Some(execution_region(&doc)), doc.head());
        let bare = Document::new();
        assert_eq!(execution_region(&bare), bare.root());
    }
}
