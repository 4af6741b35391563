//! HTML parsing via `html5ever`, copied into the [`Document`] arena.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, parse_fragment, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::document::{Attribute, Document, ElementData, NodeData, NodeId};

pub(super) const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

impl Document {
    /// Parse a complete HTML document. The tree builder synthesizes missing
    /// `<html>`, `<head>` and `<body>` elements.
    pub fn parse(html: &str) -> Document {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        let mut document = Document::new();
        let root = document.root();
        for child in dom.document.children.borrow().iter() {
            document.import(child, Some(root));
        }
        document
    }

    /// Parse markup as the content of a `context` element, the way assigning
    /// `innerHTML` on such an element would. `<tr>` markup parsed for a
    /// `tbody` keeps its rows; the same markup parsed for a `div` does not.
    ///
    /// The returned top-level nodes are detached; nothing in the live tree
    /// changes until the caller attaches them.
    pub fn parse_fragment(&mut self, html: &str, context: &str) -> Vec<NodeId> {
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(context.to_ascii_lowercase()),
        );
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
            .one(html);

        // The fragment parser roots its output in a synthetic <html> element
        let mut nodes = Vec::new();
        for wrapper in dom.document.children.borrow().iter() {
            for child in wrapper.children.borrow().iter() {
                if let Some(id) = self.import(child, None) {
                    nodes.push(id);
                }
            }
        }
        nodes
    }

    fn import(&mut self, handle: &Handle, parent: Option<NodeId>) -> Option<NodeId> {
        let data = match &handle.data {
            RcNodeData::Document => return None,
            RcNodeData::Doctype {
                name,
                public_id,
                system_id,
            } => NodeData::Doctype {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            },
            RcNodeData::Text { contents } => NodeData::Text(contents.borrow().to_string()),
            RcNodeData::Comment { contents } => NodeData::Comment(contents.to_string()),
            RcNodeData::ProcessingInstruction { target, contents } => {
                NodeData::ProcessingInstruction {
                    target: target.to_string(),
                    data: contents.to_string(),
                }
            }
            RcNodeData::Element { name, attrs, .. } => NodeData::Element(ElementData {
                name: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|a| {
                        let attr_name = match &a.name.prefix {
                            Some(prefix) => format!("{}:{}", prefix, a.name.local),
                            None => a.name.local.to_string(),
                        };
                        Attribute::new(attr_name, a.value.to_string())
                    })
                    .collect(),
            }),
        };

        let id = self.alloc(data);
        if let Some(parent) = parent {
            self.append_child(parent, id);
        }

        // <template> keeps its markup in a separate fragment. It is stored as
        // the element's children, which tree queries skip.
        let template_children = match &handle.data {
            RcNodeData::Element {
                template_contents, ..
            } => template_contents
                .borrow()
                .as_ref()
                .map(|contents| contents.children.borrow().clone()),
            _ => None,
        };
        let children = template_children.unwrap_or_else(|| handle.children.borrow().clone());
        for child in children.iter() {
            self.import(child, Some(id));
        }

        Some(id)
    }
}
