//! HTML serialization of the [`Document`] arena through `html5ever`'s
//! serializer, which owns escaping, void elements and raw-text elements.

use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};

use super::document::{Document, NodeData, NodeId};
use super::parse::HTML_NAMESPACE;

fn element_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(name))
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// One arena node viewed through html5ever's [`Serialize`] trait.
struct SerializableNode<'a> {
    document: &'a Document,
    id: NodeId,
}

impl SerializableNode<'_> {
    fn child(&self, id: NodeId) -> Self {
        Self {
            document: self.document,
            id,
        }
    }

    fn serialize_children<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
        for &child in self.document.children(self.id) {
            self.child(child)
                .serialize(serializer, TraversalScope::IncludeNode)?;
        }
        Ok(())
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        if let TraversalScope::ChildrenOnly(_) = traversal_scope {
            return self.serialize_children(serializer);
        }

        match self.document.data(self.id) {
            NodeData::Document => self.serialize_children(serializer),
            NodeData::Doctype { name, .. } => serializer.write_doctype(name),
            NodeData::Text(text) => serializer.write_text(text),
            NodeData::Comment(text) => serializer.write_comment(text),
            NodeData::ProcessingInstruction { target, data } => {
                serializer.write_processing_instruction(target, data)
            }
            NodeData::Element(element) => {
                let name = element_name(&element.name);
                let attrs: Vec<(QualName, &str)> = element
                    .attrs
                    .iter()
                    .map(|a| (attribute_name(&a.name), a.value.as_str()))
                    .collect();
                serializer.start_elem(name.clone(), attrs.iter().map(|(n, v)| (n, *v)))?;
                self.serialize_children(serializer)?;
                serializer.end_elem(name)
            }
        }
    }
}

impl Document {
    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.render(self.root(), TraversalScope::ChildrenOnly(None))
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        // The parent name decides whether text is escaped
        let parent = self.tag_name(id).map(element_name);
        self.render(id, TraversalScope::ChildrenOnly(parent))
    }

    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        self.render(id, TraversalScope::IncludeNode)
    }

    fn render(&self, id: NodeId, traversal_scope: TraversalScope) -> String {
        let node = SerializableNode { document: self, id };
        let opts = SerializeOpts {
            traversal_scope,
            ..SerializeOpts::default()
        };
        let mut out = Vec::new();
        if let Err(error) = serialize(&mut out, &node, opts) {
            tracing::error!(node = %id, error = %error, "HTML serialization failed");
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}
