//! The decoded XML tree: a fully owned arena, not a borrowed DOM.
//!
//! Grounded on the teacher crate's `model/xml.rs` (`XmlElementBuilder`,
//! `XmlModel`) for the shape of the node set, but re-based onto a flat
//! `Vec<Node>` arena addressed by [`NodeId`] rather than `Rc`/lifetime-tied
//! borrows: per §5, the tree must outlive the chunk buffer it was decoded
//! from, so every string and byte run is copied out at build time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Element {
        name: String,
        attributes: Vec<Attribute>,
        children: Vec<NodeId>,
    },
    Text(String),
    CData(String),
    ProcessingInstruction { target: String, data: String },
    EntityRef(String),
    CharRef(u16),
}

#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    pub(crate) name: String,
    pub(crate) value: String,
}

/// An owned binary-XML document: a node arena plus the id of its root
/// element. Built once by [`crate::binxml::decoder::decode_fragment`] and
/// never mutated afterward.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub(crate) fn new() -> Self {
        Tree {
            nodes: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let Node::Element { children, .. } = self.node_mut(parent) {
            children.push(child);
        }
    }

    /// First direct child element named `name`, if any.
    pub(crate) fn child_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let Node::Element { children, .. } = self.node(parent) else {
            return None;
        };
        children.iter().copied().find(|&child_id| {
            matches!(self.node(child_id), Node::Element { name: n, .. } if n == name)
        })
    }

    /// All direct child elements named `name`, in document order.
    pub(crate) fn child_elements<'a>(
        &'a self,
        parent: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        let children: &[NodeId] = match self.node(parent) {
            Node::Element { children, .. } => children,
            _ => &[],
        };
        children.iter().copied().filter(move |&child_id| {
            matches!(self.node(child_id), Node::Element { name: n, .. } if n == name)
        })
    }

    /// Value of attribute `name` on element `node_id`, if present.
    pub(crate) fn attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        let Node::Element { attributes, .. } = self.node(node_id) else {
            return None;
        };
        attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Concatenation of an element's direct text-bearing children
    /// (`Text`, `CData`, `EntityRef` rendered as their literal name, decoded
    /// `Value`s already flattened to `Text` at build time).
    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let Node::Element { children, .. } = self.node(node_id) else {
            return String::new();
        };
        let mut out = String::new();
        for &child_id in children {
            match self.node(child_id) {
                Node::Text(s) | Node::CData(s) => out.push_str(s),
                _ => {}
            }
        }
        out
    }

    pub(crate) fn element_name(&self, node_id: NodeId) -> Option<&str> {
        match self.node(node_id) {
            Node::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Serialize the whole tree as UTF-8 XML text, per §4.3.
    pub(crate) fn to_utf8_string(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.write_node(root, &mut out);
        }
        out
    }

    fn write_node(&self, node_id: NodeId, out: &mut String) {
        match self.node(node_id) {
            Node::Element {
                name,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(name);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    crate::utils::escape::escape_xml_text(&attr.value, out);
                    out.push('"');
                }
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Node::Text(text) => crate::utils::escape::escape_xml_text(text, out),
            Node::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            Node::ProcessingInstruction { target, data } => {
                out.push_str("<?");
                out.push_str(target);
                out.push(' ');
                out.push_str(data);
                out.push_str("?>");
            }
            Node::EntityRef(name) => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
            Node::CharRef(code) => {
                out.push_str(&format!("&#x{:X};", code));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.push(Node::Element {
            name: "Event".to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        tree.set_root(root);

        let child = tree.push(Node::Element {
            name: "EventID".to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        let text = tree.push(Node::Text("4624".to_string()));
        tree.add_child(child, text);
        tree.add_child(root, child);
        tree
    }

    #[test]
    fn finds_child_element_by_name() {
        let tree = build_simple_tree();
        let root = tree.root().unwrap();
        let child = tree.child_element(root, "EventID").unwrap();
        assert_eq!(tree.text_content(child), "4624");
    }

    #[test]
    fn serializes_nested_elements_as_xml() {
        let tree = build_simple_tree();
        assert_eq!(tree.to_utf8_string(), "<Event><EventID>4624</EventID></Event>");
    }

    #[test]
    fn escapes_attribute_values_on_serialize() {
        let mut tree = Tree::new();
        let root = tree.push(Node::Element {
            name: "Data".to_string(),
            attributes: vec![Attribute {
                name: "Name".to_string(),
                value: "A & B".to_string(),
            }],
            children: Vec::new(),
        });
        tree.set_root(root);
        assert_eq!(tree.to_utf8_string(), "<Data Name=\"A &amp; B\"/>");
    }
}
