//! Arena-backed mutable XML tree.
//!
//! Nodes live in a flat table and are addressed by [`NodeId`]. Removing a
//! node only detaches it from its parent, so handles held by channel
//! records stay valid for the lifetime of the tree.

use std::borrow::Cow;

use quick_xml::escape::{partial_escape, unescape};

/// Handle of a node inside an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// Content between `<?` and `?>`.
    Declaration(String),
    Element {
        name: String,
        /// Tag content after `<` up to `>` (or `/>`), attributes included.
        raw_tag: String,
        self_closing: bool,
    },
    /// Escaped text as it appears in the source.
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// A parsed XML document.
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    pub(crate) nodes: Vec<NodeData>,
    /// Top-level nodes in document order.
    pub(crate) top: Vec<NodeId>,
}

impl XmlTree {
    pub(crate) fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.top.push(id),
        }
        id
    }

    pub(crate) fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Top-level nodes (declaration, comments, root element).
    pub fn top_level(&self) -> &[NodeId] {
        &self.top
    }

    /// The document element, skipping one leading XML declaration.
    pub fn root(&self) -> Option<NodeId> {
        let mut iter = self.top.iter().copied();
        let first = iter.next()?;
        if self.is_declaration(first) {
            iter.next()
        } else {
            Some(first)
        }
    }

    pub fn is_declaration(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Declaration(_))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    /// Qualified element name, `None` for non-element nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Element name without a namespace prefix.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id)
            .map(|n| n.rsplit_once(':').map(|(_, local)| local).unwrap_or(n))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child elements in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.is_element(*c))
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id).next()
    }

    /// First child element with the given name.
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.element_children(id).find(|c| self.name(*c) == Some(name))
    }

    /// Whether the node is still reachable from the document.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return self.top.contains(&cur),
            }
        }
    }

    /// Concatenated, unescaped text of all descendant text nodes.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(raw) => out.push_str(&unescape_lenient(raw)),
            NodeKind::CData(raw) => out.push_str(raw),
            NodeKind::Element { .. } => {
                for c in self.children(id) {
                    self.collect_text(*c, out);
                }
            }
            NodeKind::Declaration(_) | NodeKind::Comment(_) => {}
        }
    }

    /// Replace all children of an element with a single text node.
    pub fn set_inner_text(&mut self, id: NodeId, text: &str) {
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for c in old {
            self.nodes[c.0].parent = None;
        }
        if let NodeKind::Element {
            raw_tag,
            self_closing,
            ..
        } = &mut self.nodes[id.0].kind
        {
            if *self_closing {
                *self_closing = false;
                let trimmed = raw_tag.trim_end().len();
                raw_tag.truncate(trimmed);
            }
        }
        if !text.is_empty() {
            self.push(NodeKind::Text(partial_escape(text).into_owned()), Some(id));
        }
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|c| *c == child) {
            Some(pos) => {
                children.remove(pos);
                self.nodes[child.0].parent = None;
                true
            }
            None => false,
        }
    }
}

/// Unescape entity references, keeping the raw text if it is not well formed.
fn unescape_lenient(raw: &str) -> Cow<'_, str> {
    unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (XmlTree, NodeId, NodeId, NodeId) {
        let mut tree = XmlTree::default();
        tree.push(NodeKind::Declaration("xml version=\"1.0\"".into()), None);
        let root = tree.push(
            NodeKind::Element {
                name: "ns:Root".into(),
                raw_tag: "ns:Root".into(),
                self_closing: false,
            },
            None,
        );
        let a = tree.push(
            NodeKind::Element {
                name: "A".into(),
                raw_tag: "A".into(),
                self_closing: false,
            },
            Some(root),
        );
        tree.push(NodeKind::Text("x &amp; y".into()), Some(a));
        let b = tree.push(
            NodeKind::Element {
                name: "B".into(),
                raw_tag: "B ".into(),
                self_closing: true,
            },
            Some(root),
        );
        (tree, root, a, b)
    }

    #[test]
    fn test_root_skips_declaration() {
        let (tree, root, _, _) = sample();
        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.name(root), Some("ns:Root"));
        assert_eq!(tree.local_name(root), Some("Root"));
    }

    #[test]
    fn test_inner_text_unescapes() {
        let (tree, root, a, _) = sample();
        assert_eq!(tree.inner_text(a), "x & y");
        assert_eq!(tree.inner_text(root), "x & y");
    }

    #[test]
    fn test_set_inner_text_escapes_and_opens_empty_element() {
        let (mut tree, _, a, b) = sample();
        tree.set_inner_text(a, "1 < 2");
        assert_eq!(tree.children(a).len(), 1);
        assert_eq!(tree.kind(tree.children(a)[0]), &NodeKind::Text("1 &lt; 2".into()));
        assert_eq!(tree.inner_text(a), "1 < 2");

        tree.set_inner_text(b, "5");
        match tree.kind(b) {
            NodeKind::Element { raw_tag, self_closing, .. } => {
                assert!(!self_closing);
                assert_eq!(raw_tag, "B");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remove_child_keeps_handle_valid() {
        let (mut tree, root, a, b) = sample();
        assert!(tree.remove_child(root, a));
        assert!(!tree.remove_child(root, a));
        assert!(!tree.is_attached(a));
        assert!(tree.is_attached(b));
        assert_eq!(tree.inner_text(a), "x & y");
        assert_eq!(tree.first_element_child(root), Some(b));
    }
}
