//! Serializer reproducing the layout of the converter's XML output.
//!
//! Elements that only contain elements are indented, one child per line.
//! Elements with text content are written on a single line. The newline
//! sequence is taken from the settings, never from the platform.

use super::tree::{NodeId, NodeKind, XmlTree};

/// Output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterSettings {
    pub indent: String,
    pub newline: String,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            newline: "\n".to_string(),
        }
    }
}

impl WriterSettings {
    pub fn with_newline(newline: &str) -> Self {
        Self {
            newline: newline.to_string(),
            ..Self::default()
        }
    }
}

/// Serialize a whole tree.
pub fn write(tree: &XmlTree, settings: &WriterSettings) -> String {
    let mut w = Writer {
        tree,
        settings,
        out: String::new(),
    };
    let mut first = true;
    for &id in tree.top_level() {
        if !first {
            w.out.push_str(&settings.newline);
        }
        first = false;
        w.node(id, 0);
    }
    w.out
}

struct Writer<'a> {
    tree: &'a XmlTree,
    settings: &'a WriterSettings,
    out: String,
}

impl Writer<'_> {
    fn node(&mut self, id: NodeId, depth: usize) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Declaration(content) => {
                self.out.push_str("<?");
                self.out.push_str(content);
                self.out.push_str("?>");
            }
            NodeKind::Text(raw) => self.out.push_str(raw),
            NodeKind::CData(raw) => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(raw);
                self.out.push_str("]]>");
            }
            NodeKind::Comment(raw) => {
                self.out.push_str("<!--");
                self.out.push_str(raw);
                self.out.push_str("-->");
            }
            NodeKind::Element {
                name,
                raw_tag,
                self_closing,
            } => {
                let children = tree.children(id);
                if children.is_empty() && *self_closing {
                    self.out.push('<');
                    self.out.push_str(raw_tag);
                    self.out.push_str("/>");
                    return;
                }

                self.out.push('<');
                self.out.push_str(raw_tag);
                self.out.push('>');

                let mixed = children.iter().any(|c| {
                    matches!(tree.kind(*c), NodeKind::Text(_) | NodeKind::CData(_))
                });
                if mixed {
                    for &c in children {
                        self.inline(c);
                    }
                } else if !children.is_empty() {
                    for &c in children {
                        self.line(depth + 1);
                        self.node(c, depth + 1);
                    }
                    self.line(depth);
                }

                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
        }
    }

    /// Write a node and its subtree without any added whitespace.
    fn inline(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Element {
                name,
                raw_tag,
                self_closing,
            } => {
                let children = tree.children(id);
                if children.is_empty() && *self_closing {
                    self.out.push('<');
                    self.out.push_str(raw_tag);
                    self.out.push_str("/>");
                    return;
                }
                self.out.push('<');
                self.out.push_str(raw_tag);
                self.out.push('>');
                for &c in children {
                    self.inline(c);
                }
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
            _ => self.node(id, 0),
        }
    }

    fn line(&mut self, depth: usize) {
        self.out.push_str(&self.settings.newline);
        for _ in 0..depth {
            self.out.push_str(&self.settings.indent);
        }
    }
}
