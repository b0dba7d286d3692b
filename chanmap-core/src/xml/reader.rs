//! Permissive XML parser building an [`XmlTree`].
//!
//! Characters are not validated, DTDs and processing instructions are
//! dropped, and whitespace between elements is discarded (it is recreated
//! by the writer's indentation).

use quick_xml::events::Event;
use quick_xml::Reader;

use super::tree::{NodeId, NodeKind, XmlTree};

/// Parse failure with a short description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at byte {position})")]
pub struct XmlError {
    pub message: String,
    pub position: u64,
}

struct Frame {
    id: NodeId,
    /// Whitespace-only text seen so far; kept only if it is the sole content.
    pending_ws: Option<String>,
    has_content: bool,
}

/// Parse a document.
pub fn parse(text: &str) -> Result<XmlTree, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut tree = XmlTree::default();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| XmlError {
            message: e.to_string(),
            position: reader.error_position(),
        })?;

        let parent = stack.last().map(|f| f.id);
        match event {
            Event::Decl(decl) => {
                let content = utf8(&decl, &reader)?;
                tree.push(NodeKind::Declaration(content), parent);
            }
            Event::Start(start) => {
                let name = utf8(start.name().as_ref(), &reader)?;
                let raw_tag = utf8(&start, &reader)?;
                mark_content(&mut stack);
                let id = tree.push(
                    NodeKind::Element {
                        name,
                        raw_tag,
                        self_closing: false,
                    },
                    parent,
                );
                stack.push(Frame {
                    id,
                    pending_ws: None,
                    has_content: false,
                });
            }
            Event::Empty(start) => {
                let name = utf8(start.name().as_ref(), &reader)?;
                let raw_tag = utf8(&start, &reader)?;
                mark_content(&mut stack);
                tree.push(
                    NodeKind::Element {
                        name,
                        raw_tag,
                        self_closing: true,
                    },
                    parent,
                );
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| XmlError {
                    message: "unexpected closing tag".to_string(),
                    position: reader.buffer_position(),
                })?;
                if !frame.has_content {
                    if let Some(ws) = frame.pending_ws {
                        tree.push(NodeKind::Text(ws), Some(frame.id));
                    }
                }
            }
            Event::Text(t) => {
                let raw = utf8(&t, &reader)?;
                if raw.chars().all(char::is_whitespace) {
                    if let Some(frame) = stack.last_mut() {
                        frame.pending_ws.get_or_insert_with(String::new).push_str(&raw);
                    }
                    continue;
                }
                if parent.is_none() {
                    return Err(XmlError {
                        message: "text outside of the document element".to_string(),
                        position: reader.buffer_position(),
                    });
                }
                mark_content(&mut stack);
                tree.push(NodeKind::Text(raw), parent);
            }
            Event::CData(c) => {
                let raw = utf8(&c, &reader)?;
                mark_content(&mut stack);
                tree.push(NodeKind::CData(raw), parent);
            }
            Event::Comment(c) => {
                let raw = utf8(&c, &reader)?;
                mark_content(&mut stack);
                tree.push(NodeKind::Comment(raw), parent);
            }
            Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(frame) = stack.last() {
        return Err(XmlError {
            message: format!(
                "unclosed element <{}>",
                tree.name(frame.id).unwrap_or_default()
            ),
            position: reader.buffer_position(),
        });
    }
    if tree.top_level().iter().all(|id| !tree.is_element(*id)) {
        return Err(XmlError {
            message: "no document element".to_string(),
            position: reader.buffer_position(),
        });
    }

    Ok(tree)
}

fn mark_content(stack: &mut [Frame]) {
    if let Some(frame) = stack.last_mut() {
        frame.has_content = true;
    }
}

fn utf8(bytes: &[u8], reader: &Reader<&[u8]>) -> Result<String, XmlError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| XmlError {
            message: format!("invalid UTF-8: {}", e),
            position: reader.buffer_position(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structure() {
        let tree = parse(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ChannelMap>\n  <ChannelData>\n    <Count>2</Count>\n    <Channel><ChNum>1</ChNum></Channel>\n  </ChannelData>\n</ChannelMap>",
        )
        .unwrap();
        assert_eq!(tree.top_level().len(), 2);
        assert!(tree.is_declaration(tree.top_level()[0]));
        let root = tree.root().unwrap();
        assert_eq!(tree.name(root), Some("ChannelMap"));
        let data = tree.child_by_name(root, "ChannelData").unwrap();
        // whitespace between elements is not kept
        assert_eq!(tree.children(data).len(), 2);
        let count = tree.first_element_child(data).unwrap();
        assert_eq!(tree.inner_text(count), "2");
    }

    #[test]
    fn test_processing_instructions_and_doctype_are_dropped() {
        let tree = parse("<!DOCTYPE ChannelMap><?vendor x?><ChannelMap/>").unwrap();
        assert_eq!(tree.top_level().len(), 1);
        assert_eq!(tree.name(tree.root().unwrap()), Some("ChannelMap"));
    }

    #[test]
    fn test_whitespace_only_content_is_kept() {
        let tree = parse("<a><b> </b></a>").unwrap();
        let a = tree.root().unwrap();
        let b = tree.first_element_child(a).unwrap();
        assert_eq!(tree.inner_text(b), " ");
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<a>").is_err());
        assert!(parse("").is_err());
        assert!(parse("just text").is_err());
    }

    #[test]
    fn test_unknown_entity_is_tolerated() {
        let tree = parse("<a>&bogus; &amp;</a>").unwrap();
        let a = tree.root().unwrap();
        assert_eq!(tree.inner_text(a), "&bogus; &amp;");
    }
}
