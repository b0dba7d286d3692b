//! Writes edited channel records back into their document.
//!
//! Only `ChNum`, `ChName` (when renamed), `Fav`, `ChLock` and `UserHide`
//! are ever rewritten; every other node keeps its original text.

use log::{debug, warn};

use crate::document::{parse_int, TunerDocument};
use crate::name_codec::NameCodec;
use crate::types::ChannelRecord;

/// Patch `doc` in place from `records`, in list order.
///
/// Records of other domains are ignored. Returns the number of removed
/// channel nodes.
pub fn patch(doc: &mut TunerDocument, records: &[ChannelRecord], codec: &NameCodec) -> usize {
    let domain = doc.domain;
    let mut removed = 0;

    for ch in records.iter().filter(|c| c.domain == domain) {
        if ch.is_removed_on_save() {
            if remove_channel(doc, ch) {
                removed += 1;
            }
            continue;
        }
        update_channel(doc, ch, codec);
    }

    if removed > 0 {
        debug!("Removed {} {} channels", removed, domain);
    }
    removed
}

/// Decrement the sibling count field and detach the node.
fn remove_channel(doc: &mut TunerDocument, ch: &ChannelRecord) -> bool {
    let tree = &mut doc.tree;
    let node = ch.node();

    let parent = match tree.parent(node) {
        Some(p) if tree.is_attached(node) => p,
        _ => {
            warn!(
                "{} channel #{} is already removed from the document",
                doc.domain, ch.record_index
            );
            return false;
        }
    };

    // count is re-read for every removal
    if let Some(count_node) = tree.first_element_child(parent).filter(|c| *c != node) {
        let count = parse_int(&tree.inner_text(count_node));
        tree.set_inner_text(count_node, &(count - 1).to_string());
    }

    tree.remove_child(parent, node)
}

fn update_channel(doc: &mut TunerDocument, ch: &ChannelRecord, codec: &NameCodec) {
    let tree = &mut doc.tree;
    let fields: Vec<_> = tree.element_children(ch.node()).collect();

    for field in fields {
        let value = match tree.name(field) {
            Some("ChNum") => ch.new_program_nr.to_string(),
            Some("ChName") if ch.is_name_modified => codec.encode(&ch.name),
            Some("Fav") => bool_text(ch.is_favorite()).to_string(),
            Some("ChLock") => bool_text(ch.lock).to_string(),
            Some("UserHide") => if ch.hidden { "1" } else { "0" }.to_string(),
            _ => continue,
        };
        if tree.inner_text(field) != value {
            tree.set_inner_text(field, &value);
        }
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
