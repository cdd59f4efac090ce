//! Selection-based formatting.
//!
//! Each operation works on one live range of the document. The caller
//! decides whether a selection exists; these functions only see the range.

use crate::dom::html::parse_fragment;
use crate::dom::{BoundaryPoint, Dom, NodeId, RangeId};
use crate::error::DomError;
use regex::Regex;
use std::sync::OnceLock;

static TAG_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_tag_name(tag_name: &str) -> bool {
    let regex = TAG_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9]*(-[A-Za-z0-9]+)*$").expect("Invalid tag name Regex")
    });
    regex.is_match(tag_name)
}

/// Append parsed `html` as the last children of `root`.
pub fn append_html(dom: &mut Dom, root: NodeId, html: &str) -> Result<(), DomError> {
    for node in parse_fragment(dom, html) {
        dom.append_child(root, node)?;
    }
    Ok(())
}

/// Replace the range's contents with parsed `html` and leave the range
/// collapsed just after the inserted nodes.
pub fn insert_html(dom: &mut Dom, range: RangeId, html: &str) -> Result<(), DomError> {
    dom.delete_contents(range)?;
    for node in parse_fragment(dom, html) {
        dom.insert_node(range, node)?;
        dom.set_start_after(range, node)?;
    }
    dom.collapse(range, false)
}

/// Put text `before` in front of the range and text `after` behind it, then
/// select exactly what was selected before.
pub fn surround_selection(
    dom: &mut Dom,
    range: RangeId,
    before: &str,
    after: &str,
) -> Result<(), DomError> {
    let original = dom.range(range).ok_or(DomError::UnknownRange(range.index()))?;
    let start_text = dom.create_text(before);
    let end_text = dom.create_text(after);

    let boundary = dom.create_range(original);
    let inserted = insert_at_edges(dom, boundary, original.start, start_text, end_text);
    dom.release_range(boundary);
    inserted?;

    dom.set_start_after(range, start_text)?;
    dom.set_end_before(range, end_text)
}

fn insert_at_edges(
    dom: &mut Dom,
    boundary: RangeId,
    start: BoundaryPoint,
    start_text: NodeId,
    end_text: NodeId,
) -> Result<(), DomError> {
    dom.collapse(boundary, false)?;
    dom.insert_node(boundary, end_text)?;
    dom.set_start(boundary, start)?;
    dom.collapse(boundary, true)?;
    dom.insert_node(boundary, start_text)
}

/// Wrap the range's contents in a new `tag_name` element, then collapse the
/// range to just after it.
pub fn surround_selection_tag(dom: &mut Dom, range: RangeId, tag_name: &str) -> Result<(), DomError> {
    wrap(dom, range, tag_name)?;
    dom.collapse(range, false)
}

/// Unwrap the anchor's parent element when it holds at most one child node
/// and is a `tag_name`; otherwise wrap like [`surround_selection_tag`].
///
/// Only the immediate parent is looked at. A matching parent with two or
/// more children is wrapped again instead of unwrapped. `root` itself is
/// never unwrapped.
pub fn toggle_selection_tag(
    dom: &mut Dom,
    root: NodeId,
    range: RangeId,
    anchor: NodeId,
    tag_name: &str,
) -> Result<(), DomError> {
    let unwrappable = dom.parent_element(anchor).filter(|parent| {
        *parent != root
            && dom.is_inclusive_ancestor(root, *parent)
            && dom.children(*parent).len() < 2
            && dom
                .tag_name(*parent)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag_name))
    });

    match unwrappable {
        Some(parent) => {
            tracing::debug!(tag = tag_name, "unwrapping selection parent");
            dom.replace_with_children(parent)?;
        }
        None => wrap(dom, range, tag_name)?,
    }
    dom.collapse(range, false)
}

fn wrap(dom: &mut Dom, range: RangeId, tag_name: &str) -> Result<(), DomError> {
    if !is_valid_tag_name(tag_name) {
        return Err(DomError::InvalidTagName(tag_name.to_string()));
    }
    let element = dom.create_element(tag_name);
    dom.surround_contents(range, element)
}

/// Type `text` at the range: selected content is replaced and the range
/// ends up collapsed after the typed characters.
pub fn type_text(dom: &mut Dom, range: RangeId, text: &str) -> Result<(), DomError> {
    dom.delete_contents(range)?;
    let caret = dom
        .range(range)
        .ok_or(DomError::UnknownRange(range.index()))?
        .start;
    if dom.is_text(caret.node) {
        dom.replace_data(caret.node, caret.offset, 0, text)?;
        let after = BoundaryPoint::new(caret.node, caret.offset + text.chars().count());
        dom.set_end(range, after)?;
        return dom.collapse(range, false);
    }
    let node = dom.create_text(text);
    dom.insert_node(range, node)?;
    dom.set_start_after(range, node)?;
    dom.collapse(range, false)
}
