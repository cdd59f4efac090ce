//! Live node tree of the embedded document.
//!
//! An arena of nodes addressed by [`NodeId`]. Detached nodes stay in the
//! arena (ids are never reused) so a stale id can always be inspected.
//!
//! Ranges registered with [`Dom::create_range`] are *live*: every mutation
//! primitive in this module adjusts their boundary points the way a browser
//! adjusts live ranges, so multi-step edits (split, insert, remove) keep the
//! selection pointing at the same content.

pub mod html;
pub mod range;

pub use range::{BoundaryPoint, Range, RangeId};

use crate::error::DomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Always lowercase.
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    ranges: Vec<Option<Range>>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            ranges: Vec::new(),
        }
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    // ────────────────────────────────────────────────────────────────
    // Construction
    // ────────────────────────────────────────────────────────────────

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    pub fn create_element_with(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    /// Copy of `id` without its children.
    pub fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        let kind = self.node(id)?.kind.clone();
        Ok(self.push(kind))
    }

    // ────────────────────────────────────────────────────────────────
    // Inspection
    // ────────────────────────────────────────────────────────────────

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    /// Text and comment nodes carry character data.
    pub fn is_character_data(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_) | NodeKind::Comment(_)))
    }

    pub fn data(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(s) | NodeKind::Comment(s)) => Some(s),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// The parent, if it is an element (the document node does not count).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// Position of `id` among its parent's children.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Node length as boundary offsets see it: characters for character
    /// data, children for everything else.
    pub fn len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Some(NodeKind::Text(s) | NodeKind::Comment(s)) => s.chars().count(),
            Some(_) => self.children(id).len(),
            None => 0,
        }
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        inclusive_ancestor_in(&self.nodes, ancestor, node)
    }

    /// `node`, its parent, and so on up to the root.
    pub fn inclusive_ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Pre-order descendants of `root`, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// First element below the document whose `id` attribute equals `value`.
    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .find(|id| self.attr(*id, "id") == Some(value))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .find(|id| self.tag_name(*id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(NodeKind::Text(s)) = self.kind(id) {
            return s.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| match self.kind(d) {
                Some(NodeKind::Text(s)) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    // ────────────────────────────────────────────────────────────────
    // Mutation (all of these keep live ranges consistent)
    // ────────────────────────────────────────────────────────────────

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => {
                el.set_attr(name, value);
                Ok(())
            }
            _ => Err(DomError::HierarchyRequest(id)),
        }
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, node, None)
    }

    /// Insert `node` into `parent` before `reference` (or last when `None`).
    /// A node that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.node(node)?;
        match self.node(parent)?.kind {
            NodeKind::Document | NodeKind::Element(_) => {}
            _ => return Err(DomError::HierarchyRequest(parent)),
        }
        if matches!(self.node(node)?.kind, NodeKind::Document)
            || self.is_inclusive_ancestor(node, parent)
        {
            return Err(DomError::HierarchyRequest(node));
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::HierarchyRequest(reference));
            }
        }
        if reference == Some(node) {
            return Ok(());
        }

        if self.parent(node).is_some() {
            self.remove(node)?;
        }

        let index = match reference {
            Some(reference) => self.index(reference).unwrap_or(0),
            None => self.children(parent).len(),
        };

        for range in self.ranges.iter_mut().flatten() {
            for point in [&mut range.start, &mut range.end] {
                if point.node == parent && point.offset > index {
                    point.offset += 1;
                }
            }
        }

        self.node_mut(parent)?.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `node` from its parent. Boundary points inside the removed
    /// subtree collapse to where the node used to be.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        let index = self.index(node).unwrap_or(0);

        let nodes = &self.nodes;
        for range in self.ranges.iter_mut().flatten() {
            for point in [&mut range.start, &mut range.end] {
                if inclusive_ancestor_in(nodes, node, point.node) {
                    *point = BoundaryPoint::new(parent, index);
                } else if point.node == parent && point.offset > index {
                    point.offset -= 1;
                }
            }
        }

        self.node_mut(parent)?.children.remove(index);
        self.node_mut(node)?.parent = None;
        Ok(())
    }

    pub fn remove_children(&mut self, parent: NodeId) -> Result<(), DomError> {
        while let Some(&child) = self.node(parent)?.children.last() {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Replace `count` characters at `offset` in a character-data node.
    pub fn replace_data(
        &mut self,
        node: NodeId,
        offset: usize,
        count: usize,
        data: &str,
    ) -> Result<(), DomError> {
        let length = self.len(node);
        if offset > length {
            return Err(DomError::IndexSize { node, offset });
        }
        let count = count.min(length - offset);
        let inserted = data.chars().count();

        match &mut self.node_mut(node)?.kind {
            NodeKind::Text(s) | NodeKind::Comment(s) => {
                let start = byte_offset(s, offset);
                let end = byte_offset(s, offset + count);
                s.replace_range(start..end, data);
            }
            _ => return Err(DomError::HierarchyRequest(node)),
        }

        for range in self.ranges.iter_mut().flatten() {
            for point in [&mut range.start, &mut range.end] {
                if point.node != node {
                    continue;
                }
                if point.offset > offset && point.offset <= offset + count {
                    point.offset = offset;
                } else if point.offset > offset + count {
                    point.offset = point.offset + inserted - count;
                }
            }
        }
        Ok(())
    }

    /// Split a text node at `offset`; the tail becomes a new following
    /// sibling, which is returned.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let Some(NodeKind::Text(data)) = self.kind(node) else {
            return Err(DomError::HierarchyRequest(node));
        };
        let length = data.chars().count();
        if offset > length {
            return Err(DomError::IndexSize { node, offset });
        }
        let tail: String = data.chars().skip(offset).collect();
        let new_node = self.create_text(&tail);

        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert_before(parent, new_node, next)?;
            let node_index = self.index(node).unwrap_or(0);

            for range in self.ranges.iter_mut().flatten() {
                for point in [&mut range.start, &mut range.end] {
                    if point.node == node && point.offset > offset {
                        *point = BoundaryPoint::new(new_node, point.offset - offset);
                    } else if point.node == parent && point.offset == node_index + 1 {
                        point.offset += 1;
                    }
                }
            }
        }

        self.replace_data(node, offset, length - offset, "")?;
        Ok(new_node)
    }

    /// Replace an element by its own children, in place.
    ///
    /// The children are moved rather than removed and re-inserted, so
    /// boundary points inside them stay where they are.
    pub fn replace_with_children(&mut self, element: NodeId) -> Result<(), DomError> {
        let parent = self
            .node(element)?
            .parent
            .ok_or(DomError::HierarchyRequest(element))?;
        let index = self.index(element).unwrap_or(0);
        let children = std::mem::take(&mut self.node_mut(element)?.children);
        let moved = children.len();

        for range in self.ranges.iter_mut().flatten() {
            for point in [&mut range.start, &mut range.end] {
                if point.node == element {
                    *point = BoundaryPoint::new(parent, index + point.offset);
                } else if point.node == parent && point.offset > index {
                    point.offset = point.offset + moved - 1;
                }
            }
        }

        for child in &children {
            self.node_mut(*child)?.parent = Some(parent);
        }
        self.node_mut(parent)?
            .children
            .splice(index..=index, children.iter().copied());
        self.node_mut(element)?.parent = None;
        Ok(())
    }
}

fn inclusive_ancestor_in(nodes: &[Node], ancestor: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = nodes.get(id.0).and_then(|n| n.parent);
    }
    false
}

/// Byte index of the `chars`-th character (or the end of the string).
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}
