//! Boundary points, ranges, and the range algorithms the formatting
//! commands are built from (`insert_node`, `extract_contents`,
//! `surround_contents`, ...).

use super::{Dom, NodeId};
use crate::error::DomError;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    pub fn collapsed_at(point: BoundaryPoint) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Handle to a live range registered with a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeId(usize);

impl RangeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Dom {
    // ────────────────────────────────────────────────────────────────
    // Registry
    // ────────────────────────────────────────────────────────────────

    pub fn create_range(&mut self, range: Range) -> RangeId {
        let id = match self.ranges.iter().position(Option::is_none) {
            Some(free) => {
                self.ranges[free] = Some(range);
                free
            }
            None => {
                self.ranges.push(Some(range));
                self.ranges.len() - 1
            }
        };
        RangeId(id)
    }

    pub fn range(&self, id: RangeId) -> Option<Range> {
        self.ranges.get(id.0).copied().flatten()
    }

    pub fn release_range(&mut self, id: RangeId) {
        if let Some(slot) = self.ranges.get_mut(id.0) {
            *slot = None;
        }
    }

    fn live(&self, id: RangeId) -> Result<Range, DomError> {
        self.range(id).ok_or(DomError::UnknownRange(id.0))
    }

    fn store(&mut self, id: RangeId, range: Range) -> Result<(), DomError> {
        match self.ranges.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = Some(range);
                Ok(())
            }
            _ => Err(DomError::UnknownRange(id.0)),
        }
    }

    fn check_point(&self, point: BoundaryPoint) -> Result<(), DomError> {
        if !self.contains(point.node) {
            return Err(DomError::UnknownNode(point.node));
        }
        if point.offset > self.len(point.node) {
            return Err(DomError::IndexSize {
                node: point.node,
                offset: point.offset,
            });
        }
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────
    // Ordering
    // ────────────────────────────────────────────────────────────────

    /// Tree order of two nodes (pre-order, ancestors first).
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);
        for (x, y) in path_a.iter().zip(path_b.iter()) {
            if x != y {
                return x.cmp(y);
            }
        }
        path_a.len().cmp(&path_b.len())
    }

    fn path_from_root(&self, node: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .inclusive_ancestors(node)
            .into_iter()
            .filter_map(|n| self.index(n))
            .collect();
        path.reverse();
        path
    }

    /// Position of boundary point `a` relative to `b`.
    pub fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        if self.tree_order(a.node, b.node) == Ordering::Greater {
            return self.compare_points(b, a).reverse();
        }
        if self.is_inclusive_ancestor(a.node, b.node) {
            let mut child = b.node;
            while let Some(parent) = self.parent(child) {
                if parent == a.node {
                    break;
                }
                child = parent;
            }
            if self.index(child).is_some_and(|i| i < a.offset) {
                return Ordering::Greater;
            }
        }
        Ordering::Less
    }

    fn is_contained(&self, node: NodeId, range: &Range) -> bool {
        self.compare_points(BoundaryPoint::new(node, 0), range.start) == Ordering::Greater
            && self.compare_points(BoundaryPoint::new(node, self.len(node)), range.end)
                == Ordering::Less
    }

    fn is_partially_contained(&self, node: NodeId, range: &Range) -> bool {
        self.is_inclusive_ancestor(node, range.start.node)
            != self.is_inclusive_ancestor(node, range.end.node)
    }

    fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let mut current = a;
        loop {
            if self.is_inclusive_ancestor(current, b) {
                return current;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Boundary setters
    // ────────────────────────────────────────────────────────────────

    pub fn set_start(&mut self, id: RangeId, point: BoundaryPoint) -> Result<(), DomError> {
        self.check_point(point)?;
        let mut range = self.live(id)?;
        range.start = point;
        if self.compare_points(range.start, range.end) == Ordering::Greater {
            range.end = point;
        }
        self.store(id, range)
    }

    pub fn set_end(&mut self, id: RangeId, point: BoundaryPoint) -> Result<(), DomError> {
        self.check_point(point)?;
        let mut range = self.live(id)?;
        range.end = point;
        if self.compare_points(range.end, range.start) == Ordering::Less {
            range.start = point;
        }
        self.store(id, range)
    }

    pub fn set_start_after(&mut self, id: RangeId, node: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.position_in_parent(node)?;
        self.set_start(id, BoundaryPoint::new(parent, index + 1))
    }

    pub fn set_end_before(&mut self, id: RangeId, node: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.position_in_parent(node)?;
        self.set_end(id, BoundaryPoint::new(parent, index))
    }

    pub fn select_node(&mut self, id: RangeId, node: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.position_in_parent(node)?;
        self.store(
            id,
            Range::new(
                BoundaryPoint::new(parent, index),
                BoundaryPoint::new(parent, index + 1),
            ),
        )
    }

    pub fn select_node_contents(&mut self, id: RangeId, node: NodeId) -> Result<(), DomError> {
        if !self.contains(node) {
            return Err(DomError::UnknownNode(node));
        }
        self.store(
            id,
            Range::new(
                BoundaryPoint::new(node, 0),
                BoundaryPoint::new(node, self.len(node)),
            ),
        )
    }

    pub fn collapse(&mut self, id: RangeId, to_start: bool) -> Result<(), DomError> {
        let range = self.live(id)?;
        let point = if to_start { range.start } else { range.end };
        self.store(id, Range::collapsed_at(point))
    }

    fn position_in_parent(&self, node: NodeId) -> Result<(NodeId, usize), DomError> {
        let parent = self.parent(node).ok_or(DomError::HierarchyRequest(node))?;
        let index = self.index(node).ok_or(DomError::HierarchyRequest(node))?;
        Ok((parent, index))
    }

    // ────────────────────────────────────────────────────────────────
    // Content operations
    // ────────────────────────────────────────────────────────────────

    /// Insert `node` at the start of the range, splitting a text node when
    /// the start lies inside one. A collapsed range grows to cover `node`.
    pub fn insert_node(&mut self, id: RangeId, node: NodeId) -> Result<(), DomError> {
        let start = self.live(id)?.start;

        if start.node == node
            || matches!(self.kind(start.node), Some(super::NodeKind::Comment(_)))
            || (self.is_text(start.node) && self.parent(start.node).is_none())
        {
            return Err(DomError::HierarchyRequest(node));
        }

        let mut reference = if self.is_text(start.node) {
            Some(start.node)
        } else {
            self.children(start.node).get(start.offset).copied()
        };
        let parent = match reference {
            Some(r) => self.parent(r).ok_or(DomError::HierarchyRequest(r))?,
            None => start.node,
        };
        if self.is_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest(node));
        }

        if self.is_text(start.node) {
            reference = Some(self.split_text(start.node, start.offset)?);
        }
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }
        if self.parent(node).is_some() {
            self.remove(node)?;
        }

        let new_offset = match reference {
            Some(r) => self.index(r).unwrap_or(0),
            None => self.len(parent),
        } + 1;

        self.insert_before(parent, node, reference)?;

        if self.live(id)?.is_collapsed() {
            self.set_end(id, BoundaryPoint::new(parent, new_offset))?;
        }
        Ok(())
    }

    /// Move the range's contents out of the tree. Partially selected
    /// elements are split: a shallow copy carrying the selected part goes
    /// into the result, the original keeps the rest. The range collapses to
    /// where the contents were.
    pub fn extract_contents(&mut self, id: RangeId) -> Result<Vec<NodeId>, DomError> {
        let range = self.live(id)?;
        let mut fragment = Vec::new();
        if range.is_collapsed() {
            return Ok(fragment);
        }

        let (start, end) = (range.start, range.end);

        if start.node == end.node && self.is_character_data(start.node) {
            let clone = self.clone_data_slice(start.node, start.offset, end.offset)?;
            fragment.push(clone);
            self.replace_data(start.node, start.offset, end.offset - start.offset, "")?;
            return Ok(fragment);
        }

        let common = self.common_ancestor(start.node, end.node);
        let children = self.children(common).to_vec();

        let first_partial = if self.is_inclusive_ancestor(start.node, end.node) {
            None
        } else {
            children
                .iter()
                .copied()
                .find(|c| self.is_partially_contained(*c, &range))
        };
        let last_partial = if self.is_inclusive_ancestor(end.node, start.node) {
            None
        } else {
            children
                .iter()
                .rev()
                .copied()
                .find(|c| self.is_partially_contained(*c, &range))
        };
        let contained: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|c| self.is_contained(*c, &range))
            .collect();

        let collapse_to = if self.is_inclusive_ancestor(start.node, end.node) {
            start
        } else {
            let mut reference = start.node;
            while let Some(parent) = self.parent(reference) {
                if self.is_inclusive_ancestor(parent, end.node) {
                    break;
                }
                reference = parent;
            }
            let (parent, index) = self.position_in_parent(reference)?;
            BoundaryPoint::new(parent, index + 1)
        };

        if let Some(first) = first_partial {
            if self.is_character_data(first) {
                let length = self.len(start.node);
                let clone = self.clone_data_slice(start.node, start.offset, length)?;
                fragment.push(clone);
                self.replace_data(start.node, start.offset, length - start.offset, "")?;
            } else {
                let clone = self.clone_shallow(first)?;
                fragment.push(clone);
                let sub = Range::new(start, BoundaryPoint::new(first, self.len(first)));
                self.extract_into(sub, clone)?;
            }
        }

        for child in contained {
            self.remove(child)?;
            fragment.push(child);
        }

        if let Some(last) = last_partial {
            if self.is_character_data(last) {
                let clone = self.clone_data_slice(end.node, 0, end.offset)?;
                fragment.push(clone);
                self.replace_data(end.node, 0, end.offset, "")?;
            } else {
                let clone = self.clone_shallow(last)?;
                fragment.push(clone);
                let sub = Range::new(BoundaryPoint::new(last, 0), end);
                self.extract_into(sub, clone)?;
            }
        }

        self.store(id, Range::collapsed_at(collapse_to))?;
        Ok(fragment)
    }

    fn extract_into(&mut self, sub: Range, target: NodeId) -> Result<(), DomError> {
        let sub_id = self.create_range(sub);
        let extracted = self.extract_contents(sub_id);
        self.release_range(sub_id);
        for node in extracted? {
            self.append_child(target, node)?;
        }
        Ok(())
    }

    fn clone_data_slice(
        &mut self,
        node: NodeId,
        from: usize,
        to: usize,
    ) -> Result<NodeId, DomError> {
        let data = self.data(node).ok_or(DomError::HierarchyRequest(node))?;
        let slice: String = data.chars().skip(from).take(to.saturating_sub(from)).collect();
        Ok(if self.is_text(node) {
            self.create_text(&slice)
        } else {
            self.create_comment(&slice)
        })
    }

    /// Remove the range's contents; the range collapses in their place.
    pub fn delete_contents(&mut self, id: RangeId) -> Result<(), DomError> {
        self.extract_contents(id).map(|_| ())
    }

    /// Move the range's contents into `new_parent`, put `new_parent` where
    /// they were, and select it.
    ///
    /// Fails with [`DomError::PartiallySelected`] (tree untouched) when the
    /// range cuts through an element, since no single wrapper could hold the
    /// selected part without re-parenting the rest.
    pub fn surround_contents(&mut self, id: RangeId, new_parent: NodeId) -> Result<(), DomError> {
        let range = self.live(id)?;
        if !self.is_element(new_parent) {
            return Err(DomError::HierarchyRequest(new_parent));
        }
        let cuts_element = |from: NodeId, other: NodeId| {
            self.inclusive_ancestors(from)
                .into_iter()
                .any(|a| !self.is_inclusive_ancestor(a, other) && !self.is_text(a))
        };
        if cuts_element(range.start.node, range.end.node)
            || cuts_element(range.end.node, range.start.node)
        {
            return Err(DomError::PartiallySelected);
        }

        let fragment = self.extract_contents(id)?;
        self.remove_children(new_parent)?;
        self.insert_node(id, new_parent)?;
        for node in fragment {
            self.append_child(new_parent, node)?;
        }
        self.select_node(id, new_parent)
    }
}

impl Dom {
    /// The text a range covers, as `Range.toString()` reports it.
    pub fn range_text(&self, range: &Range) -> String {
        let mut out = String::new();
        for node in self.descendants(self.document()) {
            let Some(data) = self.data(node).filter(|_| self.is_text(node)) else {
                continue;
            };
            let len = self.len(node);
            if self.compare_points(BoundaryPoint::new(node, len), range.start) != Ordering::Greater
                || self.compare_points(BoundaryPoint::new(node, 0), range.end) != Ordering::Less
            {
                continue;
            }
            let from = if node == range.start.node { range.start.offset } else { 0 };
            let to = if node == range.end.node { range.end.offset } else { len };
            out.extend(data.chars().skip(from).take(to.saturating_sub(from)));
        }
        out
    }
}
