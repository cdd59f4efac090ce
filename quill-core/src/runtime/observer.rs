//! Size and input observers of the editable root.
//!
//! There is no layout engine behind the runtime, so the rendered height is
//! estimated by [`SizeModel`]: text is broken into lines of
//! `chars_per_line` characters, block elements and `<br>` start new lines,
//! and headings scale their lines the way default user-agent styles do.

use crate::dom::{Dom, NodeId, NodeKind};
use crate::protocol::EditorEvent;
use serde::{Deserialize, Serialize};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "tr", "ul",
];

/// Layout metrics used to measure the editable root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizeModel {
    pub line_height: u32,
    pub chars_per_line: usize,
    /// Padding on each of the top and bottom edges.
    pub padding: u32,
    pub min_height: u32,
}

impl Default for SizeModel {
    fn default() -> Self {
        Self {
            line_height: 20,
            chars_per_line: 40,
            padding: 2,
            min_height: 20,
        }
    }
}

impl SizeModel {
    /// `max(clientHeight, scrollHeight)` of `root`.
    pub fn measure(&self, dom: &Dom, root: NodeId) -> u32 {
        let mut layout = LineLayout {
            model: self,
            height: 0.0,
            chars: 0,
            scale: 1.0,
            open: false,
        };
        layout.walk(dom, root, 1.0);
        layout.flush();

        let scroll_height =
            (layout.height.round() as u32).saturating_add(self.padding.saturating_mul(2));
        let client_height = scroll_height.max(self.min_height);
        client_height.max(scroll_height)
    }
}

fn heading_scale(tag: &str) -> Option<f64> {
    match tag {
        "h1" => Some(2.0),
        "h2" => Some(1.5),
        "h3" => Some(1.17),
        "h4" => Some(1.0),
        "h5" => Some(0.83),
        "h6" => Some(0.67),
        _ => None,
    }
}

enum Visit {
    Node(NodeId, f64),
    /// A block element's children are done.
    EndBlock,
}

fn push_children(stack: &mut Vec<Visit>, dom: &Dom, node: NodeId, scale: f64) {
    stack.extend(dom.children(node).iter().rev().map(|id| Visit::Node(*id, scale)));
}

struct LineLayout<'m> {
    model: &'m SizeModel,
    height: f64,
    chars: usize,
    scale: f64,
    open: bool,
}

impl LineLayout<'_> {
    /// Lay out the children of `node`. Uses an explicit stack so deep
    /// nesting cannot exhaust the call stack.
    fn walk(&mut self, dom: &Dom, node: NodeId, scale: f64) {
        let mut stack: Vec<Visit> = Vec::new();
        push_children(&mut stack, dom, node, scale);
        while let Some(visit) = stack.pop() {
            let (child, scale) = match visit {
                Visit::Node(child, scale) => (child, scale),
                Visit::EndBlock => {
                    self.flush();
                    continue;
                }
            };
            match dom.kind(child) {
                Some(NodeKind::Text(text)) => {
                    // Whitespace between blocks does not render.
                    if !self.open && text.trim().is_empty() {
                        continue;
                    }
                    self.open = true;
                    self.scale = scale;
                    self.chars += text.chars().count();
                }
                Some(NodeKind::Element(el)) => match el.tag.as_str() {
                    "style" | "script" | "head" => {}
                    "br" => {
                        self.scale = scale;
                        self.open = true;
                        self.flush();
                    }
                    tag if BLOCK_ELEMENTS.contains(&tag) => {
                        self.flush();
                        stack.push(Visit::EndBlock);
                        push_children(&mut stack, dom, child, heading_scale(tag).unwrap_or(scale));
                    }
                    _ => push_children(&mut stack, dom, child, scale),
                },
                _ => {}
            }
        }
    }

    fn flush(&mut self) {
        if !self.open {
            return;
        }
        let per_line = self.model.chars_per_line.max(1) as f64;
        let lines = ((self.chars as f64 * self.scale) / per_line).ceil().max(1.0);
        self.height += lines * f64::from(self.model.line_height) * self.scale;
        self.chars = 0;
        self.open = false;
    }
}

/// Reports the root's height whenever it changes, and once when observation
/// starts.
#[derive(Debug, Default)]
pub struct SizeObserver {
    last: Option<u32>,
}

impl SizeObserver {
    pub fn observe(&mut self, height: u32) -> Option<EditorEvent> {
        if self.last == Some(height) {
            return None;
        }
        self.last = Some(height);
        Some(EditorEvent::DocumentHeight { height })
    }

    pub fn last(&self) -> Option<u32> {
        self.last
    }
}

/// Turns input on the editable root into content-change events.
#[derive(Debug, Default)]
pub struct InputObserver {
    inputs: u64,
}

impl InputObserver {
    pub fn on_input(&mut self, html: String) -> EditorEvent {
        self.inputs += 1;
        EditorEvent::ContentChange { html }
    }

    /// Input events seen since load.
    pub fn inputs(&self) -> u64 {
        self.inputs
    }
}
