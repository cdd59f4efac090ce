//! Embedded document runtime.
//!
//! Everything that runs on the document side of the bridge: it owns the
//! live tree, reads injected statements, applies them and queues the
//! messages the document posts back to the host. One instance per loaded
//! document; nothing here is global.

pub mod formatting;
pub mod observer;

use crate::dom::html::{self, parse_fragment};
use crate::dom::{BoundaryPoint, Dom, NodeId, Range, RangeId};
use crate::error::{DomError, StatementError};
use crate::protocol::{Command, CommandName, EditorEvent, parse_statement};
use crate::template::EDITOR_ID;
use observer::{InputObserver, SizeModel, SizeObserver};
use std::collections::VecDeque;
use uuid::Uuid;

/// The user's selection: one live range plus its direction.
#[derive(Debug, Clone, Copy)]
struct Selection {
    range: RangeId,
    /// Anchor is the end point, focus the start point.
    backward: bool,
}

#[derive(Debug)]
pub struct EmbeddedRuntime {
    id: Uuid,
    namespace: String,
    dom: Dom,
    root: NodeId,
    head: NodeId,
    selection: Option<Selection>,
    focused: bool,
    size_model: SizeModel,
    size_observer: SizeObserver,
    input_observer: InputObserver,
    outbox: VecDeque<String>,
}

impl EmbeddedRuntime {
    /// Parse `document` and start observing its editable root.
    ///
    /// Observation starts immediately, so the first message queued is the
    /// initial `documentHeight`.
    pub fn load(
        document: &str,
        namespace: &str,
        size_model: SizeModel,
    ) -> Result<Self, DomError> {
        let mut dom = Dom::new();
        let doc = dom.document();
        for node in parse_fragment(&mut dom, document) {
            dom.append_child(doc, node)?;
        }

        let root = dom
            .find_by_id(EDITOR_ID)
            .ok_or_else(|| DomError::MissingRoot(EDITOR_ID.to_string()))?;
        let head = match dom.find_by_tag("head") {
            Some(head) => head,
            None => {
                let head = dom.create_element("head");
                let parent = dom.find_by_tag("html").unwrap_or(doc);
                let first = dom.children(parent).first().copied();
                dom.insert_before(parent, head, first)?;
                head
            }
        };

        let mut runtime = Self {
            id: Uuid::new_v4(),
            namespace: namespace.to_string(),
            dom,
            root,
            head,
            selection: None,
            focused: false,
            size_model,
            size_observer: SizeObserver::default(),
            input_observer: InputObserver::default(),
            outbox: VecDeque::new(),
        };
        tracing::debug!(runtime = %runtime.id, namespace, "document loaded");
        runtime.observe_size();
        Ok(runtime)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // ────────────────────────────────────────────────────────────────
    // Injected statements
    // ────────────────────────────────────────────────────────────────

    /// Run one injected statement. A rejected statement changes nothing.
    pub fn execute(&mut self, script: &str) -> Result<(), StatementError> {
        let command = parse_statement(&self.namespace, script)?;
        self.apply(&command);
        Ok(())
    }

    /// Apply a decoded command, then let the observers report.
    ///
    /// Failures inside a command are logged and swallowed: nothing can be
    /// returned across the bridge.
    pub fn apply(&mut self, command: &Command) {
        tracing::trace!(runtime = %self.id, command = %command.name, "apply");
        let outcome = match command.name {
            CommandName::Focus => {
                self.focused = true;
                Ok(false)
            }
            CommandName::Blur => {
                self.focused = false;
                Ok(false)
            }
            CommandName::SetHtml => self.set_html(command.arg(0)).map(|()| false),
            CommandName::InsertHtml => self.insert_html(command.arg(0).unwrap_or_default()),
            CommandName::SurroundSelection => self.surround_selection(
                command.arg(0).unwrap_or_default(),
                command.arg(1).unwrap_or_default(),
            ),
            CommandName::SurroundSelectionTag => {
                self.surround_selection_tag(command.arg(0).unwrap_or_default())
            }
            CommandName::ToggleSelectionTag => {
                self.toggle_selection_tag(command.arg(0).unwrap_or_default())
            }
            CommandName::SetPlaceholder => self
                .dom
                .set_attr(self.root, "placeholder", command.arg(0).unwrap_or_default())
                .map(|()| false),
            CommandName::InjectCss => self.inject_css(command.arg(0).unwrap_or_default()),
        };

        match outcome {
            Ok(input) => self.after_mutation(input),
            Err(err) => {
                tracing::warn!(runtime = %self.id, command = %command.name, %err, "command failed");
                self.observe_size();
            }
        }
    }

    fn set_html(&mut self, html: Option<&str>) -> Result<(), DomError> {
        html::set_inner_html(&mut self.dom, self.root, html.unwrap_or_default())
    }

    fn insert_html(&mut self, html: &str) -> Result<bool, DomError> {
        match self.selection_in_root() {
            Some(selection) => formatting::insert_html(&mut self.dom, selection.range, html)?,
            None => formatting::append_html(&mut self.dom, self.root, html)?,
        }
        Ok(true)
    }

    fn surround_selection(&mut self, before: &str, after: &str) -> Result<bool, DomError> {
        let Some(selection) = self.selection_in_root() else {
            tracing::debug!(runtime = %self.id, "surroundSelection without selection");
            return Ok(false);
        };
        formatting::surround_selection(&mut self.dom, selection.range, before, after)?;
        Ok(true)
    }

    fn surround_selection_tag(&mut self, tag_name: &str) -> Result<bool, DomError> {
        let Some(selection) = self.selection_in_root() else {
            tracing::debug!(runtime = %self.id, "surroundSelectionTag without selection");
            return Ok(false);
        };
        formatting::surround_selection_tag(&mut self.dom, selection.range, tag_name)?;
        Ok(true)
    }

    fn toggle_selection_tag(&mut self, tag_name: &str) -> Result<bool, DomError> {
        let Some(selection) = self.selection_in_root() else {
            tracing::debug!(runtime = %self.id, "toggleSelectionTag without selection");
            return Ok(false);
        };
        let anchor = self.anchor_of(selection)?.node;
        formatting::toggle_selection_tag(&mut self.dom, self.root, selection.range, anchor, tag_name)?;
        Ok(true)
    }

    fn inject_css(&mut self, css: &str) -> Result<bool, DomError> {
        let style = self.dom.create_element("style");
        let text = self.dom.create_text(css);
        self.dom.append_child(style, text)?;
        self.dom.append_child(self.head, style)?;
        Ok(false)
    }

    fn after_mutation(&mut self, input: bool) {
        if input {
            let html = self.inner_html();
            let event = self.input_observer.on_input(html);
            self.post(event);
        }
        self.observe_size();
    }

    fn observe_size(&mut self) {
        let height = self.size_model.measure(&self.dom, self.root);
        if let Some(event) = self.size_observer.observe(height) {
            self.post(event);
        }
    }

    fn post(&mut self, event: EditorEvent) {
        self.outbox.push_back(event.to_message());
    }

    // ────────────────────────────────────────────────────────────────
    // Selection
    // ────────────────────────────────────────────────────────────────

    fn selection_in_root(&self) -> Option<Selection> {
        let selection = self.selection?;
        let range = self.dom.range(selection.range)?;
        let inside = |point: BoundaryPoint| self.dom.is_inclusive_ancestor(self.root, point.node);
        (inside(range.start) && inside(range.end)).then_some(selection)
    }

    fn anchor_of(&self, selection: Selection) -> Result<BoundaryPoint, DomError> {
        let range = self
            .dom
            .range(selection.range)
            .ok_or(DomError::UnknownRange(selection.range.index()))?;
        Ok(if selection.backward { range.end } else { range.start })
    }

    /// Select from `anchor` to `focus`, as a pointer drag would. Selecting
    /// inside the editable root focuses it.
    pub fn select(&mut self, anchor: BoundaryPoint, focus: BoundaryPoint) -> Result<(), DomError> {
        let backward = self.dom.compare_points(anchor, focus) == std::cmp::Ordering::Greater;
        let (start, end) = if backward { (focus, anchor) } else { (anchor, focus) };

        let range = match self.selection {
            Some(selection) => selection.range,
            None => self.dom.create_range(Range::collapsed_at(start)),
        };
        self.selection = Some(Selection { range, backward });
        self.dom.set_start(range, start)?;
        self.dom.set_end(range, end)?;

        if self.dom.is_inclusive_ancestor(self.root, start.node) {
            self.focused = true;
        }
        Ok(())
    }

    pub fn set_caret(&mut self, point: BoundaryPoint) -> Result<(), DomError> {
        self.select(point, point)
    }

    pub fn select_node_contents(&mut self, node: NodeId) -> Result<(), DomError> {
        let end = BoundaryPoint::new(node, self.dom.len(node));
        self.select(BoundaryPoint::new(node, 0), end)
    }

    /// Select the first occurrence of `needle` inside a single text node of
    /// the editable root. Returns whether it was found.
    pub fn select_text(&mut self, needle: &str) -> Result<bool, DomError> {
        let Some(found) = self.find_text(needle) else {
            return Ok(false);
        };
        let end = BoundaryPoint::new(found.node, found.offset + needle.chars().count());
        self.select(found, end)?;
        Ok(true)
    }

    /// Where `needle` starts, searching text nodes of the editable root in
    /// document order.
    pub fn find_text(&self, needle: &str) -> Option<BoundaryPoint> {
        self.dom.descendants(self.root).into_iter().find_map(|node| {
            let data = self.dom.data(node).filter(|_| self.dom.is_text(node))?;
            let byte = data.find(needle)?;
            Some(BoundaryPoint::new(node, data[..byte].chars().count()))
        })
    }

    pub fn clear_selection(&mut self) {
        if let Some(selection) = self.selection.take() {
            self.dom.release_range(selection.range);
        }
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection.and_then(|s| self.dom.range(s.range))
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection().map(|range| self.dom.range_text(&range))
    }

    // ────────────────────────────────────────────────────────────────
    // User input
    // ────────────────────────────────────────────────────────────────

    /// Type into the focused editor at the selection, or at the end of the
    /// editable root when nothing is selected. Fires an input event.
    pub fn type_text(&mut self, text: &str) {
        if !self.focused {
            tracing::debug!(runtime = %self.id, "typing ignored, editor not focused");
            return;
        }
        let typed = match self.selection_in_root() {
            Some(selection) => formatting::type_text(&mut self.dom, selection.range, text),
            None => self.type_at_end(text),
        };
        match typed {
            Ok(()) => self.after_mutation(true),
            Err(err) => tracing::warn!(runtime = %self.id, %err, "typing failed"),
        }
    }

    fn type_at_end(&mut self, text: &str) -> Result<(), DomError> {
        match self.dom.children(self.root).last().copied() {
            Some(last) if self.dom.is_text(last) => {
                let len = self.dom.len(last);
                self.dom.replace_data(last, len, 0, text)
            }
            _ => {
                let node = self.dom.create_text(text);
                self.dom.append_child(self.root, node)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Inspection
    // ────────────────────────────────────────────────────────────────

    /// Take every message posted since the last drain, oldest first.
    pub fn drain_messages(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    pub fn inner_html(&self) -> String {
        html::inner_html(&self.dom, self.root)
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.dom.attr(self.root, "placeholder")
    }

    /// Text of every `<style>` block in the head, in order.
    pub fn styles(&self) -> Vec<String> {
        self.dom
            .children(self.head)
            .iter()
            .filter(|id| self.dom.tag_name(**id) == Some("style"))
            .map(|id| self.dom.text_content(*id))
            .collect()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Current measured height of the editable root.
    pub fn document_height(&self) -> u32 {
        self.size_model.measure(&self.dom, self.root)
    }

    /// Input events fired since load.
    pub fn input_events(&self) -> u64 {
        self.input_observer.inputs()
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}
