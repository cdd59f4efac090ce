//! HTML fragment parsing and inner-HTML serialization.
//!
//! The parser is lenient in the way browsers are lenient with
//! `insertAdjacentHTML`: unknown markup is tolerated, unmatched end tags are
//! dropped and anything left open is closed at end of input. It never fails.

use super::{Dom, Element, NodeId, NodeKind};
use crate::error::DomError;
use regex::{Captures, Regex};
use std::sync::OnceLock;

static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Deepest element nesting a parsed fragment may open. Start tags beyond it
/// are kept as empty elements and their content goes to the deepest open
/// element, as browsers do.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Start tags that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

// ────────────────────────────────────────────────────────────────
// Parsing
// ────────────────────────────────────────────────────────────────

/// Parse `html` into detached top-level nodes, in document order.
pub fn parse_fragment(dom: &mut Dom, html: &str) -> Vec<NodeId> {
    let mut parser = FragmentParser {
        dom,
        input: html,
        pos: 0,
        roots: Vec::new(),
        open: Vec::new(),
    };
    if let Err(err) = parser.run() {
        tracing::warn!(%err, "fragment parse stopped early");
    }
    parser.roots
}

/// Replace every child of `node` with the parsed `html`.
pub fn set_inner_html(dom: &mut Dom, node: NodeId, html: &str) -> Result<(), DomError> {
    dom.remove_children(node)?;
    for child in parse_fragment(dom, html) {
        dom.append_child(node, child)?;
    }
    Ok(())
}

struct FragmentParser<'a, 'd> {
    dom: &'d mut Dom,
    input: &'a str,
    pos: usize,
    roots: Vec<NodeId>,
    open: Vec<NodeId>,
}

impl<'a> FragmentParser<'a, '_> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn run(&mut self) -> Result<(), DomError> {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if let Some(after) = rest.strip_prefix("<!--") {
                let (body, consumed) = match after.find("-->") {
                    Some(end) => (&after[..end], 4 + end + 3),
                    None => (after, rest.len()),
                };
                let comment = self.dom.create_comment(body);
                self.pos += consumed;
                self.append(comment)?;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                // Doctype and processing instructions carry nothing we keep.
                self.pos += rest.find('>').map_or(rest.len(), |i| i + 1);
            } else if rest.starts_with("</") && starts_with_alpha(&rest[2..]) {
                self.end_tag();
            } else if rest.starts_with('<') && starts_with_alpha(&rest[1..]) {
                self.start_tag()?;
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
                let text = decode_entities(&rest[..end]);
                self.pos += end;
                self.append_text(&text)?;
            }
        }
        Ok(())
    }

    fn current_parent(&self) -> Option<NodeId> {
        self.open.last().copied()
    }

    fn append(&mut self, node: NodeId) -> Result<(), DomError> {
        match self.current_parent() {
            Some(parent) => self.dom.append_child(parent, node),
            None => {
                self.roots.push(node);
                Ok(())
            }
        }
    }

    fn append_text(&mut self, text: &str) -> Result<(), DomError> {
        if text.is_empty() {
            return Ok(());
        }
        let last = match self.current_parent() {
            Some(parent) => self.dom.children(parent).last().copied(),
            None => self.roots.last().copied(),
        };
        if let Some(last) = last.filter(|l| self.dom.is_text(*l)) {
            let len = self.dom.len(last);
            return self.dom.replace_data(last, len, 0, text);
        }
        let node = self.dom.create_text(text);
        self.append(node)
    }

    fn close_through(&mut self, index: usize) {
        self.open.truncate(index);
    }

    fn open_position(&self, tag: &str) -> Option<usize> {
        self.open
            .iter()
            .rposition(|id| self.dom.tag_name(*id) == Some(tag))
    }

    fn end_tag(&mut self) {
        let rest = &self.rest()[2..];
        let name = tag_name(rest);
        self.pos += 2 + rest.find('>').map_or(rest.len(), |i| i + 1);
        if let Some(index) = self.open_position(&name) {
            self.close_through(index);
        }
    }

    fn start_tag(&mut self) -> Result<(), DomError> {
        let rest = &self.rest()[1..];
        let name = tag_name(rest);
        let mut cursor = TagCursor {
            src: rest,
            pos: name.len(),
        };
        let mut element = Element::new(&name);
        let self_closing = cursor.attributes(&mut element);
        self.pos += 1 + cursor.pos;

        if CLOSES_PARAGRAPH.contains(&name.as_str()) {
            if let Some(index) = self.open_position("p") {
                self.close_through(index);
            }
        }
        if name == "li" {
            let list = self
                .open
                .iter()
                .rposition(|id| matches!(self.dom.tag_name(*id), Some("ul" | "ol")));
            if let Some(index) = self.open_position("li").filter(|i| list.is_none_or(|l| *i > l)) {
                self.close_through(index);
            }
        }

        let node = self.dom.create_element_with(element);
        self.append(node)?;

        if is_raw_text_element(&name) {
            let body = self.rest();
            let end = find_ignore_case(body, &format!("</{name}")).unwrap_or(body.len());
            let raw = body[..end].to_string();
            let after = &body[end..];
            self.pos += end + after.find('>').map_or(after.len(), |i| i + 1);
            if !raw.is_empty() {
                let text = self.dom.create_text(&raw);
                self.dom.append_child(node, text)?;
            }
        } else if !self_closing && !is_void_element(&name) {
            if self.open.len() < MAX_NESTING_DEPTH {
                self.open.push(node);
            } else {
                tracing::trace!(tag = %name, "nesting limit reached, element left empty");
            }
        }
        Ok(())
    }
}

/// Walks the attribute section of a start tag.
struct TagCursor<'a> {
    src: &'a str,
    pos: usize,
}

impl TagCursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Reads attributes up to and including `>`; returns whether the tag
    /// was written self-closing.
    fn attributes(&mut self, element: &mut Element) -> bool {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return false,
                Some('>') => {
                    self.bump();
                    return false;
                }
                Some('/') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        return true;
                    }
                    continue;
                }
                Some(_) => {}
            }

            let name = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'))
                .to_ascii_lowercase();
            if name.is_empty() {
                self.bump();
                continue;
            }
            self.skip_whitespace();
            let value = if self.peek() == Some('=') {
                self.bump();
                self.skip_whitespace();
                match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let raw = self.take_while(|c| c != quote).to_string();
                        self.bump();
                        decode_entities(&raw)
                    }
                    _ => decode_entities(self.take_while(|c| !c.is_whitespace() && c != '>')),
                }
            } else {
                String::new()
            };
            if element.attr(&name).is_none() {
                element.set_attr(&name, &value);
            }
        }
    }
}

fn starts_with_alpha(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn tag_name(s: &str) -> String {
    s.chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Decode the character references the editor produces and consumes:
/// `&amp; &lt; &gt; &quot; &apos; &nbsp;` and numeric references.
/// Anything else is kept literally.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let regex = ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);")
            .expect("Invalid entity Regex")
    });
    regex
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or(body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().map(numeric_reference)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().map(numeric_reference)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// NUL, surrogates and out-of-range code points become U+FFFD.
fn numeric_reference(code: u32) -> char {
    char::from_u32(code)
        .filter(|c| *c != '\0')
        .unwrap_or('\u{FFFD}')
}

// ────────────────────────────────────────────────────────────────
// Serialization
// ────────────────────────────────────────────────────────────────

pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    serialize(dom, dom.children(node), &mut out);
    out
}

pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    serialize(dom, &[node], &mut out);
    out
}

/// One pending serializer action.
enum Emit {
    Node(NodeId),
    EndTag(NodeId),
}

/// Serialize `nodes` in order. Uses an explicit stack so arbitrarily deep
/// trees cannot exhaust the call stack.
fn serialize(dom: &Dom, nodes: &[NodeId], out: &mut String) {
    let mut stack: Vec<Emit> = nodes.iter().rev().map(|id| Emit::Node(*id)).collect();
    while let Some(step) = stack.pop() {
        let node = match step {
            Emit::Node(node) => node,
            Emit::EndTag(node) => {
                if let Some(tag) = dom.tag_name(node) {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
                continue;
            }
        };
        match dom.kind(node) {
            Some(NodeKind::Document) => {
                stack.extend(dom.children(node).iter().rev().map(|id| Emit::Node(*id)));
            }
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    continue;
                }
                stack.push(Emit::EndTag(node));
                stack.extend(dom.children(node).iter().rev().map(|id| Emit::Node(*id)));
            }
            Some(NodeKind::Text(text)) => {
                let raw = dom
                    .parent(node)
                    .and_then(|p| dom.tag_name(p))
                    .is_some_and(is_raw_text_element);
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            None => {}
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
