//! Terminal host - A [`Document`] drawn to the terminal.
//!
//! Mutations go straight to the wrapped document and mark [`Dirty`] flags.
//! Drawing lays the container subtree out as lines and, like a diff renderer,
//! only rewrites lines that changed since the previous frame.
//!
//! # Layout
//!
//! ```text
//! block tags (div, p, h1, li, ...)  start a new line, indented by depth
//! button                            [ label ]
//! input                             [value]
//! everything else                   inline, inheriting text attributes
//! ```
//!
//! # Input
//!
//! - Tab / Shift+Tab move focus between nodes listening for `click` or `input`
//! - Enter / Space dispatch `click` on the focused node
//! - Printable keys and Backspace edit a focused `input` and dispatch `input`

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};

use super::Host;
use super::document::{Document, DocumentError, NodeId, NodeKind};
use crate::element::{EventHandler, NODE_VALUE, PropValue};
use crate::types::{Attr, HostEvent};

bitflags::bitflags! {
    /// What changed in the document since the last draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        const STRUCTURE = 1 << 0;
        const TEXT = 1 << 1;
        const PROPS = 1 << 2;
        const LISTENERS = 1 << 3;
        const FOCUS = 1 << 4;
    }
}

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "ul", "ol", "li", "section", "header", "footer", "main", "form",
];

fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

// =============================================================================
// Lines
// =============================================================================

/// Run of text sharing one set of attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub attr: Attr,
}

/// One drawn row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub indent: u16,
    pub spans: Vec<Span>,
}

impl Line {
    fn new(indent: u16) -> Self {
        Self {
            indent,
            spans: Vec::new(),
        }
    }

    /// Plain text of the row, indentation included.
    pub fn text(&self) -> String {
        let mut out = " ".repeat(self.indent as usize * 2);
        for span in &self.spans {
            out.push_str(&span.text);
        }
        out
    }
}

// =============================================================================
// Terminal Host
// =============================================================================

#[derive(Debug, Default)]
pub struct TerminalHost {
    doc: Document,
    dirty: Dirty,
    focus: Option<NodeId>,
    previous: Option<Vec<Line>>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn create_container(&mut self) -> NodeId {
        self.dirty |= Dirty::STRUCTURE;
        self.doc.create_container("root")
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    /// Forget the previous frame so the next draw rewrites every line.
    pub fn invalidate(&mut self) {
        self.previous = None;
        self.dirty |= Dirty::STRUCTURE;
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    /// Nodes under `root` that can take focus, in document order.
    pub fn focusable(&self, root: NodeId) -> Vec<NodeId> {
        self.doc
            .descendants(root)
            .into_iter()
            .filter(|&id| {
                self.doc.listener_count(id, "click") > 0
                    || self.doc.listener_count(id, "input") > 0
                    || self.doc.node(id).and_then(|n| n.tag()) == Some("input")
            })
            .collect()
    }

    /// Move focus forward (or backward) through focusable nodes, wrapping.
    pub fn cycle_focus(&mut self, root: NodeId, backward: bool) {
        let nodes = self.focusable(root);
        if nodes.is_empty() {
            self.focus = None;
            return;
        }

        let current = self.focus.and_then(|f| nodes.iter().position(|&n| n == f));
        let next = match (current, backward) {
            (None, false) => 0,
            (None, true) => nodes.len() - 1,
            (Some(i), false) => (i + 1) % nodes.len(),
            (Some(i), true) => (i + nodes.len() - 1) % nodes.len(),
        };
        self.focus = Some(nodes[next]);
        self.dirty |= Dirty::FOCUS;
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Route a key press. Returns true if it was handled.
    pub fn handle_key(&mut self, root: NodeId, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(root, false);
                true
            }
            KeyCode::BackTab => {
                self.cycle_focus(root, true);
                true
            }
            code => {
                if self.focus.is_some_and(|f| !self.doc.contains(f)) {
                    self.focus = None;
                }
                let Some(focused) = self.focus else { return false };
                let is_input = self.doc.node(focused).and_then(|n| n.tag()) == Some("input");

                match code {
                    KeyCode::Enter | KeyCode::Char(' ') if !is_input => {
                        self.doc.dispatch(focused, &HostEvent::click()) > 0
                    }
                    KeyCode::Enter if is_input => self.doc.dispatch(focused, &HostEvent::click()) > 0,
                    KeyCode::Char(c) if is_input && !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        let mut value = self.input_value(focused);
                        value.push(c);
                        self.commit_input(focused, value)
                    }
                    KeyCode::Backspace if is_input => {
                        let mut value = self.input_value(focused);
                        value.pop();
                        self.commit_input(focused, value)
                    }
                    _ => false,
                }
            }
        }
    }

    fn input_value(&self, node: NodeId) -> String {
        self.doc.property(node, "value").map(PropValue::to_text).unwrap_or_default()
    }

    fn commit_input(&mut self, node: NodeId, value: String) -> bool {
        // The host owns what the user typed, like a browser input does.
        if self.doc.set_property(&node, "value", Some(&PropValue::from(value.as_str()))).is_err() {
            return false;
        }
        self.dirty |= Dirty::PROPS;
        self.doc.dispatch(node, &HostEvent::with_value("input", value));
        true
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Lay the subtree under `root` out as lines.
    pub fn layout(&self, root: NodeId) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current = Line::new(0);
        for &child in self.doc.children(root) {
            self.layout_node(child, 0, Attr::NONE, &mut current, &mut lines);
        }
        flush_line(&mut current, &mut lines, 0);
        lines
    }

    fn layout_node(&self, id: NodeId, depth: u16, inherited: Attr, current: &mut Line, lines: &mut Vec<Line>) {
        let Some(node) = self.doc.node(id) else { return };
        let focused = self.focus == Some(id);

        match &node.kind {
            NodeKind::Text => {
                let text = node.properties.get(NODE_VALUE).map(PropValue::to_text).unwrap_or_default();
                if !text.is_empty() {
                    current.spans.push(Span { text, attr: inherited });
                }
            }
            NodeKind::Element(tag) if tag == "button" => {
                let mut attr = inherited | Attr::BOLD;
                if focused {
                    attr |= Attr::INVERSE;
                }
                let label = self.doc.text_content(id);
                current.spans.push(Span { text: format!("[ {label} ]"), attr });
            }
            NodeKind::Element(tag) if tag == "input" => {
                let mut attr = inherited | Attr::UNDERLINE;
                if focused {
                    attr |= Attr::INVERSE;
                }
                current.spans.push(Span { text: format!("[{}]", self.input_value(id)), attr });
            }
            NodeKind::Element(tag) if is_block(tag) => {
                flush_line(current, lines, depth);
                let attr = inherited | Attr::for_tag(tag);
                for &child in &node.children {
                    self.layout_node(child, depth + 1, attr, current, lines);
                }
                flush_line(current, lines, depth);
            }
            NodeKind::Element(tag) => {
                let attr = inherited | Attr::for_tag(tag);
                for &child in &node.children {
                    self.layout_node(child, depth, attr, current, lines);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Draw the subtree under `root` starting at terminal row `origin`.
    ///
    /// Only lines that differ from the previous frame are written.
    /// Returns true if anything was written.
    pub fn draw(&mut self, out: &mut impl Write, root: NodeId, origin: u16) -> io::Result<bool> {
        let lines = self.layout(root);
        let mut changed = false;

        for (y, line) in lines.iter().enumerate() {
            let unchanged = self.previous.as_ref().and_then(|prev| prev.get(y)) == Some(line);
            if unchanged {
                continue;
            }
            changed = true;

            queue!(
                out,
                MoveTo(0, origin.saturating_add(y as u16)),
                Clear(ClearType::CurrentLine),
                Print(" ".repeat(line.indent as usize * 2))
            )?;
            for span in &line.spans {
                for attribute in attributes(span.attr) {
                    queue!(out, SetAttribute(attribute))?;
                }
                queue!(out, Print(&span.text), SetAttribute(Attribute::Reset))?;
            }
        }

        // Rows left over from a longer previous frame
        let stale = self.previous.as_ref().map_or(0, Vec::len);
        for y in lines.len()..stale {
            changed = true;
            queue!(out, MoveTo(0, origin.saturating_add(y as u16)), Clear(ClearType::CurrentLine))?;
        }

        out.flush()?;
        self.previous = Some(lines);
        self.dirty = Dirty::empty();
        Ok(changed)
    }
}

fn flush_line(current: &mut Line, lines: &mut Vec<Line>, indent: u16) {
    if !current.spans.is_empty() {
        lines.push(std::mem::replace(current, Line::new(indent)));
    } else {
        current.indent = indent;
    }
}

fn attributes(attr: Attr) -> Vec<Attribute> {
    let mut out = Vec::new();
    if attr.contains(Attr::BOLD) {
        out.push(Attribute::Bold);
    }
    if attr.contains(Attr::DIM) {
        out.push(Attribute::Dim);
    }
    if attr.contains(Attr::UNDERLINE) {
        out.push(Attribute::Underlined);
    }
    if attr.contains(Attr::INVERSE) {
        out.push(Attribute::Reverse);
    }
    out
}

// =============================================================================
// Host Implementation
// =============================================================================

impl Host for TerminalHost {
    type Node = NodeId;
    type Error = DocumentError;

    fn create_text_node(&mut self, text: &str) -> Result<NodeId, DocumentError> {
        self.doc.create_text_node(text)
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DocumentError> {
        self.doc.create_element(tag)
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: Option<&PropValue>) -> Result<(), DocumentError> {
        self.doc.set_property(node, name, value)?;
        self.dirty |= if name == NODE_VALUE { Dirty::TEXT } else { Dirty::PROPS };
        Ok(())
    }

    fn add_event_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) -> Result<(), DocumentError> {
        self.doc.add_event_listener(node, event, handler)?;
        self.dirty |= Dirty::LISTENERS;
        Ok(())
    }

    fn remove_event_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) -> Result<(), DocumentError> {
        self.doc.remove_event_listener(node, event, handler)?;
        self.dirty |= Dirty::LISTENERS;
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DocumentError> {
        self.doc.append_child(parent, child)?;
        self.dirty |= Dirty::STRUCTURE;
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DocumentError> {
        self.doc.remove_child(parent, child)?;
        self.dirty |= Dirty::STRUCTURE;
        if self.focus.is_some_and(|f| f == *child || !self.doc.contains(f)) {
            self.focus = None;
        }
        Ok(())
    }

    fn discard(&mut self, node: &NodeId) -> Result<(), DocumentError> {
        self.doc.discard(node)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// root > div > [h1 > "Title", p > "Count: 0", button > "+"]
    fn counter_page(host: &mut TerminalHost) -> (NodeId, NodeId) {
        let root = host.create_container();
        let div = host.create_element("div").unwrap();
        let h1 = host.create_element("h1").unwrap();
        let title = host.create_text_node("Title").unwrap();
        let p = host.create_element("p").unwrap();
        let count = host.create_text_node("Count: 0").unwrap();
        let button = host.create_element("button").unwrap();
        let plus = host.create_text_node("+").unwrap();

        host.append_child(&root, &div).unwrap();
        host.append_child(&div, &h1).unwrap();
        host.append_child(&h1, &title).unwrap();
        host.append_child(&div, &p).unwrap();
        host.append_child(&p, &count).unwrap();
        host.append_child(&div, &button).unwrap();
        host.append_child(&button, &plus).unwrap();
        (root, button)
    }

    #[test]
    fn test_layout_lines() {
        let mut host = TerminalHost::new();
        let (root, _) = counter_page(&mut host);

        let lines = host.layout(root);
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(texts, vec!["  Title", "  Count: 0", "  [ + ]"]);
        assert_eq!(lines[0].spans[0].attr, Attr::BOLD);
    }

    #[test]
    fn test_dirty_flags_track_mutations() {
        let mut host = TerminalHost::new();
        let (root, _) = counter_page(&mut host);
        assert!(host.dirty().contains(Dirty::STRUCTURE));

        let mut sink = Vec::new();
        assert!(host.draw(&mut sink, root, 0).unwrap());
        assert_eq!(host.dirty(), Dirty::empty());

        let text = host.document().find_by_tag(root, "p").map(|p| host.document().children(p)[0]).unwrap();
        host.set_property(&text, NODE_VALUE, Some(&PropValue::from("Count: 1"))).unwrap();
        assert_eq!(host.dirty(), Dirty::TEXT);
    }

    #[test]
    fn test_draw_skips_unchanged_lines() {
        let mut host = TerminalHost::new();
        let (root, _) = counter_page(&mut host);

        let mut first = Vec::new();
        assert!(host.draw(&mut first, root, 0).unwrap());
        assert!(!first.is_empty());

        let mut second = Vec::new();
        assert!(!host.draw(&mut second, root, 0).unwrap());

        host.invalidate();
        let mut third = Vec::new();
        assert!(host.draw(&mut third, root, 0).unwrap());
    }

    #[test]
    fn test_draw_near_bottom_row() {
        let mut host = TerminalHost::new();
        let (root, _) = counter_page(&mut host);

        let mut out = Vec::new();
        assert!(host.draw(&mut out, root, u16::MAX - 1).unwrap());

        // Shorter frame clears stale rows past the last addressable one
        let div = host.document().find_by_tag(root, "div").unwrap();
        host.remove_child(&root, &div).unwrap();
        assert!(host.draw(&mut out, root, u16::MAX - 1).unwrap());
    }

    #[test]
    fn test_removing_focused_subtree_clears_focus() {
        let mut host = TerminalHost::new();
        let (root, button) = counter_page(&mut host);
        host.cycle_focus(root, false);
        assert_eq!(host.focused(), Some(button));

        let div = host.document().find_by_tag(root, "div").unwrap();
        host.remove_child(&root, &div).unwrap();

        assert_eq!(host.focused(), None);
        assert!(!host.document().contains(button));
    }

    #[test]
    fn test_focus_and_click() {
        let mut host = TerminalHost::new();
        let (root, button) = counter_page(&mut host);

        let clicks = Rc::new(RefCell::new(0));
        let handler = {
            let clicks = clicks.clone();
            EventHandler::new(move |_| *clicks.borrow_mut() += 1)
        };
        host.add_event_listener(&button, "click", &handler).unwrap();

        // Nothing focused yet
        assert!(!host.handle_key(root, press(KeyCode::Enter)));

        assert!(host.handle_key(root, press(KeyCode::Tab)));
        assert_eq!(host.focused(), Some(button));
        assert!(host.handle_key(root, press(KeyCode::Enter)));
        assert!(host.handle_key(root, press(KeyCode::Char(' '))));
        assert_eq!(*clicks.borrow(), 2);

        let lines = host.layout(root);
        assert!(lines[2].spans[0].attr.contains(Attr::INVERSE));
    }

    #[test]
    fn test_typing_into_input() {
        let mut host = TerminalHost::new();
        let root = host.create_container();
        let input = host.create_element("input").unwrap();
        host.append_child(&root, &input).unwrap();
        host.set_property(&input, "value", Some(&PropValue::from("ab"))).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let handler = {
            let seen = seen.clone();
            EventHandler::new(move |e: &HostEvent| seen.borrow_mut().push(e.value.clone().unwrap_or_default()))
        };
        host.add_event_listener(&input, "input", &handler).unwrap();

        host.cycle_focus(root, false);
        assert!(host.handle_key(root, press(KeyCode::Char('c'))));
        assert!(host.handle_key(root, press(KeyCode::Backspace)));

        assert_eq!(*seen.borrow(), vec!["abc".to_string(), "ab".to_string()]);
        assert_eq!(host.layout(root)[0].text(), "[ab]");
    }
}
