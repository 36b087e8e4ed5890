//! Host document model
//!
//! A small, UI-agnostic stand-in for the browser DOM that the expansion
//! engine edits. It carries exactly what the engine needs:
//! - `Document`: arena of nodes addressed by copyable `NodeId`s
//! - Text leaves and elements (tag, `contenteditable`, form-control state)
//! - A single collapsed selection (the caret)
//! - A log of dispatched `input` notifications the host can observe
//!
//! All offsets count chars, not bytes.

mod range;

pub use range::{Range, RangeError};
pub(crate) use range::text_offset_within;

use smallvec::SmallVec;

use crate::utils::char_len;

/// Opaque handle to a node owned by a `Document`.
///
/// Ids are never reused; a node detached by `set_text_content` keeps its id
/// but no longer has a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Value of an element's `contenteditable` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEditable {
    True,
    PlaintextOnly,
    False,
    /// Attribute absent: the state comes from the parent element
    #[default]
    Inherit,
}

/// Flat-buffer state of an `INPUT` or `TEXTAREA`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormControl {
    /// The `type` attribute of an `INPUT`; `None` for `TEXTAREA`
    pub input_type: Option<String>,
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
}

impl FormControl {
    /// Replace the value and collapse the selection to `caret`.
    pub fn set_value(&mut self, value: String, caret: usize) {
        let caret = caret.min(char_len(&value));
        self.value = value;
        self.selection_start = caret;
        self.selection_end = caret;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Upper-case tag name (`DIV`, `INPUT`, ...)
    pub tag: String,
    pub content_editable: ContentEditable,
    pub control: Option<FormControl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Text(String),
    Element(ElementData),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

/// A collapsed caret: (anchor node, offset within that node).
///
/// For a text node the offset counts chars; for an element it counts
/// children, as in the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

/// Synthetic notification dispatched on a mutated element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub target: NodeId,
    pub kind: &'static str,
    pub bubbles: bool,
}

/// A key press delivered to the engine before the host handles it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub target: NodeId,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, target: NodeId) -> Self {
        Self {
            key: key.into(),
            target,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    selection: Option<Caret>,
    input_events: Vec<InputEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `BODY` root.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Element(ElementData {
                tag: "BODY".to_string(),
                content_editable: ContentEditable::Inherit,
                control: None,
            }),
            parent: None,
            children: SmallVec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            selection: None,
            input_events: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: SmallVec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_uppercase(),
            content_editable: ContentEditable::Inherit,
            control: None,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// Text nodes cannot have children, and a node cannot be appended under
    /// itself or its own descendants; both are ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.is_text(parent) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    /// Append an `INPUT` of the given type holding `value`, caret at the end.
    pub fn append_input(&mut self, parent: NodeId, input_type: Option<&str>, value: &str) -> NodeId {
        let id = self.append_element(parent, "INPUT");
        self.attach_control(id, input_type.map(str::to_string), value);
        id
    }

    /// Append a `TEXTAREA` holding `value`, caret at the end.
    pub fn append_textarea(&mut self, parent: NodeId, value: &str) -> NodeId {
        let id = self.append_element(parent, "TEXTAREA");
        self.attach_control(id, None, value);
        id
    }

    fn attach_control(&mut self, id: NodeId, input_type: Option<String>, value: &str) {
        let caret = char_len(value);
        if let Some(element) = self.element_mut(id) {
            element.control = Some(FormControl {
                input_type,
                value: value.to_string(),
                selection_start: caret,
                selection_end: caret,
            });
        }
    }

    pub fn set_content_editable(&mut self, id: NodeId, state: ContentEditable) {
        if let Some(element) = self.element_mut(id) {
            element.content_editable = state;
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    /// Literal text of a text leaf; `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn control(&self, id: NodeId) -> Option<&FormControl> {
        self.element(id).and_then(|e| e.control.as_ref())
    }

    pub fn control_mut(&mut self, id: NodeId) -> Option<&mut FormControl> {
        self.element_mut(id).and_then(|e| e.control.as_mut())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The parent if it is an element (text nodes never parent anything).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| !self.is_text(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|c| *c == id)?;
        idx.checked_sub(1).map(|prev| siblings[prev])
    }

    /// Index of `id` within its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// DOM node length: chars for text, child count for elements.
    pub fn node_length(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text(text) => char_len(text),
            NodeKind::Element(_) => self.children(id).len(),
        }
    }

    /// True if `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Concatenated text of every text leaf under `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    /// Char length of `text_content(id)` without materializing it.
    pub fn text_len(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text(text) => char_len(text),
            NodeKind::Element(_) => self.children(id).iter().map(|c| self.text_len(*c)).sum(),
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let mut stack: Vec<NodeId> = vec![id];
        while let Some(current) = stack.pop() {
            match &self.node(current).kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(_) => stack.extend(self.children(current).iter().rev()),
            }
        }
    }

    /// Replace every child of `id` with a single text node holding `text`.
    ///
    /// An empty string leaves the element with no children. On a text node
    /// this replaces its data instead.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text(data) = &mut self.nodes[id.0].kind {
            *data = text.to_string();
            return;
        }
        let old_children = std::mem::take(&mut self.nodes[id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            self.append_text(id, text);
        }
    }

    /// First text leaf under `id` in pre-order, or `None` if there is none.
    pub fn first_text_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = vec![id];
        while let Some(current) = stack.pop() {
            if self.is_text(current) {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev());
        }
        None
    }

    /// Effective `isContentEditable` of an element.
    ///
    /// Walks up through `Inherit` until an element sets the attribute.
    /// Text nodes are never content-editable themselves.
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        if self.is_text(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(element) = self.element(node) {
                match element.content_editable {
                    ContentEditable::True | ContentEditable::PlaintextOnly => return true,
                    ContentEditable::False => return false,
                    ContentEditable::Inherit => {}
                }
            }
            current = self.parent(node);
        }
        false
    }

    pub fn selection(&self) -> Option<Caret> {
        self.selection
    }

    /// Collapse the selection to (`node`, `offset`).
    pub fn set_caret(&mut self, node: NodeId, offset: usize) {
        self.selection = Some(Caret { node, offset });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Record a bubbling `input` notification on `target`.
    pub fn dispatch_input_event(&mut self, target: NodeId) {
        self.input_events.push(InputEvent {
            target,
            kind: "input",
            bubbles: true,
        });
    }

    pub fn input_events(&self) -> &[InputEvent] {
        &self.input_events
    }
}

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;
