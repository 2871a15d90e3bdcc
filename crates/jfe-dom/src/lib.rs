//! DOM tree data structures.
//!
//! The document is an arena: nodes are addressed by [`NodeId`] and never
//! freed. Nodes removed from the tree (for example by
//! [`Document::replace_children`]) stay in the arena as detached nodes, so an
//! id handed out once never points at a different node later.

mod mutation;
mod serialize;

pub use mutation::MutationKind;
pub use mutation::MutationRecord;
pub use mutation::ObserveOptions;
pub use mutation::ObserverId;
pub use serialize::is_void_element;
pub use serialize::TextMode;
pub use serialize::text_mode;

use core::fmt;
use jfe_core::EnlargeError;
use jfe_core::EnlargeResult;
use mutation::ObserverRegistry;

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

/// A single `name="value"` pair. Names are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element payload: tag name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes<I, N, V>(tag_name: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<String>,
    {
        let mut element = Self::new(tag_name);
        for (name, value) in attributes {
            let name = name.as_ref().to_ascii_lowercase();
            // First occurrence wins, as in HTML tokenization.
            if element.attribute(&name).is_none() {
                element.attributes.push(Attribute {
                    name,
                    value: value.into(),
                });
            }
        }
        element
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.eq_ignore_ascii_case(name))
            .map(|attribute| attribute.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|value| !value.is_empty())
    }

    /// Class names from the `class` attribute, in source order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|candidate| candidate == class_name)
    }

    /// Returns true when the stored value changed.
    fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match self
            .attributes
            .iter_mut()
            .find(|attribute| attribute.name == name)
        {
            Some(existing) if existing.value == value => false,
            Some(existing) => {
                existing.value = value.to_owned();
                true
            }
            None => {
                self.attributes.push(Attribute {
                    name,
                    value: value.to_owned(),
                });
                true
            }
        }
    }

    fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes
            .retain(|attribute| !attribute.name.eq_ignore_ascii_case(name));
        self.attributes.len() != before
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena-backed document tree with focus tracking and mutation observers.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    focused: Option<NodeId>,
    observers: ObserverRegistry,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            focused: None,
            observers: ObserverRegistry::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes ever created, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Looks up a node id by arena index.
    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag_name)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attribute(name))
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.element(id)
            .map(|element| element.has_class(class_name))
            .unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// Child ids in document order; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Iterates ancestors from the parent up to the document root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cursor = self.parent(id);
        core::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.parent(current);
            Some(current)
        })
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    /// True when the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.root || self.is_descendant_of(id, self.root)
    }

    /// Concatenated character data of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            None => String::new(),
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => text.clone(),
            Some(NodeKind::Document) | Some(NodeKind::Element(_)) => {
                let mut out = String::new();
                let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
                while let Some(current) = stack.pop() {
                    if let Some(text) = self.text(current) {
                        out.push_str(text);
                    }
                    stack.extend(self.children(current).iter().rev().copied());
                }
                out
            }
        }
    }

    /// First connected element, in tree order, whose `id` attribute matches.
    pub fn element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|candidate| {
            self.element(*candidate)
                .and_then(Element::id)
                .is_some_and(|value| value == id_value)
        })
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|candidate| self.tag_name(*candidate) == Some("body"))
    }

    /// Pre-order iterator over the descendants of `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        core::iter::from_fn(move || {
            let current = stack.pop()?;
            stack.extend(self.children(current).iter().rev().copied());
            Some(current)
        })
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push_node(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Comment(data.into()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> EnlargeResult<()> {
        self.check_attachable(parent, child)?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.queue_record(MutationRecord::child_list(parent));
        Ok(())
    }

    /// Swaps out every child of `parent` for `new_children` (all detached).
    ///
    /// Old children are detached but keep their own subtrees. Queues a single
    /// child-list record for `parent`.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        new_children: Vec<NodeId>,
    ) -> EnlargeResult<()> {
        match self.kind(parent) {
            Some(NodeKind::Document | NodeKind::Element(_)) => {}
            Some(_) => return Err(EnlargeError::NotAnElement(parent.0)),
            None => return Err(EnlargeError::UnknownNode(parent.0)),
        }
        for child in &new_children {
            self.check_attachable(parent, *child)?;
        }

        let old_children = std::mem::take(&mut self.nodes[parent.0].children);
        for old in old_children {
            self.nodes[old.0].parent = None;
        }
        for child in &new_children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children = new_children;

        self.queue_record(MutationRecord::child_list(parent));
        Ok(())
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> EnlargeResult<()> {
        let parent_kind = self
            .kind(parent)
            .ok_or(EnlargeError::UnknownNode(parent.0))?;
        if !matches!(parent_kind, NodeKind::Document | NodeKind::Element(_)) {
            return Err(EnlargeError::NotAnElement(parent.0));
        }

        let child_kind = self.kind(child).ok_or(EnlargeError::UnknownNode(child.0))?;
        if matches!(child_kind, NodeKind::Document) {
            return Err(EnlargeError::InvalidAttach {
                child: child.0,
                reason: "document nodes cannot be children",
            });
        }
        if self.parent(child).is_some() {
            return Err(EnlargeError::InvalidAttach {
                child: child.0,
                reason: "node already has a parent",
            });
        }
        if child == parent || self.is_descendant_of(parent, child) {
            return Err(EnlargeError::InvalidAttach {
                child: child.0,
                reason: "node would become its own ancestor",
            });
        }

        Ok(())
    }

    /// Sets an attribute. Writing the current value is a no-op and queues no
    /// mutation record.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> EnlargeResult<()> {
        let changed = self.element_mut(id)?.set_attribute(name, value);
        if changed {
            self.queue_record(MutationRecord::attribute(id, name));
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> EnlargeResult<()> {
        let changed = self.element_mut(id)?.remove_attribute(name);
        if changed {
            self.queue_record(MutationRecord::attribute(id, name));
        }
        Ok(())
    }

    fn element_mut(&mut self, id: NodeId) -> EnlargeResult<&mut Element> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Ok(element),
            Some(_) => Err(EnlargeError::NotAnElement(id.0)),
            None => Err(EnlargeError::UnknownNode(id.0)),
        }
    }

    pub fn focus(&mut self, id: NodeId) -> EnlargeResult<()> {
        if !self.is_element(id) {
            return Err(if self.contains(id) {
                EnlargeError::NotAnElement(id.0)
            } else {
                EnlargeError::UnknownNode(id.0)
            });
        }
        self.focused = Some(id);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Focused element, provided it is still connected to the document.
    pub fn active_element(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.is_connected(*id))
    }

    /// Registers an observer on `target`. Records queue up until collected
    /// with [`Document::take_records`].
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> EnlargeResult<ObserverId> {
        if !self.contains(target) {
            return Err(EnlargeError::UnknownNode(target.0));
        }
        Ok(self.observers.register(target, options))
    }

    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.disconnect(observer);
    }

    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.take(observer)
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.has_pending()
    }

    fn queue_record(&mut self, record: MutationRecord) {
        let interested = self.observers.interested(&record, |node, observed| {
            self.is_descendant_of(node, observed)
        });
        self.observers.enqueue(&interested, record);
    }

    /// Serialized markup of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> EnlargeResult<String> {
        match self.kind(id) {
            None => Err(EnlargeError::UnknownNode(id.0)),
            Some(NodeKind::Element(_)) | Some(NodeKind::Document) => {
                Ok(serialize::children_markup(self, id))
            }
            Some(_) => Err(EnlargeError::NotAnElement(id.0)),
        }
    }

    /// Serialized markup of `id` itself.
    pub fn outer_html(&self, id: NodeId) -> EnlargeResult<String> {
        if !self.contains(id) {
            return Err(EnlargeError::UnknownNode(id.0));
        }
        Ok(serialize::node_markup(self, id))
    }
}
