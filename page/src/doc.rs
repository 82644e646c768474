//! In-memory document: an arena of element and text nodes.
//!
//! Nodes are never freed; removing a node only detaches it, matching the
//! page-lifetime model of the behaviour layer where detached elements are
//! simply dropped by the browser. Form-control state (`value`, `checked`)
//! lives beside the attributes so that user edits and attribute defaults can
//! diverge the way they do in a browser.
//!
//! Interaction side effects (focus, scroll, dispatched events) are recorded
//! rather than performed, so tests can assert on them.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use crate::DomError;
use crate::dom::Dom;
use crate::html;
use crate::selector::{Combinator, Part, Pseudo, SelectorList, Step};

/// Index of a node in the [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    checked: bool,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    fn input_type(&self) -> String {
        self.attr("type").unwrap_or("text").to_ascii_lowercase()
    }

    fn is_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "select" | "textarea" | "button")
    }

    fn is_toggle(&self) -> bool {
        self.tag == "input" && matches!(self.input_type().as_str(), "checkbox" | "radio")
    }
}

/// In-memory document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    focused: Option<NodeId>,
    scrolled: Vec<NodeId>,
    dispatched: Vec<(NodeId, String)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only an empty `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self::empty();
        doc.append_element(doc.root, "body", Vec::new());
        doc
    }

    /// Parse an HTML page or fragment. Markup without a `<body>` element is
    /// wrapped in one.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::HtmlParse`] when the markup is malformed.
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut doc = Self::empty();
        let root = doc.root;
        html::parse_into(&mut doc, root, source)?;

        if doc.find_descendant(root, |el| el.tag == "body").is_none() {
            let top_level = std::mem::take(&mut doc.nodes[root.0].children);
            let body = doc.append_element(root, "body", Vec::new());
            for child in top_level {
                doc.nodes[child.0].parent = Some(body);
                doc.nodes[body.0].children.push(child);
            }
        }

        doc.initialize_controls(root);
        Ok(doc)
    }

    fn empty() -> Self {
        Self {
            nodes: vec![Node { parent: None, children: Vec::new(), kind: NodeKind::Root }],
            root: NodeId(0),
            focused: None,
            scrolled: Vec::new(),
            dispatched: Vec::new(),
        }
    }

    /// The document root (not an element).
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Serialize an element including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.serialize(node, &mut out);
        out
    }

    /// Element most recently focused through [`Dom::focus`].
    #[must_use]
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Elements scrolled into view, oldest first.
    #[must_use]
    pub fn scrolled_into_view(&self) -> &[NodeId] {
        &self.scrolled
    }

    /// Events dispatched through [`Dom::dispatch_event`], oldest first.
    #[must_use]
    pub fn dispatched_events(&self) -> &[(NodeId, String)] {
        &self.dispatched
    }

    // --- Arena plumbing used by the HTML parser ---

    pub(crate) fn append_element(&mut self, parent: NodeId, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        let element = Element { tag: tag.to_ascii_lowercase(), attrs, value: String::new(), checked: false };
        let id = self.push_node(NodeKind::Element(element));
        self.attach(parent, id, None);
        id
    }

    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        let id = self.push_node(NodeKind::Text(text.to_string()));
        self.attach(parent, id, None);
    }

    pub(crate) fn tag_is(&self, node: NodeId, tag: &str) -> bool {
        self.element(node).is_some_and(|el| el.tag == tag)
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: None, children: Vec::new(), kind });
        id
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Root | NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Root | NodeKind::Text(_) => None,
        }
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent.filter(|parent| self.element(*parent).is_some())
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes[current.0].parent;
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    /// Attach `node` under `parent`, before `reference` when it is a child.
    fn attach(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if self.is_inclusive_ancestor(node, parent) {
            return;
        }
        self.detach(node);
        let children = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|reference| children.iter().position(|child| *child == reference))
            .unwrap_or(children.len());
        children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    fn detach_children(&mut self, node: NodeId) {
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    fn elements_under(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            stack.extend(self.nodes[node.0].children.iter().rev());
        }
        out
    }

    fn find_descendant(&self, scope: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.elements_under(scope)
            .into_iter()
            .find(|node| self.element(*node).is_some_and(&pred))
    }

    /// Seed `value`/`checked` from markup for every control under `scope`.
    fn initialize_controls(&mut self, scope: NodeId) {
        for node in self.elements_under(scope) {
            let Some(el) = self.element(node) else { continue };
            let (value, checked) = match el.tag.as_str() {
                "input" => (el.attr("value").unwrap_or_default().to_string(), el.attr("checked").is_some()),
                "textarea" => (self.text_content(&node), false),
                "select" => (self.initial_select_value(node), false),
                _ => continue,
            };
            if let Some(el) = self.element_mut(node) {
                el.value = value;
                el.checked = checked;
            }
        }
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.elements_under(select)
            .into_iter()
            .filter(|node| self.tag_is(*node, "option"))
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        self.element(option)
            .and_then(|el| el.attr("value").map(str::to_string))
            .unwrap_or_else(|| self.text_content(&option).trim().to_string())
    }

    fn initial_select_value(&self, select: NodeId) -> String {
        let options = self.options(select);
        options
            .iter()
            .find(|option| self.element(**option).is_some_and(|el| el.attr("selected").is_some()))
            .or_else(|| options.first())
            .map(|option| self.option_value(*option))
            .unwrap_or_default()
    }

    fn radio_group(&self, radio: NodeId) -> Vec<NodeId> {
        let Some(name) = self.element(radio).and_then(|el| el.attr("name")).map(str::to_string) else {
            return vec![radio];
        };
        let scope = self.closest(&radio, "form").unwrap_or(self.root);
        self.elements_under(scope)
            .into_iter()
            .filter(|node| {
                self.element(*node).is_some_and(|el| {
                    el.tag == "input" && el.input_type() == "radio" && el.attr("name") == Some(name.as_str())
                })
            })
            .collect()
    }

    // --- Selector matching ---

    fn matches_list(&self, node: NodeId, list: &SelectorList) -> bool {
        list.groups().iter().any(|chain| self.matches_chain(node, chain))
    }

    fn matches_chain(&self, node: NodeId, chain: &[Part]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        self.matches_step(node, &last.step) && self.matches_left(node, rest, last.combinator)
    }

    /// Match the remaining left-hand parts against the ancestors of `node`,
    /// backtracking over descendant combinators.
    fn matches_left(&self, node: NodeId, rest: &[Part], combinator: Option<Combinator>) -> bool {
        let Some((prev, before)) = rest.split_last() else {
            return true;
        };
        match combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => self.parent_element(node).is_some_and(|parent| {
                self.matches_step(parent, &prev.step) && self.matches_left(parent, before, prev.combinator)
            }),
            Combinator::Descendant => {
                let mut cursor = self.parent_element(node);
                while let Some(parent) = cursor {
                    if self.matches_step(parent, &prev.step) && self.matches_left(parent, before, prev.combinator) {
                        return true;
                    }
                    cursor = self.parent_element(parent);
                }
                false
            }
        }
    }

    fn matches_step(&self, node: NodeId, step: &Step) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        if step.tag.as_ref().is_some_and(|tag| *tag != el.tag) {
            return false;
        }
        if step.id.as_ref().is_some_and(|id| el.attr("id") != Some(id.as_str())) {
            return false;
        }
        let classes = el.attr("class").unwrap_or_default();
        if !step.classes.iter().all(|class| classes.split_ascii_whitespace().any(|c| c == class)) {
            return false;
        }
        if !step.attrs.iter().all(|cond| cond.matches(el.attr(cond.name()))) {
            return false;
        }
        step.pseudo.iter().all(|pseudo| match pseudo {
            Pseudo::Checked => el.is_toggle() && el.checked,
            Pseudo::Disabled => el.is_control() && el.attr("disabled").is_some(),
            Pseudo::Enabled => el.is_control() && el.attr("disabled").is_none(),
            Pseudo::Required => el.is_control() && el.attr("required").is_some(),
            Pseudo::Valid => is_validatable(el) && self.check_validity(&node),
            Pseudo::Invalid => is_validatable(el) && !self.check_validity(&node),
        })
    }

    // --- Serialization and style ---

    fn serialize(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => out.push_str(&html::escape_text(text)),
            NodeKind::Root => self.serialize_children(node, out),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html::escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if html::is_void(&el.tag) {
                    return;
                }
                self.serialize_children(node, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    fn serialize_children(&self, node: NodeId, out: &mut String) {
        for child in &self.nodes[node.0].children {
            self.serialize(*child, out);
        }
    }

    fn style_declarations(&self, node: NodeId) -> Vec<(String, String)> {
        self.element(node).and_then(|el| el.attr("style")).map(parse_style).unwrap_or_default()
    }
}

fn is_validatable(el: &Element) -> bool {
    matches!(el.tag.as_str(), "input" | "select" | "textarea")
}

fn parse_style(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

fn serialize_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !value.chars().any(char::is_whitespace)
}

impl Dom for Document {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        self.find_descendant(self.root, |el| el.tag == "body")
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.find_descendant(self.root, |el| el.attr("id") == Some(id))
    }

    fn query_all(&self, scope: Option<&NodeId>, selector: &str) -> Vec<NodeId> {
        let Ok(list) = SelectorList::parse(selector) else {
            return Vec::new();
        };
        let scope = scope.copied().unwrap_or(self.root);
        self.elements_under(scope)
            .into_iter()
            .filter(|node| self.matches_list(*node, &list))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        SelectorList::parse(selector).is_ok_and(|list| self.matches_list(*node, &list))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.parent_element(*node)
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.element(*node).map(|el| el.tag.clone()).unwrap_or_default()
    }

    fn attr(&self, node: &NodeId, name: &str) -> Option<String> {
        self.element(*node)?.attr(&name.to_ascii_lowercase()).map(str::to_string)
    }

    fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let Some(el) = self.element_mut(*node) else {
            return;
        };
        match el.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => el.attrs.push((name, value.to_string())),
        }
    }

    fn remove_attr(&mut self, node: &NodeId, name: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(el) = self.element_mut(*node) {
            el.attrs.retain(|(key, _)| *key != name);
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Root | NodeKind::Element(_) => {
                self.nodes[node.0].children.iter().map(|child| self.text_content(child)).collect()
            }
        }
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        if self.element(*node).is_none() {
            return;
        }
        self.detach_children(*node);
        if !text.is_empty() {
            self.append_text(*node, text);
        }
    }

    fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.serialize_children(*node, &mut out);
        out
    }

    fn set_inner_html(&mut self, node: &NodeId, source: &str) {
        if self.element(*node).is_none() {
            return;
        }
        self.detach_children(*node);
        if html::parse_into(self, *node, source).is_err() {
            self.set_text_content(node, source);
            return;
        }
        self.initialize_controls(*node);
    }

    fn value(&self, node: &NodeId) -> String {
        let Some(el) = self.element(*node) else {
            return String::new();
        };
        match el.tag.as_str() {
            "input" if el.is_toggle() => el.attr("value").unwrap_or("on").to_string(),
            "input" | "textarea" | "select" => el.value.clone(),
            "option" => self.option_value(*node),
            _ => el.attr("value").unwrap_or_default().to_string(),
        }
    }

    fn set_value(&mut self, node: &NodeId, value: &str) {
        let Some(el) = self.element(*node) else {
            return;
        };
        if el.is_toggle() {
            self.set_attr(node, "value", value);
            return;
        }
        let value = if el.tag == "select" {
            let known = self.options(*node).iter().any(|option| self.option_value(*option) == value);
            if known { value.to_string() } else { String::new() }
        } else {
            value.to_string()
        };
        if let Some(el) = self.element_mut(*node) {
            el.value = value;
        }
    }

    fn checked(&self, node: &NodeId) -> bool {
        self.element(*node).is_some_and(|el| el.checked)
    }

    fn set_checked(&mut self, node: &NodeId, checked: bool) {
        let Some(el) = self.element(*node) else {
            return;
        };
        let is_radio = el.tag == "input" && el.input_type() == "radio";
        if checked && is_radio {
            for other in self.radio_group(*node) {
                if let Some(el) = self.element_mut(other) {
                    el.checked = false;
                }
            }
        }
        if let Some(el) = self.element_mut(*node) {
            el.checked = checked;
        }
    }

    fn check_validity(&self, node: &NodeId) -> bool {
        let Some(el) = self.element(*node) else {
            return true;
        };
        if !is_validatable(el) || el.attr("disabled").is_some() {
            return true;
        }
        let input_type = el.input_type();
        if el.tag == "input" && matches!(input_type.as_str(), "submit" | "button" | "reset" | "hidden" | "image") {
            return true;
        }

        if el.attr("required").is_some() {
            let satisfied = match (el.tag.as_str(), input_type.as_str()) {
                ("input", "checkbox") => el.checked,
                ("input", "radio") => self.radio_group(*node).iter().any(|radio| self.checked(radio)),
                _ => !el.value.is_empty(),
            };
            if !satisfied {
                return false;
            }
        }

        if el.is_toggle() || el.value.is_empty() {
            return true;
        }
        if el.tag == "input" && input_type == "email" && !looks_like_email(&el.value) {
            return false;
        }
        let length = el.value.chars().count();
        let limit = |name: &str| el.attr(name).and_then(|raw| raw.trim().parse::<usize>().ok());
        if limit("minlength").is_some_and(|min| length < min) {
            return false;
        }
        !limit("maxlength").is_some_and(|max| length > max)
    }

    fn style(&self, node: &NodeId, property: &str) -> Option<String> {
        let property = property.to_ascii_lowercase();
        self.style_declarations(*node)
            .into_iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value)
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        let mut decls = self.style_declarations(*node);
        decls.retain(|(name, _)| *name != property);
        if !value.trim().is_empty() {
            decls.push((property, value.trim().to_string()));
        }
        if decls.is_empty() {
            self.remove_attr(node, "style");
        } else {
            self.set_attr(node, "style", &serialize_style(&decls));
        }
    }

    fn create_element(&mut self, tag: &str) -> Option<NodeId> {
        if tag.is_empty() {
            return None;
        }
        let element = Element { tag: tag.to_ascii_lowercase(), attrs: Vec::new(), value: String::new(), checked: false };
        Some(self.push_node(NodeKind::Element(element)))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, None);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        self.attach(*parent, *child, Some(*reference));
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, *node)
    }

    fn focus(&mut self, node: &NodeId) {
        self.focused = Some(*node);
    }

    fn scroll_into_view(&mut self, node: &NodeId) {
        self.scrolled.push(*node);
    }

    fn dispatch_event(&mut self, node: &NodeId, event: &str) {
        self.dispatched.push((*node, event.to_string()));
    }
}
