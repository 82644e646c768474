//! The document interface consumed by the behaviour layer.
//!
//! Every method is infallible from the caller's point of view. Browser calls
//! that can throw are swallowed by the implementation, and unsupported
//! selectors match nothing. Enhancement code is best-effort and must never
//! stop the page from rendering.

use std::fmt;

/// A live document the behaviour layer can read and mutate.
pub trait Dom {
    /// Handle to an element. Equality is node identity.
    type Node: Clone + PartialEq + fmt::Debug;

    // --- Lookup ---

    /// The `<body>` element, if the document has one.
    fn body(&self) -> Option<Self::Node>;

    /// First element whose `id` attribute equals `id`.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// All elements under `scope` (or the whole document) matching
    /// `selector`, in document order.
    fn query_all(&self, scope: Option<&Self::Node>, selector: &str) -> Vec<Self::Node>;

    /// First element under `scope` matching `selector`.
    fn query(&self, scope: Option<&Self::Node>, selector: &str) -> Option<Self::Node> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node> {
        let mut cursor = Some(node.clone());
        while let Some(current) = cursor {
            if self.matches(&current, selector) {
                return Some(current);
            }
            cursor = self.parent(&current);
        }
        None
    }

    /// Parent element, if attached under one.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Lower-case tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    // --- Attributes and classes ---

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attr(&mut self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    fn add_class(&mut self, node: &Self::Node, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let mut classes = self.attr(node, "class").unwrap_or_default();
        if !classes.trim().is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self.set_attr(node, "class", classes.trim());
    }

    fn remove_class(&mut self, node: &Self::Node, class: &str) {
        let Some(classes) = self.attr(node, "class") else {
            return;
        };
        let kept: Vec<&str> = classes.split_ascii_whitespace().filter(|c| *c != class).collect();
        self.set_attr(node, "class", &kept.join(" "));
    }

    // --- Content ---

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Replace all children with a single text node.
    fn set_text_content(&mut self, node: &Self::Node, text: &str);

    fn inner_html(&self, node: &Self::Node) -> String;

    fn set_inner_html(&mut self, node: &Self::Node, html: &str);

    // --- Form controls ---

    /// Current value of a form control. Checkboxes and radios without a
    /// `value` attribute report `"on"`.
    fn value(&self, node: &Self::Node) -> String;

    fn set_value(&mut self, node: &Self::Node, value: &str);

    fn checked(&self, node: &Self::Node) -> bool;

    fn set_checked(&mut self, node: &Self::Node, checked: bool);

    fn disabled(&self, node: &Self::Node) -> bool {
        self.attr(node, "disabled").is_some()
    }

    fn set_disabled(&mut self, node: &Self::Node, disabled: bool) {
        if disabled {
            self.set_attr(node, "disabled", "");
        } else {
            self.remove_attr(node, "disabled");
        }
    }

    /// HTML constraint validation for a single control. Non-controls are
    /// always valid.
    fn check_validity(&self, node: &Self::Node) -> bool;

    // --- Inline style ---

    /// Inline style property, `None` when unset.
    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Set an inline style property. An empty value removes it.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

    // --- Tree mutation ---

    /// Create a detached element. `None` when the host refuses the tag.
    fn create_element(&mut self, tag: &str) -> Option<Self::Node>;

    /// Append `child` as the last child of `parent`, moving it if attached.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` before `reference` under `parent`. Appends when
    /// `reference` is not a child of `parent`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node);

    /// Detach `node` from its parent.
    fn remove(&mut self, node: &Self::Node);

    /// Whether `node` is attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    // --- Interaction ---

    fn focus(&mut self, node: &Self::Node);

    fn scroll_into_view(&mut self, node: &Self::Node);

    /// Dispatch a plain bubbling event of type `event` at `node`.
    fn dispatch_event(&mut self, node: &Self::Node, event: &str);
}
