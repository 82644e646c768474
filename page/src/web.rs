//! Browser-backed [`Dom`] implementation over `web_sys`.
//!
//! Every call forwards to the live document. Methods that can throw in
//! JavaScript (`querySelectorAll` with a bad selector, `insertBefore` with a
//! stale reference) are treated as "no result" so enhancement code never
//! panics inside an event handler.

use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, NodeList,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

use crate::dom::Dom;

/// The live browser document.
#[derive(Debug, Clone)]
pub struct WebDom {
    document: web_sys::Document,
}

impl WebDom {
    #[must_use]
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// The current window's document, if running in a browser tab.
    #[must_use]
    pub fn from_window() -> Option<Self> {
        web_sys::window().and_then(|w| w.document()).map(Self::new)
    }

    /// The wrapped `web_sys::Document`.
    #[must_use]
    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Dom for WebDom {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        let list = match scope {
            Some(scope) => scope.query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        };
        list.map(elements).unwrap_or_default()
    }

    fn query(&self, scope: Option<&Element>, selector: &str) -> Option<Element> {
        let found = match scope {
            Some(scope) => scope.query_selector(selector),
            None => self.document.query_selector(selector),
        };
        found.ok().flatten()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn attr(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attr(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attr(&mut self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&mut self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_value(&mut self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>().is_some_and(HtmlInputElement::checked)
    }

    fn set_checked(&mut self, node: &Element, checked: bool) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_checked(checked);
        }
    }

    fn check_validity(&self, node: &Element) -> bool {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.check_validity()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.check_validity()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.check_validity()
        } else {
            true
        }
    }

    fn style(&self, node: &Element, property: &str) -> Option<String> {
        node.dyn_ref::<HtmlElement>()
            .and_then(|el| el.style().get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        let Some(el) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = el.style();
        if value.is_empty() {
            let _ = style.remove_property(property);
        } else {
            let _ = style.set_property(property, value);
        }
    }

    fn create_element(&mut self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn insert_before(&mut self, parent: &Element, child: &Element, reference: &Element) {
        if parent.insert_before(child, Some(reference)).is_err() {
            let _ = parent.append_child(child);
        }
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn focus(&mut self, node: &Element) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            let _ = el.focus();
        }
    }

    fn scroll_into_view(&mut self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn dispatch_event(&mut self, node: &Element, event: &str) {
        let init = web_sys::EventInit::new();
        init.set_bubbles(true);
        if let Ok(event) = web_sys::Event::new_with_event_init_dict(event, &init) {
            let _ = node.dispatch_event(&event);
        }
    }
}
