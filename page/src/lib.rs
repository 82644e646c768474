//! Document model for the ROPA client behaviour layer.
//!
//! The behaviour layer never talks to the browser directly. It reads and
//! mutates the page through the [`Dom`] trait, which covers the narrow slice
//! of the document it needs: selector queries, attributes, classes, inline
//! style, text, form-control state and tree mutation.
//!
//! Two implementations exist. [`Document`] is an in-memory arena tree built
//! from HTML fragments; it runs natively and backs every test. `WebDom`
//! (feature `hydrate`) forwards the same calls to `web_sys::Document`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | The [`Dom`] trait shared by both implementations |
//! | [`doc`] | In-memory [`Document`] arena and its `Dom` impl |
//! | [`html`] | HTML fragment parser feeding the arena |
//! | [`selector`] | CSS selector parsing for the in-memory matcher |
//! | `web` | `web_sys` backed implementation (feature `hydrate`) |

pub mod doc;
pub mod dom;
pub mod html;
pub mod selector;
#[cfg(feature = "hydrate")]
pub mod web;

pub use doc::{Document, NodeId};
pub use dom::Dom;
#[cfg(feature = "hydrate")]
pub use web::WebDom;

/// Errors raised while building or querying the in-memory document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The HTML source could not be parsed.
    #[error("html parse error: {0}")]
    HtmlParse(String),
    /// The selector uses syntax outside the supported subset.
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
}
