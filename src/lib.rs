//! Presenter-driven HTML templates.
//!
//! Templates are plain HTML. Elements that should change carry a
//! binding attribute (`rb` by default) naming a binding on the
//! presenter; everything else is printed as it was parsed:
//!
//! ```ignore
//! let mut bindings = Bindings::new();
//! bindings.text("title", "Hello");
//! let html = Presenter::render_template(
//!     "<h1 rb=\"title\">X</h1>", bindings, &Context::new())?;
//! assert_eq!(html, "<h1>Hello</h1>");
//! ```

pub mod config;
pub mod error;
pub mod scope;
pub mod context;
pub mod transformer;
pub mod presenter;

use std::sync::atomic::AtomicBool;

pub use config::{RenderConfig, MissingBindingPolicy};
pub use error::MissingBinding;
pub use scope::{Frame, Binding, BindingValue, Bindings, ScopeChain, NodeScope,
                TextItem, PureFn, NodeFn};
pub use context::{Context, JsonItem};
pub use transformer::Transformer;
pub use presenter::{Presenter, RenderState};

pub use shaven_dom;

/// Trace binding resolution in all renders, regardless of
/// `RenderConfig::trace`.
pub static TRACE: AtomicBool = AtomicBool::new(false);
