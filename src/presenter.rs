//! Rendering a template against a presenter's bindings.

use std::rc::Rc;

use anyhow::Result;
use chj_util::trace;
use shaven_dom::{Document, ParseError, attribute_name_key};

use crate::{config::RenderConfig,
            context::Context,
            scope::{Frame, ScopeChain},
            transformer::Transformer};

/// A presenter renders once; later calls return the same output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Unrendered,
    Rendered(String),
}

impl RenderState {
    pub fn output(&self) -> Option<&str> {
        match self {
            RenderState::Unrendered => None,
            RenderState::Rendered(s) => Some(s),
        }
    }
}

/// A parsed template together with the frame holding its bindings
/// (usually `Bindings`, or a type implementing `Frame` itself).
pub struct Presenter {
    document: Document,
    base: Rc<dyn Frame>,
    config: RenderConfig,
    state: RenderState,
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("document", &self.document)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Presenter {
    pub fn feed(template: &str, base: impl Frame + 'static) -> Result<Presenter, ParseError> {
        Self::feed_with_config(template, base, RenderConfig::default())
    }

    pub fn feed_with_config(
        template: &str,
        base: impl Frame + 'static,
        mut config: RenderConfig
    ) -> Result<Presenter, ParseError> {
        // The field is public, it may have been set without the builder.
        config.binding_attribute = attribute_name_key(&config.binding_attribute);
        let document = Document::parse_with_binding_attribute(
            template, config.binding_attribute.clone())?;
        Ok(Presenter {
            document,
            base: Rc::new(base),
            config,
            state: RenderState::Unrendered,
        })
    }

    /// Parse, render with `context`, and throw the presenter away.
    pub fn render_template(
        template: &str,
        base: impl Frame + 'static,
        context: &Context
    ) -> Result<String> {
        Self::feed(template, base)?.render(context)
    }

    /// Apply the bindings, with `context` in front of the
    /// presenter's frame, and serialize. Only the first successful
    /// call does any work; if it fails, nothing is kept and the
    /// presenter can be rendered again.
    pub fn render(&mut self, context: &Context) -> Result<String> {
        if let RenderState::Rendered(html) = &self.state {
            trace!(self.config.trace; "returning cached output");
            return Ok(html.clone())
        }

        let mut chain = ScopeChain::new().push(self.base.clone());
        if ! context.is_empty() {
            chain = chain.push(Rc::new(context.clone()));
        }

        let mut document = self.document.clone();
        Transformer::new(&self.config).transform_nodes(document.body_mut(), &chain)?;
        let html = document.to_html()?;
        self.document = document;
        self.state = RenderState::Rendered(html.clone());
        Ok(html)
    }

    /// `render` with an empty context.
    pub fn to_html(&mut self) -> Result<String> {
        self.render(&Context::new())
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.state, RenderState::Rendered(_))
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The template tree; transformed once rendered.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
