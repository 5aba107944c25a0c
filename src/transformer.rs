//! The walk over a template tree that applies the bindings.

use std::sync::atomic::Ordering;

use anyhow::{Result, bail};
use chj_util::{warn, trace};
use kstring::KString;
use shaven_dom::{Element, Flat, Node, SpliceFlat, has_closing_tag};

use crate::{TRACE,
            config::{RenderConfig, MissingBindingPolicy},
            error::MissingBinding,
            scope::{BindingValue, ScopeChain}};

/// Applies bindings to nodes, in document order. Each node is
/// visited once; the children of a node are transformed after the
/// node itself.
pub struct Transformer<'c> {
    config: &'c RenderConfig,
    tracing: bool,
}

impl<'c> Transformer<'c> {
    pub fn new(config: &'c RenderConfig) -> Self {
        Transformer {
            config,
            tracing: config.trace || TRACE.load(Ordering::Relaxed),
        }
    }

    /// Transform `nodes` in place. On errors, the nodes up to the
    /// failing one stay transformed.
    pub fn transform_nodes(&self, nodes: &mut Vec<Node>, chain: &ScopeChain) -> Result<()> {
        let mut i = 0;
        while i < nodes.len() {
            i += self.transform_at(nodes, i, chain)?;
        }
        Ok(())
    }

    fn transform_children(&self, element: &mut Element, chain: &ScopeChain) -> Result<()> {
        self.transform_nodes(element.body_mut(), chain)
    }

    /// Returns how many nodes are now at `i` in place of the
    /// original one, all of them done.
    fn transform_at(&self, nodes: &mut Vec<Node>, i: usize, chain: &ScopeChain) -> Result<usize> {
        let element = match nodes[i].as_element_mut() {
            Some(e) => e,
            None => return Ok(1),
        };
        let name = match element.remove_attribute(&self.config.binding_attribute) {
            Some(name) => name,
            None => {
                self.transform_children(element, chain)?;
                return Ok(1)
            }
        };

        let value = self.resolve(chain, element, &name)?;
        trace!(self.tracing; "<{}> {}={:?}: {:?}",
               element.name(), self.config.binding_attribute, name.as_str(), value);

        match value {
            BindingValue::Text(s) => {
                set_bound_text(element, &name, s)?;
                Ok(1)
            }
            BindingValue::Absent => {
                self.transform_children(element, chain)?;
                Ok(1)
            }
            BindingValue::Removed => Ok(nodes.splice_flat(i, Flat::None)),
            BindingValue::Replace(node) => {
                nodes.splice_flat(i, Flat::One(node));
                if let Some(e) = nodes[i].as_element_mut() {
                    self.transform_children(e, chain)?;
                }
                Ok(1)
            }
            BindingValue::List(items) => {
                let mut copies = Vec::with_capacity(items.len());
                for item in items {
                    let mut copy = element.clone_for_repetition();
                    if let Some(text) = item.content() {
                        set_bound_text(&mut copy, &name, text)?;
                    }
                    let item_chain = chain.push(item);
                    self.transform_children(&mut copy, &item_chain)?;
                    copies.push(Node::Element(copy));
                }
                Ok(nodes.splice_flat(i, Flat::Many(copies)))
            }
        }
    }

    fn resolve(
        &self,
        chain: &ScopeChain,
        element: &mut Element,
        name: &KString
    ) -> Result<BindingValue> {
        if let Some(value) = chain.with_node(element).try_resolve(name)? {
            return Ok(value)
        }
        match self.config.missing {
            MissingBindingPolicy::Fail =>
                Err(MissingBinding {
                    name: name.clone(),
                    element: KString::from_ref(element.name()),
                }.into()),
            MissingBindingPolicy::Skip => {
                warn!("no binding {:?} for <{}>, leaving it as it is",
                      name.as_str(), element.name());
                Ok(BindingValue::Absent)
            }
        }
    }
}

/// Void elements can't hold text; printing would silently drop it.
fn set_bound_text(element: &mut Element, name: &KString, text: KString) -> Result<()> {
    if ! has_closing_tag(element.name()) {
        bail!("binding {:?} gives text {:?} for void element <{}>",
              name.as_str(), text.as_str(), element.name())
    }
    element.set_text(text);
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use shaven_dom::{Document, att};

    use super::*;
    use crate::scope::Bindings;

    fn t_with(template: &str, bindings: Bindings, config: &RenderConfig) -> Result<String> {
        let mut doc = Document::parse(template)?;
        let chain = ScopeChain::new().push(Rc::new(bindings));
        Transformer::new(config).transform_nodes(doc.body_mut(), &chain)?;
        doc.to_html()
    }

    fn t(template: &str, bindings: Bindings) -> Result<String> {
        t_with(template, bindings, &RenderConfig::default())
    }

    #[test]
    fn t_text() -> Result<()> {
        let mut b = Bindings::new();
        b.text("title", "Hello & bye");
        assert_eq!(t("<h1 rb=\"title\">X<b>old</b></h1>", b)?,
                   "<h1>Hello &amp; bye</h1>");
        Ok(())
    }

    #[test]
    fn t_removed() -> Result<()> {
        let mut b = Bindings::new();
        b.value("hidden", false);
        assert_eq!(t("<p>a</p><div rb=\"hidden\" class=\"c\">secret<i>x</i></div><p>b</p>", b)?,
                   "<p>a</p><p>b</p>");
        Ok(())
    }

    #[test]
    fn t_absent_recurses() -> Result<()> {
        let mut b = Bindings::new();
        b.value("wrap", true).text("inner", "in");
        assert_eq!(t("<div rb=wrap><span rb=inner>x</span></div>", b)?,
                   "<div><span>in</span></div>");
        Ok(())
    }

    #[test]
    fn t_replace_recurses_into_replacement() -> Result<()> {
        let mut b = Bindings::new();
        b.pure("link", |c| {
            let html = c.html();
            let mut inner = Element::new("span");
            inner.merge_attributes([att("rb", "label")])?;
            Ok(html.a([att("href", "/x")], [Node::Element(inner)])?.into())
        });
        b.text("label", "go");
        assert_eq!(t("<p><b rb=link>old</b>!</p>", b)?,
                   "<p><a href=\"/x\"><span>go</span></a>!</p>");
        Ok(())
    }

    #[test]
    fn t_list_of_texts() -> Result<()> {
        let mut b = Bindings::new();
        b.value("items", BindingValue::texts(["a", "b", "c"]));
        assert_eq!(t("<ul><li rb=\"items\" class=i>X</li><li>last</li></ul>", b)?,
                   "<ul><li class=\"i\">a</li><li class=\"i\">b</li>\
                    <li class=\"i\">c</li><li>last</li></ul>");
        Ok(())
    }

    #[test]
    fn t_empty_list() -> Result<()> {
        let mut b = Bindings::new();
        b.value("items", BindingValue::texts(Vec::<String>::new()));
        assert_eq!(t("<ul><li rb=\"items\">X</li></ul>", b)?, "<ul></ul>");
        Ok(())
    }

    #[test]
    fn t_list_items_are_in_scope() -> Result<()> {
        let mut base = Bindings::new();
        base.text("name", "base").text("sep", ",");
        let items = ["x", "y"].into_iter().map(|n| {
            let mut item = Bindings::new();
            item.text("name", n);
            item
        });
        base.value("people", BindingValue::list(items));
        assert_eq!(t("<p rb=people><b rb=name>N</b><i rb=sep></i></p><b rb=name></b>", base)?,
                   "<p><b>x</b><i>,</i></p><p><b>y</b><i>,</i></p><b>base</b>");
        Ok(())
    }

    #[test]
    fn t_node_binding_mutates_in_place() -> Result<()> {
        let mut b = Bindings::new();
        b.node("title", |_c, e| {
            e.merge_attributes([att("id", "t")])?;
            e.set_text("Hi");
            Ok(BindingValue::Absent)
        });
        assert_eq!(t("<h1 rb=\"title\">X</h1>", b)?, "<h1 id=\"t\">Hi</h1>");
        Ok(())
    }

    #[test]
    fn t_preorder() -> Result<()> {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut b = Bindings::new();
        for name in ["a", "b", "c", "d"] {
            let order = order.clone();
            b.pure(name, move |_| {
                order.borrow_mut().push(name);
                Ok(BindingValue::Absent)
            });
        }
        t("<div rb=a><p rb=b><i rb=c></i></p></div><p rb=d></p>", b)?;
        assert_eq!(*order.borrow(), ["a", "b", "c", "d"]);
        Ok(())
    }

    #[test]
    fn t_missing_binding() -> Result<()> {
        let err = t("<p rb=\"nope\">x</p>", Bindings::new()).err().unwrap();
        assert_eq!(err.to_string(), "missing binding \"nope\" (on element <p>)");

        let config = RenderConfig::default().missing(MissingBindingPolicy::Skip);
        assert_eq!(t_with("<p rb=\"nope\">x</p>", Bindings::new(), &config)?, "<p>x</p>");
        Ok(())
    }

    #[test]
    fn t_errors_from_bindings_propagate() {
        let calls = Rc::new(Cell::new(0));
        let calls2 = calls.clone();
        let mut b = Bindings::new();
        b.pure("bad", |_| anyhow::bail!("database is gone"));
        b.pure("later", move |_| {
            calls2.set(calls2.get() + 1);
            Ok(BindingValue::Absent)
        });
        let err = t("<p rb=bad></p><p rb=later></p>", b).err().unwrap();
        assert_eq!(err.to_string(), "database is gone");
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn t_text_for_void_element() -> Result<()> {
        let mut b = Bindings::new();
        b.text("pic", "a cat");
        let err = t("<p><img rb=pic src=cat.png></p>", b).err().unwrap();
        assert_eq!(err.to_string(),
                   "binding \"pic\" gives text \"a cat\" for void element <img>");

        let mut b = Bindings::new();
        b.value("rules", BindingValue::texts(["x"]));
        let err = t("<hr rb=rules>", b).err().unwrap();
        assert_eq!(err.to_string(),
                   "binding \"rules\" gives text \"x\" for void element <hr>");

        // attributes only is fine
        let mut b = Bindings::new();
        b.node("pic", |_, e| {
            e.merge_attributes([att("alt", "a cat")])?;
            Ok(BindingValue::Absent)
        });
        assert_eq!(t("<img rb=pic src=cat.png>", b)?, "<img src=\"cat.png\" alt=\"a cat\">");
        Ok(())
    }

    #[test]
    fn t_custom_binding_attribute() -> Result<()> {
        let mut b = Bindings::new();
        b.text("x", "new");
        let config = RenderConfig::default().binding_attribute("data-bind");
        let mut doc = Document::parse_with_binding_attribute(
            "<p data-bind=x rb=y>old</p>", config.binding_attribute.clone())?;
        let chain = ScopeChain::new().push(Rc::new(b));
        Transformer::new(&config).transform_nodes(doc.body_mut(), &chain)?;
        assert_eq!(doc.to_html()?, "<p rb=\"y\">new</p>");
        Ok(())
    }
}
