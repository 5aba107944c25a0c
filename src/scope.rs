//! Resolving binding names: frames, and the chain they are looked up
//! in.

use std::{collections::HashMap, fmt::Debug, rc::Rc};

use anyhow::{Result, bail};
use kstring::KString;
use shaven_dom::{Element, Html, Node, myfrom::MyFrom};

use crate::error::MissingBinding;

/// A binding that only looks at the scope.
pub type PureFn = Rc<dyn Fn(&ScopeChain) -> Result<BindingValue>>;

/// A binding that receives the element it is bound to, to change
/// its attributes or children in place.
pub type NodeFn = Rc<dyn Fn(&ScopeChain, &mut Element) -> Result<BindingValue>>;

/// One level of the scope chain: something that knows bindings by
/// name.
pub trait Frame {
    fn has_binding(&self, name: &str) -> bool;

    /// Only called if `has_binding(name)` returned true.
    fn resolve(&self, name: &str) -> Result<Binding>;

    /// The text for an element repeated for this frame as a list
    /// item, if the item is a plain scalar.
    fn content(&self) -> Option<KString> {
        None
    }
}

impl<F: Frame + ?Sized> Frame for Rc<F> {
    fn has_binding(&self, name: &str) -> bool {
        (**self).has_binding(name)
    }
    fn resolve(&self, name: &str) -> Result<Binding> {
        (**self).resolve(name)
    }
    fn content(&self) -> Option<KString> {
        (**self).content()
    }
}


/// What a frame holds under a name.
#[derive(Clone)]
pub enum Binding {
    Value(BindingValue),
    Pure(PureFn),
    Node(NodeFn),
}

impl Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Binding::Pure(_) => f.write_str("Pure(..)"),
            Binding::Node(_) => f.write_str("Node(..)"),
        }
    }
}


/// The result of resolving a binding; decides what happens to the
/// bound element.
#[derive(Clone)]
pub enum BindingValue {
    /// Replace the element's children with this text.
    Text(KString),
    /// Put this node where the element was.
    Replace(Node),
    /// Repeat the element once per item, with the item in scope.
    List(Vec<Rc<dyn Frame>>),
    /// Leave the element alone.
    Absent,
    /// Drop the element and everything in it.
    Removed,
}

impl Debug for BindingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            BindingValue::Replace(n) => f.debug_tuple("Replace").field(n).finish(),
            BindingValue::List(items) => write!(f, "List({} items)", items.len()),
            BindingValue::Absent => f.write_str("Absent"),
            BindingValue::Removed => f.write_str("Removed"),
        }
    }
}

impl BindingValue {
    pub fn text<T>(s: T) -> Self
    where KString: MyFrom<T>
    {
        BindingValue::Text(KString::myfrom(s))
    }

    /// A list of items that each set the text of their copy of the
    /// element.
    pub fn texts<I, T>(items: I) -> Self
    where I: IntoIterator<Item = T>,
          KString: MyFrom<T>
    {
        BindingValue::List(
            items.into_iter()
                .map(|s| Rc::new(TextItem(KString::myfrom(s))) as Rc<dyn Frame>)
                .collect())
    }

    pub fn list<I, F>(items: I) -> Self
    where I: IntoIterator<Item = F>,
          F: Frame + 'static
    {
        BindingValue::List(
            items.into_iter()
                .map(|f| Rc::new(f) as Rc<dyn Frame>)
                .collect())
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            BindingValue::Text(_) => "Text",
            BindingValue::Replace(_) => "Replace",
            BindingValue::List(_) => "List",
            BindingValue::Absent => "Absent",
            BindingValue::Removed => "Removed",
        }
    }
}

impl From<&str> for BindingValue {
    fn from(s: &str) -> Self {
        BindingValue::Text(KString::from_ref(s))
    }
}

impl From<String> for BindingValue {
    fn from(s: String) -> Self {
        BindingValue::Text(KString::from_string(s))
    }
}

impl From<KString> for BindingValue {
    fn from(s: KString) -> Self {
        BindingValue::Text(s)
    }
}

impl From<Node> for BindingValue {
    fn from(n: Node) -> Self {
        BindingValue::Replace(n)
    }
}

impl From<Element> for BindingValue {
    fn from(e: Element) -> Self {
        BindingValue::Replace(Node::Element(e))
    }
}

/// `false` removes the element, `true` keeps it as it is.
impl From<bool> for BindingValue {
    fn from(b: bool) -> Self {
        if b {
            BindingValue::Absent
        } else {
            BindingValue::Removed
        }
    }
}

impl<T: Into<BindingValue>> From<Option<T>> for BindingValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => BindingValue::Removed,
        }
    }
}


/// A list item that is just text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem(pub KString);

impl Frame for TextItem {
    fn has_binding(&self, _name: &str) -> bool {
        false
    }
    fn resolve(&self, name: &str) -> Result<Binding> {
        bail!("text item has no binding {name:?}")
    }
    fn content(&self) -> Option<KString> {
        Some(self.0.clone())
    }
}


struct Link {
    frame: Rc<dyn Frame>,
    next: Option<Rc<Link>>,
}

/// Frames in lookup order. Pushing shares the existing frames, so
/// each list item gets its own chain cheaply.
#[derive(Clone, Default)]
pub struct ScopeChain {
    head: Option<Rc<Link>>,
}

impl Debug for ScopeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopeChain({} frames)", self.frames().count())
    }
}

pub struct Frames<'c> {
    link: Option<&'c Link>,
}

impl<'c> Iterator for Frames<'c> {
    type Item = &'c Rc<dyn Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.link?;
        self.link = link.next.as_deref();
        Some(&link.frame)
    }
}

impl ScopeChain {
    pub fn new() -> Self {
        ScopeChain { head: None }
    }

    /// A chain with `frame` looked at before all of `self`'s frames.
    pub fn push(&self, frame: Rc<dyn Frame>) -> ScopeChain {
        ScopeChain {
            head: Some(Rc::new(Link {
                frame,
                next: self.head.clone(),
            }))
        }
    }

    /// Front to back.
    pub fn frames(&self) -> Frames<'_> {
        Frames { link: self.head.as_deref() }
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// The first frame that has `name`.
    pub fn lookup(&self, name: &str) -> Option<&Rc<dyn Frame>> {
        self.frames().find(|frame| frame.has_binding(name))
    }

    /// Resolve `name` without an element, e.g. from inside another
    /// binding. Bindings that need an element are an error here.
    pub fn resolve(&self, name: &str) -> Result<Option<BindingValue>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(frame) => match frame.resolve(name)? {
                Binding::Value(v) => Ok(Some(v)),
                Binding::Pure(f) => Ok(Some(f(self)?)),
                Binding::Node(_) =>
                    bail!("binding {name:?} needs an element, can't resolve it \
                           from the scope alone"),
            }
        }
    }

    /// Node constructors for use in bindings.
    pub fn html(&self) -> Html {
        Html::new()
    }

    pub fn with_node<'c, 'n>(&'c self, node: &'n mut Element) -> NodeScope<'c, 'n> {
        NodeScope { chain: self, node }
    }
}


/// The scope for the element being transformed.
pub struct NodeScope<'c, 'n> {
    chain: &'c ScopeChain,
    node: &'n mut Element,
}

impl<'c, 'n> NodeScope<'c, 'n> {
    /// `None` if no frame has `name`.
    pub fn try_resolve(&mut self, name: &str) -> Result<Option<BindingValue>> {
        let frame = match self.chain.lookup(name) {
            Some(frame) => frame,
            None => return Ok(None),
        };
        Ok(Some(match frame.resolve(name)? {
            Binding::Value(v) => v,
            Binding::Pure(f) => f(self.chain)?,
            Binding::Node(f) => f(self.chain, self.node)?,
        }))
    }

    pub fn resolve(&mut self, name: &str) -> Result<BindingValue> {
        match self.try_resolve(name)? {
            Some(v) => Ok(v),
            None => Err(MissingBinding {
                name: KString::from_ref(name),
                element: KString::from_ref(self.node.name()),
            }.into())
        }
    }
}


/// Bindings by name, as a frame; what a presenter is usually made
/// of.
#[derive(Clone, Default)]
pub struct Bindings {
    map: HashMap<KString, Binding>,
}

impl Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.map.keys().map(|k| k.as_str()).collect();
        names.sort();
        f.debug_struct("Bindings").field("names", &names).finish()
    }
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<N>(&mut self, name: N, binding: Binding) -> &mut Self
    where KString: MyFrom<N>
    {
        self.map.insert(KString::myfrom(name), binding);
        self
    }

    pub fn value<N>(&mut self, name: N, v: impl Into<BindingValue>) -> &mut Self
    where KString: MyFrom<N>
    {
        self.insert(name, Binding::Value(v.into()))
    }

    pub fn text<N, T>(&mut self, name: N, text: T) -> &mut Self
    where KString: MyFrom<N> + MyFrom<T>
    {
        self.insert(name, Binding::Value(BindingValue::text(text)))
    }

    pub fn pure<N>(
        &mut self,
        name: N,
        f: impl Fn(&ScopeChain) -> Result<BindingValue> + 'static
    ) -> &mut Self
    where KString: MyFrom<N>
    {
        self.insert(name, Binding::Pure(Rc::new(f)))
    }

    pub fn node<N>(
        &mut self,
        name: N,
        f: impl Fn(&ScopeChain, &mut Element) -> Result<BindingValue> + 'static
    ) -> &mut Self
    where KString: MyFrom<N>
    {
        self.insert(name, Binding::Node(Rc::new(f)))
    }
}

impl Frame for Bindings {
    fn has_binding(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    fn resolve(&self, name: &str) -> Result<Binding> {
        match self.map.get(name) {
            Some(b) => Ok(b.clone()),
            None => bail!("no binding {name:?}"),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use shaven_dom::{att, Print};

    fn chain(frames: Vec<Bindings>) -> ScopeChain {
        // last is the front
        frames.into_iter().fold(ScopeChain::new(), |c, f| c.push(Rc::new(f)))
    }

    fn text(v: Option<BindingValue>) -> String {
        match v {
            Some(BindingValue::Text(s)) => s.to_string(),
            other => panic!("not text: {other:?}"),
        }
    }

    #[test]
    fn t_shadowing() -> Result<()> {
        let mut base = Bindings::new();
        base.text("title", "base").text("other", "o");
        let mut front = Bindings::new();
        front.text("title", "front");
        let c = chain(vec![base, front]);
        assert_eq!(c.frames().count(), 2);
        assert_eq!(text(c.resolve("title")?), "front");
        assert_eq!(text(c.resolve("other")?), "o");
        assert!(c.resolve("nope")?.is_none());
        assert!(! c.has_binding("nope"));
        Ok(())
    }

    #[test]
    fn t_push_does_not_change_the_original() -> Result<()> {
        let mut base = Bindings::new();
        base.text("a", "1");
        let c = chain(vec![base]);
        let mut item = Bindings::new();
        item.text("a", "2");
        let c2 = c.push(Rc::new(item));
        assert_eq!(text(c.resolve("a")?), "1");
        assert_eq!(text(c2.resolve("a")?), "2");
        Ok(())
    }

    #[test]
    fn t_pure_sees_the_whole_chain() -> Result<()> {
        let mut base = Bindings::new();
        base.pure("greeting", |c| {
            let name = match c.resolve("name")? {
                Some(BindingValue::Text(s)) => s,
                _ => bail!("no name"),
            };
            Ok(format!("Hello, {name}!").into())
        });
        let mut front = Bindings::new();
        front.text("name", "Ann");
        let c = chain(vec![base, front]);
        assert_eq!(text(c.resolve("greeting")?), "Hello, Ann!");
        Ok(())
    }

    #[test]
    fn t_node_binding() -> Result<()> {
        let calls = Rc::new(Cell::new(0));
        let calls2 = calls.clone();
        let mut base = Bindings::new();
        base.node("title", move |_c, e| {
            calls2.set(calls2.get() + 1);
            e.merge_attributes([att("id", "t")])?;
            Ok(BindingValue::Absent)
        });
        let c = chain(vec![base]);
        let mut e = Element::new("h1");
        let v = c.with_node(&mut e).resolve("title")?;
        assert!(matches!(v, BindingValue::Absent));
        assert_eq!(calls.get(), 1);
        assert_eq!(e.to_html_fragment_string(None)?, "<h1 id=\"t\"></h1>");
        assert!(c.resolve("title").is_err());
        Ok(())
    }

    #[test]
    fn t_missing_binding() {
        let c = chain(vec![Bindings::new()]);
        let mut e = Element::new("div");
        let mut scope = c.with_node(&mut e);
        assert!(scope.try_resolve("x").unwrap().is_none());
        let err = scope.resolve("x").err().unwrap();
        assert_eq!(err.to_string(), "missing binding \"x\" (on element <div>)");
        assert_eq!(err.downcast_ref::<MissingBinding>().unwrap().name.as_str(), "x");
    }

    #[test]
    fn t_conversions() {
        assert!(matches!(BindingValue::from(false), BindingValue::Removed));
        assert!(matches!(BindingValue::from(true), BindingValue::Absent));
        assert!(matches!(BindingValue::from(None::<&str>), BindingValue::Removed));
        assert!(matches!(BindingValue::from(Some("x")), BindingValue::Text(_)));
        assert!(matches!(BindingValue::from(Element::new("p")), BindingValue::Replace(_)));
        match BindingValue::texts(["a", "b"]) {
            BindingValue::List(items) => {
                let c: Vec<String> = items.iter()
                    .map(|i| i.content().unwrap().to_string())
                    .collect();
                assert_eq!(c, ["a", "b"]);
            }
            other => panic!("{other:?}"),
        }
        assert_eq!(format!("{:?}", BindingValue::texts(Vec::<String>::new())),
                   "List(0 items)");
    }
}
