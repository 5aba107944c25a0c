//! Building nodes by hand, e.g. for replacing a bound node:
//!
//! ```ignore
//! html.a([att("href", "/login")], [html.text("Log in")])?
//! ```

use anyhow::{Result, bail};
use kstring::KString;

use crate::{Node, Element, Flat, myfrom::MyFrom,
            meta::{has_closing_tag, is_valid_tag_name, is_valid_attribute_name}};

pub fn att<T, U>(key: T, val: U) -> Option<(KString, KString)>
    where KString: MyFrom<T> + MyFrom<U>
{
    Some((KString::myfrom(key), KString::myfrom(val)))
}

pub fn opt_att<T, U>(key: T, val: Option<U>) -> Option<(KString, KString)>
    where KString: MyFrom<T> + MyFrom<U>
{
    val.map(|val| (KString::myfrom(key), KString::myfrom(val)))
}


pub trait ToAttributes {
    fn to_attributes(self) -> Vec<(KString, KString)>;
}

// Only the array of `Option`s (as returned by `att` and `opt_att`)
// gets an array impl, so that `[]` is not ambiguous.
impl<const N: usize> ToAttributes for [Option<(KString, KString)>; N] {
    fn to_attributes(self) -> Vec<(KString, KString)> {
        self.into_iter().flatten().collect()
    }
}

impl ToAttributes for Vec<(KString, KString)> {
    fn to_attributes(self) -> Vec<(KString, KString)> {
        self
    }
}

impl ToAttributes for &[(KString, KString)] {
    fn to_attributes(self) -> Vec<(KString, KString)> {
        self.to_vec()
    }
}


pub trait ToBody {
    fn to_body(self) -> Vec<Node>;
}

impl<const N: usize> ToBody for [Node; N] {
    fn to_body(self) -> Vec<Node> {
        self.into()
    }
}

impl ToBody for Vec<Node> {
    fn to_body(self) -> Vec<Node> {
        self
    }
}

impl ToBody for Flat<Node> {
    fn to_body(self) -> Vec<Node> {
        self.into_iter().collect()
    }
}


/// Node constructors. Verifies names and that void elements stay
/// empty; content models are not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html;

impl Html {
    pub fn new() -> Self {
        Html
    }

    pub fn element<T>(
        &self,
        name: T,
        attr: impl ToAttributes,
        body: impl ToBody
    ) -> Result<Element>
    where KString: MyFrom<T>
    {
        let name = KString::myfrom(name);
        if ! is_valid_tag_name(&name) {
            bail!("invalid tag name {:?}", name.as_str())
        }
        let attr = attr.to_attributes();
        for (i, (key, _)) in attr.iter().enumerate() {
            if ! is_valid_attribute_name(key) {
                bail!("invalid attribute #{i} {:?} for element {:?}",
                      key.as_str(), name.as_str())
            }
        }
        let body = body.to_body();
        if ! (body.is_empty() || has_closing_tag(&name)) {
            bail!("element {:?} is void, can't have {} child node(s)",
                  name.as_str(), body.len())
        }
        Ok(Element::with_parts(name, attr, body))
    }

    /// Like `element` but returns a `Node`.
    pub fn tag<T>(
        &self,
        name: T,
        attr: impl ToAttributes,
        body: impl ToBody
    ) -> Result<Node>
    where KString: MyFrom<T>
    {
        Ok(Node::Element(self.element(name, attr, body)?))
    }

    pub fn text<T>(&self, s: T) -> Node
    where KString: MyFrom<T>
    {
        Node::String(KString::myfrom(s))
    }
}

macro_rules! def_elements {
    { $($name:ident)* } => {
        impl Html {
            $(
                pub fn $name(
                    &self,
                    attr: impl ToAttributes,
                    body: impl ToBody
                ) -> Result<Node> {
                    self.tag(stringify!($name), attr, body)
                }
            )*
        }
    }
}

def_elements! {
    a abbr article aside b blockquote br button caption code dd div dl dt
    em figcaption figure footer form h1 h2 h3 h4 h5 h6 header hr i img
    input label li nav ol option p pre section select small span strong
    sub sup table tbody td textarea tfoot th thead time tr u ul
}
