//! The mutable template tree.

use anyhow::{Result, bail};
use kstring::KString;

use crate::{myfrom::MyFrom, html::ToAttributes, meta::is_valid_attribute_name};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Text, stored unescaped; escaped when printed.
    String(KString),
    /// Markup that is printed verbatim: comments, doctype, the
    /// contents of script and style elements.
    Preserialized(KString),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::String(_) => None,
            Node::Preserialized(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::String(_) => None,
            Node::Preserialized(_) => None,
        }
    }

    pub fn try_element(&self) -> Result<&Element> {
        match self {
            Node::Element(e) => Ok(e),
            Node::String(_) =>
                bail!("not a Node::Element, but Node::String"),
            Node::Preserialized(_) =>
                bail!("not a Node::Element, but Node::Preserialized"),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}


/// An element with its attributes in the order they were written or
/// added, and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) name: KString,
    pub(crate) attr: Vec<(KString, KString)>,
    pub(crate) body: Vec<Node>,
}

impl Element {
    /// No verification of `name` happens here, see `Html::element`
    /// for that.
    pub fn new<T>(name: T) -> Element
    where KString: MyFrom<T>
    {
        Element {
            name: KString::myfrom(name),
            attr: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_parts(
        name: KString,
        attr: Vec<(KString, KString)>,
        body: Vec<Node>
    ) -> Element {
        Element { name, attr, body }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn attr(&self) -> &[(KString, KString)] { &self.attr }
    pub fn body(&self) -> &[Node] { &self.body }
    pub fn body_mut(&mut self) -> &mut Vec<Node> { &mut self.body }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attr.iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Removes the attribute and returns its value, the positions of
    /// the remaining attributes stay in order.
    pub fn remove_attribute(&mut self, key: &str) -> Option<KString> {
        let i = self.attr.iter().position(|(k, _)| k.as_str() == key)?;
        Some(self.attr.remove(i).1)
    }

    /// Replace all children with a single text node.
    pub fn set_text<T>(&mut self, text: T) -> &mut Self
    where KString: MyFrom<T>
    {
        self.body.clear();
        self.body.push(Node::String(KString::myfrom(text)));
        self
    }

    /// Overwrite the values of existing keys in place, append new
    /// keys at the end. Fails, leaving the element unchanged, if any
    /// of the names is not a valid attribute name.
    pub fn merge_attributes(&mut self, attr: impl ToAttributes) -> Result<&mut Self> {
        let attr = attr.to_attributes();
        if let Some((key, _)) = attr.iter().find(|(k, _)| ! is_valid_attribute_name(k)) {
            bail!("invalid attribute name {:?} for element {:?}",
                  key.as_str(), self.name.as_str())
        }
        for (key, val) in attr {
            if let Some(slot) = self.attr.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = val;
            } else {
                self.attr.push((key, val));
            }
        }
        Ok(self)
    }

    /// `merge_attributes` then `set_text`.
    pub fn update<T>(&mut self, attr: impl ToAttributes, text: T) -> Result<&mut Self>
    where KString: MyFrom<T>
    {
        self.merge_attributes(attr)?;
        Ok(self.set_text(text))
    }

    pub fn append(&mut self, node: impl Into<Node>) -> &mut Self {
        self.body.push(node.into());
        self
    }

    /// A copy sharing nothing with `self`, to be placed next to it.
    pub fn clone_for_repetition(&self) -> Element {
        self.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{att, Print};

    fn h1() -> Result<Element> {
        let mut e = Element::new("h1");
        e.merge_attributes([att("class", "big"), att("rb", "title")])?;
        e.append(Node::String(KString::from_static("X")));
        Ok(e)
    }

    #[test]
    fn t_set_text() -> Result<()> {
        let mut e = h1()?;
        e.append(Element::new("span"));
        e.set_text("a < b");
        assert_eq!(e.body().len(), 1);
        assert_eq!(e.to_html_fragment_string(None)?,
                   "<h1 class=\"big\" rb=\"title\">a &lt; b</h1>");
        Ok(())
    }

    #[test]
    fn t_set_text_does_not_double_escape() -> Result<()> {
        let mut e = Element::new("p");
        e.set_text("&amp;");
        assert_eq!(e.to_html_fragment_string(None)?, "<p>&amp;amp;</p>");
        Ok(())
    }

    #[test]
    fn t_merge_attributes_keeps_order() -> Result<()> {
        let mut e = h1()?;
        e.merge_attributes([att("id", "t"), att("class", "small")])?;
        let keys: Vec<&str> = e.attr().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["class", "rb", "id"]);
        assert_eq!(e.get_attribute("class"), Some("small"));
        Ok(())
    }

    #[test]
    fn t_merge_attributes_verifies_names() -> Result<()> {
        let mut e = h1()?;
        let err = e.merge_attributes([att("id", "ok"), att("x\" onclick=\"y", "z")])
            .err().unwrap();
        assert_eq!(err.to_string(),
                   "invalid attribute name \"x\\\" onclick=\\\"y\" for element \"h1\"");
        assert_eq!(e, h1()?);
        assert!(e.update([att("", "z")], "text").is_err());
        assert_eq!(e.update([att("data-x", "1")], "text")?.to_html_fragment_string(None)?,
                   "<h1 class=\"big\" rb=\"title\" data-x=\"1\">text</h1>");
        Ok(())
    }

    #[test]
    fn t_remove_attribute() -> Result<()> {
        let mut e = h1()?;
        assert_eq!(e.remove_attribute("rb").as_deref(), Some("title"));
        assert_eq!(e.remove_attribute("rb"), None);
        assert_eq!(e.attr().len(), 1);
        Ok(())
    }

    #[test]
    fn t_clone_for_repetition_is_independent() -> Result<()> {
        let e = h1()?;
        let mut c = e.clone_for_repetition();
        c.set_text("changed");
        c.merge_attributes([att("id", "c")])?;
        assert_eq!(e, h1()?);
        assert_ne!(c, e);
        Ok(())
    }

    #[test]
    fn t_try_element() {
        assert!(Node::from(Element::new("p")).try_element().is_ok());
        assert!(Node::String(KString::from_static("x")).try_element().is_err());
    }
}
