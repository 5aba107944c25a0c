use std::io::Write;

use anyhow::Result;
use kstring::KString;

use crate::{Node, Print, meta::attribute_name_key, parse::{ParseError, parse_fragment}};

/// The attribute naming a binding, if not configured otherwise.
pub const DEFAULT_BINDING_ATTRIBUTE: &str = "rb";

/// A parsed template: its top-level nodes (a doctype and `<html>`,
/// or any fragment), and the name of the binding attribute, which
/// is never printed.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    body: Vec<Node>,
    binding_attribute: KString,
}

impl Document {
    pub fn parse(input: &str) -> Result<Document, ParseError> {
        Self::parse_with_binding_attribute(
            input, KString::from_static(DEFAULT_BINDING_ATTRIBUTE))
    }

    /// `binding_attribute` is matched case-insensitively, like all
    /// attribute names.
    pub fn parse_with_binding_attribute(
        input: &str,
        binding_attribute: KString
    ) -> Result<Document, ParseError> {
        Ok(Document::from_nodes(parse_fragment(input)?, binding_attribute))
    }

    pub fn from_nodes(body: Vec<Node>, binding_attribute: KString) -> Document {
        Document {
            body,
            binding_attribute: attribute_name_key(&binding_attribute),
        }
    }

    pub fn body(&self) -> &[Node] { &self.body }
    pub fn body_mut(&mut self) -> &mut Vec<Node> { &mut self.body }
    pub fn binding_attribute(&self) -> &str { &self.binding_attribute }

    pub fn print_html(&self, out: &mut impl Write) -> Result<()> {
        self.body.print_html_fragment(out, Some(self.binding_attribute.as_str()))
    }

    pub fn to_html(&self) -> Result<String> {
        self.body.to_html_fragment_string(Some(self.binding_attribute.as_str()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> String {
        Document::parse(s).unwrap().to_html().unwrap()
    }

    #[test]
    fn t_to_html_strips_binding_attribute() {
        assert_eq!(t("<h1 rb=\"title\" class=\"x\">X</h1>"), "<h1 class=\"x\">X</h1>");
        assert_eq!(t("<ul rb=a><li rb=b>X</li></ul>"), "<ul><li>X</li></ul>");
    }

    #[test]
    fn t_custom_binding_attribute() -> Result<()> {
        let doc = Document::parse_with_binding_attribute(
            "<p data-bind=\"x\" rb=\"y\">z</p>", KString::from_static("data-bind"))?;
        assert_eq!(doc.binding_attribute(), "data-bind");
        assert_eq!(doc.to_html()?, "<p rb=\"y\">z</p>");

        let doc = Document::parse_with_binding_attribute(
            "<p Data-Bind=\"x\">z</p>", KString::from_static("data-BIND"))?;
        assert_eq!(doc.binding_attribute(), "data-bind");
        assert_eq!(doc.to_html()?, "<p>z</p>");
        Ok(())
    }

    #[test]
    fn t_round_trip() {
        for s in ["",
                  "plain text",
                  "<!DOCTYPE html>\n<html>\n<head><title>T</title></head>\n\
                   <body><p class=\"a\">x &amp; y</p><br></body>\n</html>\n",
                  "<ul><li>a</li><li>b</li></ul><p>second top node</p>",
                  "<p title=\"it's\">&lt;tag&gt;</p>"] {
            let once = t(s);
            assert_eq!(t(&once), once);
        }
        assert_eq!(t("<p>x &amp; y</p>"), "<p>x &amp; y</p>");
    }

    #[test]
    fn t_several_top_nodes() -> Result<()> {
        let doc = Document::parse("<!-- c --><p>a</p>\n<p>b</p>")?;
        assert_eq!(doc.body().len(), 4);
        let mut out = Vec::new();
        doc.print_html(&mut out)?;
        assert_eq!(String::from_utf8(out)?, "<!-- c --><p>a</p>\n<p>b</p>");
        Ok(())
    }

    #[test]
    fn t_parse_error_propagates() {
        let e = Document::parse("<p>").err().unwrap();
        assert_eq!(e.to_string(), "element <p> opened at line 1, column 1 is never closed");
    }
}
