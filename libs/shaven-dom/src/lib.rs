//! Html template trees: parse template text into a tree of `Node`s,
//! edit it, print it back out.

pub mod myfrom;
pub mod meta;
pub mod entities;
pub mod node;
pub mod flat;
pub mod html;
pub mod parse;
pub mod document;

use std::io::Write;

use anyhow::Result;
use kstring::KString;

pub use node::{Node, Element};
pub use flat::{Flat, SpliceFlat};
pub use html::{Html, ToAttributes, ToBody, att, opt_att};
pub use parse::{ParseError, ParseErrorKind, Position, parse_fragment};
pub use document::{Document, DEFAULT_BINDING_ATTRIBUTE};
pub use meta::{has_closing_tag, attribute_name_key};

/// Write `s` with `& < > " '` replaced by character references.
pub fn html_escape(out: &mut impl Write, s: &str) -> std::io::Result<()> {
    let bytes = s.as_bytes();
    let mut done = 0;
    for (i, b) in bytes.iter().enumerate() {
        let rep: &[u8] = match b {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' => b"&quot;",
            b'\'' => b"&#39;",
            _ => continue
        };
        out.write_all(&bytes[done..i])?;
        out.write_all(rep)?;
        done = i + 1;
    }
    out.write_all(&bytes[done..])
}

pub trait Print {
    /// Print serialized HTML. Attributes named `omit` are left out
    /// (on every element).
    fn print_html_fragment(&self, out: &mut impl Write, omit: Option<&str>)
                           -> Result<()>;

    /// Print plain text, *ignoring* HTML markup; preserialized
    /// content is skipped.
    fn print_plain(&self, out: &mut String);

    fn to_html_fragment_string(&self, omit: Option<&str>) -> Result<String> {
        let mut s = Vec::new();
        self.print_html_fragment(&mut s, omit)?;
        Ok(String::from_utf8(s)?)
    }

    fn to_plain_string(&self) -> String {
        let mut s = String::new();
        self.print_plain(&mut s);
        s
    }
}

impl Print for (KString, KString) {
    fn print_html_fragment(&self, out: &mut impl Write, _omit: Option<&str>)
                           -> Result<()> {
        // Names are verified by the parser, `Html::element` and
        // `Element::merge_attributes`; `Element::with_parts` trusts
        // its caller.
        out.write_all(self.0.as_bytes())?;
        out.write_all(b"=\"")?;
        html_escape(out, &self.1)?;
        out.write_all(b"\"")?;
        Ok(())
    }

    fn print_plain(&self, _out: &mut String) {
        // attributes are not text
    }
}

impl Print for [Node] {
    fn print_html_fragment(&self, out: &mut impl Write, omit: Option<&str>)
                           -> Result<()> {
        for node in self {
            node.print_html_fragment(out, omit)?;
        }
        Ok(())
    }

    fn print_plain(&self, out: &mut String) {
        for node in self {
            node.print_plain(out);
        }
    }
}

impl Print for Node {
    fn print_html_fragment(&self, out: &mut impl Write, omit: Option<&str>)
                           -> Result<()> {
        Ok(match self {
            Node::Element(e) => e.print_html_fragment(out, omit)?,
            Node::String(s) => html_escape(out, s)?,
            Node::Preserialized(s) => out.write_all(s.as_bytes())?,
        })
    }

    fn print_plain(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.print_plain(out),
            Node::String(s) => out.push_str(s),
            Node::Preserialized(_) => (),
        }
    }
}

impl Print for Element {
    fn print_html_fragment(&self, out: &mut impl Write, omit: Option<&str>)
                           -> Result<()> {
        out.write_all(b"<")?;
        out.write_all(self.name.as_bytes())?;
        for att in &self.attr {
            if Some(att.0.as_str()) == omit {
                continue
            }
            out.write_all(b" ")?;
            att.print_html_fragment(out, omit)?;
        }
        out.write_all(b">")?;
        if has_closing_tag(&self.name) {
            self.body.print_html_fragment(out, omit)?;
            out.write_all(b"</")?;
            out.write_all(self.name.as_bytes())?;
            out.write_all(b">")?;
        }
        Ok(())
    }

    fn print_plain(&self, out: &mut String) {
        self.body.print_plain(out)
    }
}
