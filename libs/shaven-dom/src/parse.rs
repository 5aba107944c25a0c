//! Template text to nodes.
//!
//! This is not an HTML5 parser: there's no error recovery and no
//! implied end tags; everything that is opened has to be closed
//! (except void elements). That's what you want for templates, where
//! silently re-nesting the author's markup would hide mistakes.

use std::fmt::Display;

use chj_util::{def_boxed_thiserror, nowarn as warn};
use kstring::KString;

use crate::{Node, Element,
            entities::{Piece, decode_text, decode_attribute_value},
            meta::{has_closing_tag, attribute_name_key, is_raw_text, is_tag_name_start, is_tag_name_char,
                   is_attribute_name_char}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based
    pub line: u32,
    /// 1-based, in characters
    pub column: u32,
}

impl Position {
    fn at(input: &str, offset: usize) -> Position {
        let before = &input[..offset];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Position {
            line: before.matches('\n').count() as u32 + 1,
            column: before[line_start..].chars().count() as u32 + 1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

def_boxed_thiserror!(ParseError, pub enum ParseErrorKind {
    #[error("element <{name}> opened at {at} is never closed")]
    Unclosed { name: KString, at: Position },
    #[error("end tag </{found}> at {at} does not match open element <{expected}>")]
    MismatchedEndTag { expected: KString, found: KString, at: Position },
    #[error("end tag </{name}> at {at} without open element")]
    UnexpectedEndTag { name: KString, at: Position },
    #[error("end tag </{name}> at {at} for void element")]
    VoidEndTag { name: KString, at: Position },
    #[error("invalid tag name at {at}")]
    InvalidTagName { at: Position },
    #[error("unterminated tag starting at {at}")]
    UnterminatedTag { at: Position },
    #[error("invalid character {found:?} in attribute list at {at}")]
    InvalidAttribute { found: char, at: Position },
    #[error("unterminated attribute value starting at {at}")]
    UnterminatedAttributeValue { at: Position },
    #[error("duplicate attribute {:?} at {at}", .name.as_str())]
    DuplicateAttribute { name: KString, at: Position },
    #[error("unterminated comment starting at {at}")]
    UnterminatedComment { at: Position },
    #[error("unknown character reference &{name}; in attribute value at {at}")]
    UnknownCharacterReference { name: KString, at: Position },
});

impl ParseErrorKind {
    pub fn position(&self) -> Position {
        match self {
            ParseErrorKind::Unclosed { at, .. } => *at,
            ParseErrorKind::MismatchedEndTag { at, .. } => *at,
            ParseErrorKind::UnexpectedEndTag { at, .. } => *at,
            ParseErrorKind::VoidEndTag { at, .. } => *at,
            ParseErrorKind::InvalidTagName { at } => *at,
            ParseErrorKind::UnterminatedTag { at } => *at,
            ParseErrorKind::InvalidAttribute { at, .. } => *at,
            ParseErrorKind::UnknownCharacterReference { at, .. } => *at,
            ParseErrorKind::UnterminatedAttributeValue { at } => *at,
            ParseErrorKind::DuplicateAttribute { at, .. } => *at,
            ParseErrorKind::UnterminatedComment { at } => *at,
        }
    }
}


const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len()
        && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

/// An element whose end tag hasn't been seen yet.
struct OpenElement {
    element: Element,
    // byte offset of its `<`
    start: usize,
}

struct Parser<'s> {
    input: &'s str,
    bytes: &'s [u8],
    // Invariant: always on a char boundary; we only stop at ASCII
    // bytes or after whole chars.
    pos: usize,
    stack: Vec<OpenElement>,
    top: Vec<Node>,
}

impl<'s> Parser<'s> {
    fn new(input: &'s str) -> Self {
        Parser {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            stack: Vec::new(),
            top: Vec::new(),
        }
    }

    fn position(&self, offset: usize) -> Position {
        Position::at(self.input, offset)
    }

    fn current_body(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(open) => &mut open.element.body,
            None => &mut self.top,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if ! b.is_ascii_whitespace() {
                break
            }
            self.pos += 1;
        }
    }

    /// Whether a `<` at the current position starts markup, as
    /// opposed to being a literal character in text.
    fn at_markup(&self) -> bool {
        match self.peek_at(1) {
            Some(b'!') => true,
            Some(b'/') => true,
            Some(b) => is_tag_name_start(b),
            None => false,
        }
    }

    fn run(mut self) -> Result<Vec<Node>, ParseError> {
        while self.pos < self.bytes.len() {
            if self.peek() == Some(b'<') && self.at_markup() {
                let bytes = self.bytes;
                let rest = &bytes[self.pos..];
                if rest.starts_with(COMMENT_START.as_bytes()) {
                    self.comment()?;
                } else if rest[1] == b'!' {
                    self.declaration()?;
                } else if rest[1] == b'/' {
                    self.end_tag()?;
                } else {
                    self.start_tag()?;
                }
            } else {
                self.text();
            }
        }
        if let Some(open) = self.stack.pop() {
            return Err(ParseErrorKind::Unclosed {
                name: open.element.name,
                at: self.position(open.start),
            }.into())
        }
        Ok(self.top)
    }

    fn text(&mut self) {
        let start = self.pos;
        // The first byte is either not `<`, or a `<` that is not markup.
        self.pos += 1;
        while let Some(b) = self.peek() {
            if b == b'<' && self.at_markup() {
                break
            }
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        for piece in decode_text(text) {
            let node = match piece {
                Piece::Text(s) => Node::String(KString::from_string(s)),
                Piece::Verbatim(s) => Node::Preserialized(KString::from_ref(s)),
            };
            self.current_body().push(node);
        }
    }

    fn comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let body_start = start + COMMENT_START.len();
        match self.input[body_start..].find(COMMENT_END) {
            Some(end) => {
                self.pos = body_start + end + COMMENT_END.len();
                let s = KString::from_ref(&self.input[start..self.pos]);
                self.current_body().push(Node::Preserialized(s));
                Ok(())
            }
            None => Err(ParseErrorKind::UnterminatedComment {
                at: self.position(start)
            }.into())
        }
    }

    fn declaration(&mut self) -> Result<(), ParseError> {
        // <!DOCTYPE ...> and friends, kept verbatim
        let start = self.pos;
        match self.input[start..].find('>') {
            Some(end) => {
                self.pos = start + end + 1;
                let s = KString::from_ref(&self.input[start..self.pos]);
                self.current_body().push(Node::Preserialized(s));
                Ok(())
            }
            None => Err(ParseErrorKind::UnterminatedTag {
                at: self.position(start)
            }.into())
        }
    }

    fn tag_name(&mut self) -> Result<KString, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(b) if is_tag_name_start(b) => (),
            _ => return Err(ParseErrorKind::InvalidTagName {
                at: self.position(start)
            }.into())
        }
        while let Some(b) = self.peek() {
            if ! is_tag_name_char(b) {
                break
            }
            self.pos += 1;
        }
        Ok(KString::from_string(self.input[start..self.pos].to_ascii_lowercase()))
    }

    fn end_tag(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 2; // "</"
        let name = self.tag_name()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b'>') => self.pos += 1,
            None => return Err(ParseErrorKind::UnterminatedTag {
                at: self.position(start)
            }.into()),
            Some(_) => return Err(ParseErrorKind::InvalidTagName {
                at: self.position(start)
            }.into()),
        }
        if ! has_closing_tag(&name) {
            return Err(ParseErrorKind::VoidEndTag {
                name,
                at: self.position(start)
            }.into())
        }
        match self.stack.pop() {
            None => Err(ParseErrorKind::UnexpectedEndTag {
                name,
                at: self.position(start)
            }.into()),
            Some(open) =>
                if open.element.name != name {
                    Err(ParseErrorKind::MismatchedEndTag {
                        expected: open.element.name,
                        found: name,
                        at: self.position(start)
                    }.into())
                } else {
                    warn!("closed <{}>", name);
                    self.current_body().push(Node::Element(open.element));
                    Ok(())
                }
        }
    }

    fn decoded_attribute_value(&self, start: usize, end: usize) -> Result<KString, ParseError> {
        match decode_attribute_value(&self.input[start..end]) {
            Ok(value) => Ok(KString::from_ref(&value)),
            Err((offset, name)) => Err(ParseErrorKind::UnknownCharacterReference {
                name: KString::from_ref(name),
                at: self.position(start + offset)
            }.into())
        }
    }

    fn attribute_value(&mut self) -> Result<KString, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(quote) if quote == b'"' || quote == b'\'' => {
                let vstart = start + 1;
                match self.bytes[vstart..].iter().position(|b| *b == quote) {
                    Some(len) => {
                        self.pos = vstart + len + 1;
                        self.decoded_attribute_value(vstart, vstart + len)
                    }
                    None => Err(ParseErrorKind::UnterminatedAttributeValue {
                        at: self.position(start)
                    }.into())
                }
            }
            _ => {
                // unquoted
                while let Some(b) = self.peek() {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break
                    }
                    if matches!(b, b'"' | b'\'' | b'<' | b'=' | b'`') {
                        return Err(ParseErrorKind::InvalidAttribute {
                            found: b as char,
                            at: self.position(self.pos)
                        }.into())
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    return match self.peek() {
                        None => Err(ParseErrorKind::UnterminatedTag {
                            at: self.position(start)
                        }.into()),
                        Some(b) => Err(ParseErrorKind::InvalidAttribute {
                            found: b as char,
                            at: self.position(start)
                        }.into()),
                    }
                }
                self.decoded_attribute_value(start, self.pos)
            }
        }
    }

    fn start_tag(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // "<"
        let name = self.tag_name()?;
        let mut element = Element::new(name);
        let mut self_closing = false;
        loop {
            let had_whitespace = matches!(self.peek(), Some(b) if b.is_ascii_whitespace());
            self.skip_whitespace();
            let c = match self.input[self.pos..].chars().next() {
                None => return Err(ParseErrorKind::UnterminatedTag {
                    at: self.position(start)
                }.into()),
                Some(c) => c
            };
            match c {
                '>' => {
                    self.pos += 1;
                    break
                }
                '/' if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    self_closing = true;
                    break
                }
                c if is_attribute_name_char(c) && had_whitespace => {
                    let name_start = self.pos;
                    for c in self.input[name_start..].chars() {
                        if ! is_attribute_name_char(c) {
                            break
                        }
                        self.pos += c.len_utf8();
                    }
                    let key = attribute_name_key(&self.input[name_start..self.pos]);
                    self.skip_whitespace();
                    let val = if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        self.attribute_value()?
                    } else {
                        KString::from_static("")
                    };
                    if element.get_attribute(&key).is_some() {
                        return Err(ParseErrorKind::DuplicateAttribute {
                            name: key,
                            at: self.position(name_start)
                        }.into())
                    }
                    element.attr.push((key, val));
                }
                c => return Err(ParseErrorKind::InvalidAttribute {
                    found: c,
                    at: self.position(self.pos)
                }.into())
            }
        }

        if self_closing || ! has_closing_tag(&element.name) {
            self.current_body().push(Node::Element(element));
        } else if is_raw_text(&element.name) {
            self.raw_text(element, start)?;
        } else {
            self.stack.push(OpenElement { element, start });
        }
        Ok(())
    }

    /// Contents of script and style run up to the matching end tag
    /// and are kept verbatim.
    fn raw_text(&mut self, mut element: Element, start: usize) -> Result<(), ParseError> {
        let close = format!("</{}", element.name);
        let content_start = self.pos;
        let mut i = content_start;
        loop {
            let rel = match self.input[i..].find("</") {
                Some(rel) => rel,
                None => return Err(ParseErrorKind::Unclosed {
                    name: element.name,
                    at: self.position(start)
                }.into())
            };
            let candidate = i + rel;
            if starts_with_ignore_ascii_case(&self.bytes[candidate..], close.as_bytes()) {
                let mut k = candidate + close.len();
                while k < self.bytes.len() && self.bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                if self.bytes.get(k) == Some(&b'>') {
                    let raw = &self.input[content_start..candidate];
                    if ! raw.is_empty() {
                        element.body.push(Node::Preserialized(KString::from_ref(raw)));
                    }
                    self.pos = k + 1;
                    self.current_body().push(Node::Element(element));
                    return Ok(())
                }
            }
            i = candidate + 2;
        }
    }
}

/// Parse template text into its top-level nodes.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, ParseError> {
    Parser::new(input).run()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Print;

    fn t(s: &str) -> String {
        parse_fragment(s).unwrap().to_html_fragment_string(None).unwrap()
    }

    fn e(s: &str) -> String {
        parse_fragment(s).err().unwrap().to_string()
    }

    #[test]
    fn t_parse_simple() {
        assert_eq!(t(""), "");
        assert_eq!(t("hello"), "hello");
        assert_eq!(t("<h1 rb=\"title\">X</h1>"), "<h1 rb=\"title\">X</h1>");
        assert_eq!(t("<P Class=a>x</p>"), "<p class=\"a\">x</p>");
        assert_eq!(t("<ul>\n  <li>a</li>\n</ul>\n"), "<ul>\n  <li>a</li>\n</ul>\n");
    }

    #[test]
    fn t_parse_structure() {
        let nodes = parse_fragment("<div id=a><p>x</p>y</div>").unwrap();
        assert_eq!(nodes.len(), 1);
        let div = nodes[0].try_element().unwrap();
        assert_eq!(div.name(), "div");
        assert_eq!(div.get_attribute("id"), Some("a"));
        assert_eq!(div.body().len(), 2);
        assert_eq!(div.body()[0].try_element().unwrap().name(), "p");
        assert_eq!(div.body()[1], Node::String(KString::from_static("y")));
    }

    #[test]
    fn t_parse_attributes_keep_order() {
        let nodes = parse_fragment("<a title='t' href=\"/x\" data-n=3 hidden>l</a>").unwrap();
        let a = nodes[0].try_element().unwrap();
        let keys: Vec<&str> = a.attr().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["title", "href", "data-n", "hidden"]);
        assert_eq!(t("<a title='t' href=\"/x\" data-n=3 hidden>l</a>"),
                   "<a title=\"t\" href=\"/x\" data-n=\"3\" hidden=\"\">l</a>");
    }

    #[test]
    fn t_parse_entities_and_escaping() {
        let nodes = parse_fragment("<p title=\"a&quot;b\">1 &lt; 2 &amp;&amp; AT&T</p>").unwrap();
        let p = nodes[0].try_element().unwrap();
        assert_eq!(p.get_attribute("title"), Some("a\"b"));
        assert_eq!(p.to_plain_string(), "1 < 2 && AT&T");
        assert_eq!(t("<p>1 &lt; 2 &amp;&amp; AT&T</p>"),
                   "<p>1 &lt; 2 &amp;&amp; AT&amp;T</p>");
        assert_eq!(t("a < b"), "a &lt; b");
    }

    #[test]
    fn t_parse_named_references() {
        let nodes = parse_fragment(
            "<p title=\"caf&eacute;\">&copy; 2024 &mdash; caf&eacute;</p>").unwrap();
        let p = nodes[0].try_element().unwrap();
        assert_eq!(p.get_attribute("title"), Some("café"));
        assert_eq!(p.to_plain_string(), "© 2024 — café");
        assert_eq!(t("<p>&copy; &hellip; &eacute;</p>"), "<p>© … é</p>");
        // unknown names are written out as they were
        assert_eq!(t("<p>&check; done &amp; &check;</p>"),
                   "<p>&check; done &amp; &check;</p>");
        assert_eq!(e("<p>x</p><a title=\"&check;\">y</a>"),
                   "unknown character reference &check; in attribute value at line 1, column 19");
    }

    #[test]
    fn t_parse_void_and_self_closing() {
        assert_eq!(t("<p>a<br>b<img src=x.png/></p>"),
                   "<p>a<br>b<img src=\"x.png/\"></p>");
        assert_eq!(t("<p>a<br/>b<img src=\"x.png\" /></p>"),
                   "<p>a<br>b<img src=\"x.png\"></p>");
        assert_eq!(t("<div/>"), "<div></div>");
    }

    #[test]
    fn t_parse_verbatim_parts() {
        assert_eq!(t("<!DOCTYPE html>\n<html><body><!-- <b>c</b> --></body></html>"),
                   "<!DOCTYPE html>\n<html><body><!-- <b>c</b> --></body></html>");
        assert_eq!(t("<script>if (a < b && c) { x = \"</p>\"; }</script>"),
                   "<script>if (a < b && c) { x = \"</p>\"; }</script>");
        assert_eq!(t("<style></style>"), "<style></style>");
        assert_eq!(t("<SCRIPT>x</Script >"), "<script>x</script>");
    }

    #[test]
    fn t_parse_round_trip_is_stable() {
        for s in ["<p class=a b>it's <i>1&nbsp;&gt;&#48;</i></p>",
                  "<ul><li rb=\"items\">X</li></ul>",
                  "x<y &amp z>"] {
            if parse_fragment(s).is_ok() {
                let once = t(s);
                assert_eq!(t(&once), once);
            }
        }
    }

    #[test]
    fn t_parse_errors() {
        assert_eq!(e("<div><p>x</div>"),
                   "end tag </div> at line 1, column 10 does not match open element <p>");
        assert_eq!(e("<div>\n  <p>x</p>"),
                   "element <div> opened at line 1, column 1 is never closed");
        assert_eq!(e("x</p>"),
                   "end tag </p> at line 1, column 2 without open element");
        assert_eq!(e("<br></br>"),
                   "end tag </br> at line 1, column 5 for void element");
        assert_eq!(e("<p class=\"x>y</p>"),
                   "unterminated attribute value starting at line 1, column 10");
        assert_eq!(e("<p class"),
                   "unterminated tag starting at line 1, column 1");
        assert_eq!(e("<p a=1 a=2>"),
                   "duplicate attribute \"a\" at line 1, column 8");
        assert_eq!(e("<p \"x\">"),
                   "invalid character '\"' in attribute list at line 1, column 4");
        assert_eq!(e("<p a=\"1\"b=2>"),
                   "invalid character 'b' in attribute list at line 1, column 9");
        assert_eq!(e("<!-- x"),
                   "unterminated comment starting at line 1, column 1");
        assert_eq!(e("<script>x"),
                   "element <script> opened at line 1, column 1 is never closed");
        assert_eq!(e("</ p>"),
                   "invalid tag name at line 1, column 3");
    }

    #[test]
    fn t_parse_error_kind() {
        let err = parse_fragment("ab\ncd <i>").err().unwrap();
        match err.kind() {
            ParseErrorKind::Unclosed { name, at } => {
                assert_eq!(name.as_str(), "i");
                assert_eq!(*at, Position { line: 2, column: 4 });
            }
            other => panic!("unexpected {other:?}")
        }
    }
}
