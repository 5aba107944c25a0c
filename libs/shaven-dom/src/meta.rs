//! What little we need to know about HTML elements to parse and print
//! them correctly.

use std::collections::HashSet;

use kstring::KString;
use lazy_static::lazy_static;

// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENT_NAMES: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

// Contents are not markup and are never escaped.
const RAW_TEXT_ELEMENT_NAMES: &[&str] = &[
    "script", "style",
];

lazy_static!{
    static ref VOID_ELEMENTS: HashSet<&'static str> =
        VOID_ELEMENT_NAMES.iter().copied().collect();
    static ref RAW_TEXT_ELEMENTS: HashSet<&'static str> =
        RAW_TEXT_ELEMENT_NAMES.iter().copied().collect();
}

/// Void elements have neither content nor an end tag.
pub fn has_closing_tag(tag_name: &str) -> bool {
    ! VOID_ELEMENTS.contains(tag_name)
}

pub fn is_raw_text(tag_name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(tag_name)
}

pub(crate) fn is_tag_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

pub(crate) fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Anything but whitespace, quotes, `<`, `>`, `/` and `=`.
pub(crate) fn is_attribute_name_char(c: char) -> bool {
    ! (c.is_whitespace() || c.is_control()
       || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='))
}

/// Whether `name` could have come out of the parser as a tag name.
pub fn is_valid_tag_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(b) if is_tag_name_start(*b) =>
            bytes[1..].iter().all(|b| is_tag_name_char(*b)),
        _ => false
    }
}

/// Attribute names are case-insensitive; the parser stores them
/// lowercased, so any name compared against them has to be, too.
pub fn attribute_name_key(name: &str) -> KString {
    KString::from_string(name.to_lowercase())
}

pub fn is_valid_attribute_name(name: &str) -> bool {
    ! name.is_empty() && name.chars().all(is_attribute_name_char)
}
