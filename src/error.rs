use kstring::KString;

/// No frame in scope has a binding of this name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing binding {:?} (on element <{element}>)", .name.as_str())]
pub struct MissingBinding {
    pub name: KString,
    pub element: KString,
}
