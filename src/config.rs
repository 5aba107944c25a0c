//! How templates are rendered.

use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, Error};
use kstring::KString;
use shaven_dom::{DEFAULT_BINDING_ATTRIBUTE, attribute_name_key, myfrom::MyFrom};

/// What to do when no frame in scope has a binding of the name given
/// in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingBindingPolicy {
    /// Abort rendering with a `MissingBinding` error.
    #[default]
    Fail,
    /// Warn, and leave the element as if the binding was `Absent`.
    Skip,
}

impl MissingBindingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingBindingPolicy::Fail => "fail",
            MissingBindingPolicy::Skip => "skip",
        }
    }
}

impl Display for MissingBindingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingBindingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(MissingBindingPolicy::Fail),
            "skip" => Ok(MissingBindingPolicy::Skip),
            _ => Err(anyhow!("invalid missing binding policy {s:?}, \
                              expecting \"fail\" or \"skip\""))
        }
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// The attribute carrying binding names, lowercased; removed from
    /// the output.
    pub binding_attribute: KString,
    pub missing: MissingBindingPolicy,
    /// Trace each resolved binding to stderr.
    pub trace: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            binding_attribute: KString::from_static(DEFAULT_BINDING_ATTRIBUTE),
            missing: MissingBindingPolicy::Fail,
            trace: false,
        }
    }
}

impl RenderConfig {
    /// Case doesn't matter, as for all attribute names.
    pub fn binding_attribute<T>(mut self, name: T) -> Self
    where KString: MyFrom<T>
    {
        self.binding_attribute = attribute_name_key(&KString::myfrom(name));
        self
    }

    pub fn missing(mut self, policy: MissingBindingPolicy) -> Self {
        self.missing = policy;
        self
    }

    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
