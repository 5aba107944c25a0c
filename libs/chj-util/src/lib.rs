//! A collection of utilities shared between my crates

pub mod warn;
pub mod trace;
pub mod boxed_error;
