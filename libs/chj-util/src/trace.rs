//! Thread-local switch for `trace!`.
//!
//! Enabled if the `TRACE` env var is set to a truthy value or
//! `enabled_set(true)` was called in the thread. Independently, every
//! `trace!` call site passes its own condition.

use std::cell::Cell;

fn is_truthy(v: &str) -> bool {
    match v {
        "0" | "" | "off" | "false" | "no" => false,
        _ => true
    }
}

fn trace_env_get() -> bool {
    match std::env::var("TRACE") {
        Ok(v) => is_truthy(&v),
        Err(_) => false
    }
}

thread_local!{
    pub static ENABLED: Cell<bool> = Cell::new(trace_env_get());
}

/// Enable `trace!` for the current thread.
pub fn enabled_set(on: bool) {
    ENABLED.with(|cell| cell.set(on))
}

pub fn enabled() -> bool {
    ENABLED.with(|old| old.get())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_is_truthy() {
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }

    #[test]
    fn t_enabled_set() {
        enabled_set(true);
        assert!(enabled());
        enabled_set(false);
        assert!(!enabled());
    }
}
