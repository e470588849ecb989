//! Deferred string values evaluated at publish time.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// A string produced by a zero-argument function the first time it is read.
///
/// Clones share the memoized result, so a value is computed at most once no
/// matter how many resource snapshots or publish passes observe it.
#[derive(Clone)]
pub struct LazyValue {
    source: Rc<dyn Fn() -> String>,
    resolved: Rc<OnceCell<String>>,
}

impl LazyValue {
    /// Wraps a function evaluated on first read.
    pub fn new(source: impl Fn() -> String + 'static) -> Self {
        Self {
            source: Rc::new(source),
            resolved: Rc::new(OnceCell::new()),
        }
    }

    /// Creates an already-resolved value.
    pub fn constant(value: impl Into<String>) -> Self {
        let value = value.into();
        let resolved = OnceCell::new();
        let _ = resolved.set(value.clone());
        Self {
            source: Rc::new(move || value.clone()),
            resolved: Rc::new(resolved),
        }
    }

    /// Returns the value, evaluating the source function on first use.
    pub fn get(&self) -> String {
        self.resolved.get_or_init(|| (self.source)()).clone()
    }

    /// Returns true once the value has been evaluated.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(_) => f.write_str("LazyValue(<resolved>)"),
            None => f.write_str("LazyValue(<pending>)"),
        }
    }
}

impl From<&str> for LazyValue {
    fn from(value: &str) -> Self {
        Self::constant(value)
    }
}

impl From<String> for LazyValue {
    fn from(value: String) -> Self {
        Self::constant(value)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn source_runs_once() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&calls);
        let value = LazyValue::new(move || {
            counter.set(counter.get() + 1);
            format!("call-{}", counter.get())
        });

        assert!(!value.is_resolved());
        assert_eq!(value.get(), "call-1");
        assert_eq!(value.get(), "call-1");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clones_share_resolution() {
        let value = LazyValue::new(|| "secret".to_string());
        let copy = value.clone();
        assert_eq!(copy.get(), "secret");
        assert!(value.is_resolved());
    }

    #[test]
    fn constant_is_resolved_up_front() {
        let value = LazyValue::from("fixed");
        assert!(value.is_resolved());
        assert_eq!(value.get(), "fixed");
    }

    #[test]
    fn debug_never_prints_the_value() {
        let value = LazyValue::constant("hunter2");
        assert!(!format!("{value:?}").contains("hunter2"));
    }
}
