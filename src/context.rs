//! Session Scope
//!
//! A typed context container shared down a tree of consumers. A provider
//! inserts a value once; consumers look it up by type. Looking up a value
//! that was never provided is a wiring mistake, so `expect_context` panics
//! instead of falling back to a default.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Typed context values owned by one session
#[derive(Default)]
pub struct Scope {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `false` if one of this type already exists
    pub fn provide<T>(&mut self, value: T) -> bool
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, Box::new(value));
        true
    }

    /// Look up a value by type
    pub fn use_context<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Look up a value by type.
    ///
    /// # Panics
    ///
    /// Panics if no provider inserted a `T` into this scope.
    pub fn expect_context<T>(&self) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.use_context::<T>() {
            Some(value) => value,
            None => panic!(
                "context of type {} requested outside of its provider",
                type_name::<T>()
            ),
        }
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Theme(&'static str);

    #[test]
    fn test_provide_and_use() {
        let mut scope = Scope::new();
        assert!(scope.use_context::<Theme>().is_none());

        assert!(scope.provide(Theme("dark")));
        assert_eq!(scope.use_context::<Theme>(), Some(Theme("dark")));
        assert!(scope.contains::<Theme>());
    }

    #[test]
    fn test_provide_twice_keeps_first() {
        let mut scope = Scope::new();
        assert!(scope.provide(Theme("dark")));
        assert!(!scope.provide(Theme("light")));
        assert_eq!(scope.expect_context::<Theme>(), Theme("dark"));
    }

    #[test]
    #[should_panic(expected = "outside of its provider")]
    fn test_expect_without_provider_panics() {
        let scope = Scope::new();
        let _ = scope.expect_context::<Theme>();
    }
}
