//! Action registry.
//!
//! # Responsibilities
//! - Map action identifiers to resolvable objects
//! - Enumerate every identifier that could be resolved
//!
//! # Design Decisions
//! - The dispatch stage sees only the [`ActionRegistry`] trait, so lookups can be
//!   backed by a static map, lazy construction or a proxy
//! - [`ActionLocator`] is frozen after construction; lookups take `&self` and
//!   are safe to run concurrently
//! - Lazily built entries are constructed once and shared afterwards

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::action::Resolvable;

/// The registry could not resolve an identifier.
///
/// `id` is the identifier the lookup failed on, which may be a dependency of
/// the one originally requested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Service \"{id}\" not found")]
pub struct ServiceNotFound {
    pub id: String,
}

impl ServiceNotFound {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Lookup of actions by identifier.
pub trait ActionRegistry: Send + Sync {
    fn resolve(&self, id: &str) -> Result<Arc<dyn Resolvable>, ServiceNotFound>;

    /// Every identifier [`resolve`](Self::resolve) could succeed for.
    fn identifiers(&self) -> Vec<String>;
}

type Factory = Box<dyn Fn() -> Arc<dyn Resolvable> + Send + Sync>;

enum Entry {
    Instance(Arc<dyn Resolvable>),
    Lazy(Factory),
    Alias(String),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Instance(obj) => f.debug_tuple("Instance").field(obj).finish(),
            Entry::Lazy(_) => f.write_str("Lazy"),
            Entry::Alias(target) => f.debug_tuple("Alias").field(target).finish(),
        }
    }
}

/// Upper bound on alias hops before a chain is treated as a cycle.
pub const MAX_ALIAS_DEPTH: usize = 16;

/// Service-locator style registry.
#[derive(Debug, Default)]
pub struct ActionLocator {
    entries: BTreeMap<String, Entry>,
    built: DashMap<String, Arc<dyn Resolvable>>,
}

impl ActionLocator {
    pub fn builder() -> ActionLocatorBuilder {
        ActionLocatorBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve_at_depth(
        &self,
        id: &str,
        depth: usize,
    ) -> Result<Arc<dyn Resolvable>, ServiceNotFound> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| ServiceNotFound::new(id))?;

        match entry {
            Entry::Instance(obj) => Ok(obj.clone()),
            Entry::Lazy(factory) => {
                let obj = self
                    .built
                    .entry(id.to_string())
                    .or_insert_with(|| {
                        tracing::debug!(action = %id, "Constructing action");
                        factory()
                    })
                    .clone();
                Ok(obj)
            }
            Entry::Alias(target) => {
                if depth >= MAX_ALIAS_DEPTH {
                    tracing::warn!(action = %id, target = %target, "Alias chain too deep");
                    return Err(ServiceNotFound::new(target.clone()));
                }
                self.resolve_at_depth(target, depth + 1)
            }
        }
    }
}

impl ActionRegistry for ActionLocator {
    fn resolve(&self, id: &str) -> Result<Arc<dyn Resolvable>, ServiceNotFound> {
        self.resolve_at_depth(id, 0)
    }

    fn identifiers(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Collects entries before the locator is frozen.
#[derive(Default)]
pub struct ActionLocatorBuilder {
    entries: BTreeMap<String, Entry>,
}

impl ActionLocatorBuilder {
    /// Register an already-constructed object.
    pub fn instance(mut self, id: impl Into<String>, obj: impl Resolvable + 'static) -> Self {
        self.entries.insert(id.into(), Entry::Instance(Arc::new(obj)));
        self
    }

    /// Register a shared object.
    pub fn shared(mut self, id: impl Into<String>, obj: Arc<dyn Resolvable>) -> Self {
        self.entries.insert(id.into(), Entry::Instance(obj));
        self
    }

    /// Register an object built on first resolution.
    pub fn lazy<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Resolvable> + Send + Sync + 'static,
    {
        self.entries.insert(id.into(), Entry::Lazy(Box::new(factory)));
        self
    }

    /// Register `id` as another name for `target`.
    pub fn alias(mut self, id: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries.insert(id.into(), Entry::Alias(target.into()));
        self
    }

    pub fn build(self) -> ActionLocator {
        ActionLocator {
            entries: self.entries,
            built: DashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Marker(&'static str);

    impl Resolvable for Marker {}

    #[test]
    fn test_resolve_instance() {
        let locator = ActionLocator::builder().instance("home", Marker("home")).build();
        let obj = locator.resolve("home").unwrap();
        assert!(obj.type_name().ends_with("Marker"));
    }

    #[test]
    fn test_unknown_id_reports_itself() {
        let locator = ActionLocator::builder().build();
        assert_eq!(locator.resolve("nope").unwrap_err(), ServiceNotFound::new("nope"));
    }

    #[test]
    fn test_dangling_alias_reports_target() {
        let locator = ActionLocator::builder().alias("old", "gone").build();
        let err = locator.resolve("old").unwrap_err();
        assert_eq!(err.id, "gone");
    }

    #[test]
    fn test_alias_cycle_is_not_found() {
        let locator = ActionLocator::builder().alias("a", "b").alias("b", "a").build();
        assert!(locator.resolve("a").is_err());
    }

    #[test]
    fn test_lazy_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let locator = ActionLocator::builder()
            .lazy("report", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(Marker("report"))
            })
            .build();

        let first = locator.resolve("report").unwrap();
        let second = locator.resolve("report").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_identifiers_are_sorted_and_include_aliases() {
        let locator = ActionLocator::builder()
            .instance("zeta", Marker("z"))
            .alias("alpha", "zeta")
            .instance("mid", Marker("m"))
            .build();
        assert_eq!(locator.identifiers(), vec!["alpha", "mid", "zeta"]);
    }
}
