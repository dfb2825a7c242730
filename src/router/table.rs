//! Route registration: the exact-match index and the ordered pattern list.
//!
//! Paths without `:` or `*` go into a two-level index
//! (`method → path → handler`) and resolve in O(1). Templated paths are
//! compiled once into a [`PathPattern`] and appended to a list that the
//! resolver scans in registration order.
//!
//! Every operation takes `&self`: routes can be added while other threads are
//! resolving. The exact index is a [`DashMap`]; the pattern list is an
//! immutable `Vec` behind an [`ArcSwap`] that is replaced (copy-on-write) on
//! every append, so a scan in progress always sees a complete snapshot.
//!
//! A `None` method registers a method-agnostic route, consulted only after
//! the method-specific routes of the same tier miss.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use super::handler::Handler;
use super::pattern::{self, PathPattern};
use crate::http::Method;

/// Errors raised while registering routes. The table is unchanged when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("route path must not be empty")]
    EmptyPath,

    #[error("empty parameter name in route template `{template}`")]
    EmptyParameterName { template: String },

    #[error("parameter `{name}` appears more than once in route template `{template}`")]
    DuplicateParameter { template: String, name: String },

    #[error("no routes registered for HTTP method {method}")]
    UnknownMethod { method: String },

    #[error("target path `{target}` is not registered for HTTP method {method}")]
    UnknownTarget { method: String, target: String },
}

/// A compiled pattern route.
pub struct PatternRoute {
    method: Option<Method>,
    pattern: PathPattern,
    handler: Handler,
}

impl PatternRoute {
    /// `None` for a method-agnostic route.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl std::fmt::Debug for PatternRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRoute")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .finish_non_exhaustive()
    }
}

/// The registered routes of one application.
#[derive(Default)]
pub struct RouteTable {
    exact: DashMap<Option<Method>, DashMap<String, Handler>>,
    patterns: ArcSwap<Vec<Arc<PatternRoute>>>,
    fallback: ArcSwapOption<Handler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `path`.
    ///
    /// Paths containing `:` or `*` are compiled and appended to the pattern
    /// list; all others are stored in the exact index, replacing any handler
    /// previously registered for the same method and path.
    ///
    /// # Errors
    ///
    /// [`RouteError::EmptyPath`], or a template error from [`PathPattern::compile`].
    pub fn route(
        &self,
        method: Option<Method>,
        path: &str,
        handler: Handler,
    ) -> Result<(), RouteError> {
        if path.is_empty() {
            return Err(RouteError::EmptyPath);
        }

        if pattern::is_template(path) {
            let route = Arc::new(PatternRoute {
                method,
                pattern: PathPattern::compile(path)?,
                handler,
            });
            debug!(method = ?route.method, template = %path, "registered pattern route");
            self.patterns.rcu(|current| {
                let mut next = Vec::with_capacity(current.len() + 1);
                next.extend(current.iter().cloned());
                next.push(Arc::clone(&route));
                next
            });
        } else {
            let replaced = self
                .exact
                .entry(method.clone())
                .or_default()
                .insert(path.to_owned(), handler)
                .is_some();
            debug!(method = ?method, path = %path, replaced, "registered exact route");
        }
        Ok(())
    }

    /// Register `new_path` with the handler already registered for
    /// `method` under `target_path`.
    ///
    /// The target is looked up by its original path string: first in the
    /// exact index, then in the pattern list in registration order.
    /// `new_path` is classified on its own (exact or pattern).
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnknownMethod`] — nothing is registered for `method`.
    /// - [`RouteError::UnknownTarget`] — `target_path` is not registered for `method`.
    /// - any error [`route`](Self::route) returns for `new_path`.
    pub fn alias(
        &self,
        method: Option<Method>,
        new_path: &str,
        target_path: &str,
    ) -> Result<(), RouteError> {
        let method_name = || {
            method
                .as_ref()
                .map_or_else(|| "*".to_owned(), |m| m.as_str().to_owned())
        };

        if !self.has_method(method.as_ref()) {
            return Err(RouteError::UnknownMethod {
                method: method_name(),
            });
        }

        let handler = self
            .find_registered(method.as_ref(), target_path)
            .ok_or_else(|| RouteError::UnknownTarget {
                method: method_name(),
                target: target_path.to_owned(),
            })?;

        debug!(method = ?method, alias = %new_path, target = %target_path, "registering alias");
        self.route(method, new_path, handler)
    }

    /// Set the handler used when no route matches.
    pub fn set_fallback(&self, handler: Handler) {
        self.fallback.store(Some(Arc::new(handler)));
    }

    /// The not-found handler, if one was set.
    pub fn fallback(&self) -> Option<Handler> {
        self.fallback.load().as_deref().cloned()
    }

    /// Exact-index lookup for one method tier.
    pub fn exact(&self, method: Option<&Method>, path: &str) -> Option<Handler> {
        let key = method.cloned();
        let by_path = self.exact.get(&key)?;
        let handler = by_path.get(path).map(|h| Arc::clone(h.value()));
        handler
    }

    /// A consistent snapshot of the pattern list, in registration order.
    pub fn patterns(&self) -> Arc<Vec<Arc<PatternRoute>>> {
        self.patterns.load_full()
    }

    /// Number of registered exact and pattern routes (the fallback is not counted).
    pub fn len(&self) -> usize {
        let exact: usize = self.exact.iter().map(|by_path| by_path.len()).sum();
        exact + self.patterns.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn has_method(&self, method: Option<&Method>) -> bool {
        let key = method.cloned();
        let has_exact = self
            .exact
            .get(&key)
            .is_some_and(|by_path| !by_path.is_empty());
        has_exact || self.patterns.load().iter().any(|r| r.method.as_ref() == method)
    }

    fn find_registered(&self, method: Option<&Method>, path: &str) -> Option<Handler> {
        self.exact(method, path).or_else(|| {
            self.patterns
                .load()
                .iter()
                .find(|r| r.method.as_ref() == method && r.pattern.template() == path)
                .map(|r| Arc::clone(&r.handler))
        })
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("exact", &self.exact.iter().map(|e| e.len()).sum::<usize>())
            .field("patterns", &self.patterns.load().len())
            .field("fallback", &self.fallback.load().is_some())
            .finish()
    }
}
