//! Route resolution: exact probe, then pattern scan, then fallback.
//!
//! Resolution never blocks and performs no I/O. It is deterministic: for a
//! fixed set of registered routes the same `(method, path)` always yields the
//! same handler and parameters.

use std::sync::Arc;

use tracing::trace;

use super::handler::Handler;
use super::pattern::split_path;
use super::table::RouteTable;
use crate::context::PathParams;
use crate::http::Method;

/// Which tier of the table produced a [`RouteMatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Pattern,
    Fallback,
}

/// A resolved route: the handler to run and the parameters it captured.
#[derive(Clone)]
pub struct RouteMatch {
    pub handler: Handler,
    pub params: PathParams,
    pub kind: MatchKind,
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("params", &self.params)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Looks requests up in a shared [`RouteTable`].
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<RouteTable>,
}

impl Resolver {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Resolve `method` and `path` to a handler.
    ///
    /// 1. Exact index for `method`, then the method-agnostic exact tier.
    /// 2. Pattern list: routes for `method` in registration order, then
    ///    method-agnostic routes in registration order. The first structural
    ///    match wins; later routes are never consulted.
    /// 3. The fallback handler.
    ///
    /// Returns `None` when nothing matched and no fallback is registered.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        if let Some(found) = self.resolve_exact(method, path) {
            return Some(found);
        }
        if let Some(found) = self.resolve_pattern(method, path) {
            return Some(found);
        }

        let fallback = self.table.fallback();
        trace!(%method, path, fallback = fallback.is_some(), "no route matched");
        fallback.map(|handler| RouteMatch {
            handler,
            params: PathParams::new(),
            kind: MatchKind::Fallback,
        })
    }

    fn resolve_exact(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let handler = self
            .table
            .exact(Some(method), path)
            .or_else(|| self.table.exact(None, path))?;
        trace!(%method, path, "exact route matched");
        Some(RouteMatch {
            handler,
            params: PathParams::new(),
            kind: MatchKind::Exact,
        })
    }

    fn resolve_pattern(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let patterns = self.table.patterns();
        if patterns.is_empty() {
            return None;
        }

        let segments = split_path(path);
        let specific = patterns.iter().filter(|r| r.method() == Some(method));
        let agnostic = patterns.iter().filter(|r| r.method().is_none());

        specific.chain(agnostic).find_map(|route| {
            let params = route.pattern().matches(&segments)?;
            trace!(%method, path, template = route.pattern().template(), "pattern route matched");
            Some(RouteMatch {
                handler: Arc::clone(route.handler()),
                params,
                kind: MatchKind::Pattern,
            })
        })
    }
}
