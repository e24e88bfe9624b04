//! Route lookup: path prefix → upstream host.
//!
//! # Responsibilities
//! - Store the route table built from configuration
//! - Split `/<prefix>/<rest>` into a route and the path forwarded upstream
//! - Return an explicit `NoRoute` rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) prefix lookup via HashMap; prefixes are literal path segments
//! - No regex: the first segment either equals a prefix or it does not

use std::collections::HashMap;

use thiserror::Error;

use crate::config::RouteConfig;

/// A compiled route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub prefix: String,
    pub upstream_host: String,
    pub scheme: String,
}

impl From<&RouteConfig> for Route {
    fn from(config: &RouteConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            upstream_host: config.upstream_host.clone(),
            scheme: config.scheme.clone(),
        }
    }
}

/// A path that matched a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'r> {
    pub route: &'r Route,
    /// Path forwarded upstream, always starting with `/`.
    pub remainder: String,
}

impl Resolved<'_> {
    /// `{scheme}://{host}{remainder}{?query}`; an empty query is dropped.
    pub fn upstream_url(&self, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!(
                "{}://{}{}?{}",
                self.route.scheme, self.route.upstream_host, self.remainder, q
            ),
            _ => format!(
                "{}://{}{}",
                self.route.scheme, self.route.upstream_host, self.remainder
            ),
        }
    }
}

/// The path did not start with a known prefix.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("no route matches the request path")]
pub struct NoRoute;

/// Maps route prefixes to fixed upstream hosts.
#[derive(Debug, Clone)]
pub struct HostResolver {
    routes: HashMap<String, Route>,
    /// Prefixes in configuration order, for error messages.
    order: Vec<String>,
}

impl HostResolver {
    /// Build a resolver from an already validated route table.
    pub fn new(routes: &[RouteConfig]) -> Self {
        let mut table = HashMap::with_capacity(routes.len());
        let mut order = Vec::with_capacity(routes.len());
        for config in routes {
            if table.insert(config.prefix.clone(), Route::from(config)).is_none() {
                order.push(config.prefix.clone());
            }
        }
        Self { routes: table, order }
    }

    /// Resolve `/<prefix>/<rest>` to its route and `/<rest>`.
    pub fn resolve(&self, path: &str) -> Result<Resolved<'_>, NoRoute> {
        let rest = path.strip_prefix('/').ok_or(NoRoute)?;
        let slash = rest.find('/').ok_or(NoRoute)?;
        let (prefix, remainder) = rest.split_at(slash);

        let route = self.routes.get(prefix).ok_or(NoRoute)?;
        Ok(Resolved {
            route,
            remainder: remainder.to_string(),
        })
    }

    /// Known prefixes in configuration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
