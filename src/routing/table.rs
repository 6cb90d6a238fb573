//! Route Table
//!
//! Ordered registry of admin endpoints keyed by (path, method), sealed into an
//! axum [`Router`] once the server starts.

use std::sync::Arc;

use axum::{
    handler::Handler,
    http::Method,
    middleware,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};

use crate::error::{AdminError, Result};
use crate::middleware::auth::{require_credentials, AuthGate};

/// Every method the router can dispatch on.
///
/// Registering with this set is the equivalent of a method-less route.
pub const ALL_METHODS: &[Method] = &[
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

// == Access ==
/// Whether a route sits behind the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable without credentials
    Public,
    /// Requires the configured admin credentials
    Protected,
}

// == Route ==
#[derive(Clone)]
struct Route {
    path: String,
    method: Method,
    access: Access,
    endpoint: MethodRouter,
}

// == Route Table ==
/// Registry of admin routes.
///
/// Registering the same (path, method) pair twice is allowed: the last
/// registration wins, including its [`Access`]. Distinct methods on one path
/// are merged into a single endpoint when the table is sealed.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stateless handler for each of `methods` on `path`.
    pub fn register<H, T>(
        &mut self,
        path: &str,
        methods: &[Method],
        access: Access,
        handler: H,
    ) -> Result<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.register_with_state(path, methods, access, handler, ())
    }

    /// Registers a handler that extracts `State<S>`, binding `state` to it.
    pub fn register_with_state<H, T, S>(
        &mut self,
        path: &str,
        methods: &[Method],
        access: Access,
        handler: H,
        state: S,
    ) -> Result<&mut Self>
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        // Validate every method before touching the table
        let filters = methods
            .iter()
            .map(|method| {
                MethodFilter::try_from(method.clone())
                    .map(|filter| (method.clone(), filter))
                    .map_err(|_| AdminError::UnsupportedMethod(method.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        for (method, filter) in filters {
            self.routes.push(Route {
                path: path.to_string(),
                method,
                access,
                endpoint: on(filter, handler.clone()).with_state(state.clone()),
            });
        }
        Ok(self)
    }

    /// Effective registrations in first-registration order of their path.
    pub fn routes(&self) -> Vec<(String, Method, Access)> {
        self.effective_routes()
            .into_iter()
            .map(|route| (route.path.clone(), route.method.clone(), route.access))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.effective_routes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Looks up the access level a (path, method) pair resolved to.
    pub fn access_of(&self, path: &str, method: &Method) -> Option<Access> {
        self.routes
            .iter()
            .rev()
            .find(|route| route.path == path && route.method == *method)
            .map(|route| route.access)
    }

    /// Seals the table into a router, gating protected routes with `gate`.
    pub fn into_router(self, gate: Arc<AuthGate>) -> Router {
        let mut grouped: Vec<(String, Vec<MethodRouter>)> = Vec::new();

        for route in dedup_last_wins(self.routes) {
            let endpoint = match route.access {
                Access::Public => route.endpoint,
                Access::Protected => route.endpoint.route_layer(middleware::from_fn_with_state(
                    gate.clone(),
                    require_credentials,
                )),
            };

            match grouped.iter_mut().find(|(path, _)| *path == route.path) {
                Some((_, endpoints)) => endpoints.push(endpoint),
                None => grouped.push((route.path, vec![endpoint])),
            }
        }

        grouped
            .into_iter()
            .fold(Router::new(), |router, (path, endpoints)| {
                match endpoints.into_iter().reduce(MethodRouter::merge) {
                    Some(endpoint) => router.route(&path, endpoint),
                    None => router,
                }
            })
    }

    fn effective_routes(&self) -> Vec<&Route> {
        let mut effective: Vec<&Route> = Vec::new();
        for route in &self.routes {
            effective.retain(|r| !(r.path == route.path && r.method == route.method));
            effective.push(route);
        }
        effective
    }
}

/// Drops every route shadowed by a later registration of the same pair.
fn dedup_last_wins(routes: Vec<Route>) -> Vec<Route> {
    let mut effective: Vec<Route> = Vec::with_capacity(routes.len());
    for route in routes {
        effective.retain(|r| !(r.path == route.path && r.method == route.method));
        effective.push(route);
    }
    effective
}
