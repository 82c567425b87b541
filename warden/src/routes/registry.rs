// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::dispatch::Handler;
use super::pattern::{PathParams, RoutePattern};
use crate::roles::RoleSet;
use actix_web::http::Method;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    Duplicate { method: Method, pattern: String },
    InvalidPattern(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Duplicate { method, pattern } => {
                write!(f, "Route {} {} is already registered", method, pattern)
            }
            RegistryError::InvalidPattern(msg) => write!(f, "Invalid route pattern: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {}

/// One entry of the route table.
#[derive(Clone)]
pub struct Route {
    pub pattern: RoutePattern,
    pub method: Method,
    pub permissions: RoleSet,
    /// Lets an authenticated caller through when the `{name}` parameter is
    /// their own username, whatever their role.
    pub self_access: bool,
    pub handler: Handler,
    pub description: &'static str,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: &str,
        permissions: RoleSet,
        handler: Handler,
    ) -> Result<Self, RegistryError> {
        let pattern = RoutePattern::parse(pattern).map_err(RegistryError::InvalidPattern)?;
        Ok(Self {
            pattern,
            method,
            permissions,
            self_access: false,
            handler,
            description: "",
        })
    }

    pub fn with_self_access(mut self) -> Self {
        self.self_access = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn is_public(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("permissions", &self.permissions)
            .field("self_access", &self.self_access)
            .finish()
    }
}

/// Route resolved for the current request; stored in request extensions by
/// the permission enforcer and consumed by the dispatcher.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route: Arc<Route>,
    pub params: PathParams,
}

#[derive(Debug)]
pub enum RouteMatch {
    Found(MatchedRoute),
    MethodNotAllowed,
    NotFound,
}

/// Ordered route table built once at startup and shared read-only.
#[derive(Default)]
pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, route: Route) -> Result<(), RegistryError> {
        let shape = route.pattern.normalized();
        if self
            .routes
            .iter()
            .any(|existing| existing.method == route.method && existing.pattern.normalized() == shape)
        {
            return Err(RegistryError::Duplicate {
                method: route.method.clone(),
                pattern: route.pattern.as_str().to_string(),
            });
        }
        self.routes.push(Arc::new(route));
        Ok(())
    }

    /// First registered route whose pattern and method both match wins.
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch {
        let mut path_matched = false;
        for route in &self.routes {
            if let Some(params) = route.pattern.matches(path) {
                if route.method == *method {
                    return RouteMatch::Found(MatchedRoute {
                        route: Arc::clone(route),
                        params,
                    });
                }
                path_matched = true;
            }
        }
        if path_matched {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|route| route.as_ref())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use crate::routes::{HandlerFuture, RouteContext};
    use actix_web::HttpResponse;
    use futures_util::FutureExt;

    fn ok(_ctx: RouteContext) -> HandlerFuture {
        async { Ok(HttpResponse::Ok().finish()) }.boxed_local()
    }

    fn staff() -> RoleSet {
        RoleSet::of(&[Role::Moderator, Role::Admin])
    }

    fn registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        registry
            .register(Route::new(Method::GET, "/user/me", staff(), ok).expect("route"))
            .expect("register");
        registry
            .register(
                Route::new(Method::GET, "/user/{name}", staff(), ok)
                    .expect("route")
                    .with_self_access(),
            )
            .expect("register");
        registry
            .register(Route::new(Method::PUT, "/user/{name}", staff(), ok).expect("route"))
            .expect("register");
        registry
    }

    #[test]
    fn literal_registered_first_wins() {
        let registry = registry();
        match registry.match_route(&Method::GET, "/user/me") {
            RouteMatch::Found(matched) => {
                assert_eq!(matched.route.pattern.as_str(), "/user/me");
                assert!(matched.params.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
        match registry.match_route(&Method::GET, "/user/jan") {
            RouteMatch::Found(matched) => {
                assert_eq!(matched.params.get("name"), Some("jan"));
                assert!(matched.route.self_access);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_method_is_distinguished_from_unknown_path() {
        let registry = registry();
        assert!(matches!(
            registry.match_route(&Method::POST, "/user/jan"),
            RouteMatch::MethodNotAllowed
        ));
        assert!(matches!(
            registry.match_route(&Method::GET, "/nowhere"),
            RouteMatch::NotFound
        ));
    }

    #[test]
    fn duplicate_shape_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register(Route::new(Method::GET, "/user/{id}", staff(), ok).expect("route"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(matches!(
            Route::new(Method::GET, "user", staff(), ok),
            Err(RegistryError::InvalidPattern(_))
        ));
    }
}
