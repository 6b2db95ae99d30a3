use axum::{middleware, routing::MethodRouter, Router};
use tracing::debug;

use crate::{auth::extractors::require_bearer, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    Bearer,
}

/// One entry of the routing table: path, method handler and guard.
pub struct RouteDescriptor {
    pub path: &'static str,
    pub handler: MethodRouter<AppState>,
    pub guard: Guard,
}

impl RouteDescriptor {
    pub fn public(path: &'static str, handler: MethodRouter<AppState>) -> Self {
        Self {
            path,
            handler,
            guard: Guard::Public,
        }
    }

    pub fn bearer(path: &'static str, handler: MethodRouter<AppState>) -> Self {
        Self {
            path,
            handler,
            guard: Guard::Bearer,
        }
    }
}

/// Builds a router from descriptors. Bearer routes share one `route_layer`
/// running [`require_bearer`] ahead of the handler.
pub fn mount(state: &AppState, table: Vec<RouteDescriptor>) -> Router<AppState> {
    let mut public = Router::new();
    let mut guarded = Router::new();
    let mut any_guarded = false;

    for route in table {
        debug!(path = route.path, guard = ?route.guard, "route mounted");
        match route.guard {
            Guard::Public => public = public.route(route.path, route.handler),
            Guard::Bearer => {
                guarded = guarded.route(route.path, route.handler);
                any_guarded = true;
            }
        }
    }

    // route_layer panics on a router without routes
    if any_guarded {
        guarded = guarded.route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));
    }
    public.merge(guarded)
}
