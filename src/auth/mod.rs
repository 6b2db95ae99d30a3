use axum::routing::{get, post};

use crate::routes::RouteDescriptor;

mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::public("/auth/register", post(handlers::register)),
        RouteDescriptor::public("/auth/login", post(handlers::login)),
        RouteDescriptor::bearer("/auth/profile", get(handlers::profile)),
    ]
}
