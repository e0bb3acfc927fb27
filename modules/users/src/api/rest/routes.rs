use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the `/users` resource on `router`.
///
/// Authentication is not applied here; the ingress wraps these routes.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let users = Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::replace_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(Extension(service));

    router.merge(users)
}
