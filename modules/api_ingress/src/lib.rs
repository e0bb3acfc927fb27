//! API ingress: owns the HTTP server, the global middleware stack and the
//! basic-auth guard in front of module routes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    http::header,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

pub mod auth;
mod config;
pub mod request_id;
mod web;

pub use auth::{AuthError, AuthenticatedUser, BasicAuthenticator};
pub use config::ApiIngressConfig;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP front door: assembles public and protected routes and serves them.
#[derive(Debug, Clone)]
pub struct ApiIngress {
    config: ApiIngressConfig,
    authenticator: Arc<BasicAuthenticator>,
    request_timeout: Duration,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig, authenticator: BasicAuthenticator) -> Self {
        Self {
            config,
            authenticator: Arc::new(authenticator),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Zero keeps the default.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.request_timeout = timeout;
        }
        self
    }

    /// Build the full application router.
    ///
    /// `protected` routes sit behind basic auth and must not be empty;
    /// `/health` and `/openapi.json` stay public. `openapi` is only served
    /// when docs are enabled.
    pub fn build_router(
        &self,
        protected: Router,
        openapi: Option<utoipa::openapi::OpenApi>,
    ) -> Result<Router> {
        tracing::debug!("Building router");

        let mut router = Router::new().route("/health", get(web::health_check));

        match openapi {
            Some(doc) if self.config.enable_docs => {
                // Serialize once, serve as static JSON
                let body = Arc::new(serde_json::to_value(&doc)?);
                tracing::info!(paths = doc.paths.paths.len(), "Serving OpenAPI document");
                router = router.route(
                    "/openapi.json",
                    get(move || {
                        let body = body.clone();
                        async move {
                            (
                                [(header::CACHE_CONTROL, "no-store")],
                                axum::Json((*body).clone()),
                            )
                                .into_response()
                        }
                    }),
                );
            }
            _ => tracing::debug!("OpenAPI document disabled"),
        }

        // The body limit sits inside the auth guard so unauthenticated
        // requests are answered with 401 whatever their size.
        let protected = protected
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes))
            .route_layer(from_fn_with_state(
                self.authenticator.clone(),
                auth::require_basic_auth,
            ));
        router = router.merge(protected);

        // Layers wrap outward: the last one added runs first on a request.
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions
        // -> Timeout -> CORS -> routes
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::new(self.request_timeout));
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    /// Bind `addr` and serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(&self, addr: SocketAddr, router: Router, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
        self.serve_on(listener, router, shutdown).await
    }

    pub async fn serve_on<F>(
        &self,
        listener: tokio::net::TcpListener,
        router: Router,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("HTTP server bound on {}", listener.local_addr()?);

        let shutdown = async move {
            shutdown.await;
            tracing::info!("HTTP server shutting down gracefully");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_keeps_default() {
        let ingress = ApiIngress::new(
            ApiIngressConfig::default(),
            BasicAuthenticator::new("a", "b", None),
        )
        .with_request_timeout(Duration::ZERO);
        assert_eq!(ingress.request_timeout, DEFAULT_REQUEST_TIMEOUT);

        let ingress = ingress.with_request_timeout(Duration::from_secs(5));
        assert_eq!(ingress.request_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn serve_returns_after_shutdown() {
        let ingress = ApiIngress::new(
            ApiIngressConfig::default(),
            BasicAuthenticator::new("a", "b", None),
        );
        let protected = Router::new().route("/ping", get(|| async { "pong" }));
        let router = ingress.build_router(protected, None).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = ingress.serve_on(listener, router, async {}).await;
        assert!(result.is_ok());
    }
}
