// src/api/mod.rs — HTTP API server

pub mod auth;
pub mod handlers;
pub mod types;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::infra::config::{Config, ServerConfig};
use crate::memory::StoreHandle;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StoreHandle,
    pub token: Option<String>,
    pub max_prompt_chars: usize,
    pub default_max_iters: u32,
}

impl ApiState {
    pub fn new(store: StoreHandle, config: &Config) -> Self {
        Self {
            store,
            token: config.server.api_token.clone(),
            max_prompt_chars: config.engine.max_prompt_chars,
            default_max_iters: config.engine.default_max_iters,
        }
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    if server.debug {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState, server: &ServerConfig) -> Router {
    let protected = axum::middleware::from_fn_with_state(state.clone(), auth::require_token);

    Router::new()
        .route("/generate", post(handlers::generate))
        .route("/evaluate", post(handlers::evaluate))
        .route("/iterate", post(handlers::iterate))
        .route(
            "/reports/{id}",
            get(handlers::get_report).delete(handlers::delete_report),
        )
        .route("/log-values", post(handlers::log_values))
        .route("/hidg-logs", get(handlers::list_value_logs))
        .route_layer(protected)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
        .with_state(state)
}

/// Start the API server and run until Ctrl-C.
pub async fn start_server(server: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", server.host, server.port);

    let router = build_router(state, server);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down API server");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{in_memory_store, spawn_store_server};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state(token: Option<&str>) -> ApiState {
        let (store, _join) = spawn_store_server(in_memory_store().unwrap());
        let mut config = Config::default();
        config.server.api_token = token.map(String::from);
        ApiState::new(store, &config)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state(None), &ServerConfig::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_skips_auth() {
        let app = build_router(test_state(Some("tok")), &ServerConfig::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = build_router(test_state(Some("tok")), &ServerConfig::default());
        let req = Request::builder()
            .uri("/hidg-logs")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/hidg-logs")
            .header("authorization", "Bearer tok")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_cors_layer_builds_for_strict_origins() {
        let server = ServerConfig {
            debug: false,
            cors_origins: vec!["http://localhost:3000".into(), "not a\norigin".into()],
            ..Default::default()
        };
        let _ = cors_layer(&server);
    }
}
