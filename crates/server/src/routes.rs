pub mod accounts;
pub mod auth;
pub mod collections;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::ServerState;

/// Router-level settings that do not live in [`ServerState`].
#[derive(Clone)]
pub struct HttpOptions {
    pub cors: CorsLayer,
    pub body_limit_bytes: usize,
    /// Serve the console's static build from here, if set.
    pub frontend_dir: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self { cors: CorsLayer::very_permissive(), body_limit_bytes: 10 * 1024 * 1024, frontend_dir: None }
    }
}

#[utoipa::path(
    get, path = "/api/health", tag = "health",
    responses(
        (status = 200, description = "Database reachable", body = crate::openapi::HealthResponse),
        (status = 503, description = "Database unreachable", body = crate::openapi::HealthResponse)
    )
)]
pub async fn health(State(state): State<ServerState>) -> (StatusCode, Json<Health>) {
    match state.collections.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(Health::ok())),
        Err(e) => {
            warn!(err = %e, "database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Health::degraded("unavailable")))
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public routes, token-aware API routes
/// and, optionally, the static console.
pub fn build_router(state: ServerState, opts: HttpOptions) -> Router {
    // 无需令牌的路由：健康检查、登录登出、文档；过期 cookie 不应阻止重新登录
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/permissions", get(auth::permissions))
        .route("/openapi.json", get(openapi_json));

    let guarded = Router::new()
        .route("/bootstrap", get(collections::bootstrap))
        .route(
            "/collections/:name",
            get(collections::read).put(collections::write).delete(collections::delete),
        )
        .route("/import", post(collections::import))
        .route("/clear", post(collections::clear))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/accounts", post(accounts::create))
        .route("/accounts/:id/status", put(accounts::set_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::authenticate));

    let mut app = Router::new().nest("/api", public.merge(guarded));

    if let Some(dir) = &opts.frontend_dir {
        let index = format!("{}/index.html", dir.trim_end_matches('/'));
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.with_state(state)
        .layer(DefaultBodyLimit::max(opts.body_limit_bytes))
        .layer(opts.cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
