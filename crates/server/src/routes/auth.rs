use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use serde_json::{json, Value};
use service::auth::domain::{AuthSession, ChangePasswordInput, Claims, LoginInput, PublicUser};
use tracing::{debug, warn};

use crate::errors::ApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Claims of the caller, if the request carried a valid token.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Claims>);

impl Caller {
    pub fn claims(&self) -> Option<&Claims> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Claims>().cloned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    Header,
    Cookie,
}

/// Bearer header first, then the `auth_token` cookie.
/// `Err` when an Authorization header is present but not a bearer token.
fn extract_token(req: &Request) -> Result<Option<(String, TokenSource)>, ApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let raw = h.to_str().unwrap_or("");
        return match raw.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some((t.trim().to_string(), TokenSource::Header))),
            _ => Err(ApiError::unauthorized("expected Authorization: Bearer <token>")),
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| (t, TokenSource::Cookie)))
}

/// 解析令牌并把 claims 挂到请求扩展上；无令牌时放行，由各路由按策略决定。
/// 宽松模式下过期/无效的 cookie 视为匿名，显式的 Bearer 头仍返回 401
pub async fn authenticate(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    if let Some((token, source)) = extract_token(&req)? {
        match state.auth.verify_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) if source == TokenSource::Cookie && !state.policy.enforce => {
                debug!(path = %path, err = %e, "ignoring stale auth cookie");
            }
            Err(e) => {
                warn!(path = %path, err = %e, "token validation failed");
                return Err(ApiError::unauthorized("invalid or expired token"));
            }
        }
    }
    Ok(next.run(req).await)
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[derive(Serialize)]
pub struct OkOutput {
    pub ok: bool,
}

#[utoipa::path(
    post, path = "/api/auth/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Token and public user", body = crate::openapi::LoginResponseDoc),
        (status = 400, description = "Missing username or password", body = crate::errors::ErrorBody),
        (status = 401, description = "Unknown user or wrong password", body = crate::errors::ErrorBody),
        (status = 403, description = "Account disabled", body = crate::errors::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input).await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((jar, Json(session)))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 200, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<OkOutput>) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), Json(OkOutput { ok: true }))
}

#[utoipa::path(
    get, path = "/api/auth/me", tag = "auth",
    responses(
        (status = 200, description = "Current account", body = crate::openapi::PublicUserDoc),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorBody)
    )
)]
pub async fn me(State(state): State<ServerState>, caller: Caller) -> Result<Json<PublicUser>, ApiError> {
    let claims = caller.claims().ok_or_else(|| ApiError::unauthorized("login required"))?;
    Ok(Json(state.auth.current_user(claims).await?))
}

#[utoipa::path(
    post, path = "/api/auth/change-password", tag = "auth",
    request_body = crate::openapi::ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too short", body = crate::errors::ErrorBody),
        (status = 401, description = "Not logged in or wrong current password", body = crate::errors::ErrorBody)
    )
)]
pub async fn change_password(
    State(state): State<ServerState>,
    caller: Caller,
    payload: Result<Json<ChangePasswordInput>, JsonRejection>,
) -> Result<Json<OkOutput>, ApiError> {
    let claims = caller.claims().ok_or_else(|| ApiError::unauthorized("login required"))?;
    let Json(input) = payload?;
    state.auth.change_password(claims, input).await?;
    Ok(Json(OkOutput { ok: true }))
}

#[utoipa::path(get, path = "/api/permissions", tag = "auth", responses((status = 200, description = "Role to scope table")))]
pub async fn permissions() -> Json<Value> {
    Json(json!({ "roles": service::permissions::permission_table() }))
}
