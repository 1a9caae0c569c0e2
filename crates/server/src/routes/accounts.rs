use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use service::auth::domain::{NewAccount, PublicUser};
use service::permissions::Scope;

use super::auth::Caller;
use crate::errors::ApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: String,
}

#[utoipa::path(
    post, path = "/api/accounts", tag = "accounts",
    request_body = crate::openapi::NewAccountRequest,
    responses(
        (status = 200, description = "Created account", body = crate::openapi::PublicUserDoc),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorBody),
        (status = 403, description = "Missing accounts:manage", body = crate::errors::ErrorBody),
        (status = 409, description = "Username taken", body = crate::errors::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    caller: Caller,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let operator = state.policy.require(caller.claims(), Scope::AccountsManage)?;
    let Json(input) = payload?;
    Ok(Json(state.auth.create_account(operator, input).await?))
}

#[utoipa::path(
    put, path = "/api/accounts/{id}/status", tag = "accounts",
    params(("id" = String, Path, description = "Account id")),
    request_body = crate::openapi::StatusRequest,
    responses(
        (status = 200, description = "Updated account", body = crate::openapi::PublicUserDoc),
        (status = 404, description = "No such account", body = crate::errors::ErrorBody)
    )
)]
pub async fn set_status(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let operator = state.policy.require(caller.claims(), Scope::AccountsManage)?;
    let Json(body) = payload?;
    Ok(Json(state.auth.set_account_status(operator, &id, &body.status).await?))
}
