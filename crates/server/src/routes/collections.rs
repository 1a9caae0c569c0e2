use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service::collections::registry::ensure_registered;
use service::permissions::Scope;

use super::auth::Caller;
use crate::errors::ApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct WriteBody {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct ImportBody {
    #[serde(default)]
    pub collections: Value,
}

#[derive(Serialize)]
pub struct CollectionOutput {
    pub name: String,
    pub data: Value,
}

#[derive(Serialize)]
pub struct MutationOutput {
    pub ok: bool,
    pub name: String,
}

#[derive(Serialize)]
pub struct ImportOutput {
    pub ok: bool,
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Serialize)]
pub struct ClearOutput {
    pub ok: bool,
    pub cleared: usize,
}

#[utoipa::path(
    get, path = "/api/bootstrap", tag = "collections",
    responses((status = 200, description = "Every registered collection", body = crate::openapi::BootstrapDoc))
)]
pub async fn bootstrap(State(state): State<ServerState>, caller: Caller) -> Result<Json<Value>, ApiError> {
    state.policy.authorize(caller.claims(), Scope::CollectionsRead)?;
    let all = state.collections.bootstrap().await?;
    let collections: Map<String, Value> = all.into_iter().collect();
    Ok(Json(serde_json::json!({ "collections": collections })))
}

#[utoipa::path(
    get, path = "/api/collections/{name}", tag = "collections",
    params(("name" = String, Path, description = "Registered collection name")),
    responses(
        (status = 200, description = "Current value", body = crate::openapi::CollectionDoc),
        (status = 404, description = "Unknown collection", body = crate::errors::ErrorBody)
    )
)]
pub async fn read(
    State(state): State<ServerState>,
    caller: Caller,
    Path(name): Path<String>,
) -> Result<Json<CollectionOutput>, ApiError> {
    ensure_registered(&name)?;
    state.policy.authorize(caller.claims(), Scope::CollectionsRead)?;
    let data = state.collections.read(&name).await?;
    Ok(Json(CollectionOutput { name, data }))
}

#[utoipa::path(
    put, path = "/api/collections/{name}", tag = "collections",
    params(("name" = String, Path, description = "Registered collection name")),
    request_body = crate::openapi::WriteRequest,
    responses(
        (status = 200, description = "Stored"),
        (status = 400, description = "Data is neither array nor object", body = crate::errors::ErrorBody),
        (status = 404, description = "Unknown collection", body = crate::errors::ErrorBody)
    )
)]
pub async fn write(
    State(state): State<ServerState>,
    caller: Caller,
    Path(name): Path<String>,
    payload: Result<Json<WriteBody>, JsonRejection>,
) -> Result<Json<MutationOutput>, ApiError> {
    ensure_registered(&name)?;
    state.policy.authorize(caller.claims(), Scope::CollectionsWrite)?;
    let Json(body) = payload?;
    state.collections.write(&name, &body.data).await?;
    Ok(Json(MutationOutput { ok: true, name }))
}

#[utoipa::path(
    delete, path = "/api/collections/{name}", tag = "collections",
    params(("name" = String, Path, description = "Registered collection name")),
    responses(
        (status = 200, description = "Reset to an empty array"),
        (status = 404, description = "Unknown collection", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    caller: Caller,
    Path(name): Path<String>,
) -> Result<Json<MutationOutput>, ApiError> {
    ensure_registered(&name)?;
    state.policy.authorize(caller.claims(), Scope::CollectionsWrite)?;
    state.collections.delete(&name).await?;
    Ok(Json(MutationOutput { ok: true, name }))
}

#[utoipa::path(
    post, path = "/api/import", tag = "collections",
    request_body = crate::openapi::ImportRequest,
    responses(
        (status = 200, description = "Names imported and skipped"),
        (status = 400, description = "`collections` is not an object", body = crate::errors::ErrorBody)
    )
)]
pub async fn import(
    State(state): State<ServerState>,
    caller: Caller,
    payload: Result<Json<ImportBody>, JsonRejection>,
) -> Result<Json<ImportOutput>, ApiError> {
    state.policy.authorize(caller.claims(), Scope::SystemAdmin)?;
    let Json(body) = payload?;
    let Value::Object(collections) = body.collections else {
        return Err(ApiError::bad_request("collections must be an object"));
    };
    let report = state.collections.import(&collections).await?;
    Ok(Json(ImportOutput { ok: true, imported: report.imported, skipped: report.skipped }))
}

#[utoipa::path(post, path = "/api/clear", tag = "collections", responses((status = 200, description = "Every collection reset")))]
pub async fn clear(State(state): State<ServerState>, caller: Caller) -> Result<Json<ClearOutput>, ApiError> {
    state.policy.authorize(caller.claims(), Scope::SystemAdmin)?;
    let cleared = state.collections.clear_all().await?;
    Ok(Json(ClearOutput { ok: true, cleared }))
}
