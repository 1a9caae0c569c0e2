use std::collections::BTreeMap;

use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub database: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct PublicUserDoc {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    /// admin | manager | staff | viewer
    pub role: String,
    /// active | disabled
    pub status: String,
}

#[derive(ToSchema)]
pub struct LoginResponseDoc { pub token: String, pub user: PublicUserDoc }

#[derive(ToSchema, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest { pub current_password: String, pub new_password: String }

#[derive(ToSchema)]
pub struct NewAccountRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(ToSchema)]
pub struct StatusRequest { pub status: String }

#[derive(ToSchema)]
pub struct WriteRequest {
    /// Array or object; anything else is rejected.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(ToSchema)]
pub struct CollectionDoc {
    pub name: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(ToSchema)]
pub struct BootstrapDoc {
    #[schema(value_type = Object)]
    pub collections: BTreeMap<String, serde_json::Value>,
}

#[derive(ToSchema)]
pub struct ImportRequest {
    #[schema(value_type = Object)]
    pub collections: BTreeMap<String, serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::collections::bootstrap,
        crate::routes::collections::read,
        crate::routes::collections::write,
        crate::routes::collections::delete,
        crate::routes::collections::import,
        crate::routes::collections::clear,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
        crate::routes::auth::permissions,
        crate::routes::accounts::create,
        crate::routes::accounts::set_status,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginResponseDoc,
            PublicUserDoc,
            ChangePasswordRequest,
            NewAccountRequest,
            StatusRequest,
            WriteRequest,
            CollectionDoc,
            BootstrapDoc,
            ImportRequest,
            crate::errors::ErrorBody,
        )
    ),
    tags(
        (name = "health"),
        (name = "collections"),
        (name = "auth"),
        (name = "accounts")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for p in ["/api/bootstrap", "/api/collections/{name}", "/api/auth/login", "/api/accounts/{id}/status"] {
            assert!(paths.iter().any(|k| k.as_str() == p), "missing {p}");
        }
    }
}
