use service::auth::{service::AuthConfig, AuthService};
use service::collections::{CollectionService, CollectionStore};
use service::permissions::AccessPolicy;

/// Shared handler state. Cheap to clone; every field is handle-like.
#[derive(Clone)]
pub struct ServerState {
    pub collections: CollectionService,
    pub auth: AuthService,
    pub policy: AccessPolicy,
}

impl ServerState {
    pub fn new(store: CollectionStore, auth: &configs::AuthConfig) -> Self {
        let auth_cfg = AuthConfig {
            jwt_secret: auth.jwt_secret.clone(),
            token_ttl_hours: auth.token_ttl_hours,
            hash_cost: auth.hash_cost,
            default_admin_password: auth.default_admin_password.clone(),
        };
        Self {
            collections: CollectionService::new(store.clone()),
            auth: AuthService::new(store, auth_cfg),
            policy: AccessPolicy::new(auth.enforce),
        }
    }
}
