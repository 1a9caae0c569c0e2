use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::accounts::AccountBook;
use super::domain::{
    Account, AccountId, AccountStatus, AuthSession, ChangePasswordInput, Claims, LoginInput, NewAccount, PublicUser,
};
use super::errors::AuthError;
use super::password::PasswordHasherConfig;
use super::token::TokenIssuer;
use crate::collections::CollectionStore;
use crate::oplog::OperationLog;
use crate::permissions::Role;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const MIN_PASSWORD_LEN: usize = 6;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub hash_cost: u32,
    pub default_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".into(),
            token_ttl_hours: 24,
            hash_cost: 2,
            default_admin_password: "admin123".into(),
        }
    }
}

/// Auth business service independent of web framework
#[derive(Clone)]
pub struct AuthService {
    accounts: AccountBook,
    oplog: OperationLog,
    hasher: PasswordHasherConfig,
    tokens: TokenIssuer,
    default_admin_password: String,
    // serializes account-list rewrites made by this process
    write_lock: Arc<Mutex<()>>,
}

impl AuthService {
    pub fn new(store: CollectionStore, cfg: AuthConfig) -> Self {
        Self {
            accounts: AccountBook::new(store.clone()),
            oplog: OperationLog::new(store),
            hasher: PasswordHasherConfig::new(cfg.hash_cost),
            tokens: TokenIssuer::new(&cfg.jwt_secret, cfg.token_ttl_hours),
            default_admin_password: cfg.default_admin_password,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::HashError(e.to_string()))?
    }

    async fn verify(&self, password: &str, hash: &str) -> bool {
        let hasher = self.hasher;
        let (password, hash) = (password.to_string(), hash.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }

    async fn record(&self, operator: &str, action: &str, details: &str) {
        if let Err(e) = self.oplog.append(operator, action, "auth", details).await {
            warn!(err = %e, action, "failed to append operation log");
        }
    }

    /// Create the default admin when the account list is empty.
    /// Returns whether an account was created.
    #[instrument(skip(self))]
    pub async fn ensure_default_admin(&self) -> Result<bool, AuthError> {
        let _guard = self.write_lock.lock().await;
        let mut list = self.accounts.load().await?;
        if !list.is_empty() {
            return Ok(false);
        }
        let admin = Account {
            id: AccountId::Text(Uuid::new_v4().to_string()),
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password_hash: self.hash(&self.default_admin_password).await?,
            role: Role::Admin.as_str().to_string(),
            name: "Administrator".to_string(),
            email: String::new(),
            status: AccountStatus::Active,
            created_at: Value::String(Utc::now().to_rfc3339()),
            extra: Map::new(),
        };
        list.push(&admin)?;
        self.accounts.save(&list).await?;
        warn!(username = DEFAULT_ADMIN_USERNAME, "default admin account created; change its password");
        Ok(true)
    }

    /// Authenticate by username/password and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, service::AuthConfig, domain::LoginInput};
    /// use service::collections::CollectionStore;
    /// let svc = AuthService::new(CollectionStore::in_memory(), AuthConfig { hash_cost: 1, ..AuthConfig::default() });
    /// let input = LoginInput { username: "admin".into(), password: "admin123".into() };
    /// let session = tokio_test::block_on(svc.login(input)).unwrap();
    /// assert_eq!(session.user.username, "admin");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if input.username.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("username and password are required".into()));
        }
        self.ensure_default_admin().await?;

        let list = self.accounts.load().await?;
        let Some(account) = list.find_by_username(&input.username) else {
            warn!("login failed: unknown username");
            return Err(AuthError::Unauthorized);
        };
        if !self.verify(&input.password, &account.password_hash).await {
            warn!("login failed: wrong password");
            return Err(AuthError::Unauthorized);
        }
        if account.is_disabled() {
            warn!("login refused: account disabled");
            return Err(AuthError::Disabled);
        }

        let token = self.tokens.issue(&account)?;
        self.record(&account.username, "login", "signed in").await;
        info!(user_id = %account.id, role = %account.role, "login succeeded");
        Ok(AuthSession { token, user: account.public() })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token)
    }

    /// Account behind a token. Accounts removed or disabled since issue are rejected.
    pub async fn current_user(&self, claims: &Claims) -> Result<PublicUser, AuthError> {
        let account = self.active_account(claims).await?;
        Ok(account.public())
    }

    async fn active_account(&self, claims: &Claims) -> Result<Account, AuthError> {
        let list = self.accounts.load().await?;
        let account = list.find_by_id(&claims.sub).ok_or(AuthError::Unauthorized)?;
        if account.is_disabled() {
            return Err(AuthError::Disabled);
        }
        Ok(account)
    }

    #[instrument(skip(self, claims, input), fields(username = %claims.username))]
    pub async fn change_password(&self, claims: &Claims, input: ChangePasswordInput) -> Result<(), AuthError> {
        if input.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("new password must be at least {} characters", MIN_PASSWORD_LEN)));
        }
        let guard = self.write_lock.lock().await;
        let mut account = self.active_account(claims).await?;
        if !self.verify(&input.current_password, &account.password_hash).await {
            return Err(AuthError::Unauthorized);
        }
        account.password_hash = self.hash(&input.new_password).await?;

        let mut list = self.accounts.load().await?;
        list.replace(&account)?;
        self.accounts.save(&list).await?;
        drop(guard);

        self.record(&claims.username, "change_password", "password changed").await;
        info!("password changed");
        Ok(())
    }

    #[instrument(skip(self, operator, input), fields(operator = %operator.username, username = %input.username))]
    pub async fn create_account(&self, operator: &Claims, input: NewAccount) -> Result<PublicUser, AuthError> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(AuthError::Validation("username is required".into()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("password must be at least {} characters", MIN_PASSWORD_LEN)));
        }
        let role = Role::parse(&input.role)
            .ok_or_else(|| AuthError::Validation(format!("unknown role: {}", input.role)))?;

        let guard = self.write_lock.lock().await;
        let mut list = self.accounts.load().await?;
        if list.find_by_username(&username).is_some() {
            debug!("duplicate username");
            return Err(AuthError::Conflict);
        }
        let account = Account {
            id: AccountId::Text(Uuid::new_v4().to_string()),
            username,
            password_hash: self.hash(&input.password).await?,
            role: role.as_str().to_string(),
            name: input.name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
            status: AccountStatus::Active,
            created_at: Value::String(Utc::now().to_rfc3339()),
            extra: Map::new(),
        };
        list.push(&account)?;
        self.accounts.save(&list).await?;
        drop(guard);

        self.record(&operator.username, "create_account", &format!("created {} ({})", account.username, account.role)).await;
        info!(user_id = %account.id, "account created");
        Ok(account.public())
    }

    #[instrument(skip(self, operator), fields(operator = %operator.username))]
    pub async fn set_account_status(&self, operator: &Claims, id: &str, status: &str) -> Result<PublicUser, AuthError> {
        let status = AccountStatus::parse(status)
            .ok_or_else(|| AuthError::Validation(format!("unknown status: {}", status)))?;
        if status == AccountStatus::Disabled && operator.sub == id {
            return Err(AuthError::Validation("cannot disable your own account".into()));
        }

        let guard = self.write_lock.lock().await;
        let mut list = self.accounts.load().await?;
        let mut account = list.find_by_id(id).ok_or(AuthError::NotFound)?;
        account.status = status;
        list.replace(&account)?;
        self.accounts.save(&list).await?;
        drop(guard);

        self.record(&operator.username, "set_account_status", &format!("{} -> {}", account.username, status.as_str())).await;
        info!(user_id = %account.id, status = status.as_str(), "account status changed");
        Ok(account.public())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::registry::{ACCOUNTS, OPERATION_LOGS};
    use crate::test_support::sqlite_store;
    use serde_json::json;

    fn cfg() -> AuthConfig {
        AuthConfig { hash_cost: 1, ..AuthConfig::default() }
    }

    fn login(username: &str, password: &str) -> LoginInput {
        LoginInput { username: username.into(), password: password.into() }
    }

    async fn admin_claims(svc: &AuthService) -> Claims {
        let session = svc.login(login("admin", "admin123")).await.unwrap();
        svc.verify_token(&session.token).unwrap()
    }

    #[tokio::test]
    async fn first_login_creates_one_admin() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        let svc = AuthService::new(store.clone(), cfg());
        let session = svc.login(login("admin", "admin123")).await?;
        let claims = svc.verify_token(&session.token)?;
        assert_eq!(claims.role, "admin");
        assert_eq!(session.user.role, "admin");

        assert!(matches!(svc.login(login("admin", "nope")).await, Err(AuthError::Unauthorized)));
        assert_eq!(store.get_array(ACCOUNTS).await?.len(), 1);

        let logs = store.get_array(OPERATION_LOGS).await?;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "login");
        assert_eq!(logs[0]["module"], "auth");
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_first_still_creates_admin_once() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        let svc = AuthService::new(store.clone(), cfg());
        assert!(matches!(svc.login(login("admin", "bad")).await, Err(AuthError::Unauthorized)));
        assert!(matches!(svc.login(login("ghost", "admin123")).await, Err(AuthError::Unauthorized)));
        assert_eq!(store.get_array(ACCOUNTS).await?.len(), 1);
        assert!(store.get_array(OPERATION_LOGS).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_before_anything_else() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        let svc = AuthService::new(store.clone(), cfg());
        assert!(matches!(svc.login(login("  ", "x")).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.login(login("admin", "")).await, Err(AuthError::Validation(_))));
        assert!(store.get_array(ACCOUNTS).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn existing_accounts_block_default_admin() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        store.set(ACCOUNTS, &json!([{"id": 1, "username": "owner", "passwordHash": "", "role": "admin"}])).await?;
        let svc = AuthService::new(store.clone(), cfg());
        assert!(!svc.ensure_default_admin().await?);
        assert!(matches!(svc.login(login("admin", "admin123")).await, Err(AuthError::Unauthorized)));
        // empty hash never verifies
        assert!(matches!(svc.login(login("owner", "anything")).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn imported_bcrypt_accounts_can_log_in() -> Result<(), anyhow::Error> {
        let store = CollectionStore::in_memory();
        let legacy = bcrypt::hash("password", 4)?;
        store
            .set(ACCOUNTS, &json!([{"id": 1, "username": "admin", "passwordHash": legacy, "role": "admin", "status": "active"}]))
            .await?;
        let svc = AuthService::new(store.clone(), cfg());
        let session = svc.login(login("admin", "password")).await?;
        assert_eq!(session.user.role, "admin");
        assert!(matches!(svc.login(login("admin", "admin123")).await, Err(AuthError::Unauthorized)));
        assert_eq!(store.get_array(ACCOUNTS).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn disabled_account_gets_forbidden() -> Result<(), anyhow::Error> {
        let svc = AuthService::new(CollectionStore::in_memory(), cfg());
        let admin = admin_claims(&svc).await;
        let user = svc
            .create_account(&admin, NewAccount { username: "li".into(), password: "secret1".into(), role: "staff".into(), name: Some("Li".into()), email: None })
            .await?;
        assert!(svc.login(login("li", "secret1")).await.is_ok());

        svc.set_account_status(&admin, &user.id.to_string(), "disabled").await?;
        assert!(matches!(svc.login(login("li", "secret1")).await, Err(AuthError::Disabled)));
        // password is still checked first
        assert!(matches!(svc.login(login("li", "wrong")).await, Err(AuthError::Unauthorized)));

        svc.set_account_status(&admin, &user.id.to_string(), "active").await?;
        assert!(svc.login(login("li", "secret1")).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn create_account_validation_and_conflict() {
        let svc = AuthService::new(CollectionStore::in_memory(), cfg());
        let admin = admin_claims(&svc).await;
        let mk = |u: &str, p: &str, r: &str| NewAccount { username: u.into(), password: p.into(), role: r.into(), name: None, email: None };

        assert!(matches!(svc.create_account(&admin, mk("admin", "secret1", "viewer")).await, Err(AuthError::Conflict)));
        assert!(matches!(svc.create_account(&admin, mk("", "secret1", "viewer")).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.create_account(&admin, mk("x", "123", "viewer")).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.create_account(&admin, mk("x", "secret1", "root")).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn status_changes() {
        let svc = AuthService::new(CollectionStore::in_memory(), cfg());
        let admin = admin_claims(&svc).await;
        assert!(matches!(svc.set_account_status(&admin, "missing", "disabled").await, Err(AuthError::NotFound)));
        assert!(matches!(svc.set_account_status(&admin, &admin.sub, "disabled").await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.set_account_status(&admin, &admin.sub, "sleeping").await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn change_password_flow() -> Result<(), anyhow::Error> {
        let svc = AuthService::new(CollectionStore::in_memory(), cfg());
        let admin = admin_claims(&svc).await;
        let input = |c: &str, n: &str| ChangePasswordInput { current_password: c.into(), new_password: n.into() };

        assert!(matches!(svc.change_password(&admin, input("admin123", "short")).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.change_password(&admin, input("wrong", "longenough")).await, Err(AuthError::Unauthorized)));
        svc.change_password(&admin, input("admin123", "longenough")).await?;

        assert!(matches!(svc.login(login("admin", "admin123")).await, Err(AuthError::Unauthorized)));
        assert!(svc.login(login("admin", "longenough")).await.is_ok());
        assert_eq!(svc.current_user(&admin).await?.username, "admin");
        Ok(())
    }

    #[tokio::test]
    async fn current_user_requires_existing_account() {
        let svc = AuthService::new(CollectionStore::in_memory(), cfg());
        let ghost = Claims { sub: "nobody".into(), username: "ghost".into(), role: "admin".into(), iat: 0, exp: 0 };
        assert!(matches!(svc.current_user(&ghost).await, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn login_against_sqlite() -> Result<(), anyhow::Error> {
        let store = sqlite_store().await?;
        let svc = AuthService::new(store.clone(), cfg());
        let session = svc.login(login("admin", "admin123")).await?;
        assert_eq!(session.user.username, "admin");
        assert_eq!(store.get_array(ACCOUNTS).await?.len(), 1);
        Ok(())
    }
}
