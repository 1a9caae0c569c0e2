use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login input. Missing fields deserialize as empty and are rejected by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Account ids written by the console may be strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Text(s) => f.write_str(s),
            AccountId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl AccountId {
    pub fn matches(&self, raw: &str) -> bool {
        self.to_string() == raw
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Disabled,
}

impl AccountStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

/// One element of the `accounts` collection. Fields this backend does not
/// know about are carried in `extra` and written back untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(default)]
    pub password_hash: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub created_at: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    pub fn is_disabled(&self) -> bool {
        self.status == AccountStatus::Disabled
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            status: self.status,
        }
    }
}

/// Account as returned to clients (no hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: AccountId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: AccountStatus,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// JWT claims. `sub` is the account id rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_accepts_numeric_id_and_keeps_extras() {
        let raw = json!({
            "id": 1700000000123u64,
            "username": "li",
            "passwordHash": "x",
            "role": "staff",
            "phone": "138"
        });
        let acc: Account = serde_json::from_value(raw).unwrap();
        assert_eq!(acc.id.to_string(), "1700000000123");
        assert!(acc.id.matches("1700000000123"));
        assert_eq!(acc.status, AccountStatus::Active);
        assert_eq!(acc.extra.get("phone"), Some(&json!("138")));

        let back = serde_json::to_value(&acc).unwrap();
        assert_eq!(back["phone"], "138");
        assert_eq!(back["passwordHash"], "x");
        assert_eq!(back["status"], "active");
    }

    #[test]
    fn public_view_has_no_hash() {
        let acc: Account = serde_json::from_value(json!({
            "id": "a1", "username": "wang", "passwordHash": "secret", "role": "viewer", "status": "disabled"
        }))
        .unwrap();
        let v = serde_json::to_value(acc.public()).unwrap();
        assert!(v.get("passwordHash").is_none());
        assert_eq!(v["status"], "disabled");
    }

    #[test]
    fn status_parse() {
        assert_eq!(AccountStatus::parse(" Disabled "), Some(AccountStatus::Disabled));
        assert_eq!(AccountStatus::parse("gone"), None);
    }
}
