use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::domain::{Account, Claims};
use super::errors::AuthError;

/// Longest token lifetime accepted; larger values are clamped.
pub const MAX_TTL_HOURS: i64 = 24 * 365;

/// HS256 token issuing and checking with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.clamp(0, MAX_TTL_HOURS)),
        }
    }

    pub fn issue(&self, account: &Account) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| AuthError::TokenError("token expiry out of range".into()))?
                .timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Signature and expiry check. Any failure is reported as `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account() -> Account {
        serde_json::from_value(json!({"id": 7, "username": "zhao", "passwordHash": "", "role": "manager"})).unwrap()
    }

    #[test]
    fn issue_then_verify() {
        let issuer = TokenIssuer::new("s3cret", 24);
        let token = issuer.issue(&account()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "zhao");
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_or_garbage_is_rejected() {
        let token = TokenIssuer::new("a", 1).issue(&account()).unwrap();
        assert!(matches!(TokenIssuer::new("b", 1).verify(&token), Err(AuthError::Unauthorized)));
        assert!(TokenIssuer::new("a", 1).verify("not.a.jwt").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("a", 0);
        let token = issuer.issue(&account()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let issuer = TokenIssuer::new("a", 1_000_000_000);
        let claims = issuer.verify(&issuer.issue(&account()).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TTL_HOURS * 3600);
    }
}
