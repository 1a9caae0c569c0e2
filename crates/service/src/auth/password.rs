use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::warn;

use super::errors::AuthError;

/// Argon2id hasher; `cost` is the time cost (iterations), memory stays at the
/// library default.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasherConfig {
    pub cost: u32,
}

impl PasswordHasherConfig {
    pub fn new(cost: u32) -> Self { Self { cost: cost.max(1) } }

    fn argon2(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(Params::DEFAULT_M_COST, self.cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string())
    }

    /// Parameters are read from the PHC string, so hashes made with another
    /// cost still verify. Bcrypt hashes (`$2a$`, `$2b$`, `$2y$`) from older
    /// account lists are checked with bcrypt. A malformed hash never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if is_bcrypt(hash) {
            return match bcrypt::verify(password, hash) {
                Ok(ok) => ok,
                Err(e) => {
                    warn!(err = %e, "stored bcrypt hash is malformed");
                    false
                }
            };
        }
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(err = %e, "stored password hash is malformed");
                return false;
            }
        };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let h = PasswordHasherConfig::new(1);
        let hash = h.hash("admin123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(h.verify("admin123", &hash));
        assert!(!h.verify("admin124", &hash));
    }

    #[test]
    fn cost_is_recorded_and_portable() {
        let hash = PasswordHasherConfig::new(3).hash("pw-123").unwrap();
        assert!(hash.contains("t=3"));
        assert!(PasswordHasherConfig::new(1).verify("pw-123", &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        let h = PasswordHasherConfig::new(1);
        assert!(!h.verify("anything", ""));
        assert!(!h.verify("anything", "plain-text"));
    }

    #[test]
    fn bcrypt_hashes_still_verify() {
        let h = PasswordHasherConfig::new(1);
        let legacy = bcrypt::hash("password", 4).unwrap();
        assert!(legacy.starts_with("$2b$"));
        assert!(h.verify("password", &legacy));
        assert!(!h.verify("passw0rd", &legacy));

        let legacy_2a = legacy.replacen("$2b$", "$2a$", 1);
        assert!(h.verify("password", &legacy_2a));
        assert!(!h.verify("password", "$2a$10$truncated"));
    }
}
