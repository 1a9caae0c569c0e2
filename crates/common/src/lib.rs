//! Shared helpers for the console backend: logging setup, runtime checks and
//! small wire types reused by several crates.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::ok();
        assert!(h.is_ok());
        let d = types::Health::degraded("unavailable");
        assert!(!d.is_ok());
        assert_eq!(d.database, "unavailable");
    }
}
