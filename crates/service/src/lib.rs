//! Service layer for the spa console backend.
//! - Collection registry, storage seam and JSON-aware store.
//! - Authentication, the role/scope table and the operation log.
//! - Framework independent; the HTTP layer lives in the `server` crate.

pub mod errors;
pub mod collections;
pub mod auth;
pub mod permissions;
pub mod oplog;
#[cfg(test)]
pub mod test_support;
