//! The fixed set of collection names the console persists.

use crate::errors::ServiceError;

pub const MEMBERS: &str = "members";
pub const CARDS: &str = "cards";
pub const RECHARGES: &str = "recharges";
pub const CONSUMPTIONS: &str = "consumptions";
pub const STAFF: &str = "staff";
pub const ACCOUNTS: &str = "accounts";
pub const ROLE_PERMISSIONS: &str = "rolePermissions";
pub const OPERATION_LOGS: &str = "operationLogs";
pub const SETTINGS: &str = "settings";

/// Every registered name, in bootstrap order.
pub const REGISTERED_COLLECTIONS: &[&str] = &[
    MEMBERS,
    CARDS,
    RECHARGES,
    CONSUMPTIONS,
    STAFF,
    ACCOUNTS,
    ROLE_PERMISSIONS,
    OPERATION_LOGS,
    SETTINGS,
];

pub fn is_registered(name: &str) -> bool {
    REGISTERED_COLLECTIONS.contains(&name)
}

/// Resolve `name` to its registered constant, or `NotFound`.
pub fn ensure_registered(name: &str) -> Result<&'static str, ServiceError> {
    REGISTERED_COLLECTIONS
        .iter()
        .copied()
        .find(|n| *n == name)
        .ok_or_else(|| ServiceError::unknown_collection(name))
}
