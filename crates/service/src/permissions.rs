//! Static role → scope table and the request-level access policy built on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::{domain::Claims, errors::AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Staff, Role::Viewer];

    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Viewer => "viewer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    CollectionsRead,
    CollectionsWrite,
    MembersManage,
    FinanceManage,
    StaffManage,
    ReportsView,
    LogsView,
    AccountsManage,
    SystemAdmin,
}

impl Scope {
    pub const ALL: [Scope; 9] = [
        Scope::CollectionsRead,
        Scope::CollectionsWrite,
        Scope::MembersManage,
        Scope::FinanceManage,
        Scope::StaffManage,
        Scope::ReportsView,
        Scope::LogsView,
        Scope::AccountsManage,
        Scope::SystemAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::CollectionsRead => "collections:read",
            Scope::CollectionsWrite => "collections:write",
            Scope::MembersManage => "members:manage",
            Scope::FinanceManage => "finance:manage",
            Scope::StaffManage => "staff:manage",
            Scope::ReportsView => "reports:view",
            Scope::LogsView => "logs:view",
            Scope::AccountsManage => "accounts:manage",
            Scope::SystemAdmin => "system:admin",
        }
    }
}

const MANAGER_SCOPES: &[Scope] = &[
    Scope::CollectionsRead,
    Scope::CollectionsWrite,
    Scope::MembersManage,
    Scope::FinanceManage,
    Scope::StaffManage,
    Scope::ReportsView,
    Scope::LogsView,
];

const STAFF_SCOPES: &[Scope] = &[
    Scope::CollectionsRead,
    Scope::CollectionsWrite,
    Scope::MembersManage,
    Scope::FinanceManage,
];

const VIEWER_SCOPES: &[Scope] = &[Scope::CollectionsRead, Scope::ReportsView];

pub fn scopes_for_role(role: Role) -> &'static [Scope] {
    match role {
        Role::Admin => &Scope::ALL,
        Role::Manager => MANAGER_SCOPES,
        Role::Staff => STAFF_SCOPES,
        Role::Viewer => VIEWER_SCOPES,
    }
}

/// Unknown role strings carry no scopes.
pub fn has_permission(role: &str, scope: Scope) -> bool {
    Role::parse(role)
        .map(|r| scopes_for_role(r).contains(&scope))
        .unwrap_or(false)
}

/// The whole table as `role -> [scope]`, for the console to render menus.
pub fn permission_table() -> BTreeMap<&'static str, Vec<&'static str>> {
    Role::ALL
        .iter()
        .map(|r| (r.as_str(), scopes_for_role(*r).iter().map(Scope::as_str).collect()))
        .collect()
}

/// Decides whether a request may proceed given the (optional) caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    /// When false, anonymous callers pass `authorize`; presented tokens are
    /// still checked for scope.
    pub enforce: bool,
}

impl AccessPolicy {
    pub fn new(enforce: bool) -> Self { Self { enforce } }

    pub fn authorize(&self, caller: Option<&Claims>, scope: Scope) -> Result<(), AuthError> {
        match caller {
            None if !self.enforce => Ok(()),
            None => Err(AuthError::Unauthorized),
            Some(claims) => Self::check(claims, scope),
        }
    }

    /// Always requires an authenticated caller holding `scope`.
    pub fn require<'a>(&self, caller: Option<&'a Claims>, scope: Scope) -> Result<&'a Claims, AuthError> {
        let claims = caller.ok_or(AuthError::Unauthorized)?;
        Self::check(claims, scope)?;
        Ok(claims)
    }

    fn check(claims: &Claims, scope: Scope) -> Result<(), AuthError> {
        if has_permission(&claims.role, scope) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(scope.as_str().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> Claims {
        Claims { sub: "1".into(), username: "u".into(), role: role.into(), iat: 0, exp: 0 }
    }

    #[test]
    fn admin_has_everything() {
        for scope in Scope::ALL {
            assert!(has_permission("admin", scope), "{}", scope.as_str());
        }
    }

    #[test]
    fn lookup_matches_table() {
        assert!(has_permission("manager", Scope::LogsView));
        assert!(!has_permission("manager", Scope::AccountsManage));
        assert!(has_permission("staff", Scope::FinanceManage));
        assert!(!has_permission("staff", Scope::ReportsView));
        assert!(has_permission("viewer", Scope::CollectionsRead));
        assert!(!has_permission("viewer", Scope::CollectionsWrite));
        assert!(has_permission("Viewer", Scope::ReportsView));
        assert!(!has_permission("cashier", Scope::CollectionsRead));
    }

    #[test]
    fn table_lists_every_role() {
        let table = permission_table();
        assert_eq!(table.len(), 4);
        assert_eq!(table["viewer"], vec!["collections:read", "reports:view"]);
        assert_eq!(table["admin"].len(), Scope::ALL.len());
    }

    #[test]
    fn policy_lenient_mode() {
        let policy = AccessPolicy::new(false);
        assert!(policy.authorize(None, Scope::SystemAdmin).is_ok());
        let viewer = claims("viewer");
        assert!(matches!(
            policy.authorize(Some(&viewer), Scope::CollectionsWrite),
            Err(AuthError::Forbidden(_))
        ));
        assert!(matches!(policy.require(None, Scope::AccountsManage), Err(AuthError::Unauthorized)));
    }

    #[test]
    fn policy_enforced_mode() {
        let policy = AccessPolicy::new(true);
        assert!(matches!(policy.authorize(None, Scope::CollectionsRead), Err(AuthError::Unauthorized)));
        let staff = claims("staff");
        assert!(policy.authorize(Some(&staff), Scope::CollectionsWrite).is_ok());
        assert!(policy.authorize(Some(&staff), Scope::SystemAdmin).is_err());
    }
}
