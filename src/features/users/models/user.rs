use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};

/// Capability tag carried by a user. Tags are independent: a supplier may
/// also be a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Supplier,
    Customer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Administrator => write!(f, "administrator"),
            Role::Supplier => write!(f, "supplier"),
            Role::Customer => write!(f, "customer"),
        }
    }
}

/// Set of capability tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roles(BTreeSet<Role>);

impl Roles {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn grant(&mut self, role: Role) {
        self.0.insert(role);
    }

    pub fn revoke(&mut self, role: Role) {
        self.0.remove(&role);
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

/// New accounts are customers only
impl Default for Roles {
    fn default() -> Self {
        Self(BTreeSet::from([Role::Customer]))
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Account record. Only the salted hash of the password is ever stored;
/// hashing and token issuance happen outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub roles: Roles,
    pub is_active: bool,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Administrator)
    }

    pub fn is_supplier(&self) -> bool {
        self.has_role(Role::Supplier)
    }

    pub fn is_customer(&self) -> bool {
        self.has_role(Role::Customer)
    }

    /// Fails unless the user is active and carries `role`
    pub fn require(&self, role: Role) -> Result<()> {
        self.require_any(&[role])
    }

    /// Fails unless the user is active and carries at least one of `roles`
    pub fn require_any(&self, roles: &[Role]) -> Result<()> {
        if !self.is_active {
            return Err(AppError::Unauthorized(format!(
                "User '{}' is not active",
                self.username
            )));
        }

        if roles.iter().any(|r| self.has_role(*r)) {
            return Ok(());
        }

        let wanted: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        Err(AppError::Forbidden(format!(
            "Requires one of the roles: {}",
            wanted.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::user_with_roles;

    #[test]
    fn test_default_roles_is_customer() {
        let roles = Roles::default();
        assert!(roles.contains(Role::Customer));
        assert!(!roles.contains(Role::Administrator));
        assert!(!roles.contains(Role::Supplier));
    }

    #[test]
    fn test_roles_are_independent() {
        let user = user_with_roles(1, &[Role::Supplier, Role::Customer]);
        assert!(user.is_supplier());
        assert!(user.is_customer());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_require_missing_role_is_forbidden() {
        let user = user_with_roles(1, &[Role::Customer]);
        assert!(user.require(Role::Customer).is_ok());
        assert!(matches!(
            user.require(Role::Administrator),
            Err(AppError::Forbidden(_))
        ));
        assert!(user
            .require_any(&[Role::Supplier, Role::Customer])
            .is_ok());
    }

    #[test]
    fn test_inactive_user_is_unauthorized() {
        let mut user = user_with_roles(1, &[Role::Administrator]);
        user.is_active = false;
        assert!(matches!(
            user.require(Role::Administrator),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut roles = Roles::empty();
        roles.grant(Role::Supplier);
        roles.grant(Role::Supplier);
        assert_eq!(roles.iter().count(), 1);
        roles.revoke(Role::Supplier);
        assert!(!roles.contains(Role::Supplier));
    }

    #[test]
    fn test_roles_serialize_as_tag_list() {
        let roles: Roles = [Role::Customer, Role::Administrator].into_iter().collect();
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["administrator","customer"]"#);
    }
}
