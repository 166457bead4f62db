use thiserror::Error;

use crate::{Permission, Principal, Role, UserIdentity};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Role → permission policy.
///
/// `admin` holds the wildcard; `user` may browse the catalog and file requests.
/// Unknown roles grant nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(Role::is_admin) {
        return vec![Permission::WILDCARD];
    }

    if roles.iter().any(|r| r == &Role::USER) {
        return vec![Permission::CATALOG_READ, Permission::REQUESTS_CREATE];
    }

    Vec::new()
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    check(&principal.roles, required).inspect_err(|_| {
        tracing::debug!(
            user_id = %principal.user_id,
            permission = %required,
            "authorization denied"
        );
    })
}

/// Authorize a registered identity by the role the directory holds for it.
///
/// Whatever roles a token claims, this is the check that decides.
pub fn authorize_identity(identity: &UserIdentity, required: &Permission) -> Result<(), AuthzError> {
    check(std::slice::from_ref(&identity.role), required).inspect_err(|_| {
        tracing::debug!(
            user_id = %identity.id,
            role = %identity.role,
            permission = %required,
            "authorization denied by directory role"
        );
    })
}

fn check(roles: &[Role], required: &Permission) -> Result<(), AuthzError> {
    let granted = permissions_for_roles(roles);

    if granted.iter().any(|p| p.is_wildcard() || p == required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Whether a resolved identity holds `role`.
pub fn has_role(identity: &UserIdentity, role: &Role) -> bool {
    &identity.role == role
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::UserId;

    fn principal(roles: Vec<Role>) -> Principal {
        Principal::new(UserId::new(), roles)
    }

    #[test]
    fn admin_is_granted_everything() {
        let admin = principal(vec![Role::ADMIN]);
        for perm in [
            Permission::CATALOG_READ,
            Permission::CATALOG_WRITE,
            Permission::REQUESTS_CREATE,
            Permission::REQUESTS_MANAGE,
            Permission::AUDIT_READ,
        ] {
            assert_eq!(authorize(&admin, &perm), Ok(()));
        }
    }

    #[test]
    fn user_can_browse_and_request_only() {
        let user = principal(vec![Role::USER]);
        assert!(authorize(&user, &Permission::CATALOG_READ).is_ok());
        assert!(authorize(&user, &Permission::REQUESTS_CREATE).is_ok());
        assert_eq!(
            authorize(&user, &Permission::REQUESTS_MANAGE),
            Err(AuthzError::Forbidden("requests.manage".to_string()))
        );
        assert!(authorize(&user, &Permission::AUDIT_READ).is_err());
        assert!(authorize(&user, &Permission::CATALOG_WRITE).is_err());
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let guest = principal(vec![Role::new("guest")]);
        assert!(authorize(&guest, &Permission::CATALOG_READ).is_err());
        assert!(authorize(&principal(vec![]), &Permission::CATALOG_READ).is_err());
    }

    #[test]
    fn directory_role_decides_for_identities() {
        let admin = UserIdentity::register(UserId::new(), "admin", "School Admin").unwrap();
        let ann = UserIdentity::register(UserId::new(), "ann", "Ann Lee").unwrap();

        assert!(authorize_identity(&admin, &Permission::REQUESTS_MANAGE).is_ok());
        assert!(authorize_identity(&ann, &Permission::REQUESTS_CREATE).is_ok());
        assert_eq!(
            authorize_identity(&ann, &Permission::AUDIT_READ),
            Err(AuthzError::Forbidden("audit.read".to_string()))
        );
    }

    #[test]
    fn has_role_checks_the_directory_role() {
        let identity = UserIdentity::register(UserId::new(), "admin", "School Admin").unwrap();
        assert!(has_role(&identity, &Role::ADMIN));
        assert!(!has_role(&identity, &Role::USER));
    }
}
