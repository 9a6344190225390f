//! Input checks run before any network call
//!
//! Violations are `Fatal`: retrying cannot fix them.

use permsys_domain::{
    ApiError, ApiResult, Entity, EntityMeta, PermissionSystem, Policy, Role, ServiceAccount, Token,
};

/// Structural checks for a planned entity.
pub trait Validate {
    /// Checks for a create: identity fields the server cannot fill in.
    fn validate(&self) -> ApiResult<()>;

    /// Checks for read, update and delete. Only the path identity is
    /// required; imported state may know nothing but `(scope, id)`.
    fn validate_stored(&self) -> ApiResult<()>
    where
        Self: Entity,
    {
        require_identity(Self::KIND, self.meta())
    }
}

fn require_scope_and_name(kind: &str, meta: &EntityMeta) -> ApiResult<()> {
    if meta.scope_id.is_empty() {
        return Err(ApiError::Fatal(format!("{kind} must belong to a permission system")));
    }
    if meta.name.trim().is_empty() {
        return Err(ApiError::Fatal(format!("{kind} name must not be empty")));
    }
    Ok(())
}

fn require_identity(kind: &str, meta: &EntityMeta) -> ApiResult<()> {
    if meta.scope_id.is_empty() {
        return Err(ApiError::Fatal(format!("{kind} must belong to a permission system")));
    }
    if meta.id.trim().is_empty() {
        return Err(ApiError::Fatal(format!(
            "{kind} in permission system {} has no id in state",
            meta.scope_id
        )));
    }
    Ok(())
}

impl Validate for Role {
    fn validate(&self) -> ApiResult<()> {
        require_scope_and_name(Self::KIND, &self.meta)?;
        if let Some(name) = self.permissions.keys().find(|name| name.trim().is_empty()) {
            return Err(ApiError::Fatal(format!(
                "role {} has a permission with an empty name ({name:?})",
                self.meta.name
            )));
        }
        Ok(())
    }
}

impl Validate for ServiceAccount {
    fn validate(&self) -> ApiResult<()> {
        require_scope_and_name(Self::KIND, &self.meta)
    }
}

impl Validate for Token {
    fn validate(&self) -> ApiResult<()> {
        require_scope_and_name(Self::KIND, &self.meta)?;
        if self.service_account_id.trim().is_empty() {
            return Err(ApiError::Fatal(format!(
                "token {} must name its service account",
                self.meta.name
            )));
        }
        Ok(())
    }

    /// Token paths nest under the owning service account.
    fn validate_stored(&self) -> ApiResult<()> {
        require_identity(Self::KIND, &self.meta)?;
        if self.service_account_id.trim().is_empty() {
            return Err(ApiError::Fatal(format!(
                "token {} has no service account in state",
                self.meta.id
            )));
        }
        Ok(())
    }
}

impl Validate for Policy {
    fn validate(&self) -> ApiResult<()> {
        require_scope_and_name(Self::KIND, &self.meta)?;
        if self.principal_id.trim().is_empty() {
            return Err(ApiError::Fatal(format!("policy {} must name a principal", self.meta.name)));
        }
        if self.role_ids.is_empty() {
            return Err(ApiError::Fatal(format!(
                "policy {} must reference at least one role",
                self.meta.name
            )));
        }
        if self.role_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ApiError::Fatal(format!(
                "policy {} references an empty role id",
                self.meta.name
            )));
        }
        Ok(())
    }
}

impl Validate for PermissionSystem {
    fn validate(&self) -> ApiResult<()> {
        if self.meta.id.trim().is_empty() {
            return Err(ApiError::Fatal("permission system id must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use permsys_domain::ApiErrorKind;

    use super::*;

    #[test]
    fn empty_scope_is_fatal() {
        let err = ServiceAccount::new("", "ci").validate().unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Fatal);
        assert!(err.message().contains("permission system"));
    }

    #[test]
    fn policy_needs_principal_and_roles() {
        assert!(Policy::new("ps", "p", "").with_role("r").validate().is_err());
        assert!(Policy::new("ps", "p", "sa").validate().is_err());
        assert!(Policy::new("ps", "p", "sa").with_role("r").validate().is_ok());
    }

    #[test]
    fn token_needs_service_account() {
        assert!(Token::new("ps", " ", "deploy").validate().is_err());
        assert!(Token::new("ps", "sa", "deploy").validate().is_ok());
    }

    #[test]
    fn stored_entities_need_an_id() {
        let mut role = Role::new("ps", "reader").with_permission("p1", "");
        assert!(role.validate().is_ok());
        assert!(role.validate_stored().is_err());
        role.meta.id = "r-1".into();
        assert!(role.validate_stored().is_ok());
    }

    #[test]
    fn stored_checks_only_need_path_identity() {
        let mut role = Role::new("ps", "");
        role.meta.id = "r-1".into();
        assert!(role.validate().is_err());
        assert!(role.validate_stored().is_ok());

        let mut policy = Policy::new("ps", "", "");
        policy.meta.id = "pol-1".into();
        assert!(policy.validate_stored().is_ok());

        let mut token = Token::new("ps", "", "");
        token.meta.id = "t-1".into();
        assert!(token.validate_stored().is_err());
        token.service_account_id = "sa-1".into();
        assert!(token.validate_stored().is_ok());

        let mut unscoped = ServiceAccount::new("", "");
        unscoped.meta.id = "sa-1".into();
        assert!(unscoped.validate_stored().is_err());
    }

    #[test]
    fn blank_permission_name_is_rejected() {
        let role = Role::new("ps", "reader").with_permission(" ", "");
        assert!(role.validate().is_err());
    }
}
