//! Control-plane resource paths

use permsys_domain::ScopeId;

/// `/ps`
pub fn permission_systems() -> String {
    "/ps".to_string()
}

/// `/ps/{scope}`
pub fn permission_system(scope: &ScopeId) -> String {
    format!("/ps/{scope}")
}

/// `/ps/{scope}/access/roles`
pub fn roles(scope: &ScopeId) -> String {
    format!("/ps/{scope}/access/roles")
}

pub fn role(scope: &ScopeId, id: &str) -> String {
    format!("{}/{id}", roles(scope))
}

/// `/ps/{scope}/access/service-accounts`
pub fn service_accounts(scope: &ScopeId) -> String {
    format!("/ps/{scope}/access/service-accounts")
}

pub fn service_account(scope: &ScopeId, id: &str) -> String {
    format!("{}/{id}", service_accounts(scope))
}

/// Token collection under one service account.
pub fn tokens(scope: &ScopeId, service_account_id: &str) -> String {
    format!("{}/tokens", service_account(scope, service_account_id))
}

pub fn token(scope: &ScopeId, service_account_id: &str, id: &str) -> String {
    format!("{}/{id}", tokens(scope, service_account_id))
}

/// `/ps/{scope}/access/policies`
pub fn policies(scope: &ScopeId) -> String {
    format!("/ps/{scope}/access/policies")
}

pub fn policy(scope: &ScopeId, id: &str) -> String {
    format!("{}/{id}", policies(scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_token_paths() {
        let scope = ScopeId::new("ps-1");
        assert_eq!(tokens(&scope, "sa-9"), "/ps/ps-1/access/service-accounts/sa-9/tokens");
        assert_eq!(token(&scope, "sa-9", "t-2"), "/ps/ps-1/access/service-accounts/sa-9/tokens/t-2");
        assert_eq!(policy(&scope, "p-1"), "/ps/ps-1/access/policies/p-1");
        assert_eq!(permission_system(&scope), "/ps/ps-1");
    }
}
