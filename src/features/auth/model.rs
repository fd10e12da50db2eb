use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::ROLE_SUPER_ADMIN;

/// Principal resolved from a verified access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Stable user id (`sub` claim); quotas and usage are tracked against it
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }
}

/// Provider-managed metadata claim; roles are assigned by admins, never by users
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMetadataClaims {
    #[serde(default)]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_role() {
        let mut user = AuthenticatedUser {
            user_id: "u1".to_string(),
            email: None,
            roles: vec!["owner".to_string()],
        };
        assert!(user.has_role("owner"));
        assert!(!user.is_super_admin());

        user.roles.push(ROLE_SUPER_ADMIN.to_string());
        assert!(user.is_super_admin());
    }
}
