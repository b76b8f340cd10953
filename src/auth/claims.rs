use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Serialized and stored as `USER` / `ADMIN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("USER"),
            Role::Admin => f.write_str("ADMIN"),
        }
    }
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String,
    pub role: Role,
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_format_is_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let r: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(r, Role::User);
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }
}
