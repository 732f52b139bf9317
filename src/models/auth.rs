use serde::{Deserialize, Serialize};

/// Respuesta de `POST /auth/login`.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub role: String,
    pub full_name: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Rol persistido de la sesión actual.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Admin,
    Driver,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "admin" => Some(Role::Admin),
            "driver" => Some(Role::Driver),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Driver => "driver",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roles_conocidos() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("driver"), Some(Role::Driver));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(""), None);
    }
}
