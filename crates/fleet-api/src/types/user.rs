use fleet_auth::Role;
use serde::{Deserialize, Serialize};

/// Wire code for a role (`"0"` driver, `"1"` admin, `"2"` dispatcher).
pub fn role_code(role: Role) -> &'static str {
    match role {
        Role::Driver => "0",
        Role::Admin => "1",
        Role::Dispatcher => "2",
    }
}

/// Role for a wire code; unknown codes fall back to `Driver`.
pub fn role_from_code(code: &str) -> Role {
    match code.trim() {
        "1" => Role::Admin,
        "2" => Role::Dispatcher,
        _ => Role::Driver,
    }
}

/// Serde adapter for roles travelling as string codes.
pub mod role_as_code {
    use fleet_auth::Role;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(role: &Role, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::role_code(*role))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
        // Tolerate numeric codes; anything unrecognised maps to Driver
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::String(code) => super::role_from_code(&code),
            serde_json::Value::Number(code) => super::role_from_code(&code.to_string()),
            _ => Role::Driver,
        })
    }

    pub fn serialize_opt<S: Serializer>(role: &Option<Role>, serializer: S) -> Result<S::Ok, S::Error> {
        match role {
            Some(role) => serializer.serialize_some(super::role_code(*role)),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(with = "role_as_code")]
    pub role: Role,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct UserList {
    pub users: Vec<User>,
}

/// Registration payload.
#[derive(Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(with = "role_as_code")]
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

/// Partial user update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "role_as_code::serialize_opt"
    )]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}
