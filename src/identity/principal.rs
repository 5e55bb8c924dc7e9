use serde::{Deserialize, Serialize};

use crate::earnings::ManagerType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
        }
    }
}

/// Manager account linked to a login, when the user is a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub manager_type: Option<ManagerType>,
}

/// The authenticated user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerRef>,
}

impl Identity {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
    pub fn is_manager(&self) -> bool { self.role == Role::Manager }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() { self.email.clone() } else { full.to_string() }
    }

    /// Manager id whose earnings this user may view, if any.
    pub fn manager_id(&self) -> Option<&str> {
        self.manager.as_ref().map(|m| m.id.as_str())
    }
}
