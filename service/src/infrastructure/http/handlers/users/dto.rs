use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Role, users::User};

// Requests

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

// Responses

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    id: i64,
    email: String,
    name: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id.0,
            email: value.email,
            name: value.name,
            role: value.role,
            created_at: value.created_at,
        }
    }
}
