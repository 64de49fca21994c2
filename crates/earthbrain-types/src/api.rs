use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Attendance, Role};

// -- JWT Claims --

/// Claims carried in every bearer token. Verified claims are the caller's
/// session for the duration of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub role: Role,
}

impl From<&Claims> for SessionResponse {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            display_name: claims.name.clone(),
            photo_url: claims.photo.clone(),
            role: claims.role,
        }
    }
}

// -- Submissions --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RsvpRequest {
    pub name: String,
    pub email: String,
    pub attending: Attendance,
    #[serde(default)]
    pub guests: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryRequest {
    pub name: String,
    pub memory: String,
}

/// A community wall post. `image` is the base64-encoded file as picked by
/// the member, in any format the server can decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRequest {
    #[serde(default)]
    pub caption: String,
    pub image: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestionRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisitRequest {
    pub path: String,
    pub session: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisitResponse {
    pub recorded: bool,
}

// -- Charities --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharityRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CharityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.url.is_none() && self.label.is_none() && self.description.is_none()
    }
}

// -- Admin --

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStats {
    pub total: u64,
    pub by_path: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
