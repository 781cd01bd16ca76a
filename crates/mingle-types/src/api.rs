use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Gender, Hobby, User};

// -- JWT Claims --

/// JWT claims shared between the auth handlers that mint tokens and the
/// middleware that validates them. Canonical definition lives here in
/// mingle-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub dob: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendFriendRequest {
    pub recipient: Uuid,
}

/// `answer` is the literal string "True" or "False"; anything else declines.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RespondFriendRequest {
    pub req_id: Uuid,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct RankedFriend {
    pub user: User,
    pub score: usize,
}

// -- Hobbies --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HobbyEditRequest {
    pub hobby_id: Uuid,
}

// -- Profile --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDetailsRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub hobbies: Vec<Hobby>,
}

// -- Messages --

/// `content` may be absent entirely; absent and empty are rejected alike.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient: Uuid,
    pub content: Option<String>,
}

// -- Browse / filter --

#[derive(Debug, Serialize)]
pub struct FilterUsersResponse {
    pub users: HashMap<Uuid, User>,
}
