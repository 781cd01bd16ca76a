/// Database row types — these map directly to SQLite rows.
/// Distinct from the mingle-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: String,
}

/// Insert payload for a new user. The password field is always the argon2
/// hash; raw passwords never reach this layer.
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub gender: Option<&'a str>,
    pub dob: Option<&'a str>,
}

pub struct HobbyRow {
    pub id: String,
    pub name: String,
    pub kind: String,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct PendingRequestRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub created_at: String,
}
