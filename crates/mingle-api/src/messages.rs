use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use mingle_types::api::{Claims, SendMessageRequest};
use mingle_types::models::Message;

use crate::auth::AppStateInner;
use crate::convert;
use crate::error::ApiError;

pub async fn send_message(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    let sender = claims.sub.to_string();
    let recipient = req.recipient.to_string();
    // A missing content field is treated as empty content
    let content = req.content.unwrap_or_default();

    // Self-message and empty-content checks live in the store layer,
    // alongside the insert they guard.
    tokio::task::spawn_blocking(move || {
        db.db.insert_message(&id, &sender, &recipient, &content)
    })
    .await??;

    Ok(Json(serde_json::json!({ "msg": "Success" })))
}

/// A single message, readable only by its two parties.
pub async fn get_message(
    State(state): State<Arc<AppStateInner>>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let mid = message_id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_message(&mid))
        .await??
        .ok_or(ApiError::NotFound)?;

    let uid = claims.sub.to_string();
    if row.sender_id != uid && row.recipient_id != uid {
        // Don't reveal that the message exists
        return Err(ApiError::NotFound);
    }

    Ok(Json(convert::message(row)))
}

/// Both sides of the exchange between the caller and one other user,
/// oldest first.
pub async fn conversation(
    State(state): State<Arc<AppStateInner>>,
    Path(other_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let other = other_id.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.conversation(&uid, &other)).await??;

    let messages: Vec<Message> = rows.into_iter().map(convert::message).collect();
    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mingle_db::{Database, StoreError, models::NewUser};

    fn add_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&NewUser {
            id: &id,
            username,
            email: &format!("{username}@example.com"),
            password_hash: "$argon2$test",
            first_name: username,
            last_name: "Tester",
            gender: None,
            dob: None,
        })
        .unwrap();
        id
    }

    #[test]
    fn absent_content_rejected_as_empty() {
        // A body without a content field still deserializes...
        let body = format!(r#"{{"recipient": "{}"}}"#, Uuid::new_v4());
        let req: SendMessageRequest = serde_json::from_str(&body).unwrap();
        assert!(req.content.is_none());

        // ...and the store rejects it the same way as an empty string.
        let db = Database::open_in_memory().unwrap();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");

        let content = req.content.unwrap_or_default();
        let err = db
            .insert_message(&Uuid::new_v4().to_string(), &alice, &bob, &content)
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyContent));
    }
}
