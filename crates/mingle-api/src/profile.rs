use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use mingle_types::api::{Claims, ProfileResponse, UpdateDetailsRequest};
use mingle_types::models::Hobby;

use crate::auth::AppStateInner;
use crate::convert;
use crate::error::ApiError;

/// The caller's own profile together with their hobby set.
pub async fn get_profile(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();

    let (user, hobby_rows) = tokio::task::spawn_blocking(move || {
        let user = db.db.get_user_by_id(&uid)?.ok_or(mingle_db::StoreError::NotFound)?;
        let hobbies = db.db.hobbies_of_user(&uid)?;
        Ok::<_, mingle_db::StoreError>((user, hobbies))
    })
    .await??;

    let hobbies: Vec<Hobby> = hobby_rows.into_iter().map(convert::hobby).collect();
    Ok(Json(ProfileResponse {
        user: convert::user(user),
        hobbies,
    }))
}

/// Profile detail update. The username in the payload identifies the record
/// and must be the caller's own; usernames themselves are immutable here.
pub async fn update_details(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateDetailsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username != claims.username {
        return Err(ApiError::Validation("can only update your own details"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email address is not valid"));
    }

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        db.db
            .update_user_details(&req.username, &req.first_name, &req.last_name, &req.email)
    })
    .await??;

    Ok(Json(serde_json::json!({ "result": true })))
}
