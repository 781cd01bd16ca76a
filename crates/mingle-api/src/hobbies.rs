use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use mingle_types::api::{Claims, HobbyEditRequest};
use mingle_types::models::{Hobby, User};

use crate::auth::AppStateInner;
use crate::convert;
use crate::error::ApiError;

/// The full catalog. Small and fixed, so no pagination.
pub async fn list_hobbies(
    State(state): State<Arc<AppStateInner>>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_hobbies()).await??;

    let hobbies: Vec<Hobby> = rows.into_iter().map(convert::hobby).collect();
    Ok(Json(hobbies))
}

pub async fn users_with_hobby(
    State(state): State<Arc<AppStateInner>>,
    Path(hobby_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let hid = hobby_id.to_string();

    let (hobby, rows) = tokio::task::spawn_blocking(move || {
        let hobby = db.db.get_hobby_by_id(&hid)?.ok_or(mingle_db::StoreError::NotFound)?;
        let rows = db.db.users_with_hobby(&hid)?;
        Ok::<_, mingle_db::StoreError>((hobby, rows))
    })
    .await??;

    let users: Vec<User> = rows.into_iter().map(convert::user).collect();
    Ok(Json(serde_json::json!({
        "hobby": convert::hobby(hobby),
        "users": users,
    })))
}

pub async fn add_hobby(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<HobbyEditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    edit_membership(state, claims, req, true).await
}

pub async fn remove_hobby(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<HobbyEditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    edit_membership(state, claims, req, false).await
}

/// Idempotent set membership: re-adding or re-removing is a silent no-op.
/// Only a hobby id that doesn't exist in the catalog is an error.
async fn edit_membership(
    state: Arc<AppStateInner>,
    claims: Claims,
    req: HobbyEditRequest,
    add: bool,
) -> Result<Json<serde_json::Value>, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let hid = req.hobby_id.to_string();

    tokio::task::spawn_blocking(move || {
        db.db.get_hobby_by_id(&hid)?.ok_or(mingle_db::StoreError::NotFound)?;
        if add {
            db.db.add_user_hobby(&uid, &hid)
        } else {
            db.db.remove_user_hobby(&uid, &hid)
        }
    })
    .await??;

    Ok(Json(serde_json::json!({ "msg": "Success" })))
}
