use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use mingle_types::api::{Claims, RankedFriend, RespondFriendRequest, SendFriendRequest};
use mingle_types::models::{PendingRequest, User};

use crate::auth::AppStateInner;
use crate::convert;
use crate::error::ApiError;
use crate::recommend;

pub async fn send_friend_request(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    let sender = claims.sub.to_string();
    let recipient = req.recipient.to_string();

    tokio::task::spawn_blocking(move || db.db.create_friend_request(&id, &sender, &recipient))
        .await??;

    Ok(Json(serde_json::json!({ "msg": "Success" })))
}

/// Resolves a pending request. The record is consumed whatever the answer;
/// a second call for the same id comes back 404.
pub async fn respond_to_request(
    State(state): State<Arc<AppStateInner>>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<RespondFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let approve = req.answer == "True";

    let db = state.clone();
    let id = req.req_id.to_string();
    tokio::task::spawn_blocking(move || db.db.respond_friend_request(&id, approve)).await??;

    Ok(Json(serde_json::json!({ "msg": "Success" })))
}

/// Pending requests addressed to the caller, oldest first.
pub async fn list_incoming_requests(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.requests_for_recipient(&uid)).await??;

    let requests: Vec<PendingRequest> = rows.into_iter().map(convert::pending_request).collect();
    Ok(Json(requests))
}

pub async fn list_friends(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.friends_of(&uid)).await??;

    let friends: Vec<User> = rows.into_iter().map(convert::user).collect();
    Ok(Json(friends))
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    recommend::DEFAULT_TOP_K
}

/// The caller's friends ranked by shared-hobby count, best matches first.
pub async fn recommendations(
    State(state): State<Arc<AppStateInner>>,
    Query(query): Query<RecommendQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();

    // One query for the friends, one batch query for all hobby edges involved.
    let (friends, my_pairs, friend_pairs) = tokio::task::spawn_blocking(move || {
        let friends = db.db.friends_of(&uid)?;
        let my_pairs = db.db.hobby_ids_for_users(std::slice::from_ref(&uid))?;
        let friend_ids: Vec<String> = friends.iter().map(|f| f.id.clone()).collect();
        let friend_pairs = db.db.hobby_ids_for_users(&friend_ids)?;
        Ok::<_, mingle_db::StoreError>((friends, my_pairs, friend_pairs))
    })
    .await??;

    let my_hobbies: HashSet<String> = my_pairs.into_iter().map(|(_, h)| h).collect();

    let mut hobbies_by_friend: HashMap<String, HashSet<String>> = HashMap::new();
    for (user_id, hobby_id) in friend_pairs {
        hobbies_by_friend.entry(user_id).or_default().insert(hobby_id);
    }

    let username = claims.username;
    let candidates: Vec<_> = friends
        .into_iter()
        .filter(|f| f.username != username)
        .map(|f| {
            let hobbies = hobbies_by_friend.remove(&f.id).unwrap_or_default();
            (f, hobbies)
        })
        .collect();

    let ranked: Vec<RankedFriend> = recommend::rank_by_overlap(&my_hobbies, candidates, query.top_k)
        .into_iter()
        .map(|(row, score)| RankedFriend {
            user: convert::user(row),
            score,
        })
        .collect();

    Ok(Json(ranked))
}
