use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use mingle_db::models::UserRow;
use mingle_types::api::FilterUsersResponse;
use mingle_types::models::{Gender, User};

use crate::auth::AppStateInner;
use crate::convert;
use crate::error::ApiError;

pub async fn list_users(
    State(state): State<Arc<AppStateInner>>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_users()).await??;

    let users: Vec<User> = rows.into_iter().map(convert::user).collect();
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub gender: Option<Gender>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

/// Read-only directory filter: gender restricts by exact value, age bounds
/// are derived from birth year against the current year. Users without a
/// recorded date of birth are excluded whenever an age bound is active.
pub async fn filter_users(
    State(state): State<Arc<AppStateInner>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let gender = query.gender.map(|g| g.as_str());
    let rows = tokio::task::spawn_blocking(move || db.db.list_users_by_gender(gender)).await??;

    let current_year = Utc::now().year();
    let users: HashMap<Uuid, User> =
        apply_age_window(rows, current_year, query.min_age, query.max_age)
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

    Ok(Json(FilterUsersResponse { users }))
}

fn apply_age_window(
    rows: Vec<UserRow>,
    current_year: i32,
    min_age: Option<i32>,
    max_age: Option<i32>,
) -> Vec<User> {
    rows.into_iter()
        .map(convert::user)
        .filter(|u| within_age_window(u.dob, current_year, min_age, max_age))
        .collect()
}

/// `current_year - min_age >= birth_year >= current_year - max_age`,
/// each bound applied independently. No recorded date of birth fails closed
/// when any bound is active.
fn within_age_window(
    dob: Option<NaiveDate>,
    current_year: i32,
    min_age: Option<i32>,
    max_age: Option<i32>,
) -> bool {
    if min_age.is_none() && max_age.is_none() {
        return true;
    }
    let Some(dob) = dob else {
        return false;
    };

    let birth_year = dob.year();
    // Saturating arithmetic: the bounds are untrusted query input and can
    // be anywhere in the i32 range.
    if let Some(min) = min_age {
        if birth_year > current_year.saturating_sub(min) {
            return false;
        }
    }
    if let Some(max) = max_age {
        if birth_year < current_year.saturating_sub(max) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use mingle_db::Database;
    use mingle_db::models::NewUser;

    fn date(s: &str) -> Option<NaiveDate> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn no_bounds_means_no_age_filtering() {
        assert!(within_age_window(None, 2026, None, None));
        assert!(within_age_window(date("2010-01-01"), 2026, None, None));
    }

    #[test]
    fn missing_dob_fails_closed_under_age_bounds() {
        assert!(!within_age_window(None, 2026, Some(20), None));
        assert!(!within_age_window(None, 2026, None, Some(30)));
    }

    #[test]
    fn bounds_are_inclusive_on_birth_year() {
        // 2026 - 20 = 2006; 2026 - 30 = 1996
        assert!(within_age_window(date("2006-12-31"), 2026, Some(20), Some(30)));
        assert!(within_age_window(date("1996-01-01"), 2026, Some(20), Some(30)));
        assert!(!within_age_window(date("2007-01-01"), 2026, Some(20), Some(30)));
        assert!(!within_age_window(date("1995-12-31"), 2026, Some(20), Some(30)));
    }

    #[test]
    fn extreme_bounds_saturate_instead_of_overflowing() {
        // min_age at i32::MIN saturates to no lower cutoff at all
        assert!(within_age_window(date("2000-01-01"), 2026, Some(i32::MIN), None));
        // max_age at i32::MIN saturates to a cutoff nobody satisfies
        assert!(!within_age_window(date("2000-01-01"), 2026, None, Some(i32::MIN)));
        // max_age at i32::MAX admits every recorded birth year
        assert!(within_age_window(date("2000-01-01"), 2026, Some(0), Some(i32::MAX)));
    }

    #[test]
    fn single_bound_applies_independently() {
        assert!(within_age_window(date("1950-06-15"), 2026, Some(20), None));
        assert!(!within_age_window(date("1950-06-15"), 2026, None, Some(30)));
    }

    #[test]
    fn gender_and_age_filter_compose() {
        let db = Database::open_in_memory().unwrap();
        let mk = |username: &str, gender: &str, dob: Option<&str>| {
            db.create_user(&NewUser {
                id: &Uuid::new_v4().to_string(),
                username,
                email: &format!("{username}@example.com"),
                password_hash: "$argon2$test",
                first_name: username,
                last_name: "Tester",
                gender: Some(gender),
                dob,
            })
            .unwrap();
        };

        mk("ann", "Female", Some("2001-03-01")); // in window
        mk("bea", "Female", Some("1990-03-01")); // too old
        mk("cleo", "Female", None); // no dob, excluded
        mk("dan", "Male", Some("2001-03-01")); // wrong gender

        let rows = db.list_users_by_gender(Some("Female")).unwrap();
        let users = apply_age_window(rows, 2026, Some(20), Some(30));

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "ann");
    }
}
