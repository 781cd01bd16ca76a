//! Row-to-API conversions. Corrupt stored values are logged and replaced
//! with defaults rather than failing the whole response.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use mingle_db::models::{HobbyRow, MessageRow, PendingRequestRow, UserRow};
use mingle_types::models::{Gender, Hobby, HobbyKind, Message, PendingRequest, User};

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn user(row: UserRow) -> User {
    User {
        id: parse_id(&row.id, "user"),
        gender: row.gender.as_deref().and_then(|g| {
            g.parse::<Gender>()
                .map_err(|e| warn!("Corrupt gender on user '{}': {}", row.username, e))
                .ok()
        }),
        dob: row.dob.as_deref().and_then(|d| {
            d.parse::<NaiveDate>()
                .map_err(|e| warn!("Corrupt dob on user '{}': {}", row.username, e))
                .ok()
        }),
        created_at: parse_timestamp(&row.created_at),
        username: row.username,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        is_active: row.is_active,
        is_staff: row.is_staff,
    }
}

pub(crate) fn hobby(row: HobbyRow) -> Hobby {
    Hobby {
        id: parse_id(&row.id, "hobby"),
        kind: row.kind.parse::<HobbyKind>().unwrap_or_else(|e| {
            warn!("Corrupt kind on hobby '{}': {}", row.name, e);
            HobbyKind::Indoor
        }),
        name: row.name,
    }
}

pub(crate) fn message(row: MessageRow) -> Message {
    Message {
        id: parse_id(&row.id, "message"),
        sender_id: parse_id(&row.sender_id, "sender"),
        recipient_id: parse_id(&row.recipient_id, "recipient"),
        content: row.content,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn pending_request(row: PendingRequestRow) -> PendingRequest {
    PendingRequest {
        id: parse_id(&row.id, "request"),
        sender_id: parse_id(&row.sender_id, "sender"),
        recipient_id: parse_id(&row.recipient_id, "recipient"),
        created_at: parse_timestamp(&row.created_at),
    }
}
