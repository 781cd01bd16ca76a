use crate::models::{HobbyRow, MessageRow, NewUser, PendingRequestRow, UserRow};
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, Row};

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, first_name, last_name, gender, dob)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.password_hash,
                    user.first_name,
                    user.last_name,
                    user.gender,
                    user.dob,
                ],
            )
            .map_err(|e| {
                if StoreError::is_constraint_violation(&e) {
                    StoreError::Conflict("username or email")
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("{USER_COLUMNS} WHERE username = ?1"))?
                .query_row([username], user_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(&format!("{USER_COLUMNS} WHERE id = ?1"))?
                .query_row([id], user_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            collect_users(conn, &format!("{USER_COLUMNS} ORDER BY username"), &[])
        })
    }

    /// Users restricted by gender when one is given, everyone otherwise.
    /// Age windows are applied above this layer, where "today" is explicit.
    pub fn list_users_by_gender(&self, gender: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| match gender {
            Some(g) => collect_users(
                conn,
                &format!("{USER_COLUMNS} WHERE gender = ?1 ORDER BY username"),
                &[&g],
            ),
            None => collect_users(conn, &format!("{USER_COLUMNS} ORDER BY username"), &[]),
        })
    }

    /// Updates the mutable profile details of the user identified by username.
    pub fn update_user_details(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET first_name = ?2, last_name = ?3, email = ?4 WHERE username = ?1",
                    rusqlite::params![username, first_name, last_name, email],
                )
                .map_err(|e| {
                    if StoreError::is_constraint_violation(&e) {
                        StoreError::Conflict("email")
                    } else {
                        e.into()
                    }
                })?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    // -- Hobbies --

    pub fn list_hobbies(&self) -> Result<Vec<HobbyRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, kind FROM hobbies ORDER BY name")?;
            let rows = stmt
                .query_map([], hobby_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_hobby_by_id(&self, id: &str) -> Result<Option<HobbyRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, name, kind FROM hobbies WHERE id = ?1")?
                .query_row([id], hobby_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Idempotent: adding a hobby the user already has is a no-op.
    pub fn add_user_hobby(&self, user_id: &str, hobby_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_hobbies (user_id, hobby_id) VALUES (?1, ?2)",
                (user_id, hobby_id),
            )?;
            Ok(())
        })
    }

    /// Idempotent: removing an absent hobby is a no-op.
    pub fn remove_user_hobby(&self, user_id: &str, hobby_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM user_hobbies WHERE user_id = ?1 AND hobby_id = ?2",
                (user_id, hobby_id),
            )?;
            Ok(())
        })
    }

    pub fn hobbies_of_user(&self, user_id: &str) -> Result<Vec<HobbyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT h.id, h.name, h.kind FROM hobbies h
                 JOIN user_hobbies uh ON uh.hobby_id = h.id
                 WHERE uh.user_id = ?1
                 ORDER BY h.name",
            )?;
            let rows = stmt
                .query_map([user_id], hobby_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn users_with_hobby(&self, hobby_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            collect_users(
                conn,
                &format!(
                    "{USER_COLUMNS} WHERE id IN
                     (SELECT user_id FROM user_hobbies WHERE hobby_id = ?1)
                     ORDER BY username"
                ),
                &[&hobby_id],
            )
        })
    }

    /// Batch-fetch (user_id, hobby_id) pairs for a set of users in one query.
    pub fn hobby_ids_for_users(&self, user_ids: &[String]) -> Result<Vec<(String, String)>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=user_ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT user_id, hobby_id FROM user_hobbies WHERE user_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = user_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Friends --

    pub fn friends_of(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            collect_users(
                conn,
                &format!(
                    "{USER_COLUMNS} WHERE id IN
                     (SELECT friend_id FROM friends WHERE user_id = ?1)
                     ORDER BY username"
                ),
                &[&user_id],
            )
        })
    }

    // -- Friend requests --

    /// Persists a new pending request. The UNIQUE constraint on the ordered
    /// pair makes the duplicate check atomic with the insert.
    pub fn create_friend_request(&self, id: &str, sender_id: &str, recipient_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let recipient_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [recipient_id],
                |row| row.get(0),
            )?;
            if !recipient_exists {
                return Err(StoreError::UnknownRecipient);
            }

            conn.execute(
                "INSERT INTO pending_requests (id, sender_id, recipient_id) VALUES (?1, ?2, ?3)",
                (id, sender_id, recipient_id),
            )
            .map_err(|e| {
                if StoreError::is_constraint_violation(&e) {
                    StoreError::DuplicateRequest
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn get_friend_request(&self, id: &str) -> Result<Option<PendingRequestRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, sender_id, recipient_id, created_at
                     FROM pending_requests WHERE id = ?1",
                )?
                .query_row([id], request_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn requests_for_recipient(&self, recipient_id: &str) -> Result<Vec<PendingRequestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, created_at
                 FROM pending_requests WHERE recipient_id = ?1
                 ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([recipient_id], request_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Resolves a pending request in one transaction: on approval the friend
    /// edge is inserted in both directions, and the row is deleted whatever
    /// the answer was. A second call for the same id is NotFound.
    pub fn respond_friend_request(&self, id: &str, approve: bool) -> Result<PendingRequestRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let req = tx
                .prepare(
                    "SELECT id, sender_id, recipient_id, created_at
                     FROM pending_requests WHERE id = ?1",
                )?
                .query_row([id], request_from_row)
                .optional()?
                .ok_or(StoreError::NotFound)?;

            if approve {
                // Mirrored insert keeps is-friend-of symmetric.
                tx.execute(
                    "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
                    (&req.sender_id, &req.recipient_id),
                )?;
                tx.execute(
                    "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
                    (&req.recipient_id, &req.sender_id),
                )?;
            }

            tx.execute("DELETE FROM pending_requests WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(req)
        })
    }

    // -- Messages --

    /// Persists a message after checking the domain invariants:
    /// sender and recipient must differ, content must be non-empty.
    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<()> {
        if sender_id == recipient_id {
            return Err(StoreError::SelfMessage);
        }
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }

        self.with_conn(|conn| {
            let recipient_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [recipient_id],
                |row| row.get(0),
            )?;
            if !recipient_exists {
                return Err(StoreError::UnknownRecipient);
            }

            conn.execute(
                "INSERT INTO messages (id, sender_id, recipient_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, sender_id, recipient_id, content),
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, sender_id, recipient_id, content, created_at
                     FROM messages WHERE id = ?1",
                )?
                .query_row([id], message_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Both directions of a two-party exchange, oldest first.
    pub fn conversation(&self, a: &str, b: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, content, created_at
                 FROM messages
                 WHERE (sender_id = ?1 AND recipient_id = ?2)
                    OR (sender_id = ?2 AND recipient_id = ?1)
                 ORDER BY created_at, id",
            )?;
            let rows = stmt
                .query_map([a, b], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

const USER_COLUMNS: &str = "SELECT id, username, email, password, first_name, last_name, \
                            gender, dob, is_active, is_staff, created_at FROM users";

fn user_from_row(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        gender: row.get(6)?,
        dob: row.get(7)?,
        is_active: row.get(8)?,
        is_staff: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn hobby_from_row(row: &Row) -> rusqlite::Result<HobbyRow> {
    Ok(HobbyRow {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn request_from_row(row: &Row) -> rusqlite::Result<PendingRequestRow> {
    Ok(PendingRequestRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn collect_users(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, username: &str, gender: Option<&str>, dob: Option<&str>) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&NewUser {
            id: &id,
            username,
            email: &format!("{username}@example.com"),
            password_hash: "$argon2$test",
            first_name: username,
            last_name: "Tester",
            gender,
            dob,
        })
        .unwrap();
        id
    }

    fn hobby_id(db: &Database, name: &str) -> String {
        db.list_hobbies()
            .unwrap()
            .into_iter()
            .find(|h| h.name == name)
            .unwrap()
            .id
    }

    #[test]
    fn duplicate_username_rejected() {
        let db = test_db();
        add_user(&db, "alice", None, None);
        let err = db
            .create_user(&NewUser {
                id: &Uuid::new_v4().to_string(),
                username: "alice",
                email: "other@example.com",
                password_hash: "$argon2$test",
                first_name: "Alice",
                last_name: "Two",
                gender: None,
                dob: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn duplicate_friend_request_rejected() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let bob = add_user(&db, "bob", None, None);

        db.create_friend_request(&Uuid::new_v4().to_string(), &alice, &bob)
            .unwrap();
        let err = db
            .create_friend_request(&Uuid::new_v4().to_string(), &alice, &bob)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRequest));

        // Exactly one pending row survives
        assert_eq!(db.requests_for_recipient(&bob).unwrap().len(), 1);
    }

    #[test]
    fn request_to_unknown_recipient_rejected() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let err = db
            .create_friend_request(
                &Uuid::new_v4().to_string(),
                &alice,
                &Uuid::new_v4().to_string(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownRecipient));
    }

    #[test]
    fn approve_adds_mirrored_edge_and_consumes_request() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let bob = add_user(&db, "bob", None, None);

        let req_id = Uuid::new_v4().to_string();
        db.create_friend_request(&req_id, &alice, &bob).unwrap();

        let req = db.respond_friend_request(&req_id, true).unwrap();
        assert_eq!(req.sender_id, alice);
        assert_eq!(req.recipient_id, bob);

        let alice_friends: Vec<String> =
            db.friends_of(&alice).unwrap().into_iter().map(|u| u.id).collect();
        let bob_friends: Vec<String> =
            db.friends_of(&bob).unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(alice_friends, vec![bob.clone()]);
        assert_eq!(bob_friends, vec![alice.clone()]);

        assert!(db.get_friend_request(&req_id).unwrap().is_none());

        // Responding twice signals NotFound
        let err = db.respond_friend_request(&req_id, true).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn decline_consumes_request_without_edge() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let bob = add_user(&db, "bob", None, None);

        let req_id = Uuid::new_v4().to_string();
        db.create_friend_request(&req_id, &alice, &bob).unwrap();
        db.respond_friend_request(&req_id, false).unwrap();

        assert!(db.friends_of(&alice).unwrap().is_empty());
        assert!(db.friends_of(&bob).unwrap().is_empty());
        assert!(db.get_friend_request(&req_id).unwrap().is_none());

        let err = db.respond_friend_request(&req_id, false).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn self_message_rejected() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let err = db
            .insert_message(&Uuid::new_v4().to_string(), &alice, &alice, "hi")
            .unwrap_err();
        assert!(matches!(err, StoreError::SelfMessage));
    }

    #[test]
    fn empty_message_rejected() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let bob = add_user(&db, "bob", None, None);
        let err = db
            .insert_message(&Uuid::new_v4().to_string(), &alice, &bob, "")
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyContent));
    }

    #[test]
    fn message_persisted_faithfully() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let bob = add_user(&db, "bob", None, None);

        let id = Uuid::new_v4().to_string();
        db.insert_message(&id, &alice, &bob, "hi").unwrap();

        let msg = db.get_message(&id).unwrap().unwrap();
        assert_eq!(msg.sender_id, alice);
        assert_eq!(msg.recipient_id, bob);
        assert_eq!(msg.content, "hi");

        let convo = db.conversation(&alice, &bob).unwrap();
        assert_eq!(convo.len(), 1);
        assert_eq!(convo[0].id, id);
    }

    #[test]
    fn hobby_add_is_idempotent() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let chess = hobby_id(&db, "Chess");

        db.add_user_hobby(&alice, &chess).unwrap();
        db.add_user_hobby(&alice, &chess).unwrap();

        let hobbies = db.hobbies_of_user(&alice).unwrap();
        assert_eq!(hobbies.len(), 1);
        assert_eq!(hobbies[0].name, "Chess");

        // Removing twice is equally silent
        db.remove_user_hobby(&alice, &chess).unwrap();
        db.remove_user_hobby(&alice, &chess).unwrap();
        assert!(db.hobbies_of_user(&alice).unwrap().is_empty());
    }

    #[test]
    fn users_with_hobby_lists_members() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let _bob = add_user(&db, "bob", None, None);
        let hiking = hobby_id(&db, "Hiking");

        db.add_user_hobby(&alice, &hiking).unwrap();

        let users = db.users_with_hobby(&hiking).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
    }

    #[test]
    fn gender_filter_restricts_rows() {
        let db = test_db();
        add_user(&db, "alice", Some("Female"), Some("1999-04-02"));
        add_user(&db, "bob", Some("Male"), None);
        add_user(&db, "carol", Some("Female"), None);

        let women = db.list_users_by_gender(Some("Female")).unwrap();
        assert_eq!(women.len(), 2);
        assert!(women.iter().all(|u| u.gender.as_deref() == Some("Female")));

        let all = db.list_users_by_gender(None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn batch_hobby_fetch_covers_all_users() {
        let db = test_db();
        let alice = add_user(&db, "alice", None, None);
        let bob = add_user(&db, "bob", None, None);
        let chess = hobby_id(&db, "Chess");
        let hiking = hobby_id(&db, "Hiking");

        db.add_user_hobby(&alice, &chess).unwrap();
        db.add_user_hobby(&alice, &hiking).unwrap();
        db.add_user_hobby(&bob, &chess).unwrap();

        let pairs = db
            .hobby_ids_for_users(&[alice.clone(), bob.clone()])
            .unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.iter().filter(|(u, _)| *u == alice).count(), 2);
        assert_eq!(pairs.iter().filter(|(u, _)| *u == bob).count(), 1);

        assert!(db.hobby_ids_for_users(&[]).unwrap().is_empty());
    }

    #[test]
    fn update_details_changes_profile() {
        let db = test_db();
        add_user(&db, "alice", None, None);

        db.update_user_details("alice", "Alicia", "Jones", "alicia@example.com")
            .unwrap();
        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.first_name, "Alicia");
        assert_eq!(user.last_name, "Jones");
        assert_eq!(user.email, "alicia@example.com");

        let err = db
            .update_user_details("nobody", "X", "Y", "x@example.com")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
