use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            first_name  TEXT NOT NULL DEFAULT '',
            last_name   TEXT NOT NULL DEFAULT '',
            gender      TEXT,
            dob         TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1,
            is_staff    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS hobbies (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            kind        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_hobbies (
            user_id     TEXT NOT NULL REFERENCES users(id),
            hobby_id    TEXT NOT NULL REFERENCES hobbies(id),
            PRIMARY KEY (user_id, hobby_id)
        );

        CREATE TABLE IF NOT EXISTS friends (
            user_id     TEXT NOT NULL REFERENCES users(id),
            friend_id   TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, friend_id)
        );

        -- UNIQUE on the ordered pair makes concurrent duplicate creates
        -- impossible: at most one outstanding request per (sender, recipient).
        CREATE TABLE IF NOT EXISTS pending_requests (
            id          TEXT PRIMARY KEY,
            sender_id   TEXT NOT NULL REFERENCES users(id),
            recipient_id TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (sender_id, recipient_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            recipient_id    TEXT NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages(sender_id, recipient_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_pending_recipient
            ON pending_requests(recipient_id);

        -- Seed the fixed hobby catalog
        INSERT OR IGNORE INTO hobbies (id, name, kind) VALUES
            ('00000000-0000-0000-0000-000000000001', 'Reading', 'Indoor'),
            ('00000000-0000-0000-0000-000000000002', 'Cooking', 'Indoor'),
            ('00000000-0000-0000-0000-000000000003', 'Board Games', 'Indoor'),
            ('00000000-0000-0000-0000-000000000004', 'Hiking', 'Outdoor'),
            ('00000000-0000-0000-0000-000000000005', 'Cycling', 'Outdoor'),
            ('00000000-0000-0000-0000-000000000006', 'Gardening', 'Outdoor'),
            ('00000000-0000-0000-0000-000000000007', 'Stamp Collecting', 'Collection'),
            ('00000000-0000-0000-0000-000000000008', 'Coin Collecting', 'Collection'),
            ('00000000-0000-0000-0000-000000000009', 'Chess', 'Competitive'),
            ('00000000-0000-0000-0000-000000000010', 'Football', 'Competitive');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
