//! SQLite conversation history
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.0: chat_messages table backing the HTTP surface's history

use crate::core::{ConversationTurn, Role};
use crate::features::chat::HistoryStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use sqlite::{Connection, State};
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        sender TEXT NOT NULL,
        text TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_chat_messages_user ON chat_messages (user_id, timestamp);
";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        let connection = sqlite::open(database_path)
            .with_context(|| format!("failed to open database at {database_path}"))?;
        connection
            .execute(SCHEMA)
            .context("failed to initialize chat_messages schema")?;
        info!("💾 Database ready at {database_path}");

        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn insert_all(conn: &Connection, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let mut statement = conn.prepare(
            "INSERT INTO chat_messages (user_id, sender, text, timestamp) VALUES (?, ?, ?, ?)",
        )?;
        for turn in turns {
            let timestamp = turn.timestamp.unwrap_or_else(Utc::now).to_rfc3339();
            statement.bind((1, user_id))?;
            statement.bind((2, turn.role.as_str()))?;
            statement.bind((3, turn.text.as_str()))?;
            statement.bind((4, timestamp.as_str()))?;
            statement.next()?;
            statement.reset()?;
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for Database {
    async fn fetch_history(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT sender, text, timestamp FROM chat_messages
             WHERE user_id = ?
             ORDER BY timestamp ASC, id ASC",
        )?;
        statement.bind((1, user_id))?;

        let mut turns = Vec::new();
        while let State::Row = statement.next()? {
            let sender = statement.read::<String, _>("sender")?;
            let Some(role) = Role::parse(&sender) else {
                warn!("Skipping stored message with unknown sender '{sender}' for user {user_id}");
                continue;
            };
            let timestamp = statement
                .read::<String, _>("timestamp")
                .ok()
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|ts| ts.with_timezone(&Utc));

            turns.push(ConversationTurn {
                role,
                text: statement.read::<String, _>("text")?,
                timestamp,
            });
        }

        debug!("📚 Loaded {} stored message(s) for user {user_id}", turns.len());
        Ok(turns)
    }

    async fn save_turns(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let conn = self.connection.lock().await;
        conn.execute("BEGIN TRANSACTION")?;
        // A failed COMMIT can leave the transaction open on the shared connection
        let result = Self::insert_all(&conn, user_id, turns)
            .and_then(|()| conn.execute("COMMIT").context("commit failed"));
        match result {
            Ok(()) => {
                debug!("💾 Stored {} message(s) for user {user_id}", turns.len());
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = conn.execute("ROLLBACK") {
                    warn!("Rollback failed after store error: {rollback}");
                }
                Err(e.context(format!("failed to store messages for user {user_id}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_db() -> Database {
        Database::new(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_history() {
        let db = memory_db().await;
        assert!(db.fetch_history("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_fetch_in_order() {
        let db = memory_db().await;
        let base = Utc::now();
        let mut turns = vec![
            ConversationTurn::user("how to learn python"),
            ConversationTurn::assistant("Start with the official tutorial."),
        ];
        turns[0].timestamp = Some(base);
        turns[1].timestamp = Some(base + Duration::seconds(1));
        db.save_turns("u1", &turns).await.unwrap();

        let mut later = vec![
            ConversationTurn::user("aur btao"),
            ConversationTurn::assistant("Kis baare mein?"),
        ];
        later[0].timestamp = Some(base + Duration::seconds(2));
        later[1].timestamp = Some(base + Duration::seconds(3));
        db.save_turns("u1", &later).await.unwrap();

        let history = db.fetch_history("u1").await.unwrap();
        let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "how to learn python",
                "Start with the official tutorial.",
                "aur btao",
                "Kis baare mein?"
            ]
        );
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert!(history.iter().all(|t| t.timestamp.is_some()));
    }

    #[tokio::test]
    async fn test_histories_are_per_user() {
        let db = memory_db().await;
        db.save_turns("u1", &[ConversationTurn::user("mine")]).await.unwrap();
        db.save_turns("u2", &[ConversationTurn::user("theirs")]).await.unwrap();

        let history = db.fetch_history("u2").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "theirs");
        assert_eq!(db.fetch_history("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_model_sender_is_assistant() {
        let db = memory_db().await;
        {
            let conn = db.connection.lock().await;
            conn.execute(
                "INSERT INTO chat_messages (user_id, sender, text, timestamp)
                 VALUES ('u1', 'model', 'old reply', '2024-01-01T00:00:00+00:00'),
                        ('u1', 'system', 'ignored', '2024-01-01T00:00:01+00:00')",
            )
            .unwrap();
        }

        let history = db.fetch_history("u1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_failed_insert_is_rolled_back() {
        let db = memory_db().await;
        {
            let conn = db.connection.lock().await;
            conn.execute(
                "CREATE TRIGGER reject_marked BEFORE INSERT ON chat_messages
                 WHEN NEW.text = 'rejected'
                 BEGIN SELECT RAISE(ABORT, 'rejected by trigger'); END;",
            )
            .unwrap();
        }

        let result = db
            .save_turns(
                "u1",
                &[ConversationTurn::user("kept?"), ConversationTurn::assistant("rejected")],
            )
            .await;
        assert!(result.is_err());
        assert!(db.fetch_history("u1").await.unwrap().is_empty());

        // The connection is usable again for every user
        db.save_turns("u2", &[ConversationTurn::user("hello")]).await.unwrap();
        assert_eq!(db.fetch_history("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_does_not_leave_transaction_open() {
        let db = memory_db().await;
        {
            // A deferred foreign key violation only surfaces at COMMIT
            let conn = db.connection.lock().await;
            conn.execute(
                "PRAGMA foreign_keys = ON;
                 CREATE TABLE owners (id INTEGER PRIMARY KEY);
                 CREATE TABLE owned (
                     owner_id INTEGER REFERENCES owners(id) DEFERRABLE INITIALLY DEFERRED
                 );
                 CREATE TRIGGER orphan_marked AFTER INSERT ON chat_messages
                 WHEN NEW.text = 'orphan'
                 BEGIN INSERT INTO owned (owner_id) VALUES (999); END;",
            )
            .unwrap();
        }

        let result = db.save_turns("u1", &[ConversationTurn::user("orphan")]).await;
        assert!(result.is_err());
        assert!(db.fetch_history("u1").await.unwrap().is_empty());

        db.save_turns("u2", &[ConversationTurn::user("after")]).await.unwrap();
        let history = db.fetch_history("u2").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "after");
    }
}
