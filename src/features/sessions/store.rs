//! # Feature: Conversation Sessions
//!
//! Per-user conversation state. A user has at most one session, bound to a
//! single reply language. Switching language discards the old session and
//! starts an empty one. Access goes through a per-user async lock so one
//! user's requests are processed strictly one at a time, while different
//! users never wait on each other.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Idle eviction via `prune_idle`
//! - 1.1.0: History cap, oldest turns dropped in pairs
//! - 1.0.0: Initial release with DashMap-backed store and `SessionEvent`

use crate::core::ConversationTurn;
use crate::features::personas::Language;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use uuid::Uuid;

type Slot = Arc<Mutex<Option<Session>>>;

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub user_key: String,
    language: Language,
    pub created_at: DateTime<Utc>,
    history: Vec<ConversationTurn>,
    /// 0 disables the cap
    history_cap: usize,
    last_active: Instant,
}

impl Session {
    fn new(user_key: &str, language: Language, history_cap: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_key: user_key.to_string(),
            language,
            created_at: Utc::now(),
            history: Vec::new(),
            history_cap,
            last_active: Instant::now(),
        }
    }

    /// Turns in chronological order
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Fixed for the lifetime of the session
    pub fn language(&self) -> Language {
        self.language
    }

    /// Append a turn. Past the cap the oldest turns are dropped, two at a
    /// time so user/assistant exchanges stay paired.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
        self.last_active = Instant::now();

        if self.history_cap > 0 && self.history.len() > self.history_cap {
            let excess = self.history.len() - self.history_cap;
            let drop = (excess + excess % 2).min(self.history.len());
            self.history.drain(..drop);
        }
    }
}

/// Outcome of `SessionGuard::get_or_create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// First session for this user
    Created,
    /// Existing session reused unchanged
    Continue,
    /// Language changed; the previous session and its history were discarded
    Reset {
        previous: Language,
        discarded_turns: usize,
    },
}

/// Shared handle to all sessions. Cloning shares the same map.
#[derive(Clone)]
pub struct SessionStore {
    slots: Arc<DashMap<String, Slot>>,
    max_history_turns: usize,
}

impl SessionStore {
    pub fn new(max_history_turns: usize) -> Self {
        SessionStore {
            slots: Arc::new(DashMap::new()),
            max_history_turns,
        }
    }

    /// Lock the slot for `user_key`, waiting for any request already holding it.
    pub async fn acquire(&self, user_key: &str) -> SessionGuard {
        let slot = self.slots.entry(user_key.to_string()).or_default().clone();
        let guard = slot.lock_owned().await;
        SessionGuard {
            user_key: user_key.to_string(),
            slot: guard,
            max_history_turns: self.max_history_turns,
        }
    }

    /// Number of tracked users
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop sessions idle for at least `ttl`. Slots held or awaited by a
    /// request are kept. Returns the number of removed slots.
    pub fn prune_idle(&self, ttl: Duration) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            let keep = match slot.try_lock() {
                Ok(session) => (*session)
                    .as_ref()
                    .is_some_and(|s| s.last_active.elapsed() < ttl),
                Err(_) => true,
            };
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// Exclusive access to one user's session for the duration of a request
pub struct SessionGuard {
    user_key: String,
    slot: OwnedMutexGuard<Option<Session>>,
    max_history_turns: usize,
}

impl SessionGuard {
    pub fn session(&self) -> Option<&Session> {
        (*self.slot).as_ref()
    }

    /// Return the session for `language`, creating a fresh one if there is
    /// none or if the current session speaks a different language.
    pub fn get_or_create(&mut self, language: Language) -> (&mut Session, SessionEvent) {
        let event = match &*self.slot {
            None => SessionEvent::Created,
            Some(existing) if existing.language == language => SessionEvent::Continue,
            Some(existing) => SessionEvent::Reset {
                previous: existing.language,
                discarded_turns: existing.history.len(),
            },
        };

        if event != SessionEvent::Continue {
            *self.slot = Some(Session::new(&self.user_key, language, self.max_history_turns));
        }

        let session = self
            .slot
            .get_or_insert_with(|| Session::new(&self.user_key, language, self.max_history_turns));
        session.last_active = Instant::now();
        (session, event)
    }
}
