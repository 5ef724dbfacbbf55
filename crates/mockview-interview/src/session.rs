// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview sessions and the in-memory session store.
//!
//! A [`Session`] records the progress of one interview: the current question,
//! whether its follow-up was used, every submitted answer, and a log of each
//! turn. Sessions live in a [`SessionStore`] keyed by id; each sits behind its
//! own async mutex so turns for different sessions never contend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mockview_core::MockviewError;
use mockview_core::assessment::FollowUpStrategy;
use mockview_core::types::{InputType, InterviewStyle};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::memory::ConversationMemory;
use crate::recognizer::Transcription;

/// Shared handle to a single session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Where a session is in the interview flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewPhase {
    /// Waiting for an answer to the main question at this index.
    Answering(usize),
    /// The follow-up for the question at this index was asked.
    FollowingUp(usize),
    /// All questions covered or explicitly completed.
    Completed,
}

impl std::fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterviewPhase::Answering(_) => write!(f, "answering"),
            InterviewPhase::FollowingUp(_) => write!(f, "following_up"),
            InterviewPhase::Completed => write!(f, "completed"),
        }
    }
}

/// One submitted answer.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEntry {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    /// Follow-up asked in reply, if any.
    pub follow_up: Option<String>,
    pub input_type: InputType,
    pub timestamp: DateTime<Utc>,
}

/// Log record of one processed turn.
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub input_type: InputType,
    pub user_input: String,
    pub ai_response: String,
    pub latency_ms: u64,
    pub strategy: Option<FollowUpStrategy>,
    pub transcription: Option<Transcription>,
}

/// State of a single interview.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub style: InterviewStyle,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub question_index: usize,
    /// 0 or 1: whether the current question's follow-up was used.
    pub follow_up_count: u8,
    pub total_interactions: u32,
    pub completed: bool,
    pub responses: Vec<ResponseEntry>,
    pub interactions: Vec<Interaction>,
    pub follow_up_questions: Vec<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, style: InterviewStyle) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            style,
            created_at: now,
            last_activity: now,
            question_index: 0,
            follow_up_count: 0,
            total_interactions: 0,
            completed: false,
            responses: Vec::new(),
            interactions: Vec::new(),
            follow_up_questions: Vec::new(),
        }
    }

    pub fn phase(&self) -> InterviewPhase {
        if self.completed {
            InterviewPhase::Completed
        } else if self.follow_up_count > 0 {
            InterviewPhase::FollowingUp(self.question_index)
        } else {
            InterviewPhase::Answering(self.question_index)
        }
    }

    /// Whether the current question may still receive a follow-up.
    pub fn follow_up_available(&self) -> bool {
        self.follow_up_count == 0
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        (Utc::now() - self.last_activity).to_std().unwrap_or_default()
    }

    /// Elapsed interview time in minutes.
    pub fn duration_minutes(&self) -> f64 {
        let elapsed = (self.last_activity - self.created_at).num_milliseconds().max(0);
        elapsed as f64 / 60_000.0
    }

    /// The last `limit` interactions as `User:`/`AI:` lines.
    pub fn recent_context(&self, limit: usize) -> String {
        let start = self.interactions.len().saturating_sub(limit);
        self.interactions[start..]
            .iter()
            .map(|i| format!("User: {}\nAI: {}", i.user_input, i.ai_response))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Moves to the next question and resets the follow-up budget.
    pub fn advance(&mut self, total_questions: usize) {
        self.question_index += 1;
        self.follow_up_count = 0;
        if self.question_index >= total_questions {
            self.completed = true;
        }
    }
}

/// In-memory store of all live sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
    memory: Arc<ConversationMemory>,
}

impl SessionStore {
    pub fn new(memory: Arc<ConversationMemory>) -> Self {
        Self {
            sessions: DashMap::new(),
            memory,
        }
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    /// Returns the session for `id`, creating it first if needed.
    ///
    /// Without an id a fresh UUID is assigned. An existing session keeps
    /// its original style.
    pub fn create(&self, id: Option<&str>, style: InterviewStyle) -> (String, SessionHandle) {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let handle = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| {
                info!(session_id = %id, %style, "session created");
                Arc::new(Mutex::new(Session::new(id.clone(), style)))
            })
            .value()
            .clone();

        (id, handle)
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Whether `handle` is still the live session stored under `id`.
    pub fn is_live(&self, id: &str, handle: &SessionHandle) -> bool {
        self.sessions
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), handle))
    }

    /// Drops the session and its conversation memory.
    ///
    /// Fails with [`MockviewError::TurnInProgress`] while a turn holds the
    /// session. The lock is held across the removal, so a turn queued on
    /// the old handle finds it no longer live.
    pub fn reset(&self, id: &str) -> Result<(), MockviewError> {
        let handle = self
            .get(id)
            .ok_or_else(|| MockviewError::SessionNotFound(id.to_string()))?;
        let _guard = handle
            .try_lock()
            .map_err(|_| MockviewError::TurnInProgress(id.to_string()))?;

        self.sessions.remove_if(id, |_, live| Arc::ptr_eq(live, &handle));
        self.memory.clear(id);
        info!(session_id = id, "session reset");
        Ok(())
    }

    /// Marks the session as active now.
    pub async fn touch(&self, id: &str) {
        if let Some(handle) = self.get(id) {
            handle.lock().await.touch();
        }
    }

    /// Removes sessions idle for longer than `ttl`.
    ///
    /// Sessions with a turn in flight are skipped. Returns the number evicted.
    pub fn evict_expired(&self, ttl: Duration) -> usize {
        let candidates: Vec<(String, SessionHandle)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut evicted = 0;
        for (id, handle) in candidates {
            // Held across the removal, like `reset`.
            let Ok(session) = handle.try_lock() else {
                continue;
            };
            if session.idle_for() <= ttl {
                continue;
            }
            if self
                .sessions
                .remove_if(&id, |_, live| Arc::ptr_eq(live, &handle))
                .is_some()
            {
                self.memory.clear(&id);
                debug!(session_id = %id, "evicted idle session");
                evicted += 1;
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Spawns the periodic TTL sweep.
///
/// Returns `None` when `ttl` is zero (eviction disabled). The task exits when
/// `cancel` fires.
pub fn spawn_eviction_sweeper(
    store: Arc<SessionStore>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if ttl.is_zero() {
        info!("session eviction disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = store.evict_expired(ttl);
                    if evicted > 0 {
                        info!(evicted, remaining = store.len(), "evicted idle sessions");
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("session eviction sweeper stopped");
                    break;
                }
            }
        }
    }))
}
