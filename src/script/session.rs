//! Live script sessions and reply routing.
//!
//! Each connection owns at most one session. A suspended session parks a
//! oneshot sender here; [`SessionTable::deliver`] resolves it when the
//! matching reply arrives, and [`SessionTable::cancel`] drops it (and aborts
//! the session task) when the connection goes away.

use std::collections::HashMap;

use tokio::sync::{oneshot, RwLock};
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ScriptError, ScriptResult};
use crate::character::CharacterId;
use crate::packet::{ScriptAnswer, ScriptMessageType, ScriptReply};
use crate::{KodamaError, Result};

/// Identity of one client connection.
pub type ConnectionId = Uuid;

/// What a suspended session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitDescriptor {
    Reply(ScriptMessageType),
    Delay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, waiting for the character's handle.
    Idle,
    Running,
    Waiting(WaitDescriptor),
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Result of routing a client reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The waiting session was resumed with the reply.
    Resumed,
    /// The session is waiting for a different kind of reply; it keeps waiting.
    Rejected,
    /// No session is waiting for this reply.
    Stale,
}

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: u64,
    pub script_id: String,
    pub character_id: CharacterId,
    pub state: SessionState,
}

struct SessionEntry {
    info: SessionInfo,
    pending: Option<oneshot::Sender<ScriptAnswer>>,
    abort: Option<AbortHandle>,
}

/// Sessions keyed by owning connection.
pub struct SessionTable {
    sessions: RwLock<HashMap<ConnectionId, SessionEntry>>,
    max_sessions: usize,
}

impl SessionTable {
    /// `max_sessions` of 0 means unlimited.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Register a new `Idle` session for `connection_id`.
    pub async fn open(
        &self,
        connection_id: ConnectionId,
        session_id: u64,
        script_id: &str,
        character_id: CharacterId,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&connection_id) {
            return Err(KodamaError::SessionBusy(existing.info.session_id));
        }
        if self.max_sessions > 0 && sessions.len() >= self.max_sessions {
            return Err(KodamaError::SessionLimit(self.max_sessions));
        }
        sessions.insert(
            connection_id,
            SessionEntry {
                info: SessionInfo {
                    session_id,
                    script_id: script_id.to_string(),
                    character_id,
                    state: SessionState::Idle,
                },
                pending: None,
                abort: None,
            },
        );
        debug!(%connection_id, session_id, script_id, "Session opened");
        Ok(())
    }

    /// Attach the task running the session so cancellation can abort it.
    ///
    /// If the session already ended, the handle is dropped.
    pub async fn attach(&self, connection_id: ConnectionId, session_id: u64, abort: AbortHandle) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(&connection_id) {
            if entry.info.session_id == session_id {
                entry.abort = Some(abort);
            }
        }
    }

    /// Move a live session to `state`. Returns false if it no longer exists.
    pub async fn transition(
        &self,
        connection_id: ConnectionId,
        session_id: u64,
        state: SessionState,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&connection_id) {
            Some(entry) if entry.info.session_id == session_id => {
                debug!(session_id, from = ?entry.info.state, to = ?state, "Session transition");
                entry.info.state = state;
                true
            }
            _ => false,
        }
    }

    /// Park the session until a reply of `expected` type arrives.
    ///
    /// Fails with `Cancelled` if the session was removed in the meantime.
    pub async fn begin_wait(
        &self,
        connection_id: ConnectionId,
        session_id: u64,
        expected: ScriptMessageType,
    ) -> ScriptResult<oneshot::Receiver<ScriptAnswer>> {
        let mut sessions = self.sessions.write().await;
        let entry = match sessions.get_mut(&connection_id) {
            Some(entry) if entry.info.session_id == session_id => entry,
            _ => return Err(ScriptError::Cancelled),
        };
        debug_assert!(
            entry.pending.is_none(),
            "session {session_id} issued a second prompt while one is outstanding"
        );
        let (tx, rx) = oneshot::channel();
        entry.pending = Some(tx);
        entry.info.state = SessionState::Waiting(WaitDescriptor::Reply(expected));
        Ok(rx)
    }

    /// Drop an outstanding wait without resuming, e.g. after a reply timeout.
    pub async fn abandon_wait(&self, connection_id: ConnectionId, session_id: u64) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(&connection_id) {
            if entry.info.session_id == session_id {
                entry.pending = None;
                entry.info.state = SessionState::Running;
            }
        }
    }

    /// Route a client reply to the session waiting on `connection_id`.
    pub async fn deliver(&self, connection_id: ConnectionId, reply: ScriptReply) -> ReplyOutcome {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(&connection_id) else {
            debug!(%connection_id, session_id = reply.session_id, "Reply for unknown session");
            return ReplyOutcome::Stale;
        };
        if entry.info.session_id != reply.session_id {
            debug!(
                %connection_id,
                session_id = reply.session_id,
                current = entry.info.session_id,
                "Reply for a finished session"
            );
            return ReplyOutcome::Stale;
        }
        let SessionState::Waiting(WaitDescriptor::Reply(expected)) = entry.info.state else {
            debug!(session_id = reply.session_id, state = ?entry.info.state, "Reply while not waiting");
            return ReplyOutcome::Stale;
        };
        if !reply.answer.is_end_chat() && !reply.answer.answers(expected) {
            warn!(
                session_id = reply.session_id,
                ?expected,
                received = reply.answer.kind(),
                "Reply does not match the outstanding prompt"
            );
            return ReplyOutcome::Rejected;
        }
        let Some(tx) = entry.pending.take() else {
            return ReplyOutcome::Stale;
        };
        entry.info.state = SessionState::Running;
        match tx.send(reply.answer) {
            Ok(()) => ReplyOutcome::Resumed,
            Err(_) => ReplyOutcome::Stale,
        }
    }

    /// Remove a session that ran to an end on its own.
    pub async fn finish(&self, connection_id: ConnectionId, session_id: u64, state: SessionState) {
        let mut sessions = self.sessions.write().await;
        if matches!(sessions.get(&connection_id), Some(e) if e.info.session_id == session_id) {
            sessions.remove(&connection_id);
            debug!(%connection_id, session_id, ?state, "Session finished");
        }
    }

    /// Cancel and remove the connection's session, aborting its task.
    ///
    /// Dropping the task drops everything it holds, including the
    /// character's handle.
    pub async fn cancel(&self, connection_id: ConnectionId) -> Option<SessionInfo> {
        let entry = self.sessions.write().await.remove(&connection_id)?;
        if let Some(abort) = &entry.abort {
            abort.abort();
        }
        let mut info = entry.info;
        debug!(%connection_id, session_id = info.session_id, from = ?info.state, "Session cancelled");
        info.state = SessionState::Cancelled;
        Some(info)
    }

    pub async fn get(&self, connection_id: ConnectionId) -> Option<SessionInfo> {
        self.sessions
            .read()
            .await
            .get(&connection_id)
            .map(|entry| entry.info.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
