//! Session-scoped script execution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::manager::SessionContext;
use super::registry::ScriptFn;
use super::session::{ConnectionId, ReplyOutcome, SessionInfo, SessionState, SessionTable};
use super::{ScriptManager, ScriptRegistry};
use crate::character::{CharacterId, CharacterRegistry};
use crate::config::ScriptConfig;
use crate::packet::{OutPacket, PacketSink, ScriptReply};
use crate::provider::{ItemCatalog, QuestProvider};
use crate::quest::ActContext;
use crate::{KodamaError, Result};

/// What started a script: NPC talk, item use or portal touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTrigger {
    pub script_id: String,
    pub npc_id: Option<i32>,
    pub field_id: Option<i32>,
}

impl ScriptTrigger {
    pub fn new(script_id: impl Into<String>) -> Self {
        Self {
            script_id: script_id.into(),
            npc_id: None,
            field_id: None,
        }
    }

    pub fn with_npc(mut self, npc_id: i32) -> Self {
        self.npc_id = Some(npc_id);
        self
    }

    pub fn with_field(mut self, field_id: i32) -> Self {
        self.field_id = Some(field_id);
        self
    }
}

/// A session started by [`ScriptEngine::invoke`].
///
/// Dropping it detaches the session; it keeps running until it ends or the
/// connection is closed.
#[derive(Debug)]
pub struct SessionHandle {
    session_id: u64,
    task: JoinHandle<SessionState>,
}

impl SessionHandle {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Wait for the session to end and return its final state.
    pub async fn finished(self) -> SessionState {
        self.task.await.unwrap_or(SessionState::Cancelled)
    }
}

/// Runs content scripts, one live session per connection.
pub struct ScriptEngine {
    scripts: ScriptRegistry,
    characters: Arc<CharacterRegistry>,
    items: Arc<dyn ItemCatalog>,
    quests: Arc<QuestProvider>,
    sessions: Arc<SessionTable>,
    next_session_id: AtomicU64,
    reply_timeout: Option<Duration>,
    rng_seed: Option<u64>,
}

impl ScriptEngine {
    pub fn new(
        config: &ScriptConfig,
        scripts: ScriptRegistry,
        characters: Arc<CharacterRegistry>,
        items: Arc<dyn ItemCatalog>,
        quests: Arc<QuestProvider>,
    ) -> Self {
        Self {
            scripts,
            characters,
            items,
            quests,
            sessions: Arc::new(SessionTable::new(config.max_sessions)),
            next_session_id: AtomicU64::new(1),
            reply_timeout: config.reply_timeout(),
            rng_seed: config.rng_seed,
        }
    }

    pub fn characters(&self) -> &Arc<CharacterRegistry> {
        &self.characters
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Snapshot of the connection's live session.
    pub async fn session(&self, connection_id: ConnectionId) -> Option<SessionInfo> {
        self.sessions.get(connection_id).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    fn rng_for(&self, salt: u64) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ salt),
            None => StdRng::from_os_rng(),
        }
    }

    /// Start `trigger`'s script for `character_id` on its own task.
    ///
    /// The session waits for the character's handle before the script body
    /// runs, so triggers against the same character run one after another.
    pub async fn invoke(
        &self,
        connection_id: ConnectionId,
        character_id: CharacterId,
        trigger: ScriptTrigger,
        sink: PacketSink,
    ) -> Result<SessionHandle> {
        let script = self
            .scripts
            .get(&trigger.script_id)
            .ok_or_else(|| KodamaError::UnknownScript(trigger.script_id.clone()))?;
        if !self.characters.contains(&character_id).await {
            return Err(KodamaError::NotFound(format!("character {character_id}")));
        }

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.sessions
            .open(connection_id, session_id, &trigger.script_id, character_id)
            .await?;

        let ctx = SessionContext {
            connection_id,
            session_id,
            script_id: trigger.script_id.clone(),
            npc_id: trigger.npc_id,
            field_id: trigger.field_id,
            sink,
            sessions: Arc::clone(&self.sessions),
            items: Arc::clone(&self.items),
            quests: Arc::clone(&self.quests),
            reply_timeout: self.reply_timeout,
        };
        let rng = self.rng_for(session_id);
        let task = tokio::spawn(run_session(
            script,
            Arc::clone(&self.characters),
            character_id,
            ctx,
            rng,
        ));
        self.sessions
            .attach(connection_id, session_id, task.abort_handle())
            .await;

        info!(
            %connection_id,
            session_id,
            character_id,
            script_id = %trigger.script_id,
            "Script session started"
        );
        Ok(SessionHandle { session_id, task })
    }

    /// Resume the connection's waiting session with a client reply.
    ///
    /// Replies nobody waits for are dropped and reported as `Stale`.
    pub async fn deliver_reply(
        &self,
        connection_id: ConnectionId,
        reply: ScriptReply,
    ) -> ReplyOutcome {
        self.sessions.deliver(connection_id, reply).await
    }

    /// Invalidate the connection's session, e.g. when the player leaves the
    /// field that owns the NPC. Returns false if there was none.
    pub async fn cancel_session(&self, connection_id: ConnectionId) -> bool {
        match self.sessions.cancel(connection_id).await {
            Some(info) => {
                info!(
                    %connection_id,
                    session_id = info.session_id,
                    script_id = %info.script_id,
                    "Script session cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Tear down everything owned by a closing connection.
    pub async fn close_connection(&self, connection_id: ConnectionId) {
        if !self.cancel_session(connection_id).await {
            debug!(%connection_id, "Connection closed with no live session");
        }
    }

    /// Complete a quest outside any script, under the character's handle.
    pub async fn complete_quest(
        &self,
        character_id: CharacterId,
        quest_id: u32,
        choice: Option<usize>,
        sink: &PacketSink,
    ) -> Result<bool> {
        let quest = self
            .quests
            .get(quest_id)
            .ok_or_else(|| KodamaError::NotFound(format!("quest {quest_id}")))?;
        let mut locked = self.characters.acquire(&character_id).await?;
        let mut rng = self.rng_for((u64::from(quest_id) << 32) | u64::from(character_id));
        let mut ctx = ActContext::new(&*self.items, sink, &mut rng);
        Ok(quest.complete(&mut locked, &mut ctx, choice))
    }
}

async fn run_session(
    script: ScriptFn,
    characters: Arc<CharacterRegistry>,
    character_id: CharacterId,
    ctx: SessionContext,
    rng: StdRng,
) -> SessionState {
    let connection_id = ctx.connection_id;
    let session_id = ctx.session_id;
    let script_id = ctx.script_id.clone();
    let sessions = Arc::clone(&ctx.sessions);

    let locked = match characters.acquire(&character_id).await {
        Ok(locked) => locked,
        Err(e) => {
            warn!(session_id, character_id, error = %e, "Session could not acquire its character");
            ctx.sink
                .write(OutPacket::notice("Please try again in a moment."));
            sessions
                .finish(connection_id, session_id, SessionState::Cancelled)
                .await;
            return SessionState::Cancelled;
        }
    };
    if !sessions
        .transition(connection_id, session_id, SessionState::Running)
        .await
    {
        return SessionState::Cancelled;
    }

    let mut manager = ScriptManager::new(ctx, locked, rng);
    let result = script(&mut manager).await;
    drop(manager);

    let state = match result {
        Ok(()) => SessionState::Completed,
        Err(e) if e.is_cancellation() => {
            debug!(session_id, script_id = %script_id, reason = %e, "Script ended early");
            SessionState::Cancelled
        }
        Err(e) => {
            warn!(session_id, script_id = %script_id, error = %e, "Script failed");
            SessionState::Cancelled
        }
    };
    sessions.finish(connection_id, session_id, state).await;
    debug!(session_id, script_id = %script_id, ?state, "Script session ended");
    state
}
