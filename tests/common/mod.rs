//! Shared fixtures for integration tests.
//!
//! Provides a ready-made engine with one character and the bundled item and
//! quest data, plus helpers for driving a session by hand.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use uuid::Uuid;

use kodama::config::ScriptConfig;
use kodama::packet::{ScriptAnswer, ScriptPrompt, ScriptReply};
use kodama::provider::{ItemCatalog, ItemProvider, QuestProvider};
use kodama::script::{ConnectionId, ReplyOutcome, SessionHandle};
use kodama::{
    CharacterId, CharacterRegistry, CharacterState, Gender, OutPacket, PacketSink, ScriptEngine,
    ScriptRegistry, ScriptTrigger,
};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Character every fixture starts with.
pub const CHARACTER_ID: CharacterId = 1;

pub const ITEMS: &str = include_str!("../../data/items.toml");
pub const QUESTS: &str = include_str!("../../data/quests.toml");

pub fn items() -> ItemProvider {
    ItemProvider::parse(ITEMS).unwrap()
}

pub fn quests() -> QuestProvider {
    QuestProvider::parse(QUESTS).unwrap()
}

pub fn character() -> CharacterState {
    CharacterState::new(CHARACTER_ID, "Mushroom", Gender::Female, 100, 30)
}

/// Give `character` `quantity` of `item_id` using the bundled templates.
pub fn give(character: &mut CharacterState, item_id: i32, quantity: i32) {
    let items = items();
    let info = items.item_info(item_id).expect("item missing from data/items.toml");
    let item = info.create_item(character.inventory.next_item_sn(), quantity);
    character.inventory.add_item(item).unwrap();
}

/// Script config with a fixed seed and the given reply timeout.
pub fn script_config(reply_timeout_secs: u64) -> ScriptConfig {
    ScriptConfig {
        reply_timeout_secs,
        max_sessions: 0,
        rng_seed: Some(0x2333),
    }
}

/// Engine over `scripts` with the given characters registered.
pub async fn engine_with(
    scripts: ScriptRegistry,
    config: ScriptConfig,
    characters: Vec<CharacterState>,
) -> Arc<ScriptEngine> {
    engine_with_quests(scripts, config, quests(), characters).await
}

/// Like [`engine_with`], with a custom quest catalog.
pub async fn engine_with_quests(
    scripts: ScriptRegistry,
    config: ScriptConfig,
    quests: QuestProvider,
    characters: Vec<CharacterState>,
) -> Arc<ScriptEngine> {
    let registry = Arc::new(CharacterRegistry::new());
    for character in characters {
        registry.insert(character.id(), character).await;
    }
    Arc::new(ScriptEngine::new(
        &config,
        scripts,
        registry,
        Arc::new(items()),
        Arc::new(quests),
    ))
}

/// Engine with one default character and the given scripts.
pub async fn engine(scripts: ScriptRegistry) -> Arc<ScriptEngine> {
    engine_with(scripts, script_config(0), vec![character()]).await
}

/// One simulated client connection.
pub struct TestClient {
    pub connection_id: ConnectionId,
    pub sink: PacketSink,
    pub rx: UnboundedReceiver<OutPacket>,
}

impl TestClient {
    pub fn new() -> Self {
        let (sink, rx) = PacketSink::channel();
        Self {
            connection_id: Uuid::new_v4(),
            sink,
            rx,
        }
    }

    /// Trigger `script_id` for the default character.
    pub async fn invoke(&self, engine: &ScriptEngine, script_id: &str) -> SessionHandle {
        self.invoke_as(engine, CHARACTER_ID, script_id).await
    }

    pub async fn invoke_as(
        &self,
        engine: &ScriptEngine,
        character_id: CharacterId,
        script_id: &str,
    ) -> SessionHandle {
        engine
            .invoke(
                self.connection_id,
                character_id,
                ScriptTrigger::new(script_id).with_npc(1300002),
                self.sink.clone(),
            )
            .await
            .unwrap()
    }

    /// Next packet, failing the test if none arrives in time.
    pub async fn recv(&mut self) -> OutPacket {
        timeout(DEFAULT_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for a packet")
            .expect("packet channel closed")
    }

    /// Skip packets until the next dialogue prompt.
    pub async fn next_prompt(&mut self) -> ScriptPrompt {
        loop {
            if let OutPacket::ScriptMessage(prompt) = self.recv().await {
                return prompt;
            }
        }
    }

    /// Every packet already queued, without waiting.
    pub fn drain(&mut self) -> Vec<OutPacket> {
        let mut packets = Vec::new();
        while let Ok(packet) = self.rx.try_recv() {
            packets.push(packet);
        }
        packets
    }

    pub async fn answer(
        &self,
        engine: &ScriptEngine,
        prompt: &ScriptPrompt,
        answer: ScriptAnswer,
    ) -> ReplyOutcome {
        engine
            .deliver_reply(
                self.connection_id,
                ScriptReply {
                    session_id: prompt.session_id,
                    answer,
                },
            )
            .await
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn next() -> ScriptAnswer {
    ScriptAnswer::Ack { action: 1 }
}

pub fn prev() -> ScriptAnswer {
    ScriptAnswer::Ack { action: 0 }
}

pub fn yes() -> ScriptAnswer {
    ScriptAnswer::YesNo { value: true }
}

/// Read a character's state, waiting for any session holding it.
pub async fn inspect<R>(
    engine: &ScriptEngine,
    character_id: CharacterId,
    f: impl FnOnce(&CharacterState) -> R,
) -> R {
    let locked = timeout(DEFAULT_TIMEOUT, engine.characters().acquire(&character_id))
        .await
        .expect("character handle was never released")
        .unwrap();
    f(&locked)
}
