use serde::Deserialize;
use tracing::{debug, info};

use super::{ActContext, QuestExpAct, QuestItemAct};
use crate::character::{CharacterState, QuestState};
use crate::lock::Locked;
use crate::packet::{OutPacket, PacketSink};

/// Closed set of quest acts sharing the two-phase contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "act", rename_all = "snake_case")]
pub enum QuestAct {
    Item(QuestItemAct),
    Exp(QuestExpAct),
}

impl QuestAct {
    pub fn can_act(
        &self,
        character: &CharacterState,
        ctx: &ActContext<'_>,
        choice: Option<usize>,
    ) -> bool {
        match self {
            QuestAct::Item(act) => act.can_act(character, ctx, choice),
            QuestAct::Exp(act) => act.can_act(character, ctx),
        }
    }

    pub fn do_act(
        &self,
        character: &mut CharacterState,
        ctx: &mut ActContext<'_>,
        choice: Option<usize>,
    ) -> bool {
        match self {
            QuestAct::Item(act) => act.do_act(character, ctx, choice),
            QuestAct::Exp(act) => act.do_act(character, ctx),
        }
    }
}

/// A quest and the acts run when it starts and completes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestInfo {
    pub quest_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "start")]
    pub start_acts: Vec<QuestAct>,
    #[serde(default, rename = "complete")]
    pub complete_acts: Vec<QuestAct>,
}

impl QuestInfo {
    pub fn new(quest_id: u32, name: impl Into<String>) -> Self {
        Self {
            quest_id,
            name: name.into(),
            start_acts: Vec::new(),
            complete_acts: Vec::new(),
        }
    }

    pub fn with_start_act(mut self, act: QuestAct) -> Self {
        self.start_acts.push(act);
        self
    }

    pub fn with_complete_act(mut self, act: QuestAct) -> Self {
        self.complete_acts.push(act);
        self
    }

    /// Start the quest if it has no record yet and every start act is feasible.
    pub fn start(&self, locked: &mut Locked<CharacterState>, ctx: &mut ActContext<'_>) -> bool {
        if locked.quests.state(self.quest_id) != QuestState::None {
            debug!(quest_id = self.quest_id, "Quest already started");
            return false;
        }
        if !run_acts(&self.start_acts, locked, ctx, None) {
            return false;
        }
        locked.quests.force_start(self.quest_id);
        ctx.sink.write(OutPacket::QuestResult {
            quest_id: self.quest_id,
            state: QuestState::Started,
        });
        info!(character_id = locked.id(), quest_id = self.quest_id, "Quest started");
        true
    }

    /// Complete a started quest, running every complete act.
    pub fn complete(
        &self,
        locked: &mut Locked<CharacterState>,
        ctx: &mut ActContext<'_>,
        choice: Option<usize>,
    ) -> bool {
        if locked.quests.state(self.quest_id) != QuestState::Started {
            debug!(quest_id = self.quest_id, "Quest not in progress");
            return false;
        }
        if !run_acts(&self.complete_acts, locked, ctx, choice) {
            return false;
        }
        locked.quests.force_complete(self.quest_id);
        ctx.sink.write(OutPacket::QuestResult {
            quest_id: self.quest_id,
            state: QuestState::Completed,
        });
        info!(character_id = locked.id(), quest_id = self.quest_id, "Quest completed");
        true
    }
}

/// Check and apply each act in turn on a staged copy of the character, so
/// every act sees the demand of the ones before it.
///
/// The copy replaces the live state and the buffered packets are forwarded
/// only when every act succeeded; otherwise nothing changes and nothing is
/// sent.
fn run_acts(
    acts: &[QuestAct],
    locked: &mut Locked<CharacterState>,
    ctx: &mut ActContext<'_>,
    choice: Option<usize>,
) -> bool {
    let mut staged = locked.get().clone();
    let (staged_sink, mut staged_rx) = PacketSink::channel();
    {
        let mut staged_ctx = ActContext::new(ctx.catalog, &staged_sink, &mut *ctx.rng);
        for act in acts {
            if !act.can_act(&staged, &staged_ctx, choice) {
                return false;
            }
            if !act.do_act(&mut staged, &mut staged_ctx, choice) {
                return false;
            }
        }
    }

    *locked.get_mut() = staged;
    while let Ok(packet) = staged_rx.try_recv() {
        ctx.sink.write(packet);
    }
    true
}
