//! The API a script body runs against.
//!
//! A [`ScriptManager`] owns the character's [`Locked`] handle for the whole
//! session, so every helper here mutates state that no other trigger can
//! touch until the script returns. Prompt primitives suspend the session
//! task until [`SessionTable::deliver`] resumes it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::time;
use tracing::{debug, warn};

use super::session::{ConnectionId, SessionState, SessionTable, WaitDescriptor};
use super::{ScriptError, ScriptMessageParam, ScriptResult};
use crate::character::{CharacterState, QuestState};
use crate::lock::Locked;
use crate::packet::{
    Effect, MenuOption, OutPacket, PacketSink, PromptKind, ScriptAnswer, ScriptMessageType,
    ScriptPrompt,
};
use crate::provider::{ItemCatalog, QuestProvider};
use crate::quest::ActContext;
use crate::KodamaError;

/// Everything a session needs besides the character handle.
pub(crate) struct SessionContext {
    pub connection_id: ConnectionId,
    pub session_id: u64,
    pub script_id: String,
    pub npc_id: Option<i32>,
    pub field_id: Option<i32>,
    pub sink: PacketSink,
    pub sessions: Arc<SessionTable>,
    pub items: Arc<dyn ItemCatalog>,
    pub quests: Arc<QuestProvider>,
    pub reply_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
struct SayPage {
    text: String,
    param: ScriptMessageParam,
    prev: bool,
    next: bool,
}

pub struct ScriptManager {
    ctx: SessionContext,
    locked: Locked<CharacterState>,
    rng: StdRng,
    speaker_id: i32,
    not_cancellable: bool,
    variables: HashMap<String, String>,
    /// Say pages of the current dialogue chain, for prev/next navigation.
    pages: Vec<SayPage>,
}

impl ScriptManager {
    pub(crate) fn new(ctx: SessionContext, locked: Locked<CharacterState>, rng: StdRng) -> Self {
        let speaker_id = ctx.npc_id.unwrap_or_default();
        Self {
            ctx,
            locked,
            rng,
            speaker_id,
            not_cancellable: false,
            variables: HashMap::new(),
            pages: Vec::new(),
        }
    }

    pub fn session_id(&self) -> u64 {
        self.ctx.session_id
    }

    pub fn script_id(&self) -> &str {
        &self.ctx.script_id
    }

    /// NPC that triggered the script, if any.
    pub fn npc_id(&self) -> Option<i32> {
        self.ctx.npc_id
    }

    pub fn field_id(&self) -> Option<i32> {
        self.ctx.field_id
    }

    pub fn character(&self) -> &CharacterState {
        &self.locked
    }

    pub fn character_mut(&mut self) -> &mut CharacterState {
        &mut self.locked
    }

    pub fn level(&self) -> u32 {
        self.locked.level()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn speaker_id(&self) -> i32 {
        self.speaker_id
    }

    /// Speaker shown on subsequent prompts.
    pub fn set_speaker_id(&mut self, speaker_id: i32) {
        self.speaker_id = speaker_id;
    }

    /// Hide the close button on subsequent prompts.
    pub fn set_not_cancellable(&mut self, not_cancellable: bool) {
        self.not_cancellable = not_cancellable;
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    // Prompts

    /// Send a prompt and suspend until the client answers it.
    async fn prompt(
        &mut self,
        prompt: PromptKind,
        param: ScriptMessageParam,
    ) -> ScriptResult<ScriptAnswer> {
        let connection_id = self.ctx.connection_id;
        let session_id = self.ctx.session_id;
        let rx = self
            .ctx
            .sessions
            .begin_wait(connection_id, session_id, prompt.message_type())
            .await?;

        let mut param = param;
        if self.not_cancellable {
            param |= ScriptMessageParam::NOT_CANCELLABLE;
        }
        self.ctx.sink.write(OutPacket::ScriptMessage(ScriptPrompt {
            session_id,
            speaker_id: self.speaker_id,
            param: param.bits(),
            prompt,
        }));

        let received = match self.ctx.reply_timeout {
            Some(limit) => match time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.ctx.sessions.abandon_wait(connection_id, session_id).await;
                    warn!(session_id, timeout_secs = limit.as_secs(), "No reply before timeout");
                    return Err(ScriptError::ReplyTimeout);
                }
            },
            None => rx.await,
        };

        let answer = received.map_err(|_| ScriptError::Cancelled)?;
        if answer.is_end_chat() {
            debug!(session_id, "Client ended the dialogue");
            return Err(ScriptError::Cancelled);
        }
        Ok(answer)
    }

    fn unexpected(expected: ScriptMessageType, answer: &ScriptAnswer) -> ScriptError {
        ScriptError::UnexpectedReply {
            expected,
            received: answer.kind(),
        }
    }

    async fn say(
        &mut self,
        text: &str,
        param: ScriptMessageParam,
        prev: bool,
        next: bool,
    ) -> ScriptResult<()> {
        self.pages.push(SayPage {
            text: text.to_string(),
            param,
            prev,
            next,
        });
        let mut cursor = self.pages.len() - 1;
        loop {
            let page = self.pages[cursor].clone();
            let prompt = PromptKind::Say {
                text: page.text,
                prev: page.prev,
                next: page.next,
            };
            match self.prompt(prompt, page.param).await? {
                ScriptAnswer::Ack { action: 0 } => cursor = cursor.saturating_sub(1),
                ScriptAnswer::Ack { .. } => {
                    if cursor + 1 >= self.pages.len() {
                        break;
                    }
                    cursor += 1;
                }
                other => return Err(Self::unexpected(ScriptMessageType::Say, &other)),
            }
        }
        if !next {
            self.pages.clear();
        }
        Ok(())
    }

    /// Single page with an OK button; ends the current page chain.
    pub async fn say_ok(&mut self, text: &str) -> ScriptResult<()> {
        self.say(text, ScriptMessageParam::empty(), false, false).await
    }

    pub async fn say_ok_with(&mut self, text: &str, param: ScriptMessageParam) -> ScriptResult<()> {
        self.say(text, param, false, false).await
    }

    /// First page of a chain, with a next button.
    pub async fn say_next(&mut self, text: &str) -> ScriptResult<()> {
        self.say(text, ScriptMessageParam::empty(), false, true).await
    }

    pub async fn say_next_with(&mut self, text: &str, param: ScriptMessageParam) -> ScriptResult<()> {
        self.say(text, param, false, true).await
    }

    /// Last page of a chain, with a prev button.
    pub async fn say_prev(&mut self, text: &str) -> ScriptResult<()> {
        self.say(text, ScriptMessageParam::empty(), true, false).await
    }

    /// Middle page of a chain, with prev and next buttons.
    pub async fn say_both(&mut self, text: &str) -> ScriptResult<()> {
        self.say(text, ScriptMessageParam::empty(), true, true).await
    }

    pub async fn say_both_with(&mut self, text: &str, param: ScriptMessageParam) -> ScriptResult<()> {
        self.say(text, param, true, true).await
    }

    pub async fn ask_yes_no(&mut self, text: &str) -> ScriptResult<bool> {
        self.ask_yes_no_with(text, ScriptMessageParam::empty()).await
    }

    pub async fn ask_yes_no_with(
        &mut self,
        text: &str,
        param: ScriptMessageParam,
    ) -> ScriptResult<bool> {
        self.pages.clear();
        let prompt = PromptKind::AskYesNo {
            text: text.to_string(),
        };
        match self.prompt(prompt, param).await? {
            ScriptAnswer::YesNo { value } => Ok(value),
            other => Err(Self::unexpected(ScriptMessageType::AskYesNo, &other)),
        }
    }

    pub async fn ask_accept(&mut self, text: &str) -> ScriptResult<bool> {
        self.ask_accept_with(text, ScriptMessageParam::empty()).await
    }

    pub async fn ask_accept_with(
        &mut self,
        text: &str,
        param: ScriptMessageParam,
    ) -> ScriptResult<bool> {
        self.pages.clear();
        let prompt = PromptKind::AskAccept {
            text: text.to_string(),
        };
        match self.prompt(prompt, param).await? {
            ScriptAnswer::YesNo { value } => Ok(value),
            other => Err(Self::unexpected(ScriptMessageType::AskAccept, &other)),
        }
    }

    /// Offer `options` and return the index of the chosen one.
    pub async fn ask_menu<S: AsRef<str>>(&mut self, text: &str, options: &[S]) -> ScriptResult<usize> {
        self.pages.clear();
        let prompt = PromptKind::AskMenu {
            text: text.to_string(),
            options: options
                .iter()
                .enumerate()
                .map(|(index, label)| MenuOption {
                    index: index as i32,
                    label: label.as_ref().to_string(),
                })
                .collect(),
        };
        match self.prompt(prompt, ScriptMessageParam::empty()).await? {
            ScriptAnswer::Selection { index } => usize::try_from(index)
                .ok()
                .filter(|i| *i < options.len())
                .ok_or(ScriptError::InvalidMenuOption(index)),
            other => Err(Self::unexpected(ScriptMessageType::AskMenu, &other)),
        }
    }

    pub async fn ask_number(
        &mut self,
        text: &str,
        default: i32,
        min: i32,
        max: i32,
    ) -> ScriptResult<i32> {
        self.pages.clear();
        let prompt = PromptKind::AskNumber {
            text: text.to_string(),
            default,
            min,
            max,
        };
        match self.prompt(prompt, ScriptMessageParam::empty()).await? {
            ScriptAnswer::Number { value } if (min..=max).contains(&value) => Ok(value),
            ScriptAnswer::Number { value } => Err(ScriptError::NumberOutOfRange { value, min, max }),
            other => Err(Self::unexpected(ScriptMessageType::AskNumber, &other)),
        }
    }

    pub async fn ask_text(
        &mut self,
        text: &str,
        default: &str,
        min_len: u16,
        max_len: u16,
    ) -> ScriptResult<String> {
        self.pages.clear();
        let prompt = PromptKind::AskText {
            text: text.to_string(),
            default: default.to_string(),
            min_len,
            max_len,
        };
        match self.prompt(prompt, ScriptMessageParam::empty()).await? {
            ScriptAnswer::Text { value } => Ok(value),
            other => Err(Self::unexpected(ScriptMessageType::AskText, &other)),
        }
    }

    /// Suspend the session for `duration` without waiting on the client.
    pub async fn delay(&mut self, duration: Duration) -> ScriptResult<()> {
        let connection_id = self.ctx.connection_id;
        let session_id = self.ctx.session_id;
        let sessions = &self.ctx.sessions;
        if !sessions
            .transition(connection_id, session_id, SessionState::Waiting(WaitDescriptor::Delay))
            .await
        {
            return Err(ScriptError::Cancelled);
        }
        time::sleep(duration).await;
        if !sessions
            .transition(connection_id, session_id, SessionState::Running)
            .await
        {
            return Err(ScriptError::Cancelled);
        }
        Ok(())
    }

    // Quests

    pub fn has_quest_started(&self, quest_id: u32) -> bool {
        self.locked.quests.has_started(quest_id)
    }

    pub fn has_quest_completed(&self, quest_id: u32) -> bool {
        self.locked.quests.has_completed(quest_id)
    }

    /// Mark a quest started without running its start acts.
    pub fn force_start_quest(&mut self, quest_id: u32) {
        self.locked.quests.force_start(quest_id);
        self.ctx.sink.write(OutPacket::QuestResult {
            quest_id,
            state: QuestState::Started,
        });
    }

    /// Mark a quest completed without running its complete acts.
    pub fn force_complete_quest(&mut self, quest_id: u32) {
        self.locked.quests.force_complete(quest_id);
        self.ctx.sink.write(OutPacket::QuestResult {
            quest_id,
            state: QuestState::Completed,
        });
    }

    /// Start a quest through its start acts. Returns false if infeasible.
    pub fn start_quest(&mut self, quest_id: u32) -> ScriptResult<bool> {
        let quest = self
            .ctx
            .quests
            .get(quest_id)
            .ok_or_else(|| KodamaError::NotFound(format!("quest {quest_id}")))?;
        let mut act_ctx = ActContext::new(&*self.ctx.items, &self.ctx.sink, &mut self.rng);
        Ok(quest.start(&mut self.locked, &mut act_ctx))
    }

    /// Complete a quest through its complete acts. Returns false if any act
    /// is infeasible, in which case nothing changed.
    pub fn complete_quest(&mut self, quest_id: u32, choice: Option<usize>) -> ScriptResult<bool> {
        let quest = self
            .ctx
            .quests
            .get(quest_id)
            .ok_or_else(|| KodamaError::NotFound(format!("quest {quest_id}")))?;
        let mut act_ctx = ActContext::new(&*self.ctx.items, &self.ctx.sink, &mut self.rng);
        Ok(quest.complete(&mut self.locked, &mut act_ctx, choice))
    }

    /// Quest record value, empty if unset.
    pub fn qr_value(&self, quest_id: impl Into<u32>) -> String {
        self.locked
            .quests
            .value(quest_id.into())
            .unwrap_or_default()
            .to_string()
    }

    pub fn has_qr_value(&self, quest_id: impl Into<u32>, value: &str) -> bool {
        self.locked.quests.has_value(quest_id.into(), value)
    }

    pub fn set_qr_value(&mut self, quest_id: impl Into<u32>, value: &str) {
        let quest_id = quest_id.into();
        self.locked.quests.set_value(quest_id, value);
        self.ctx.sink.write(OutPacket::QuestRecordMessage {
            quest_id,
            value: value.to_string(),
        });
    }

    // Inventory

    pub fn has_item(&self, item_id: i32) -> bool {
        self.locked.inventory.has_item(item_id, 1)
    }

    pub fn has_item_count(&self, item_id: i32, quantity: i32) -> bool {
        self.locked.inventory.has_item(item_id, quantity)
    }

    pub fn item_count(&self, item_id: i32) -> i32 {
        self.locked.inventory.item_count(item_id)
    }

    pub fn can_add_item(&self, item_id: i32, quantity: i32) -> bool {
        match self.ctx.items.item_info(item_id) {
            Some(info) => self
                .locked
                .inventory
                .can_add_item(item_id, quantity, info.slot_max),
            None => false,
        }
    }

    /// Grant an item, notifying the client. Returns false if it does not fit
    /// or the item is unknown.
    pub fn add_item(&mut self, item_id: i32, quantity: i32) -> bool {
        let Some(info) = self.ctx.items.item_info(item_id) else {
            warn!(script_id = %self.ctx.script_id, item_id, "Script granted an unknown item");
            return false;
        };
        let inventory = &mut self.locked.inventory;
        let item = info.create_item(inventory.next_item_sn(), quantity);
        match inventory.add_item(item) {
            Ok(batch) => {
                self.ctx.sink.write(OutPacket::inventory_operation(batch));
                self.ctx.sink.write(OutPacket::gain_item(item_id, quantity));
                true
            }
            Err(e) => {
                debug!(item_id, quantity, error = %e, "Item not added");
                false
            }
        }
    }

    /// Take an item, notifying the client. Returns false if not enough is held.
    pub fn remove_item(&mut self, item_id: i32, quantity: i32) -> bool {
        match self.locked.inventory.remove_item(item_id, quantity) {
            Ok(batch) => {
                self.ctx.sink.write(OutPacket::inventory_operation(batch));
                self.ctx.sink.write(OutPacket::gain_item(item_id, -quantity));
                true
            }
            Err(e) => {
                debug!(item_id, quantity, error = %e, "Item not removed");
                false
            }
        }
    }

    /// Take every copy of an item.
    pub fn remove_all(&mut self, item_id: i32) -> bool {
        let count = self.item_count(item_id);
        count > 0 && self.remove_item(item_id, count)
    }

    // Stats and presentation

    pub fn add_exp(&mut self, exp: i64) {
        let total = self.locked.add_exp(exp);
        self.ctx.sink.write(OutPacket::StatChanged { exp: total });
        self.ctx.sink.write(OutPacket::Effect(Effect::GainExp { exp }));
    }

    /// System notice in the chat log.
    pub fn message(&mut self, text: &str) {
        self.ctx.sink.write(OutPacket::notice(text));
    }

    pub fn chat_message(&mut self, text: &str) {
        self.ctx.sink.write(OutPacket::ChatMessage {
            text: text.to_string(),
        });
    }

    pub fn script_progress_message(&mut self, text: &str) {
        self.ctx.sink.write(OutPacket::ScriptProgressMessage {
            text: text.to_string(),
        });
    }

    pub fn avatar_oriented(&mut self, path: &str) {
        self.ctx.sink.write(OutPacket::Effect(Effect::AvatarOriented {
            path: path.to_string(),
        }));
    }

    pub fn screen_effect(&mut self, path: &str) {
        self.ctx.sink.write(OutPacket::Effect(Effect::ScreenEffect {
            path: path.to_string(),
        }));
    }

    pub fn reserved_effect(&mut self, path: &str) {
        self.ctx.sink.write(OutPacket::Effect(Effect::ReservedEffect {
            path: path.to_string(),
        }));
    }

    /// Ask the field layer to move the character.
    pub fn warp(&mut self, field_id: i32, portal: Option<&str>) {
        self.ctx.sink.write(OutPacket::TransferField {
            field_id,
            portal: portal.map(str::to_string),
        });
    }
}
