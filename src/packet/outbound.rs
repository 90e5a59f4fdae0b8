//! Server → client messages.

use serde::{Deserialize, Serialize};

use crate::character::{InventoryBatch, QuestState};

/// Kind of reply a prompt waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMessageType {
    Say,
    AskYesNo,
    AskAccept,
    AskMenu,
    AskNumber,
    AskText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub index: i32,
    pub label: String,
}

/// Body of a dialogue prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptKind {
    Say { text: String, prev: bool, next: bool },
    AskYesNo { text: String },
    AskAccept { text: String },
    AskMenu { text: String, options: Vec<MenuOption> },
    AskNumber { text: String, default: i32, min: i32, max: i32 },
    AskText { text: String, default: String, min_len: u16, max_len: u16 },
}

impl PromptKind {
    pub fn message_type(&self) -> ScriptMessageType {
        match self {
            PromptKind::Say { .. } => ScriptMessageType::Say,
            PromptKind::AskYesNo { .. } => ScriptMessageType::AskYesNo,
            PromptKind::AskAccept { .. } => ScriptMessageType::AskAccept,
            PromptKind::AskMenu { .. } => ScriptMessageType::AskMenu,
            PromptKind::AskNumber { .. } => ScriptMessageType::AskNumber,
            PromptKind::AskText { .. } => ScriptMessageType::AskText,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            PromptKind::Say { text, .. }
            | PromptKind::AskYesNo { text }
            | PromptKind::AskAccept { text }
            | PromptKind::AskMenu { text, .. }
            | PromptKind::AskNumber { text, .. }
            | PromptKind::AskText { text, .. } => text,
        }
    }
}

/// A dialogue prompt bound to one script session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPrompt {
    pub session_id: u64,
    pub speaker_id: i32,
    /// `ScriptMessageParam` bit flags.
    pub param: u8,
    pub prompt: PromptKind,
}

/// Cosmetic client-side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    GainItem { item_id: i32, quantity: i32 },
    GainExp { exp: i64 },
    AvatarOriented { path: String },
    ScreenEffect { path: String },
    ReservedEffect { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutPacket {
    ScriptMessage(ScriptPrompt),
    Notice {
        text: String,
    },
    ChatMessage {
        text: String,
    },
    InventoryOperation {
        exclusive: bool,
        operations: InventoryBatch,
    },
    Effect(Effect),
    QuestResult {
        quest_id: u32,
        state: QuestState,
    },
    QuestRecordMessage {
        quest_id: u32,
        value: String,
    },
    ScriptProgressMessage {
        text: String,
    },
    StatChanged {
        exp: i64,
    },
    /// Request for the field layer to move the character.
    TransferField {
        field_id: i32,
        portal: Option<String>,
    },
}

impl OutPacket {
    pub fn notice(text: impl Into<String>) -> Self {
        OutPacket::Notice { text: text.into() }
    }

    pub fn gain_item(item_id: i32, quantity: i32) -> Self {
        OutPacket::Effect(Effect::GainItem { item_id, quantity })
    }

    pub fn inventory_operation(operations: InventoryBatch) -> Self {
        OutPacket::InventoryOperation {
            exclusive: true,
            operations,
        }
    }
}
