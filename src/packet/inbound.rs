//! Client → server messages.

use serde::{Deserialize, Serialize};

use super::ScriptMessageType;
use crate::character::{CharacterId, Gender};

/// Decoded answer to a dialogue prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptAnswer {
    /// Answer to a say prompt: -1 end chat, 0 previous page, 1 next page.
    Ack { action: i8 },
    YesNo { value: bool },
    /// Menu selection; -1 means the dialogue was closed.
    Selection { index: i32 },
    Number { value: i32 },
    Text { value: String },
}

impl ScriptAnswer {
    /// Whether this answer is one the given prompt type can receive.
    pub fn answers(&self, message_type: ScriptMessageType) -> bool {
        matches!(
            (self, message_type),
            (ScriptAnswer::Ack { .. }, ScriptMessageType::Say)
                | (
                    ScriptAnswer::YesNo { .. },
                    ScriptMessageType::AskYesNo | ScriptMessageType::AskAccept
                )
                | (ScriptAnswer::Selection { .. }, ScriptMessageType::AskMenu)
                | (ScriptAnswer::Number { .. }, ScriptMessageType::AskNumber)
                | (ScriptAnswer::Text { .. }, ScriptMessageType::AskText)
        )
    }

    /// Whether the client closed the dialogue instead of answering.
    pub fn is_end_chat(&self) -> bool {
        matches!(
            self,
            ScriptAnswer::Ack { action: -1 } | ScriptAnswer::Selection { index: -1 }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScriptAnswer::Ack { .. } => "ack",
            ScriptAnswer::YesNo { .. } => "yes_no",
            ScriptAnswer::Selection { .. } => "selection",
            ScriptAnswer::Number { .. } => "number",
            ScriptAnswer::Text { .. } => "text",
        }
    }
}

/// An answer tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptReply {
    pub session_id: u64,
    pub answer: ScriptAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InPacket {
    /// Stand-in for character load; real login/migration lives elsewhere.
    Enter {
        character_id: CharacterId,
        name: String,
        gender: Gender,
        #[serde(default)]
        job: u16,
        #[serde(default = "default_level")]
        level: u32,
    },
    /// NPC talk, item use or portal touch naming a script.
    Trigger {
        script_id: String,
        #[serde(default)]
        npc_id: Option<i32>,
        #[serde(default)]
        field_id: Option<i32>,
    },
    ScriptAnswer(ScriptReply),
    QuestComplete {
        quest_id: u32,
        #[serde(default)]
        choice: Option<usize>,
    },
}

fn default_level() -> u32 {
    1
}
