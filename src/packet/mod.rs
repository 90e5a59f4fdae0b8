//! Messages exchanged with the client.
//!
//! The byte layout of the real client protocol is outside this crate; packets
//! are plain serde types and the transport writes them as one JSON object per
//! line.

mod inbound;
mod outbound;
mod sink;

pub use inbound::{InPacket, ScriptAnswer, ScriptReply};
pub use outbound::{Effect, MenuOption, OutPacket, PromptKind, ScriptMessageType, ScriptPrompt};
pub use sink::PacketSink;
