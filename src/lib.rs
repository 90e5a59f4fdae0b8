//! kodama - session-scoped NPC/quest script engine for a multiplayer game
//! channel server.
//!
//! Scripts talk to the player through prompts that suspend until the client
//! answers, while holding the character's exclusive handle for the whole
//! conversation. Quest rewards are applied in two phases: a feasibility check
//! and an all-or-nothing application.

pub mod character;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod packet;
pub mod provider;
pub mod quest;
pub mod script;
pub mod server;

pub use character::{CharacterId, CharacterRegistry, CharacterState, Gender};
pub use config::{Config, DataConfig, LockConfig, LoggingConfig, ScriptConfig, ServerConfig};
pub use error::{KodamaError, Result};
pub use lock::{LockRegistry, Locked};
pub use packet::{InPacket, OutPacket, PacketSink};
pub use script::{ScriptEngine, ScriptManager, ScriptRegistry, ScriptTrigger};
pub use server::ChannelServer;
