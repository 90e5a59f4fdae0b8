//! Interactive NPC/portal/item scripts.
//!
//! A script is a native async procedure over a [`ScriptManager`]. Each
//! invocation runs as its own task holding the character's handle; prompt
//! primitives park the task until the client's reply is delivered, so a
//! player taking minutes to answer never ties up a worker.

pub mod content;
mod engine;
mod error;
mod manager;
mod param;
mod registry;
mod session;

pub use engine::{ScriptEngine, ScriptTrigger, SessionHandle};
pub use error::{ScriptError, ScriptResult};
pub use manager::ScriptManager;
pub use param::ScriptMessageParam;
pub use registry::{ScriptFn, ScriptRegistry};
pub use session::{
    ConnectionId, ReplyOutcome, SessionInfo, SessionState, SessionTable, WaitDescriptor,
};
