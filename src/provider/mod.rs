//! Read-only game data loaded once at startup and shared by every session.

mod item;
mod quest;

pub use item::{ItemCatalog, ItemInfo, ItemProvider};
pub use quest::QuestProvider;
