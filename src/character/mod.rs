//! Mutable per-character state.
//!
//! A [`CharacterState`] is only ever mutated through a
//! [`Locked`](crate::lock::Locked) handle obtained from the character
//! registry.

mod inventory;
mod quest_record;

use serde::{Deserialize, Serialize};

pub use inventory::{
    Inventory, InventoryBatch, InventoryError, InventoryManager, InventoryOperation,
    InventoryType, Item, DEFAULT_SLOT_COUNT,
};
pub use quest_record::{QuestRecord, QuestRecordStore, QuestState};

/// Character identity used as the lock key.
pub type CharacterId = u32;

/// Logged-in characters, each behind its own lock.
pub type CharacterRegistry = crate::lock::LockRegistry<CharacterId, CharacterState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Wire/data encoding: 0 male, 1 female.
    pub fn as_index(self) -> u8 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
        }
    }
}

/// Job branch bit used by job-restricted rewards.
///
/// Branch is the hundreds digit of the job id within its thousand block
/// (0 beginner, 1 warrior, 2 magician, 3 bowman, 4 thief, 5 pirate).
pub fn job_branch_flag(job: u16) -> u32 {
    1 << ((job % 1000) / 100)
}

/// Everything about a logged-in character the script engine may touch.
#[derive(Debug, Clone)]
pub struct CharacterState {
    id: CharacterId,
    name: String,
    gender: Gender,
    job: u16,
    level: u32,
    exp: i64,
    pub inventory: InventoryManager,
    pub quests: QuestRecordStore,
}

impl CharacterState {
    pub fn new(id: CharacterId, name: impl Into<String>, gender: Gender, job: u16, level: u32) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            job,
            level,
            exp: 0,
            inventory: InventoryManager::new(),
            quests: QuestRecordStore::new(),
        }
    }

    /// Replace the inventory, e.g. with one of a different capacity.
    pub fn with_inventory(mut self, inventory: InventoryManager) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn job(&self) -> u16 {
        self.job
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn exp(&self) -> i64 {
        self.exp
    }

    /// Add experience, returning the new total. Negative amounts floor at 0.
    pub fn add_exp(&mut self, amount: i64) -> i64 {
        self.exp = (self.exp + amount).max(0);
        self.exp
    }
}
