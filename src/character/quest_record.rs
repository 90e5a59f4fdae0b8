//! Per-character quest progress records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of one quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    #[default]
    None,
    Started,
    Completed,
}

/// Stored record for one quest id.
///
/// `value` is free-form progress data; special quest ids (see
/// [`QuestRecordType`](crate::quest::QuestRecordType)) use it as a flag store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub quest_id: u32,
    pub state: QuestState,
    pub value: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestRecord {
    fn new(quest_id: u32) -> Self {
        Self {
            quest_id,
            state: QuestState::None,
            value: String::new(),
            completed_at: None,
        }
    }
}

/// Quest id → record table for one character.
#[derive(Debug, Clone, Default)]
pub struct QuestRecordStore {
    records: HashMap<u32, QuestRecord>,
}

impl QuestRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quest_id: u32) -> Option<&QuestRecord> {
        self.records.get(&quest_id)
    }

    pub fn state(&self, quest_id: u32) -> QuestState {
        self.get(quest_id).map(|r| r.state).unwrap_or_default()
    }

    pub fn has_started(&self, quest_id: u32) -> bool {
        self.state(quest_id) == QuestState::Started
    }

    pub fn has_completed(&self, quest_id: u32) -> bool {
        self.state(quest_id) == QuestState::Completed
    }

    fn entry(&mut self, quest_id: u32) -> &mut QuestRecord {
        self.records
            .entry(quest_id)
            .or_insert_with(|| QuestRecord::new(quest_id))
    }

    /// Mark the quest started regardless of its current state.
    pub fn force_start(&mut self, quest_id: u32) -> &QuestRecord {
        let record = self.entry(quest_id);
        record.state = QuestState::Started;
        record.completed_at = None;
        record
    }

    /// Mark the quest completed regardless of its current state.
    pub fn force_complete(&mut self, quest_id: u32) -> &QuestRecord {
        let record = self.entry(quest_id);
        record.state = QuestState::Completed;
        record.completed_at = Some(Utc::now());
        record
    }

    /// Progress value, if a record exists.
    pub fn value(&self, quest_id: u32) -> Option<&str> {
        self.get(quest_id).map(|r| r.value.as_str())
    }

    /// Set the progress value. A missing record is created in the started
    /// state, which is how flag-only records come into existence.
    pub fn set_value(&mut self, quest_id: u32, value: impl Into<String>) -> &QuestRecord {
        let record = self.entry(quest_id);
        if record.state == QuestState::None {
            record.state = QuestState::Started;
        }
        record.value = value.into();
        record
    }

    pub fn has_value(&self, quest_id: u32, value: &str) -> bool {
        self.value(quest_id) == Some(value)
    }

    /// Drop a record entirely (quest forfeited).
    pub fn remove(&mut self, quest_id: u32) -> Option<QuestRecord> {
        self.records.remove(&quest_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
