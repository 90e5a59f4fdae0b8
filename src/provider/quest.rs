use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::quest::QuestInfo;
use crate::{KodamaError, Result};

#[derive(Debug, Deserialize)]
struct QuestFile {
    #[serde(default, rename = "quest")]
    quests: Vec<QuestInfo>,
}

/// Quest definitions keyed by quest id.
#[derive(Debug, Clone, Default)]
pub struct QuestProvider {
    quests: HashMap<u32, QuestInfo>,
}

impl QuestProvider {
    pub fn new<I: IntoIterator<Item = QuestInfo>>(quests: I) -> Self {
        Self {
            quests: quests.into_iter().map(|q| (q.quest_id, q)).collect(),
        }
    }

    /// Load `[[quest]]` tables from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let provider = Self::parse(&content)?;
        info!(
            "Loaded {} quests from {}",
            provider.len(),
            path.as_ref().display()
        );
        Ok(provider)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let file: QuestFile = toml::from_str(s)?;
        let mut quests = HashMap::with_capacity(file.quests.len());
        for quest in file.quests {
            let quest_id = quest.quest_id;
            if quests.insert(quest_id, quest).is_some() {
                return Err(KodamaError::Validation(format!(
                    "duplicate quest id {quest_id}"
                )));
            }
        }
        Ok(Self { quests })
    }

    pub fn get(&self, quest_id: u32) -> Option<&QuestInfo> {
        self.quests.get(&quest_id)
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}
