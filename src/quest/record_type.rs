use std::fmt;

/// Quest ids reserved for per-character flags rather than real quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestRecordType {
    NautilusMomCow,
    MushroomCastleOpening,
    MushroomCastleInvestigation,
    MushroomCastleInvestigation2,
    MushroomCastleThornRemover,
    MushroomCastlePepe,
    UnityPortal,
    FreeMarket,
    TatamoLikeness,
    WorldTour,
    CygnusTutorial,
    AranTutorial,
    AranGuideEffect,
    AranHelperClear,
}

impl QuestRecordType {
    pub fn quest_id(self) -> u32 {
        match self {
            QuestRecordType::NautilusMomCow => 2180,
            QuestRecordType::MushroomCastleOpening => 2311,
            QuestRecordType::MushroomCastleInvestigation => 2314,
            QuestRecordType::MushroomCastleInvestigation2 => 2322,
            QuestRecordType::MushroomCastleThornRemover => 2324,
            QuestRecordType::MushroomCastlePepe => 2330,
            QuestRecordType::UnityPortal => 7050,
            QuestRecordType::FreeMarket => 7600,
            QuestRecordType::TatamoLikeness => 7810,
            QuestRecordType::WorldTour => 8792,
            QuestRecordType::CygnusTutorial => 20022,
            QuestRecordType::AranTutorial => 21002,
            QuestRecordType::AranGuideEffect => 21003,
            QuestRecordType::AranHelperClear => 21019,
        }
    }
}

impl From<QuestRecordType> for u32 {
    fn from(value: QuestRecordType) -> Self {
        value.quest_id()
    }
}

impl fmt::Display for QuestRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.quest_id())
    }
}
