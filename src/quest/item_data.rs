use serde::Deserialize;

use crate::character::{job_branch_flag, Gender, InventoryType};

/// How a reward entry is handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSelection {
    /// Always granted (or consumed, for negative counts).
    Static,
    /// One of the random entries is granted, weighted by `weight`.
    Random { weight: u32 },
    /// Granted only when picked by the player's choice index.
    Choice,
}

/// One reward or requirement line of a quest item act.
///
/// `prop` follows the quest data convention: 0 static, positive random
/// weight, -1 choice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestItemData {
    pub item_id: i32,
    /// Negative counts are consumed from the player.
    pub count: i32,
    #[serde(default)]
    pub prop: i32,
    /// 0 male, 1 female, 2 either.
    #[serde(default = "any_gender")]
    pub gender: u8,
    /// Bitmask over job branches; 0 allows every job.
    #[serde(default)]
    pub job: u32,
}

fn any_gender() -> u8 {
    2
}

impl QuestItemData {
    pub fn new(item_id: i32, count: i32) -> Self {
        Self {
            item_id,
            count,
            prop: 0,
            gender: any_gender(),
            job: 0,
        }
    }

    pub fn random(item_id: i32, count: i32, weight: u32) -> Self {
        Self {
            prop: weight.min(i32::MAX as u32) as i32,
            ..Self::new(item_id, count)
        }
    }

    pub fn choice(item_id: i32, count: i32) -> Self {
        Self {
            prop: -1,
            ..Self::new(item_id, count)
        }
    }

    pub fn with_gender(mut self, gender: u8) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_job_mask(mut self, job: u32) -> Self {
        self.job = job;
        self
    }

    pub fn selection(&self) -> ItemSelection {
        match self.prop {
            0 => ItemSelection::Static,
            p if p > 0 => ItemSelection::Random { weight: p as u32 },
            _ => ItemSelection::Choice,
        }
    }

    pub fn is_static(&self) -> bool {
        self.selection() == ItemSelection::Static
    }

    pub fn is_random(&self) -> bool {
        matches!(self.selection(), ItemSelection::Random { .. })
    }

    pub fn is_choice(&self) -> bool {
        self.selection() == ItemSelection::Choice
    }

    /// Random weight, 0 for non-random entries.
    pub fn weight(&self) -> u32 {
        match self.selection() {
            ItemSelection::Random { weight } => weight,
            _ => 0,
        }
    }

    pub fn inventory_type(&self) -> Option<InventoryType> {
        InventoryType::from_item_id(self.item_id)
    }

    pub fn check_gender(&self, gender: Gender) -> bool {
        self.gender == 2 || self.gender == gender.as_index()
    }

    pub fn check_job(&self, job: u16) -> bool {
        self.job == 0 || self.job & job_branch_flag(job) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_from_prop() {
        assert_eq!(QuestItemData::new(4000000, 1).selection(), ItemSelection::Static);
        assert_eq!(
            QuestItemData::random(4000000, 1, 3).selection(),
            ItemSelection::Random { weight: 3 }
        );
        assert_eq!(QuestItemData::choice(4000000, 1).selection(), ItemSelection::Choice);
        assert_eq!(QuestItemData::choice(4000000, 1).weight(), 0);
    }

    #[test]
    fn test_check_gender() {
        let any = QuestItemData::new(1002000, 1);
        assert!(any.check_gender(Gender::Male));
        assert!(any.check_gender(Gender::Female));

        let female = any.clone().with_gender(1);
        assert!(female.check_gender(Gender::Female));
        assert!(!female.check_gender(Gender::Male));
    }

    #[test]
    fn test_check_job() {
        let any = QuestItemData::new(1302000, 1);
        assert!(any.check_job(232));

        // warrior | bowman
        let restricted = any.with_job_mask((1 << 1) | (1 << 3));
        assert!(restricted.check_job(110));
        assert!(restricted.check_job(300));
        assert!(!restricted.check_job(200));
        assert!(!restricted.check_job(0));
    }

    #[test]
    fn test_deserialize_defaults() {
        let data: QuestItemData = toml::from_str("item_id = 4032386\ncount = 1\n").unwrap();
        assert_eq!(data, QuestItemData::new(4032386, 1));
    }
}
