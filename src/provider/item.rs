//! Item templates.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::character::Item;
use crate::{KodamaError, Result};

/// Static description of an item id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemInfo {
    pub item_id: i32,
    #[serde(default)]
    pub name: String,
    /// Maximum count per inventory slot.
    #[serde(default = "default_slot_max")]
    pub slot_max: i32,
}

fn default_slot_max() -> i32 {
    100
}

impl ItemInfo {
    pub fn new(item_id: i32, name: impl Into<String>, slot_max: i32) -> Self {
        Self {
            item_id,
            name: name.into(),
            slot_max,
        }
    }

    /// Materialize an instance of this template.
    pub fn create_item(&self, item_sn: i64, quantity: i32) -> Item {
        Item {
            item_sn,
            item_id: self.item_id,
            quantity,
            slot_max: self.slot_max,
        }
    }
}

/// Lookup of item templates by id.
pub trait ItemCatalog: Send + Sync {
    fn item_info(&self, item_id: i32) -> Option<&ItemInfo>;
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    #[serde(default, rename = "item")]
    items: Vec<ItemInfo>,
}

/// In-memory item catalog.
#[derive(Debug, Clone, Default)]
pub struct ItemProvider {
    items: HashMap<i32, ItemInfo>,
}

impl ItemProvider {
    pub fn new<I: IntoIterator<Item = ItemInfo>>(items: I) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.item_id, i)).collect(),
        }
    }

    /// Load `[[item]]` tables from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let provider = Self::parse(&content)?;
        info!(
            "Loaded {} item templates from {}",
            provider.len(),
            path.as_ref().display()
        );
        Ok(provider)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let file: ItemFile = toml::from_str(s)?;
        for item in &file.items {
            if item.slot_max <= 0 {
                return Err(KodamaError::Validation(format!(
                    "item {} has non-positive slot_max",
                    item.item_id
                )));
            }
        }
        Ok(Self::new(file.items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemCatalog for ItemProvider {
    fn item_info(&self, item_id: i32) -> Option<&ItemInfo> {
        self.items.get(&item_id)
    }
}
