//! Character inventory partitions and their mutation primitives.
//!
//! Every add/remove call is all-or-nothing: capacity and quantity are checked
//! before the first slot is touched, and the returned [`InventoryBatch`]
//! describes exactly what changed so it can be forwarded to the client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of slots per partition for a new character.
pub const DEFAULT_SLOT_COUNT: u16 = 24;

/// Inventory partition, derived from the item id's leading digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryType {
    Equip,
    Consume,
    Install,
    Etc,
    Cash,
}

impl InventoryType {
    /// All partitions in client order.
    pub const ALL: [InventoryType; 5] = [
        InventoryType::Equip,
        InventoryType::Consume,
        InventoryType::Install,
        InventoryType::Etc,
        InventoryType::Cash,
    ];

    /// Partition holding `item_id`, if the id is in a known range.
    pub fn from_item_id(item_id: i32) -> Option<Self> {
        match item_id / 1_000_000 {
            1 => Some(Self::Equip),
            2 => Some(Self::Consume),
            3 => Some(Self::Install),
            4 => Some(Self::Etc),
            5 => Some(Self::Cash),
            _ => None,
        }
    }

    /// Whether identical items merge into one slot.
    pub fn is_stackable(self) -> bool {
        !matches!(self, Self::Equip)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equip => "equip",
            Self::Consume => "consume",
            Self::Install => "install",
            Self::Etc => "etc",
            Self::Cash => "cash",
        }
    }
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete item instance occupying one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique serial number within the owning character.
    pub item_sn: i64,
    /// Template id.
    pub item_id: i32,
    /// Count in this slot.
    pub quantity: i32,
    /// Maximum count per slot, copied from the template.
    pub slot_max: i32,
}

/// One change to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InventoryOperation {
    /// A new item was placed into an empty slot.
    NewItem {
        inventory_type: InventoryType,
        position: u16,
        item: Item,
    },
    /// The count of an existing stack changed to `quantity`.
    ItemNumber {
        inventory_type: InventoryType,
        position: u16,
        quantity: i32,
    },
    /// The slot was emptied.
    DelItem {
        inventory_type: InventoryType,
        position: u16,
    },
}

/// Ordered changes produced by one add or remove.
pub type InventoryBatch = Vec<InventoryOperation>;

/// Failure of an inventory primitive. No slot is modified when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("{0} inventory is full")]
    Full(InventoryType),

    #[error("insufficient quantity of item {item_id}: requested {requested}, have {available}")]
    InsufficientQuantity {
        item_id: i32,
        requested: i32,
        available: i32,
    },

    #[error("invalid item {0}")]
    InvalidItem(i32),
}

/// One partition: a fixed number of 1-based slot positions.
#[derive(Debug, Clone)]
pub struct Inventory {
    inventory_type: InventoryType,
    capacity: u16,
    items: BTreeMap<u16, Item>,
}

impl Inventory {
    pub fn new(inventory_type: InventoryType, capacity: u16) -> Self {
        Self {
            inventory_type,
            capacity,
            items: BTreeMap::new(),
        }
    }

    pub fn inventory_type(&self) -> InventoryType {
        self.inventory_type
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    /// Number of empty slots.
    pub fn remaining(&self) -> usize {
        usize::from(self.capacity).saturating_sub(self.items.len())
    }

    pub fn get(&self, position: u16) -> Option<&Item> {
        self.items.get(&position)
    }

    pub fn items(&self) -> impl Iterator<Item = (u16, &Item)> {
        self.items.iter().map(|(pos, item)| (*pos, item))
    }

    pub fn item_count(&self, item_id: i32) -> i32 {
        self.items
            .values()
            .filter(|item| item.item_id == item_id)
            .map(|item| item.quantity)
            .sum()
    }

    fn effective_slot_max(&self, slot_max: i32) -> i32 {
        if self.inventory_type.is_stackable() {
            slot_max.max(1)
        } else {
            1
        }
    }

    /// Room left in existing stacks of `item_id`.
    fn stack_room(&self, item_id: i32, slot_max: i32) -> i32 {
        if !self.inventory_type.is_stackable() {
            return 0;
        }
        self.items
            .values()
            .filter(|item| item.item_id == item_id)
            .map(|item| (slot_max - item.quantity).max(0))
            .sum()
    }

    /// Empty slots needed to place `quantity` of `item_id` after topping up
    /// existing stacks.
    pub fn slots_required(&self, item_id: i32, quantity: i32, slot_max: i32) -> usize {
        if quantity <= 0 {
            return 0;
        }
        let slot_max = self.effective_slot_max(slot_max);
        let leftover = (quantity - self.stack_room(item_id, slot_max)).max(0);
        ((leftover + slot_max - 1) / slot_max) as usize
    }

    fn first_free_position(&self) -> Option<u16> {
        (1..=self.capacity).find(|pos| !self.items.contains_key(pos))
    }

    /// Place `item`, splitting across stacks as needed. `next_sn` allocates
    /// serial numbers for any extra slots the split creates.
    fn add(
        &mut self,
        item: Item,
        next_sn: &mut impl FnMut() -> i64,
    ) -> Result<InventoryBatch, InventoryError> {
        if item.quantity <= 0 {
            return Err(InventoryError::InvalidItem(item.item_id));
        }
        let slot_max = self.effective_slot_max(item.slot_max);
        if self.slots_required(item.item_id, item.quantity, slot_max) > self.remaining() {
            return Err(InventoryError::Full(self.inventory_type));
        }

        let mut batch = InventoryBatch::new();
        let mut left = item.quantity;

        if self.inventory_type.is_stackable() {
            for (position, stack) in self.items.iter_mut() {
                if left == 0 {
                    break;
                }
                if stack.item_id != item.item_id || stack.quantity >= slot_max {
                    continue;
                }
                let take = (slot_max - stack.quantity).min(left);
                stack.quantity += take;
                left -= take;
                batch.push(InventoryOperation::ItemNumber {
                    inventory_type: self.inventory_type,
                    position: *position,
                    quantity: stack.quantity,
                });
            }
        }

        let prototype = item.clone();
        let mut first = Some(item);
        while left > 0 {
            let Some(position) = self.first_free_position() else {
                // slots_required was checked above
                return Err(InventoryError::Full(self.inventory_type));
            };
            let chunk = left.min(slot_max);
            let mut placed = first.take().unwrap_or_else(|| Item {
                item_sn: next_sn(),
                ..prototype.clone()
            });
            placed.quantity = chunk;
            placed.slot_max = slot_max;
            left -= chunk;
            self.items.insert(position, placed.clone());
            batch.push(InventoryOperation::NewItem {
                inventory_type: self.inventory_type,
                position,
                item: placed,
            });
        }

        Ok(batch)
    }

    /// Remove `quantity` of `item_id`, draining the lowest positions first.
    fn remove(&mut self, item_id: i32, quantity: i32) -> Result<InventoryBatch, InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidItem(item_id));
        }
        let available = self.item_count(item_id);
        if available < quantity {
            return Err(InventoryError::InsufficientQuantity {
                item_id,
                requested: quantity,
                available,
            });
        }

        let positions: Vec<u16> = self
            .items
            .iter()
            .filter(|(_, item)| item.item_id == item_id)
            .map(|(pos, _)| *pos)
            .collect();

        let mut batch = InventoryBatch::new();
        let mut left = quantity;
        for position in positions {
            if left == 0 {
                break;
            }
            let Some(stack) = self.items.get_mut(&position) else {
                continue;
            };
            let take = stack.quantity.min(left);
            stack.quantity -= take;
            left -= take;
            if stack.quantity == 0 {
                self.items.remove(&position);
                batch.push(InventoryOperation::DelItem {
                    inventory_type: self.inventory_type,
                    position,
                });
            } else {
                batch.push(InventoryOperation::ItemNumber {
                    inventory_type: self.inventory_type,
                    position,
                    quantity: stack.quantity,
                });
            }
        }
        Ok(batch)
    }
}

/// All partitions of one character plus its item serial counter.
#[derive(Debug, Clone)]
pub struct InventoryManager {
    partitions: BTreeMap<InventoryType, Inventory>,
    next_sn: i64,
}

impl InventoryManager {
    /// Every partition gets `DEFAULT_SLOT_COUNT` slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SLOT_COUNT)
    }

    pub fn with_capacity(slots: u16) -> Self {
        let partitions = InventoryType::ALL
            .iter()
            .map(|t| (*t, Inventory::new(*t, slots)))
            .collect();
        Self {
            partitions,
            next_sn: 1,
        }
    }

    /// Override the slot count of one partition. Existing items beyond the
    /// new capacity are kept.
    pub fn set_capacity(&mut self, inventory_type: InventoryType, slots: u16) {
        if let Some(inventory) = self.partitions.get_mut(&inventory_type) {
            inventory.capacity = slots;
        }
    }

    pub fn inventory(&self, inventory_type: InventoryType) -> &Inventory {
        &self.partitions[&inventory_type]
    }

    /// Allocate the next item serial number.
    pub fn next_item_sn(&mut self) -> i64 {
        let sn = self.next_sn;
        self.next_sn += 1;
        sn
    }

    pub fn remaining(&self, inventory_type: InventoryType) -> usize {
        self.inventory(inventory_type).remaining()
    }

    pub fn item_count(&self, item_id: i32) -> i32 {
        InventoryType::from_item_id(item_id)
            .map(|t| self.inventory(t).item_count(item_id))
            .unwrap_or(0)
    }

    /// Whether at least `quantity` of `item_id` is held.
    pub fn has_item(&self, item_id: i32, quantity: i32) -> bool {
        self.item_count(item_id) >= quantity.max(1)
    }

    /// Empty slots required to add `quantity` of `item_id`.
    pub fn slots_required(&self, item_id: i32, quantity: i32, slot_max: i32) -> Option<usize> {
        let inventory_type = InventoryType::from_item_id(item_id)?;
        Some(
            self.inventory(inventory_type)
                .slots_required(item_id, quantity, slot_max),
        )
    }

    /// Whether `add_item` for this quantity would succeed.
    pub fn can_add_item(&self, item_id: i32, quantity: i32, slot_max: i32) -> bool {
        match InventoryType::from_item_id(item_id) {
            Some(t) => {
                quantity > 0
                    && self.inventory(t).slots_required(item_id, quantity, slot_max)
                        <= self.remaining(t)
            }
            None => false,
        }
    }

    pub fn add_item(&mut self, item: Item) -> Result<InventoryBatch, InventoryError> {
        let inventory_type = InventoryType::from_item_id(item.item_id)
            .ok_or(InventoryError::InvalidItem(item.item_id))?;
        let mut next_sn = self.next_sn;
        let mut alloc = || {
            let sn = next_sn;
            next_sn += 1;
            sn
        };
        let inventory = self
            .partitions
            .get_mut(&inventory_type)
            .ok_or(InventoryError::InvalidItem(item.item_id))?;
        let batch = inventory.add(item, &mut alloc)?;
        self.next_sn = next_sn;
        Ok(batch)
    }

    pub fn remove_item(
        &mut self,
        item_id: i32,
        quantity: i32,
    ) -> Result<InventoryBatch, InventoryError> {
        let inventory_type =
            InventoryType::from_item_id(item_id).ok_or(InventoryError::InvalidItem(item_id))?;
        self.partitions
            .get_mut(&inventory_type)
            .ok_or(InventoryError::InvalidItem(item_id))?
            .remove(item_id, quantity)
    }
}

impl Default for InventoryManager {
    fn default() -> Self {
        Self::new()
    }
}
