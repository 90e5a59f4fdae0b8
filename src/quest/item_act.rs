//! Item rewards and requirements of a quest.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use super::random::pick_weighted;
use super::{ActContext, QuestItemData};
use crate::character::{CharacterState, InventoryBatch, InventoryError, InventoryManager};
use crate::packet::OutPacket;
use crate::provider::ItemCatalog;

/// Consumes and grants items in one step.
///
/// Choice entries are indexed in the order they appear in `items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuestItemAct {
    #[serde(default)]
    items: Vec<QuestItemData>,
}

/// One applied sub-step waiting to be announced.
struct Applied {
    batch: InventoryBatch,
    item_id: i32,
    quantity: i32,
}

#[derive(Debug, Error)]
enum StageError {
    #[error("invalid reward choice {0:?}")]
    Choice(Option<usize>),
    #[error("item {item_id}: {source}")]
    Inventory {
        item_id: i32,
        source: InventoryError,
    },
}

impl StageError {
    fn inventory(item_id: i32) -> impl FnOnce(InventoryError) -> Self {
        move |source| StageError::Inventory { item_id, source }
    }
}

impl QuestItemAct {
    pub fn new(items: Vec<QuestItemData>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[QuestItemData] {
        &self.items
    }

    pub fn choices(&self) -> impl Iterator<Item = &QuestItemData> {
        self.items.iter().filter(|data| data.is_choice())
    }

    pub fn choice(&self, index: usize) -> Option<&QuestItemData> {
        self.choices().nth(index)
    }

    /// Static and random entries the character is eligible for.
    fn filtered(&self, character: &CharacterState) -> Vec<&QuestItemData> {
        self.items
            .iter()
            .filter(|data| !data.is_choice())
            .filter(|data| data.check_gender(character.gender()) && data.check_job(character.job()))
            .collect()
    }

    /// Resolve `choice` against the choice list. A list with choices needs a
    /// valid index; a list without them ignores it.
    fn resolve_choice(&self, choice: Option<usize>) -> Result<Option<&QuestItemData>, StageError> {
        if self.choices().next().is_none() {
            return Ok(None);
        }
        choice
            .and_then(|index| self.choice(index))
            .map(Some)
            .ok_or(StageError::Choice(choice))
    }

    /// Whether `do_act` would succeed against the current state.
    ///
    /// Runs the same consume, choice and static steps on a scratch copy of
    /// the inventory, so entries sharing an item id see each other's effect.
    /// Every random entry must fit afterwards, since any of them may be
    /// picked. Never mutates.
    pub fn can_act(
        &self,
        character: &CharacterState,
        ctx: &ActContext<'_>,
        choice: Option<usize>,
    ) -> bool {
        let mut scratch = character.inventory.clone();
        if let Err(e) = self.stage_fixed(character, &mut scratch, &mut Vec::new(), ctx.catalog, choice) {
            debug!(character_id = character.id(), error = %e, "Quest item act infeasible");
            return false;
        }

        for data in self.random_entries(character) {
            let fits = ctx
                .catalog
                .item_info(data.item_id)
                .is_some_and(|info| scratch.can_add_item(data.item_id, data.count, info.slot_max));
            if !fits {
                debug!(
                    character_id = character.id(),
                    item_id = data.item_id,
                    "No room for a possible random reward"
                );
                return false;
            }
        }
        true
    }

    /// Consume, then grant the choice, static and random items.
    ///
    /// Every sub-step runs against a staged copy of the inventory; the copy
    /// replaces the live one and notifications go out only when all of them
    /// succeed. Call only after `can_act` returned true on the same state.
    pub fn do_act(
        &self,
        character: &mut CharacterState,
        ctx: &mut ActContext<'_>,
        choice: Option<usize>,
    ) -> bool {
        let character_id = character.id();
        let mut staged = character.inventory.clone();
        let mut applied: Vec<Applied> = Vec::new();

        let result = self
            .stage_fixed(character, &mut staged, &mut applied, ctx.catalog, choice)
            .and_then(|()| {
                let random = self.random_entries(character);
                match pick_weighted(&random, |d| d.weight(), &mut *ctx.rng) {
                    Some(data) => {
                        applied.push(grant(&mut staged, ctx.catalog, data)?);
                        Ok(())
                    }
                    None => Ok(()),
                }
            });
        if let Err(e) = result {
            error!(
                character_id,
                error = %e,
                "Quest item act failed after passing its feasibility check"
            );
            return false;
        }

        character.inventory = staged;
        for step in applied {
            ctx.sink.write(OutPacket::inventory_operation(step.batch));
            ctx.sink.write(OutPacket::gain_item(step.item_id, step.quantity));
        }
        true
    }

    fn random_entries(&self, character: &CharacterState) -> Vec<&QuestItemData> {
        self.filtered(character)
            .into_iter()
            .filter(|d| d.is_random() && d.count > 0)
            .collect()
    }

    /// Consume, choice and static steps, in that order.
    fn stage_fixed(
        &self,
        character: &CharacterState,
        staged: &mut InventoryManager,
        applied: &mut Vec<Applied>,
        catalog: &dyn ItemCatalog,
        choice: Option<usize>,
    ) -> Result<(), StageError> {
        let filtered = self.filtered(character);

        for data in filtered.iter().filter(|d| d.is_static() && d.count < 0) {
            let batch = staged
                .remove_item(data.item_id, -data.count)
                .map_err(StageError::inventory(data.item_id))?;
            applied.push(Applied {
                batch,
                item_id: data.item_id,
                quantity: data.count,
            });
        }

        if let Some(data) = self.resolve_choice(choice)? {
            applied.push(grant(staged, catalog, data)?);
        }

        for data in filtered.iter().filter(|d| d.is_static() && d.count > 0) {
            applied.push(grant(staged, catalog, data)?);
        }
        Ok(())
    }
}

fn grant(
    staged: &mut InventoryManager,
    catalog: &dyn ItemCatalog,
    data: &QuestItemData,
) -> Result<Applied, StageError> {
    let info = catalog
        .item_info(data.item_id)
        .ok_or(StageError::Inventory {
            item_id: data.item_id,
            source: InventoryError::InvalidItem(data.item_id),
        })?;
    let item = info.create_item(staged.next_item_sn(), data.count);
    let batch = staged
        .add_item(item)
        .map_err(StageError::inventory(data.item_id))?;
    Ok(Applied {
        batch,
        item_id: data.item_id,
        quantity: data.count,
    })
}
