//! Quest data and the two-phase acts that reward or charge a character.
//!
//! Every act exposes `can_act`, a pure feasibility check, and `do_act`,
//! which applies it. Both take the character's [`Locked`](crate::lock::Locked)
//! handle so the check and the mutation see the same state.

mod exp_act;
mod info;
mod item_act;
mod item_data;
mod random;
mod record_type;

use rand::RngCore;

pub use exp_act::QuestExpAct;
pub use info::{QuestAct, QuestInfo};
pub use item_act::QuestItemAct;
pub use item_data::{ItemSelection, QuestItemData};
pub use random::pick_weighted;
pub use record_type::QuestRecordType;

use crate::packet::PacketSink;
use crate::provider::ItemCatalog;

/// Collaborators an act needs besides the character itself.
pub struct ActContext<'a> {
    pub catalog: &'a dyn ItemCatalog,
    pub sink: &'a PacketSink,
    pub rng: &'a mut (dyn RngCore + Send),
}

impl<'a> ActContext<'a> {
    pub fn new(
        catalog: &'a dyn ItemCatalog,
        sink: &'a PacketSink,
        rng: &'a mut (dyn RngCore + Send),
    ) -> Self {
        Self { catalog, sink, rng }
    }
}
