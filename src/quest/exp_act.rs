use serde::Deserialize;
use tracing::debug;

use super::ActContext;
use crate::character::CharacterState;
use crate::packet::{Effect, OutPacket};

/// Flat experience reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuestExpAct {
    pub exp: i64,
}

impl QuestExpAct {
    pub fn new(exp: i64) -> Self {
        Self { exp }
    }

    pub fn can_act(&self, _character: &CharacterState, _ctx: &ActContext<'_>) -> bool {
        true
    }

    pub fn do_act(&self, character: &mut CharacterState, ctx: &mut ActContext<'_>) -> bool {
        let total = character.add_exp(self.exp);
        debug!(character_id = character.id(), exp = self.exp, total, "Quest exp granted");
        ctx.sink.write(OutPacket::StatChanged { exp: total });
        ctx.sink.write(OutPacket::Effect(Effect::GainExp { exp: self.exp }));
        true
    }
}
