//! Mushroom Castle quest line.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::quest::QuestRecordType;
use crate::script::{ScriptManager, ScriptMessageParam, ScriptRegistry, ScriptResult};

const KILLER_MUSHROOM_SPORE: i32 = 2430014;
const THORN_REMOVER: i32 = 2430015;
const POISON_SPORE: i32 = 4000507;
const PRINCESS_CROWN: i32 = 4032386;
const WEDDING_HALL_KEY: i32 = 4032388;
const SECRET_KEY: i32 = 4032405;

const SPLIT_ROAD_OF_DESTINY: i32 = 106020400;
const CASTLE_WALL_EDGE: i32 = 106020500;
const CASTLE_WALL_EDGE_CLEARED: i32 = 106020501;

pub(super) fn register(registry: &mut ScriptRegistry) {
    registry.register("q2314s", q2314s);
    registry.register("investigate1", investigate1);
    registry.register("q2314e", q2314e);
    registry.register("q2322s", q2322s);
    registry.register("obstacle", obstacle);
    registry.register("gotocastle", gotocastle);
    registry.register("investigate2", investigate2);
    registry.register("removethorns", removethorns);
    registry.register("TD_MC_faild", td_mc_faild);
    registry.register("go_secretroom", go_secretroom);
    registry.register("in_secretroom", in_secretroom);
    registry.register("q2327s", q2327s);
    registry.register("TD_MC_keycheck", td_mc_keycheck);
    registry.register("TD_MC_enterboss1", td_mc_enterboss1);
    registry.register("TD_MC_bossEnter", td_mc_enterboss1);
    registry.register("findvioleta", findvioleta);
    registry.register("q2333s", q2333s);
    registry.register("q2333e", q2333e);
    registry.register("q2334s", q2334s);
    registry.register("q2335s", q2335s);
    registry.register("TD_MC_first", td_mc_first);
    registry.register("TD_MC_title", td_mc_title);
}

/// Exploring Mushroom Forest (1), start.
fn q2314s(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if !sm
            .ask_accept("In order to rescue the princess, you must first investigate the Mushroom Forest. King Pepe has somehow set up a powerful barrier preventing anyone from entering the castle. Please investigate this matter for us right away.")
            .await?
        {
            sm.say_ok("Please do not lose faith in the Mushroom Kingdom.").await?;
            return Ok(());
        }
        sm.force_start_quest(2314);
        sm.say_next("You'll run into the barrier in the Mushroom Forest if you head over to the east from your current location. Please be careful, though. From what I've heard, the area is infested with many atrocious monsters.")
            .await
    }
    .boxed()
}

/// Barrier in Deep Inside Mushroom Forest.
fn investigate1(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        let investigation = QuestRecordType::MushroomCastleInvestigation;
        if sm.has_quest_started(2314) && !sm.has_qr_value(investigation, "1") {
            sm.say_next_with(
                "This looks to be a type of \"Mushroom Spore\" that has been transformed by magic into a strong defense barrier. It doesn't appear penetrable through physical force. Return to the #bSecretary of Domestic Affairs#k and report this matter.",
                ScriptMessageParam::PLAYER_AS_SPEAKER,
            )
            .await?;
            sm.avatar_oriented("Effect/OnUserEff.img/normalEffect/mushroomcastle/chatBalloon1");
            sm.set_qr_value(investigation, "1");
            return Ok(());
        }
        if sm.has_item(KILLER_MUSHROOM_SPORE) && !sm.has_quest_completed(2338) {
            sm.say_ok_with(
                "It seems as if the barrier could be broken using a Killer Mushroom Spore.",
                ScriptMessageParam::PLAYER_AS_SPEAKER,
            )
            .await?;
        }
        Ok(())
    }
    .boxed()
}

/// Exploring Mushroom Forest (1), end.
fn q2314e(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.say_ok("I see that you have thoroughly investigated the barrier in the Mushroom Forest. What was it like?")
            .await?;
        sm.force_complete_quest(2314);
        sm.add_exp(1650);
        sm.say_ok("So I see it wasn't an ordinary barrier by any means. Great work! If it weren't for your help, we wouldn't have had a clue.")
            .await
    }
    .boxed()
}

/// Over the Castle Walls (2), start.
fn q2322s(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if !sm
            .ask_accept("Like I told you, we can't be relieved just because the barrier has been broken. The castle of the Mushking Empire is impenetrable from the outside, so it won't be easy for you to enter. First, would you mind investigating the outer walls of the castle?")
            .await?
        {
            sm.say_ok("Oh, really? You think you have a better idea?! Come talk to me when you get stuck outside the Castle Walls.")
                .await?;
            return Ok(());
        }
        sm.force_start_quest(2322);
        sm.say_next("Head over to the castle from the #bSplit Road of Destiny#k, past the Mushroom Forest. Good luck.")
            .await
    }
    .boxed()
}

/// Vines blocking Deep Inside Mushroom Forest.
fn obstacle(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if !sm.has_quest_completed(2338) {
            if !sm.has_item(POISON_SPORE) {
                let text = if sm.has_item(KILLER_MUSHROOM_SPORE) {
                    "You must remove the barrier by using the Killer Mushroom Spore first."
                } else {
                    "The overgrown vines are blocking the way."
                };
                sm.message(text);
                sm.script_progress_message("You cannot move forward due to the barrier.");
                return Ok(());
            }
            sm.remove_item(POISON_SPORE, 1);
            sm.message("You have used a Poison Spore to pass through the barrier.");
        }
        sm.warp(SPLIT_ROAD_OF_DESTINY, Some("left00"));
        Ok(())
    }
    .boxed()
}

fn warp_to_castle(sm: &mut ScriptManager) {
    let thorns = !sm.has_qr_value(QuestRecordType::MushroomCastleThornRemover, "1");
    let field_id = if thorns {
        CASTLE_WALL_EDGE
    } else {
        CASTLE_WALL_EDGE_CLEARED
    };
    sm.warp(field_id, None);
}

/// Split Road of Destiny, east portal.
fn gotocastle(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        warp_to_castle(sm);
        Ok(())
    }
    .boxed()
}

/// Castle Wall Edge inspection.
fn investigate2(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        let investigation = QuestRecordType::MushroomCastleInvestigation2;
        if sm.has_qr_value(investigation, "1") {
            return Ok(());
        }
        sm.set_not_cancellable(true);
        sm.say_next_with(
            "The colossal castle wall is covered with thorny vines. It's going to be difficult getting into the castle. For now, go report this to the #b#p1300003##k.",
            ScriptMessageParam::PLAYER_AS_SPEAKER,
        )
        .await?;
        sm.set_qr_value(investigation, "1");
        sm.script_progress_message("Castle Wall Investigation Completed 1/1");
        Ok(())
    }
    .boxed()
}

/// Thorn Remover item.
fn removethorns(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if sm.field_id() != Some(CASTLE_WALL_EDGE) {
            sm.say_ok("There's nothing to use the #bThorn Remover#k on around here.")
                .await?;
            return Ok(());
        }
        if sm.ask_accept("Do you wish to use the #bThorn Remover#k?").await? {
            sm.set_qr_value(QuestRecordType::MushroomCastleThornRemover, "1");
            sm.remove_all(THORN_REMOVER);
            sm.warp(106020502, None);
        }
        Ok(())
    }
    .boxed()
}

/// On the Watch trap: spotted by the guard, thrown back down.
fn td_mc_faild(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.reserved_effect("Effect/Direction2.img/mushCatle/nugu");
        sm.message("You've been spotted by the guard and will now be sent to the bottom of the cliff.");
        sm.delay(Duration::from_secs(2)).await?;
        warp_to_castle(sm);
        Ok(())
    }
    .boxed()
}

/// Skyscraper 3, Security Room door.
fn go_secretroom(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if sm.has_quest_started(2335) && sm.has_item(SECRET_KEY) {
            sm.message("You used the Secret Key to enter.");
            sm.remove_all(SECRET_KEY);
            sm.warp(106021001, Some("out00"));
        } else {
            sm.message("You can't enter without the Secret Key.");
        }
        Ok(())
    }
    .boxed()
}

/// Security Room cleared.
fn in_secretroom(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.force_complete_quest(2335);
        sm.message("Quest Complete: Eliminate the Minions");
        sm.add_exp(1200);
        Ok(())
    }
    .boxed()
}

/// James's Whereabouts (3), start.
fn q2327s(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if !sm.ask_yes_no("Okay, it's time to use the #t4001317#").await? {
            return Ok(());
        }
        sm.say_next("Thank you so much. Let me put on this disguise before we start.")
            .await?;
        sm.force_start_quest(2327);
        sm.force_complete_quest(2327);
        sm.add_exp(800);
        Ok(())
    }
    .boxed()
}

/// East Castle Tower entry check for the Wedding Hall Key.
fn td_mc_keycheck(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if sm.has_item(WEDDING_HALL_KEY) && !sm.has_quest_started(2332) {
            sm.script_progress_message("Acquired the Wedding Hall Key 1/1");
            sm.say_next_with(
                "This is #b#t4032388##k! This will allow us to enter the #m106021600#, where #bPrincess #p1300002##k is imprisoned.",
                ScriptMessageParam::PLAYER_AS_SPEAKER,
            )
            .await?;
        }
        Ok(())
    }
    .boxed()
}

/// Door to East Castle Tower.
fn td_mc_enterboss1(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.set_speaker_id(1300012);
        let maps = [
            (106021500, "1. Bringing Down King Pepe (Party: 2-6 / Level: 30 or higher)"),
            (106021401, "2. Saving Violetta (Solo only / Level: 30 or higher)"),
        ];
        let labels: Vec<&str> = maps.iter().map(|(_, label)| *label).collect();
        let choice = sm
            .ask_menu(
                "You will be moved to the #b#m106021401##k. Where would you like to go?\r\n",
                &labels,
            )
            .await?;
        let (field_id, _) = maps[choice];
        if choice == 0 {
            sm.warp(field_id, Some("out01"));
            return Ok(());
        }
        if !sm.has_item(WEDDING_HALL_KEY) {
            sm.say_ok("You cannot enter without the #t4032388#.").await?;
            return Ok(());
        }
        if sm.level() < 30 {
            sm.message("You must be level 30 or higher to enter.");
            return Ok(());
        }
        sm.warp(field_id, Some("out00"));
        Ok(())
    }
    .boxed()
}

/// Wedding Hall reached.
fn findvioleta(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if sm.has_quest_started(2332) && !sm.has_quest_completed(2332) {
            sm.force_complete_quest(2332);
            sm.add_exp(800);
            sm.script_progress_message("<Where is Violetta?> Quest Complete 1/1");
        }
        Ok(())
    }
    .boxed()
}

/// The Story of Betrayal, start. The Prime Minister is summoned by the field.
fn q2333s(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.say_next_with(
            "Ah, you're the brave hero that has come to save me, #b#h0##k! I knew you'd come! *Sniff sniff*",
            ScriptMessageParam::FLIP_SPEAKER,
        )
        .await?;
        sm.say_both_with("Are you alright, Princess?", ScriptMessageParam::PLAYER_AS_SPEAKER)
            .await?;
        sm.say_both_with(
            "Yes, I'm fine. But my father... how is my father? Is he alright?",
            ScriptMessageParam::FLIP_SPEAKER,
        )
        .await?;
        sm.say_both_with(
            "Yes, #b#p1300000##k is in a safe place outside the castle with his ministers.",
            ScriptMessageParam::PLAYER_AS_SPEAKER,
        )
        .await?;
        sm.set_speaker_id(1300001);
        sm.say_both_with(
            "How dare you step foot in here! You're terribly mistaken if you think this is how it ends!",
            ScriptMessageParam::SPEAKER_ON_RIGHT,
        )
        .await?;
        sm.set_speaker_id(1300002);
        sm.say_both_with(
            "Watch out! It's dangerous. He's trying to summon the one who's behind all of this!",
            ScriptMessageParam::FLIP_SPEAKER,
        )
        .await?;
        sm.say_both_with(
            "The one who's behind all of this? Are you saying there is someone else that's responsible for this?",
            ScriptMessageParam::PLAYER_AS_SPEAKER,
        )
        .await?;
        sm.set_speaker_id(1300001);
        sm.say_both_with("Silence! He'll be here soon!", ScriptMessageParam::SPEAKER_ON_RIGHT)
            .await?;
        sm.set_speaker_id(1300002);
        sm.say_both_with(
            "#bThe #o3300008#! Please defeat the #o3300008#!",
            ScriptMessageParam::FLIP_SPEAKER,
        )
        .await?;
        sm.force_start_quest(2333);
        sm.script_progress_message("New Mission! Defeat the Prime Minister!");
        Ok(())
    }
    .boxed()
}

/// The Story of Betrayal, end. Rewards come from the quest's complete acts.
fn q2333e(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if !sm.can_add_item(PRINCESS_CROWN, 1) {
            sm.say_ok_with(
                "Please have at least 1 slot empty in your Etc window.",
                ScriptMessageParam::FLIP_SPEAKER,
            )
            .await?;
            return Ok(());
        }
        sm.say_next_with("You did it, #b#h0##k! I don't know how to thank you.", ScriptMessageParam::FLIP_SPEAKER)
            .await?;
        sm.set_speaker_id(1300001);
        sm.say_both_with("No way! Even the #o3300008#?!", ScriptMessageParam::SPEAKER_ON_RIGHT)
            .await?;
        sm.say_both_with(
            "#b#p1300001##k! This is where your foolhardy dreams end! I will spare your life, but you must head back to where you came from. Go back to #bIce Land#k at once!",
            ScriptMessageParam::PLAYER_AS_SPEAKER,
        )
        .await?;
        sm.say_both_with("Grrrr...", ScriptMessageParam::SPEAKER_ON_RIGHT)
            .await?;
        sm.say_both_with(
            "Give me your crown! Princess, please take the crown.",
            ScriptMessageParam::PLAYER_AS_SPEAKER,
        )
        .await?;
        sm.say_both_with("You mark my words. This isn't over between us!", ScriptMessageParam::SPEAKER_ON_RIGHT)
            .await?;

        if !sm.complete_quest(2333, None)? {
            sm.say_ok_with(
                "Please have at least 1 slot empty in your Etc window.",
                ScriptMessageParam::FLIP_SPEAKER,
            )
            .await?;
            return Ok(());
        }
        sm.warp(106021700, None);
        Ok(())
    }
    .boxed()
}

/// The Identity of the Princess, start.
fn q2334s(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.say_next_with(
            "Thank you so much, #b#h0##k. You are the hero that has saved our empire from danger. I'm so grateful for what you've done, I don't know how to thank you. And please understand why I can't show you my face.",
            ScriptMessageParam::FLIP_SPEAKER,
        )
        .await?;
        sm.say_both_with(
            "I see... \r\n#b(Wow, how pretty could she be?)",
            ScriptMessageParam::PLAYER_AS_SPEAKER,
        )
        .await?;
        sm.force_start_quest(2334);
        sm.force_complete_quest(2334);
        sm.add_exp(1000);
        sm.say_both_with("I'm so shy, I'm blushing. Anyways, thank you, #b#h0##k.", ScriptMessageParam::FLIP_SPEAKER)
            .await
    }
    .boxed()
}

/// Eliminating the Rest, start.
fn q2335s(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.say_next_with(
            "This is not the end, #b#h0##k. Minions of the #b#o3300008##k can still be found scattered throughout the castle.",
            ScriptMessageParam::FLIP_SPEAKER,
        )
        .await?;
        let accepted = sm
            .ask_accept_with(
                "From what I've heard, there is a place near #b#m106021000##k where a group of the #o3300008#'s minions can be found. I've picked up a key that the #o3300008# has dropped the other day. Here, use this key.",
                ScriptMessageParam::FLIP_SPEAKER,
            )
            .await?;
        if !accepted {
            return Ok(());
        }
        if !sm.add_item(SECRET_KEY, 1) {
            sm.say_ok_with(
                "Please have at least 1 slot empty in your Etc window.",
                ScriptMessageParam::FLIP_SPEAKER,
            )
            .await?;
            return Ok(());
        }
        sm.say_next_with("For one last time, good luck.", ScriptMessageParam::FLIP_SPEAKER)
            .await?;
        sm.force_start_quest(2335);
        Ok(())
    }
    .boxed()
}

/// Ghost Mushroom Forest portal into Mushroom Castle.
fn td_mc_first(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        if sm.level() < 30 {
            sm.message("A strange force is blocking you from entering.");
        } else if sm.qr_value(QuestRecordType::MushroomCastleOpening) == "1" {
            sm.warp(106020000, Some("left00"));
        } else {
            sm.warp(106020001, None);
        }
        Ok(())
    }
    .boxed()
}

fn td_mc_title(sm: &mut ScriptManager) -> BoxFuture<'_, ScriptResult<()>> {
    async move {
        sm.screen_effect("temaD/enter/mushCatle");
        Ok(())
    }
    .boxed()
}
