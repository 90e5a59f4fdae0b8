//! Quest rewards and the Mushroom Castle scripts that drive them.

mod common;

use common::*;
use kodama::character::{InventoryType, QuestState};
use kodama::packet::{Effect, PromptKind};
use kodama::quest::QuestRecordType;
use kodama::script::SessionState;
use kodama::provider::QuestProvider;
use kodama::{CharacterState, KodamaError, OutPacket, PacketSink, ScriptRegistry};

const PRINCESS_CROWN: i32 = 4032386;
const WEDDING_HALL_KEY: i32 = 4032388;
const POTIONS: [i32; 3] = [2000000, 2000001, 2000002];

/// A character ready to hand in The Story of Betrayal.
fn betrayal_ready() -> CharacterState {
    let mut character = character();
    give(&mut character, WEDDING_HALL_KEY, 1);
    character.quests.force_start(2333);
    character
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<OutPacket>) -> Vec<OutPacket> {
    let mut packets = Vec::new();
    while let Ok(packet) = rx.try_recv() {
        packets.push(packet);
    }
    packets
}

#[tokio::test]
async fn test_complete_quest_applies_every_act() {
    let engine = engine_with(ScriptRegistry::new(), script_config(0), vec![betrayal_ready()]).await;
    let (sink, mut rx) = PacketSink::channel();

    assert!(engine
        .complete_quest(CHARACTER_ID, 2333, None, &sink)
        .await
        .unwrap());

    inspect(&engine, CHARACTER_ID, |c| {
        assert_eq!(c.inventory.item_count(WEDDING_HALL_KEY), 0);
        assert_eq!(c.inventory.item_count(PRINCESS_CROWN), 1);
        let potions: Vec<i32> = POTIONS
            .iter()
            .map(|id| c.inventory.item_count(*id))
            .collect();
        assert_eq!(potions.iter().filter(|n| **n > 0).count(), 1);
        assert_eq!(potions.iter().sum::<i32>(), 20);
        assert_eq!(c.exp(), 3000);
        assert_eq!(c.quests.state(2333), QuestState::Completed);
    })
    .await;

    let packets = drain(&mut rx);
    let inventory_ops = packets
        .iter()
        .filter(|p| matches!(p, OutPacket::InventoryOperation { .. }))
        .count();
    assert_eq!(inventory_ops, 3);
    let gains: Vec<(i32, i32)> = packets
        .iter()
        .filter_map(|p| match p {
            OutPacket::Effect(Effect::GainItem { item_id, quantity }) => Some((*item_id, *quantity)),
            _ => None,
        })
        .collect();
    assert_eq!(gains[0], (WEDDING_HALL_KEY, -1));
    assert_eq!(gains[1], (PRINCESS_CROWN, 1));
    assert!(POTIONS.contains(&gains[2].0));
    assert!(packets.contains(&OutPacket::StatChanged { exp: 3000 }));
    assert_eq!(
        packets.last(),
        Some(&OutPacket::QuestResult {
            quest_id: 2333,
            state: QuestState::Completed,
        })
    );
}

#[tokio::test]
async fn test_no_free_slot_changes_nothing() {
    let mut character = betrayal_ready();
    // the key fills the only Etc slot, leaving no room for the crown
    character.inventory.set_capacity(InventoryType::Etc, 1);
    let before = character.inventory.clone();
    let engine = engine_with(ScriptRegistry::new(), script_config(0), vec![character]).await;
    let (sink, mut rx) = PacketSink::channel();

    assert!(!engine
        .complete_quest(CHARACTER_ID, 2333, None, &sink)
        .await
        .unwrap());
    assert!(drain(&mut rx).is_empty());

    inspect(&engine, CHARACTER_ID, |c| {
        assert_eq!(c.inventory.item_count(WEDDING_HALL_KEY), 1);
        assert_eq!(c.inventory.item_count(PRINCESS_CROWN), 0);
        for inventory_type in InventoryType::ALL {
            assert_eq!(
                c.inventory.remaining(inventory_type),
                before.remaining(inventory_type)
            );
        }
        assert_eq!(c.exp(), 0);
        assert_eq!(c.quests.state(2333), QuestState::Started);
    })
    .await;
}

#[tokio::test]
async fn test_missing_consumed_item_is_infeasible() {
    let mut character = character();
    character.quests.force_start(2333);
    let engine = engine_with(ScriptRegistry::new(), script_config(0), vec![character]).await;
    let (sink, mut rx) = PacketSink::channel();

    assert!(!engine
        .complete_quest(CHARACTER_ID, 2333, None, &sink)
        .await
        .unwrap());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_quest_must_be_in_progress() {
    let mut character = character();
    give(&mut character, WEDDING_HALL_KEY, 1);
    let engine = engine_with(ScriptRegistry::new(), script_config(0), vec![character]).await;
    let (sink, _rx) = PacketSink::channel();

    assert!(!engine
        .complete_quest(CHARACTER_ID, 2333, None, &sink)
        .await
        .unwrap());
    let err = engine
        .complete_quest(CHARACTER_ID, 99999, None, &sink)
        .await
        .unwrap_err();
    assert!(matches!(err, KodamaError::NotFound(_)));
}

#[tokio::test]
async fn test_choice_reward() {
    let mut character = character();
    character.quests.force_start(2338);
    let engine = engine_with(ScriptRegistry::new(), script_config(0), vec![character]).await;
    let (sink, _rx) = PacketSink::channel();

    // a choice quest needs a valid choice
    for choice in [None, Some(2)] {
        assert!(!engine
            .complete_quest(CHARACTER_ID, 2338, choice, &sink)
            .await
            .unwrap());
    }
    assert!(engine
        .complete_quest(CHARACTER_ID, 2338, Some(1), &sink)
        .await
        .unwrap());

    inspect(&engine, CHARACTER_ID, |c| {
        assert_eq!(c.inventory.item_count(2000002), 50);
        assert_eq!(c.inventory.item_count(1002026), 0);
    })
    .await;
}

#[tokio::test]
async fn test_story_of_betrayal_start_script() {
    let engine = engine(ScriptRegistry::with_content()).await;
    let mut client = TestClient::new();
    let handle = client.invoke(&engine, "q2333s").await;

    let mut speakers = Vec::new();
    for _ in 0..9 {
        let prompt = client.next_prompt().await;
        speakers.push(prompt.speaker_id);
        client.answer(&engine, &prompt, next()).await;
    }
    assert_eq!(handle.finished().await, SessionState::Completed);
    assert_eq!(speakers[0], 1300002);
    assert_eq!(speakers[4], 1300001);
    assert_eq!(speakers[8], 1300002);

    let packets = client.drain();
    assert!(packets.contains(&OutPacket::QuestResult {
        quest_id: 2333,
        state: QuestState::Started,
    }));
    assert!(packets.contains(&OutPacket::ScriptProgressMessage {
        text: "New Mission! Defeat the Prime Minister!".to_string(),
    }));
    inspect(&engine, CHARACTER_ID, |c| {
        assert!(c.quests.has_started(2333));
        assert!(!c.quests.has_completed(2333));
    })
    .await;
}

#[tokio::test]
async fn test_story_of_betrayal_script() {
    let engine = engine_with(ScriptRegistry::with_content(), script_config(0), vec![betrayal_ready()]).await;
    let mut client = TestClient::new();
    let handle = client.invoke(&engine, "q2333e").await;

    for _ in 0..6 {
        let prompt = client.next_prompt().await;
        assert!(matches!(prompt.prompt, PromptKind::Say { next: true, .. }));
        client.answer(&engine, &prompt, next()).await;
    }
    assert_eq!(handle.finished().await, SessionState::Completed);

    let packets = client.drain();
    assert!(packets.contains(&OutPacket::TransferField {
        field_id: 106021700,
        portal: None,
    }));
    inspect(&engine, CHARACTER_ID, |c| {
        assert_eq!(c.inventory.item_count(PRINCESS_CROWN), 1);
        assert!(c.quests.has_completed(2333));
    })
    .await;
}

#[tokio::test]
async fn test_story_of_betrayal_without_etc_slot() {
    let mut character = betrayal_ready();
    character.inventory.set_capacity(InventoryType::Etc, 1);
    let engine = engine_with(ScriptRegistry::with_content(), script_config(0), vec![character]).await;
    let mut client = TestClient::new();
    let handle = client.invoke(&engine, "q2333e").await;

    let prompt = client.next_prompt().await;
    assert_eq!(
        prompt.prompt.text(),
        "Please have at least 1 slot empty in your Etc window."
    );
    client.answer(&engine, &prompt, next()).await;
    assert_eq!(handle.finished().await, SessionState::Completed);

    inspect(&engine, CHARACTER_ID, |c| {
        assert_eq!(c.inventory.item_count(WEDDING_HALL_KEY), 1);
        assert_eq!(c.quests.state(2333), QuestState::Started);
    })
    .await;
}

#[tokio::test]
async fn test_investigation_record() {
    let engine = engine(ScriptRegistry::with_content()).await;
    let mut client = TestClient::new();

    // accept Exploring Mushroom Forest (1)
    let handle = client.invoke(&engine, "q2314s").await;
    let prompt = client.next_prompt().await;
    assert!(matches!(prompt.prompt, PromptKind::AskAccept { .. }));
    client.answer(&engine, &prompt, yes()).await;
    let prompt = client.next_prompt().await;
    client.answer(&engine, &prompt, next()).await;
    assert_eq!(handle.finished().await, SessionState::Completed);

    // inspect the barrier
    let handle = client.invoke(&engine, "investigate1").await;
    let prompt = client.next_prompt().await;
    assert_eq!(prompt.param, kodama::script::ScriptMessageParam::PLAYER_AS_SPEAKER.bits());
    client.answer(&engine, &prompt, next()).await;
    assert_eq!(handle.finished().await, SessionState::Completed);

    let packets = client.drain();
    assert!(packets.contains(&OutPacket::QuestRecordMessage {
        quest_id: QuestRecordType::MushroomCastleInvestigation.quest_id(),
        value: "1".to_string(),
    }));
    inspect(&engine, CHARACTER_ID, |c| {
        assert!(c.quests.has_started(2314));
        assert_eq!(c.quests.value(2314), Some("1"));
    })
    .await;

    // a second visit has nothing left to report
    let handle = client.invoke(&engine, "investigate1").await;
    assert_eq!(handle.finished().await, SessionState::Completed);
}

/// Exp first, then two Etc grants competing for the only free Etc slot.
const ROYAL_GIFTS: &str = r#"
[[quest]]
quest_id = 2336
name = "Royal Gifts"

[[quest.complete]]
act = "exp"
exp = 500

[[quest.complete]]
act = "item"
items = [{ item_id = 4032386, count = 1 }]

[[quest.complete]]
act = "item"
items = [{ item_id = 4032405, count = 1 }]
"#;

#[tokio::test]
async fn test_rejected_quest_leaves_no_trace() {
    let mut character = character();
    character.inventory.set_capacity(InventoryType::Etc, 1);
    character.quests.force_start(2336);
    let quests = QuestProvider::parse(ROYAL_GIFTS).unwrap();
    let engine = engine_with_quests(ScriptRegistry::new(), script_config(0), quests, vec![character]).await;
    let (sink, mut rx) = PacketSink::channel();

    assert!(!engine
        .complete_quest(CHARACTER_ID, 2336, None, &sink)
        .await
        .unwrap());
    assert!(drain(&mut rx).is_empty());

    inspect(&engine, CHARACTER_ID, |c| {
        assert_eq!(c.exp(), 0);
        assert_eq!(c.inventory.item_count(PRINCESS_CROWN), 0);
        assert_eq!(c.inventory.item_count(4032405), 0);
        assert_eq!(c.quests.state(2336), QuestState::Started);
    })
    .await;
}
