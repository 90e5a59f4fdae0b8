//! Integration tests for the channel server transport.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use common::*;
use kodama::config::ServerConfig;
use kodama::packet::PromptKind;
use kodama::{ChannelServer, OutPacket, ScriptRegistry};

fn test_config(max_connections: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections,
    }
}

/// Start a server with the bundled content and no characters logged in.
async fn start_server() -> SocketAddr {
    let engine = engine_with(ScriptRegistry::with_content(), script_config(0), Vec::new()).await;
    let server = ChannelServer::bind(&test_config(10)).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run(engine));
    addr
}

struct LineClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl LineClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn send(&mut self, value: serde_json::Value) {
        self.send_raw(&value.to_string()).await;
    }

    async fn recv(&mut self) -> OutPacket {
        let line = timeout(DEFAULT_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("server closed the connection");
        serde_json::from_str(&line).unwrap()
    }

    async fn enter(&mut self, character_id: u32) {
        self.send(json!({
            "type": "enter",
            "character_id": character_id,
            "name": "Mushroom",
            "gender": "female",
            "level": 30,
        }))
        .await;
    }
}

#[tokio::test]
async fn test_single_slot_is_handed_to_next_client() {
    let engine = engine_with(ScriptRegistry::with_content(), script_config(0), Vec::new()).await;
    let server = ChannelServer::bind(&test_config(1)).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run(engine));

    let mut first = LineClient::connect(addr).await;
    first.send_raw("{not json").await;
    assert_eq!(first.recv().await, OutPacket::notice("Malformed packet."));

    // queued in the backlog until the first lane closes
    let mut second = LineClient::connect(addr).await;
    second.send_raw("{not json").await;
    assert!(timeout(Duration::from_millis(100), second.lines.next_line())
        .await
        .is_err());

    drop(first);
    assert_eq!(second.recv().await, OutPacket::notice("Malformed packet."));
}

#[tokio::test]
async fn test_script_round_trip() {
    let addr = start_server().await;
    let mut client = LineClient::connect(addr).await;
    client.enter(7).await;
    client
        .send(json!({"type": "trigger", "script_id": "q2314s", "npc_id": 1300002}))
        .await;

    let OutPacket::ScriptMessage(prompt) = client.recv().await else {
        panic!("expected a prompt");
    };
    assert!(matches!(prompt.prompt, PromptKind::AskAccept { .. }));
    assert_eq!(prompt.speaker_id, 1300002);

    client
        .send(json!({
            "type": "script_answer",
            "session_id": prompt.session_id,
            "answer": {"kind": "yes_no", "value": true},
        }))
        .await;

    assert_eq!(
        client.recv().await,
        OutPacket::QuestResult {
            quest_id: 2314,
            state: kodama::character::QuestState::Started,
        }
    );
    let OutPacket::ScriptMessage(next_page) = client.recv().await else {
        panic!("expected the follow-up page");
    };
    assert!(matches!(next_page.prompt, PromptKind::Say { next: true, .. }));
    assert_eq!(next_page.session_id, prompt.session_id);
}

#[tokio::test]
async fn test_unknown_script_notice() {
    let addr = start_server().await;
    let mut client = LineClient::connect(addr).await;
    client.enter(8).await;
    client
        .send(json!({"type": "trigger", "script_id": "q9999s"}))
        .await;

    let OutPacket::Notice { text } = client.recv().await else {
        panic!("expected a notice");
    };
    assert!(text.contains("q9999s"));
}

#[tokio::test]
async fn test_malformed_packet_notice() {
    let addr = start_server().await;
    let mut client = LineClient::connect(addr).await;
    client.send_raw("{not json").await;

    assert_eq!(client.recv().await, OutPacket::notice("Malformed packet."));
}

#[tokio::test]
async fn test_trigger_before_enter() {
    let addr = start_server().await;
    let mut client = LineClient::connect(addr).await;
    client
        .send(json!({"type": "trigger", "script_id": "q2314s"}))
        .await;

    assert!(matches!(client.recv().await, OutPacket::Notice { .. }));
}

#[tokio::test]
async fn test_duplicate_enter_is_refused() {
    let addr = start_server().await;
    let mut first = LineClient::connect(addr).await;
    first.enter(9).await;
    // the character is registered once the first client hears back
    first
        .send(json!({"type": "trigger", "script_id": "q9999s"}))
        .await;
    first.recv().await;

    let mut second = LineClient::connect(addr).await;
    second.enter(9).await;
    assert_eq!(
        second.recv().await,
        OutPacket::notice("Character is already online.")
    );
}

#[tokio::test]
async fn test_disconnect_frees_character() {
    let addr = start_server().await;
    let mut first = LineClient::connect(addr).await;
    first.enter(10).await;
    first
        .send(json!({"type": "trigger", "script_id": "q2314s"}))
        .await;
    assert!(matches!(first.recv().await, OutPacket::ScriptMessage(_)));
    drop(first);

    // the suspended session is cancelled and the character logged out
    let mut second = LineClient::connect(addr).await;
    let mut entered = false;
    for _ in 0..50 {
        second.enter(10).await;
        second
            .send(json!({"type": "trigger", "script_id": "q2314s"}))
            .await;
        match second.recv().await {
            OutPacket::ScriptMessage(_) => {
                entered = true;
                break;
            }
            OutPacket::Notice { .. } => {
                // "already online" then "enter first"
                second.recv().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }
    assert!(entered);
}
