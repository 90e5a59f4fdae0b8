//! One client's lane: newline-delimited JSON in, newline-delimited JSON out.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::character::{CharacterId, CharacterState};
use crate::packet::{InPacket, OutPacket, PacketSink};
use crate::script::{ConnectionId, ReplyOutcome, ScriptEngine, ScriptTrigger};
use crate::KodamaError;

/// Per-connection packet handler.
///
/// Inbound packets are handled one at a time; script sessions run on their
/// own tasks so a suspended prompt never stalls this lane.
pub struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    engine: Arc<ScriptEngine>,
    character_id: Option<CharacterId>,
}

impl Connection {
    pub fn new(peer_addr: SocketAddr, engine: Arc<ScriptEngine>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer_addr,
            engine,
            character_id: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Serve the connection until the peer disconnects.
    pub async fn run(mut self, stream: TcpStream) {
        info!(connection_id = %self.id, peer = %self.peer_addr, "Connection opened");
        let (reader, writer) = stream.into_split();
        let (sink, rx) = PacketSink::channel();
        let writer_task = tokio::spawn(write_loop(writer, rx));

        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<InPacket>(line) {
                        Ok(packet) => self.handle(packet, &sink).await,
                        Err(e) => {
                            warn!(connection_id = %self.id, error = %e, "Malformed packet");
                            sink.write(OutPacket::notice("Malformed packet."));
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(connection_id = %self.id, error = %e, "Read failed");
                    break;
                }
            }
        }

        self.close().await;
        drop(sink);
        if let Err(e) = writer_task.await {
            warn!(connection_id = %self.id, error = %e, "Writer task failed");
        }
        info!(connection_id = %self.id, peer = %self.peer_addr, "Connection closed");
    }

    async fn handle(&mut self, packet: InPacket, sink: &PacketSink) {
        match packet {
            InPacket::Enter {
                character_id,
                name,
                gender,
                job,
                level,
            } => {
                if self.character_id.is_some() {
                    sink.write(OutPacket::notice("Already in game."));
                    return;
                }
                let character = CharacterState::new(character_id, name, gender, job, level);
                if !self.engine.characters().insert(character_id, character).await {
                    sink.write(OutPacket::notice("Character is already online."));
                    return;
                }
                self.character_id = Some(character_id);
                debug!(connection_id = %self.id, character_id, "Character entered");
            }
            InPacket::Trigger {
                script_id,
                npc_id,
                field_id,
            } => {
                let Some(character_id) = self.character_id else {
                    sink.write(OutPacket::notice("Enter the game first."));
                    return;
                };
                let trigger = ScriptTrigger {
                    script_id,
                    npc_id,
                    field_id,
                };
                match self
                    .engine
                    .invoke(self.id, character_id, trigger, sink.clone())
                    .await
                {
                    // the session runs detached; close_connection cancels it
                    Ok(_handle) => {}
                    Err(KodamaError::UnknownScript(script_id)) => {
                        warn!(connection_id = %self.id, %script_id, "Unknown script");
                        sink.write(OutPacket::notice(format!("Unknown script: {script_id}")));
                    }
                    Err(KodamaError::SessionBusy(session_id)) => {
                        debug!(connection_id = %self.id, session_id, "Trigger ignored during a session");
                    }
                    Err(e) => {
                        warn!(connection_id = %self.id, error = %e, "Trigger failed");
                        sink.write(OutPacket::notice("Please try again in a moment."));
                    }
                }
            }
            InPacket::ScriptAnswer(reply) => {
                let session_id = reply.session_id;
                let outcome = self.engine.deliver_reply(self.id, reply).await;
                if outcome != ReplyOutcome::Resumed {
                    debug!(connection_id = %self.id, session_id, ?outcome, "Reply not delivered");
                }
            }
            InPacket::QuestComplete { quest_id, choice } => {
                let Some(character_id) = self.character_id else {
                    sink.write(OutPacket::notice("Enter the game first."));
                    return;
                };
                // waits for the character's handle, which a live session may hold
                let engine = Arc::clone(&self.engine);
                let sink = sink.clone();
                tokio::spawn(async move {
                    match engine
                        .complete_quest(character_id, quest_id, choice, &sink)
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => {
                            sink.write(OutPacket::notice("You cannot complete this quest yet."));
                        }
                        Err(e) => {
                            warn!(character_id, quest_id, error = %e, "Quest completion failed");
                            sink.write(OutPacket::notice("Please try again in a moment."));
                        }
                    }
                });
            }
        }
    }

    async fn close(&mut self) {
        self.engine.close_connection(self.id).await;
        if let Some(character_id) = self.character_id.take() {
            self.engine.characters().remove(&character_id).await;
            debug!(connection_id = %self.id, character_id, "Character left");
        }
    }
}

async fn write_loop(mut writer: OwnedWriteHalf, mut rx: UnboundedReceiver<OutPacket>) {
    while let Some(packet) = rx.recv().await {
        let mut line = match serde_json::to_string(&packet) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode packet");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            debug!(error = %e, "Peer went away while writing");
            break;
        }
    }
    let _ = writer.shutdown().await;
}
