use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    directory::RoomDirectory,
    dto::ws::{ClientMessage, ServerEvent},
    games::Directive,
    games::rules::{GameKind, MoveSlot},
    state::{PeerHandle, SharedState},
};

/// Handle the full lifecycle for an individual room member WebSocket
/// connection. Identity is established before the upgrade, so the socket is
/// live in the room as soon as this runs.
pub async fn handle_socket(state: SharedState, socket: WebSocket, room: String, participant: String) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let conn_id = Uuid::new_v4();
    state.registry().register(
        &room,
        PeerHandle {
            participant: participant.clone(),
            conn_id,
            tx: outbound_tx.clone(),
        },
    );

    if let Some(directory) = state.directory().await {
        if let Err(err) = directory.note_join(&room, &participant).await {
            warn!(room = %room, participant = %participant, error = %err, "failed to record join");
        }
    }

    info!(room = %room, participant = %participant, "member connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(inbound) => dispatch(&state, &room, &participant, &text, inbound).await,
                Err(err) => {
                    warn!(
                        room = %room,
                        participant = %participant,
                        error = %err,
                        "failed to parse room message"
                    );
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(room = %room, participant = %participant, "member closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(room = %room, participant = %participant, error = %err, "websocket error");
                break;
            }
        }
    }

    // A displaced connection must not tear down its successor's registration
    // or the room roster, hence the tag check.
    if state.registry().deregister(&room, &participant, conn_id) {
        info!(room = %room, participant = %participant, "member disconnected");
        if let Some(directory) = state.directory().await {
            let room = room.clone();
            let participant = participant.clone();
            tokio::spawn(async move {
                if let Err(err) = directory.remove_member(&room, &participant).await {
                    warn!(room = %room, error = %err, "failed to remove departed member");
                }
                if let Err(err) = directory.reassign_admin(&room, &participant).await {
                    warn!(room = %room, error = %err, "failed to reassign room admin");
                }
                let note = format!("{participant} left the room");
                if let Err(err) = directory.append_notification(&room, &note).await {
                    warn!(room = %room, error = %err, "failed to append departure notification");
                }
            });
        }
    }

    finalize(writer_task, outbound_tx).await;
}

/// Route one parsed message to the game engine or the playback relay.
async fn dispatch(
    state: &SharedState,
    room: &str,
    participant: &str,
    raw: &str,
    inbound: ClientMessage,
) {
    match inbound {
        ClientMessage::JoinQueue { game } => {
            let members = state.registry().members(room);
            let directives = state
                .games()
                .lock()
                .await
                .join_queue(room, participant, game, &members);
            deliver(state, room, directives);
        }
        ClientMessage::AcceptInvite { game, from } => {
            let directives = state
                .games()
                .lock()
                .await
                .accept_invite(room, participant, game, &from);
            deliver(state, room, directives);
        }
        ClientMessage::RejectInvite { game, from } => {
            let directives = state
                .games()
                .lock()
                .await
                .reject_invite(room, participant, game, &from);
            deliver(state, room, directives);
        }
        ClientMessage::CancelInvites { game } => {
            let directives = state
                .games()
                .lock()
                .await
                .cancel_invites(room, participant, game);
            deliver(state, room, directives);
        }
        ClientMessage::Move { game, index, col } => {
            let slot = match game {
                GameKind::TicTacToe => index.map(MoveSlot::Cell),
                GameKind::ConnectFour => col.map(MoveSlot::Column),
            };
            let Some(slot) = slot else {
                debug!(room = %room, participant = %participant, game = %game, "move without a slot");
                return;
            };
            let directives = state
                .games()
                .lock()
                .await
                .apply_move(room, participant, game, slot);
            deliver(state, room, directives);
        }
        ClientMessage::Reset { game } => {
            let directives = state.games().lock().await.reset(room, game);
            deliver(state, room, directives);
        }
        ClientMessage::PlaybackState(_) | ClientMessage::SeekTo(_) => {
            if !holds_authority(state, room, participant).await {
                warn!(room = %room, participant = %participant, "dropping playback message from non-admin");
                return;
            }
            relay_to_others(state, room, participant, raw);
        }
        ClientMessage::RequestState => {
            forward_to_admin(state, room, participant, raw).await;
        }
        ClientMessage::TrackEnded(ended) => {
            if !holds_authority(state, room, participant).await {
                warn!(room = %room, participant = %participant, "dropping track end from non-admin");
                return;
            }
            relay_to_room(state, room, raw);
            if let Some(directory) = state.directory().await {
                advance_room_queue(directory, room.to_string(), ended.message);
            }
        }
        ClientMessage::Unknown => {
            debug!(room = %room, participant = %participant, "ignoring unhandled message type");
        }
    }
}

/// Deliver engine directives through the registry, tolerating dead peers.
pub(crate) fn deliver(state: &SharedState, room: &str, directives: Vec<Directive>) {
    for directive in directives {
        match directive {
            Directive::ToPlayer { participant, event } => {
                let Some(peer) = state.registry().peer(room, &participant) else {
                    debug!(room = %room, participant = %participant, "recipient not connected");
                    continue;
                };
                send_event(&peer.tx, &event);
            }
            Directive::ToRoom { event } => {
                for peer in state.registry().peers(room) {
                    send_event(&peer.tx, &event);
                }
            }
        }
    }
}

/// Whether the participant is the room's current admin.
async fn holds_authority(state: &SharedState, room: &str, participant: &str) -> bool {
    let Some(directory) = state.directory().await else {
        warn!(room = %room, "room directory unavailable, refusing playback authority");
        return false;
    };
    match directory.admin_of(room).await {
        Ok(admin) => admin.as_deref() == Some(participant),
        Err(err) => {
            warn!(room = %room, error = %err, "failed to resolve room admin");
            false
        }
    }
}

/// Relay a raw frame to every other member of the room.
fn relay_to_others(state: &SharedState, room: &str, sender: &str, raw: &str) {
    for peer in state.registry().peers(room) {
        if peer.participant == sender {
            continue;
        }
        send_raw(room, &peer, raw);
    }
}

/// Relay a raw frame to every member of the room, sender included.
fn relay_to_room(state: &SharedState, room: &str, raw: &str) {
    for peer in state.registry().peers(room) {
        send_raw(room, &peer, raw);
    }
}

/// Push a raw frame to one peer, logging the skip when its writer is gone.
fn send_raw(room: &str, peer: &PeerHandle, raw: &str) {
    if peer.tx.send(Message::Text(raw.to_string().into())).is_err() {
        debug!(room = %room, participant = %peer.participant, "skipping dead peer during relay");
    }
}

/// Forward a raw frame to the room admin's connection only.
async fn forward_to_admin(state: &SharedState, room: &str, sender: &str, raw: &str) {
    let Some(directory) = state.directory().await else {
        return;
    };
    let admin = match directory.admin_of(room).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            debug!(room = %room, "state request with no room admin");
            return;
        }
        Err(err) => {
            warn!(room = %room, error = %err, "failed to resolve room admin");
            return;
        }
    };
    if admin == sender {
        return;
    }
    let Some(peer) = state.registry().peer(room, &admin) else {
        debug!(room = %room, admin = %admin, "room admin not connected");
        return;
    };
    send_raw(room, &peer, raw);
}

/// Advance the room's track queue off the socket task.
fn advance_room_queue(directory: Arc<dyn RoomDirectory>, room: String, note: String) {
    tokio::spawn(async move {
        if let Err(err) = directory.advance_queue(&room).await {
            warn!(room = %room, error = %err, "failed to advance track queue");
        }
        if let Err(err) = directory.append_notification(&room, &note).await {
            warn!(room = %room, error = %err, "failed to append track notification");
        }
    });
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failure is permanent and only logged; a closed writer means
/// the disconnect path is already tearing the peer down.
fn send_event(tx: &mpsc::UnboundedSender<Message>, event: &ServerEvent) {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize event `{event:?}`");
            return;
        }
    };
    if tx.send(Message::Text(payload.into())).is_err() {
        debug!("skipping dead peer during event delivery");
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
