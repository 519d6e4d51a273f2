//! Message contract for the room WebSocket: the inbound tagged union clients
//! send and the outbound events the relay emits.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_identity;
use crate::games::rules::GameKind;

/// Identity carried on the WebSocket upgrade request's query string.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConnectParams {
    /// Participant id joining the room.
    #[validate(custom(function = validate_identity))]
    pub username: String,
    /// Room the connection belongs to.
    #[serde(rename = "roomId")]
    #[validate(custom(function = validate_identity))]
    pub room_id: String,
}

/// Authoritative playback announcement emitted by the room admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlaybackState {
    /// Whether the admin's player is currently playing.
    #[serde(rename = "isPlaying")]
    pub is_playing: bool,
    /// Playback position of the admin's player, in seconds.
    #[serde(rename = "positionSeconds")]
    pub position_seconds: f64,
    /// Participant id of the announcing admin.
    #[serde(rename = "adminId")]
    pub admin_id: String,
    /// Milliseconds since the Unix epoch when the announcement was produced.
    pub timestamp: u64,
}

/// Immediate scrub announcement, bypassing the periodic tick interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeekTo {
    /// Target position of the scrub, in seconds.
    #[serde(rename = "positionSeconds")]
    pub position_seconds: f64,
    /// Participant id of the announcing admin.
    #[serde(rename = "adminId")]
    pub admin_id: String,
}

/// One-shot end-of-track signal from the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackEnded {
    /// Participant id of the announcing admin.
    #[serde(rename = "adminId")]
    pub admin_id: String,
    /// Human-readable notice forwarded to the room feed.
    pub message: String,
}

/// Messages accepted from room WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Fan a game invitation out to every other room member.
    #[serde(rename = "joinQueue")]
    JoinQueue {
        /// Game type the initiator wants to play.
        #[serde(rename = "gameId")]
        game: GameKind,
    },
    /// Accept a pending invitation from `from`.
    #[serde(rename = "acceptInvite")]
    AcceptInvite {
        /// Game type of the invitation.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Participant who sent the invitation.
        from: String,
    },
    /// Reject a pending invitation from `from`.
    #[serde(rename = "rejectInvite")]
    RejectInvite {
        /// Game type of the invitation.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Participant who sent the invitation.
        from: String,
    },
    /// Withdraw every invitation the sender has outstanding for a game type.
    #[serde(rename = "cancelInvites")]
    CancelInvites {
        /// Game type of the invitations.
        #[serde(rename = "gameId")]
        game: GameKind,
    },
    /// Play a move in the sender's active session. The grid game addresses
    /// cells through `index`, the drop-piece game columns through `col`.
    #[serde(rename = "move")]
    Move {
        /// Game type the move targets.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Grid cell index, 0..9.
        #[serde(default)]
        index: Option<usize>,
        /// Drop column index, 0..7.
        #[serde(default)]
        col: Option<usize>,
    },
    /// Restart the session with the same two players.
    #[serde(rename = "reset")]
    Reset {
        /// Game type of the session.
        #[serde(rename = "gameId")]
        game: GameKind,
    },
    /// Periodic authoritative playback announcement (admin only).
    #[serde(rename = "playbackState")]
    PlaybackState(PlaybackState),
    /// Immediate scrub announcement (admin only).
    #[serde(rename = "seekTo")]
    SeekTo(SeekTo),
    /// Ask the admin for an immediate playback announcement.
    #[serde(rename = "requestState")]
    RequestState,
    /// Signal that the current track finished (admin only).
    #[serde(rename = "trackEnded")]
    TrackEnded(TrackEnded),
    /// Catch-all for message types this relay does not handle.
    #[serde(other)]
    Unknown,
}

/// Board snapshot as it appears on the wire: token labels or null per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum BoardView {
    /// Flat 9-cell grid board.
    Grid(Vec<Option<String>>),
    /// Drop-piece board, rows top to bottom.
    Rows(Vec<Vec<Option<String>>>),
}

/// Events the relay pushes to room clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A game invitation delivered to one invitee.
    #[serde(rename = "gameInvite")]
    GameInvite {
        /// Game type of the invitation.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Inviting participant.
        from: String,
        /// Stable identifier of this invitation.
        #[serde(rename = "inviteId")]
        invite_id: String,
        /// Milliseconds since the Unix epoch when the invite was created.
        timestamp: u64,
    },
    /// Confirmation to the initiator that invitations went out.
    #[serde(rename = "inviteSent")]
    InviteSent {
        /// Game type of the invitations.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Human-readable confirmation.
        message: String,
    },
    /// An invitation was rejected; sent to both inviter and rejecter.
    #[serde(rename = "inviteRejected")]
    InviteRejected {
        /// Game type of the invitation.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Rejecting participant (present on the inviter's copy only).
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(default)]
        from: Option<String>,
        /// Human-readable notice.
        message: String,
    },
    /// The initiator withdrew an invitation before it was answered.
    #[serde(rename = "inviteCancelled")]
    InviteCancelled {
        /// Game type of the invitation.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Withdrawing participant.
        from: String,
        /// Human-readable notice.
        message: String,
    },
    /// Every invitation for the game type is gone without an acceptance.
    #[serde(rename = "noAcceptances")]
    NoAcceptances {
        /// Game type of the invitations.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Human-readable notice.
        message: String,
    },
    /// A session is starting for the two listed players.
    #[serde(rename = "gameStart")]
    GameStart {
        /// Game type of the session.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Human-readable notice.
        message: String,
        /// The two players; index 0 owns the opening token.
        players: Vec<String>,
    },
    /// Full session snapshot after any successful state change.
    #[serde(rename = "gameState")]
    GameState {
        /// Game type of the session.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Current board contents.
        board: BoardView,
        /// Token label of the seat whose turn it is.
        player: String,
        /// Winning token label, "Tie", or null while the game is open.
        winner: Option<String>,
        /// The two players; index 0 owns the opening token.
        players: Vec<String>,
    },
    /// Generic game notice addressed to a single participant or the room.
    #[serde(rename = "gameUpdate")]
    GameUpdate {
        /// Game type the notice concerns.
        #[serde(rename = "gameId")]
        game: GameKind,
        /// Human-readable notice.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_move_parses_grid_and_column_variants() {
        let grid: ClientMessage =
            serde_json::from_str(r#"{"type":"move","gameId":"tic-tac-toe","index":4}"#).unwrap();
        assert_eq!(
            grid,
            ClientMessage::Move {
                game: GameKind::TicTacToe,
                index: Some(4),
                col: None,
            }
        );

        let drop: ClientMessage =
            serde_json::from_str(r#"{"type":"move","gameId":"connect-four","col":6}"#).unwrap();
        assert_eq!(
            drop,
            ClientMessage::Move {
                game: GameKind::ConnectFour,
                index: None,
                col: Some(6),
            }
        );
    }

    #[test]
    fn unrecognized_type_falls_back_to_unknown() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"test","message":"ping"}"#).unwrap();
        assert_eq!(message, ClientMessage::Unknown);
    }

    #[test]
    fn playback_state_round_trips_wire_names() {
        let raw = r#"{"type":"playbackState","isPlaying":true,"positionSeconds":12.5,"adminId":"alice","timestamp":1700000000000}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();
        let ClientMessage::PlaybackState(state) = &message else {
            panic!("expected playbackState, got {message:?}");
        };
        assert!(state.is_playing);
        assert_eq!(state.admin_id, "alice");

        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(encoded["type"], "playbackState");
        assert_eq!(encoded["positionSeconds"], 12.5);
    }

    #[test]
    fn game_state_event_serializes_nullable_winner() {
        let event = ServerEvent::GameState {
            game: GameKind::TicTacToe,
            board: BoardView::Grid(vec![None; 9]),
            player: "X".into(),
            winner: None,
            players: vec!["alice".into(), "bob".into()],
        };
        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["type"], "gameState");
        assert_eq!(encoded["gameId"], "tic-tac-toe");
        assert!(encoded["winner"].is_null());
    }
}
