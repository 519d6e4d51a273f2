//! Turn-based game engine: one invitation/session lifecycle shared by every
//! game type, parameterized by the [`rules::GameRules`] strategy.
//!
//! The engine never touches sockets. Every operation returns [`Directive`]
//! values describing who should receive which [`ServerEvent`]; the socket
//! layer delivers them. Invalid input (stale invites, out-of-turn moves,
//! illegal slots) yields no directives and mutates nothing.

pub mod rules;

use std::collections::HashMap;

use indexmap::IndexSet;
use time::OffsetDateTime;

use crate::dto::unix_millis;
use crate::dto::ws::{BoardView, ServerEvent};
use rules::{Board, GameKind, MoveSlot, Outcome, Token};

/// Lifecycle phase of one (room, game type) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyPhase {
    /// No session and no outstanding invitations.
    Idle,
    /// One invitation round is outstanding.
    Inviting,
    /// A session exists and has no winner yet.
    Active,
    /// The session finished; a reset or a fresh invite cycle follows.
    Resolved,
}

/// A delivery instruction produced by an engine operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Send the event to a single participant.
    ToPlayer {
        /// Recipient participant id.
        participant: String,
        /// Event payload.
        event: ServerEvent,
    },
    /// Send the event to every connection in the room.
    ToRoom {
        /// Event payload.
        event: ServerEvent,
    },
}

/// One outstanding invitation round: a single inviter, fan-out to the room.
#[derive(Debug, Clone)]
struct InviteRound {
    inviter: String,
    invitees: IndexSet<String>,
    created_at: OffsetDateTime,
}

/// An active or resolved two-player session.
#[derive(Debug, Clone, PartialEq)]
struct GameSession {
    /// Seat order; index 0 (the inviter) owns the opening token.
    players: [String; 2],
    turn: Token,
    board: Board,
    winner: Option<Outcome>,
}

impl GameSession {
    fn new(kind: GameKind, players: [String; 2]) -> Self {
        Self {
            players,
            turn: Token::First,
            board: kind.rules().initial_board(),
            winner: None,
        }
    }

    fn seat_of(&self, participant: &str) -> Option<Token> {
        if self.players[0] == participant {
            Some(Token::First)
        } else if self.players[1] == participant {
            Some(Token::Second)
        } else {
            None
        }
    }
}

type LobbyKey = (String, GameKind);

/// Per-room, per-game-type invitation and session state.
///
/// All methods take `&mut self`; the owner must funnel calls through a single
/// serialization point (the relay holds the engine behind one mutex) so each
/// transition observes and produces a consistent state.
#[derive(Debug, Default)]
pub struct GameEngine {
    invites: HashMap<LobbyKey, InviteRound>,
    sessions: HashMap<LobbyKey, GameSession>,
}

impl GameEngine {
    /// Create an engine with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle phase of a (room, game type) pair.
    pub fn phase(&self, room: &str, kind: GameKind) -> LobbyPhase {
        let key = (room.to_string(), kind);
        if self.invites.contains_key(&key) {
            return LobbyPhase::Inviting;
        }
        match self.sessions.get(&key) {
            Some(session) if session.winner.is_none() => LobbyPhase::Active,
            Some(_) => LobbyPhase::Resolved,
            None => LobbyPhase::Idle,
        }
    }

    /// Fan an invitation out to every other room member.
    ///
    /// `members` is the room's current participant set as the registry sees
    /// it; the initiator is excluded from the fan-out. A round that is
    /// already outstanding makes this a no-op; an empty room yields only a
    /// local acknowledgment to the initiator.
    pub fn join_queue(
        &mut self,
        room: &str,
        initiator: &str,
        kind: GameKind,
        members: &[String],
    ) -> Vec<Directive> {
        let key = (room.to_string(), kind);
        if self.invites.contains_key(&key) {
            return Vec::new();
        }

        let invitees: IndexSet<String> = members
            .iter()
            .filter(|member| member.as_str() != initiator)
            .cloned()
            .collect();

        if invitees.is_empty() {
            return vec![Directive::ToPlayer {
                participant: initiator.to_string(),
                event: ServerEvent::GameUpdate {
                    game: kind,
                    message: "No other members in the room to invite".to_string(),
                },
            }];
        }

        let round = InviteRound {
            inviter: initiator.to_string(),
            invitees,
            created_at: OffsetDateTime::now_utc(),
        };
        let timestamp = unix_millis(round.created_at);

        let mut directives: Vec<Directive> = round
            .invitees
            .iter()
            .map(|invitee| Directive::ToPlayer {
                participant: invitee.clone(),
                event: ServerEvent::GameInvite {
                    game: kind,
                    from: initiator.to_string(),
                    invite_id: format!("{room}-{kind}-{initiator}-{invitee}"),
                    timestamp,
                },
            })
            .collect();

        directives.push(Directive::ToPlayer {
            participant: initiator.to_string(),
            event: ServerEvent::InviteSent {
                game: kind,
                message: format!(
                    "Game invitations sent to {} room members",
                    round.invitees.len()
                ),
            },
        });

        self.invites.insert(key, round);
        directives
    }

    /// Convert one invitation into a session.
    ///
    /// Valid only while an invitation from `inviter` to `accepter` is
    /// outstanding. Every sibling invitation for the round is destroyed: only
    /// one invitation can ever convert to a game. A stale or missing
    /// invitation is a silent no-op.
    pub fn accept_invite(
        &mut self,
        room: &str,
        accepter: &str,
        kind: GameKind,
        inviter: &str,
    ) -> Vec<Directive> {
        let key = (room.to_string(), kind);
        let valid = self
            .invites
            .get(&key)
            .is_some_and(|round| round.inviter == inviter && round.invitees.contains(accepter));
        if !valid {
            return Vec::new();
        }
        self.invites.remove(&key);

        let session = GameSession::new(kind, [inviter.to_string(), accepter.to_string()]);
        let state = snapshot_event(kind, &session);
        self.sessions.insert(key, session);

        vec![
            Directive::ToRoom {
                event: ServerEvent::GameStart {
                    game: kind,
                    message: format!("Game starting for {kind}"),
                    players: vec![inviter.to_string(), accepter.to_string()],
                },
            },
            Directive::ToRoom { event: state },
        ]
    }

    /// Reject a single invitation, notifying both parties.
    ///
    /// When the last invitation of the round disappears the round is closed
    /// and the inviter learns that no one accepted.
    pub fn reject_invite(
        &mut self,
        room: &str,
        rejecter: &str,
        kind: GameKind,
        inviter: &str,
    ) -> Vec<Directive> {
        let key = (room.to_string(), kind);
        let Some(round) = self.invites.get_mut(&key) else {
            return Vec::new();
        };
        if round.inviter != inviter || !round.invitees.shift_remove(rejecter) {
            return Vec::new();
        }

        let mut directives = vec![
            Directive::ToPlayer {
                participant: inviter.to_string(),
                event: ServerEvent::InviteRejected {
                    game: kind,
                    from: Some(rejecter.to_string()),
                    message: format!("{rejecter} rejected your game invitation"),
                },
            },
            Directive::ToPlayer {
                participant: rejecter.to_string(),
                event: ServerEvent::InviteRejected {
                    game: kind,
                    from: None,
                    message: "You rejected the game invitation".to_string(),
                },
            },
        ];

        if round.invitees.is_empty() {
            self.invites.remove(&key);
            directives.push(Directive::ToPlayer {
                participant: inviter.to_string(),
                event: ServerEvent::NoAcceptances {
                    game: kind,
                    message: "No one accepted your game invitation".to_string(),
                },
            });
        }

        directives
    }

    /// Withdraw the initiator's outstanding invitation round.
    ///
    /// Every still-pending invitee is told the invitation is gone; the
    /// initiator receives a closing acknowledgment. Only the round's own
    /// inviter may cancel it.
    pub fn cancel_invites(&mut self, room: &str, initiator: &str, kind: GameKind) -> Vec<Directive> {
        let key = (room.to_string(), kind);
        if !self
            .invites
            .get(&key)
            .is_some_and(|round| round.inviter == initiator)
        {
            return Vec::new();
        }
        let Some(round) = self.invites.remove(&key) else {
            return Vec::new();
        };

        let mut directives: Vec<Directive> = round
            .invitees
            .iter()
            .map(|invitee| Directive::ToPlayer {
                participant: invitee.clone(),
                event: ServerEvent::InviteCancelled {
                    game: kind,
                    from: initiator.to_string(),
                    message: format!("Game invitation for {kind} cancelled by {initiator}"),
                },
            })
            .collect();

        directives.push(Directive::ToPlayer {
            participant: initiator.to_string(),
            event: ServerEvent::NoAcceptances {
                game: kind,
                message: "Game invitation cancelled".to_string(),
            },
        });

        directives
    }

    /// Apply a move for `player` in the room's active session.
    ///
    /// The move is accepted only when a session exists with no winner, the
    /// player holds the current turn token, and the slot is legal for the
    /// game type. Win detection runs before the snapshot broadcast. Anything
    /// else is a silent no-op with no state mutation.
    pub fn apply_move(
        &mut self,
        room: &str,
        player: &str,
        kind: GameKind,
        slot: MoveSlot,
    ) -> Vec<Directive> {
        let key = (room.to_string(), kind);
        let Some(session) = self.sessions.get_mut(&key) else {
            return Vec::new();
        };
        if session.winner.is_some() {
            return Vec::new();
        }
        let Some(seat) = session.seat_of(player) else {
            return Vec::new();
        };
        if seat != session.turn {
            return Vec::new();
        }

        let rules = kind.rules();
        if !rules.apply_move(&mut session.board, seat, slot) {
            return Vec::new();
        }
        session.turn = session.turn.other();
        session.winner = rules.check_winner(&session.board);

        vec![Directive::ToRoom {
            event: snapshot_event(kind, session),
        }]
    }

    /// Restart the session with the same two players and a fresh board.
    ///
    /// Valid whenever a session exists, active or resolved.
    pub fn reset(&mut self, room: &str, kind: GameKind) -> Vec<Directive> {
        let key = (room.to_string(), kind);
        let Some(session) = self.sessions.get_mut(&key) else {
            return Vec::new();
        };
        *session = GameSession::new(kind, session.players.clone());

        vec![Directive::ToRoom {
            event: snapshot_event(kind, session),
        }]
    }

    /// Wire snapshot of the room's session for this game type, if one exists.
    pub fn session_snapshot(&self, room: &str, kind: GameKind) -> Option<ServerEvent> {
        self.sessions
            .get(&(room.to_string(), kind))
            .map(|session| snapshot_event(kind, session))
    }
}

/// Build the `gameState` event for a session.
fn snapshot_event(kind: GameKind, session: &GameSession) -> ServerEvent {
    let rules = kind.rules();
    let label = |token: Token| rules.token_label(token).to_string();

    let board = match &session.board {
        Board::Grid(cells) => BoardView::Grid(cells.iter().map(|cell| cell.map(label)).collect()),
        Board::Drop(rows) => BoardView::Rows(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.map(label)).collect())
                .collect(),
        ),
    };

    ServerEvent::GameState {
        game: kind,
        board,
        player: label(session.turn),
        winner: session.winner.map(|outcome| match outcome {
            Outcome::Won(token) => label(token),
            Outcome::Tie => "Tie".to_string(),
        }),
        players: session.players.to_vec(),
    }
}
