use alloc::string::String;
use mineblown_protocol::{self as protocol, ClientRequest, GameEvent, PeerFrame, RelayNotice};
use serde::{Deserialize, Serialize};

use crate::*;

/// Event telling the other peer about a local command, if it needs to hear
/// about it. Moves and attacks travel only when they changed something;
/// reveals and flags always do.
pub fn command_event(command: Command, outcome: CommandOutcome, position: Coord2) -> Option<GameEvent> {
    let (x, y) = position;
    match (command, outcome) {
        (_, CommandOutcome::Move(MoveOutcome::Moved((x, y)))) => Some(GameEvent::Move { x, y }),
        (_, CommandOutcome::Reveal(_)) => Some(GameEvent::Reveal { x, y }),
        (_, CommandOutcome::Flag(_)) => Some(GameEvent::Flag { x, y }),
        (
            Command::RandomAttack,
            CommandOutcome::Attack(AttackOutcome::Landed {
                center: (cx, cy), ..
            }),
        ) => Some(GameEvent::RandomAttack { cx, cy }),
        (Command::PrecisionAttack, CommandOutcome::Attack(outcome)) if outcome.has_update() => {
            Some(GameEvent::PrecisionAttack)
        }
        _ => None,
    }
}

pub fn spawn_event((x, y): Coord2, kind: PowerUpKind) -> GameEvent {
    GameEvent::PowerupSpawn { x, y, kind }
}

pub fn activation_event(kind: PowerUpKind, center: Option<Coord2>) -> GameEvent {
    GameEvent::PowerupActivate {
        kind,
        cx: center.map(|(x, _)| x),
        cy: center.map(|(_, y)| y),
    }
}

/// Applies an event produced by `player`'s own peer. Random centers are taken
/// from the event, never rolled again, and attacks skip the clock checks the
/// originator already made.
pub fn replay_event(engine: &mut Engine, player: PlayerId, event: &GameEvent, now: Millis) -> Result<()> {
    match *event {
        GameEvent::Move { x, y } => {
            engine.place_player(player, (x, y))?;
        }
        GameEvent::Reveal { x, y } => {
            engine.reveal(player, (x, y), now)?;
        }
        GameEvent::Flag { x, y } => {
            engine.flag(player, (x, y), now)?;
        }
        GameEvent::RandomAttack { cx, cy } => {
            engine.random_attack(player, (cx, cy), AttackGate::Trusted, now)?;
        }
        GameEvent::PrecisionAttack => {
            engine.precision_attack(player, AttackGate::Trusted, now)?;
        }
        GameEvent::PowerupSpawn { x, y, kind } => engine.place_power_up((x, y), kind)?,
        GameEvent::PowerupActivate { kind, cx, cy } => {
            engine.apply_power_up(player, kind, cx.zip(cy), now)?;
        }
    }
    Ok(())
}

/// Wraps an event in the envelope the relay forwards.
pub fn event_frame(event: &GameEvent) -> protocol::Result<String> {
    protocol::encode(&PeerFrame::Event { data: event.clone() })
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchmakingState {
    #[default]
    Connecting,
    Waiting,
    RoomCreated {
        code: String,
    },
    RoomNotFound,
    Matched {
        local: PlayerId,
        seed: u32,
    },
    /// The socket closed before a match was made.
    Failed,
}

/// Client side of the relay handshake, up to the `matched` notice.
#[derive(Clone, Debug, Default)]
pub struct MatchmakingClient {
    state: MatchmakingState,
}

impl MatchmakingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MatchmakingState {
        &self.state
    }

    /// Local player and board seed, once matched.
    pub fn matched(&self) -> Option<(PlayerId, u32)> {
        match self.state {
            MatchmakingState::Matched { local, seed } => Some((local, seed)),
            _ => None,
        }
    }

    /// Frame for `request`. Room codes are normalized before they are sent.
    pub fn request(&self, request: &ClientRequest) -> protocol::Result<String> {
        match request {
            ClientRequest::JoinRoom { code } => protocol::encode(&ClientRequest::JoinRoom {
                code: protocol::normalize_room_code(code)?,
            }),
            other => protocol::encode(other),
        }
    }

    /// Feeds one relay frame. Returns the match once it is made.
    pub fn handle_text(&mut self, text: &str) -> Option<(PlayerId, u32)> {
        if self.matched().is_some() {
            log::debug!("Already matched, ignoring {}", text);
            return None;
        }

        let notice = match protocol::decode::<RelayNotice>(text) {
            Ok(notice) => notice,
            Err(err) => {
                log::debug!("Dropping relay frame: {}", err);
                return None;
            }
        };

        match notice {
            RelayNotice::Waiting => self.state = MatchmakingState::Waiting,
            RelayNotice::RoomCreated { code } => self.state = MatchmakingState::RoomCreated { code },
            RelayNotice::RoomNotFound => self.state = MatchmakingState::RoomNotFound,
            RelayNotice::Matched { player_num, seed } => match PlayerId::from_number(player_num) {
                Some(local) => {
                    log::debug!("Matched as {:?} with seed {}", local, seed);
                    self.state = MatchmakingState::Matched { local, seed };
                    return Some((local, seed));
                }
                None => log::debug!("Ignoring match with player number {}", player_num),
            },
            RelayNotice::OpponentLeft => log::debug!("Opponent left before the match started"),
        }
        None
    }

    pub fn connection_lost(&mut self) {
        if self.matched().is_none() {
            self.state = MatchmakingState::Failed;
        }
    }
}
