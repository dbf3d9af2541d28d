//! Wire format shared by the relay and the game clients.
//!
//! Every frame is a JSON text message with a `type` tag. Before a match the
//! relay parses [`ClientRequest`]s and answers with [`RelayNotice`]s; after a
//! match it forwards [`PeerFrame`]s between the two peers without looking at
//! them.

#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters allowed in a room code. Visually confusable ones (`I`, `O`,
/// `0`, `1`) are left out.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(String),
    #[error("Frame could not be encoded: {0}")]
    Encode(String),
    #[error("Invalid room code")]
    InvalidRoomCode,
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Power-up kinds as they appear on the wire (`"shield"`, `"firewall"`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Shield,
    Firewall,
    Reinforce,
    Drain,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [Self::Shield, Self::Firewall, Self::Reinforce, Self::Drain];

    /// Whether activating this kind needs a board position picked at random.
    pub const fn needs_center(self) -> bool {
        matches!(self, Self::Reinforce | Self::Drain)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Shield => "Shield",
            Self::Firewall => "Firewall",
            Self::Reinforce => "Reinforce",
            Self::Drain => "Drain",
        }
    }
}

/// Client to relay, only meaningful before a match is made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Quickmatch,
    CreateRoom,
    JoinRoom { code: String },
}

/// Relay to client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayNotice {
    Waiting,
    RoomCreated {
        code: String,
    },
    RoomNotFound,
    Matched {
        #[serde(rename = "playerNum")]
        player_num: u8,
        seed: u32,
    },
    OpponentLeft,
}

/// Gameplay event produced by one peer and replayed by the other.
///
/// Actions whose target is random (random attack, reinforce, drain) always
/// carry the center the originator already resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Move {
        x: u8,
        y: u8,
    },
    Reveal {
        x: u8,
        y: u8,
    },
    Flag {
        x: u8,
        y: u8,
    },
    #[serde(rename = "rndatk")]
    RandomAttack {
        cx: u8,
        cy: u8,
    },
    #[serde(rename = "precatk")]
    PrecisionAttack,
    PowerupSpawn {
        x: u8,
        y: u8,
        #[serde(rename = "puType")]
        kind: PowerUpKind,
    },
    PowerupActivate {
        #[serde(rename = "puType")]
        kind: PowerUpKind,
        #[serde(default)]
        cx: Option<u8>,
        #[serde(default)]
        cy: Option<u8>,
    },
}

/// Peer to peer envelope, relayed verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerFrame {
    Event { data: GameEvent },
}

/// Anything a client can receive from its socket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Notice(RelayNotice),
    Peer(PeerFrame),
}

pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    serde_json::to_string(message).map_err(|err| ProtocolError::Encode(err.to_string()))
}

pub fn decode<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T> {
    serde_json::from_str(text).map_err(|err| ProtocolError::Malformed(err.to_string()))
}

/// Uppercases `raw` and checks it against the room code alphabet and length.
pub fn normalize_room_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = code.len() == ROOM_CODE_LEN && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
    if valid {
        Ok(code)
    } else {
        Err(ProtocolError::InvalidRoomCode)
    }
}
