use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{Millis, PowerUpKind};

/// One of the two sides of a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [Self::One, Self::Two];

    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Player number as used on the wire (`1` or `2`).
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub const fn scorch_bit(self) -> ScorchMask {
        match self {
            Self::One => ScorchMask::PLAYER_ONE,
            Self::Two => ScorchMask::PLAYER_TWO,
        }
    }
}

/// Canonical player-visible state of a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    Hidden,
    Revealed,
    Flagged,
}

impl Default for TileState {
    fn default() -> Self {
        Self::Hidden
    }
}

bitflags! {
    /// Which players a tile is scorched for. Detonations always scorch for both.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ScorchMask: u8 {
        const PLAYER_ONE = 0b01;
        const PLAYER_TWO = 0b10;
        const BOTH = Self::PLAYER_ONE.bits() | Self::PLAYER_TWO.bits();
    }
}

/// Short-lived marker left where a power-up was picked up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundMarker {
    pub kind: PowerUpKind,
    pub until: Millis,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub mine: bool,
    pub adjacency: u8,
    pub state: TileState,
    pub owner: Option<PlayerId>,
    pub flagged_by: Option<PlayerId>,
    pub scorched: ScorchMask,
    pub power_up: Option<PowerUpKind>,
    pub found: Option<FoundMarker>,
    pub reinforced: bool,
}

impl Tile {
    pub fn is_scorched(&self) -> bool {
        !self.scorched.is_empty()
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.state, TileState::Hidden)
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, TileState::Revealed)
    }

    /// Revealed territory of `player`; only these tiles can be attacked,
    /// reinforced or drained.
    pub fn is_territory_of(&self, player: PlayerId) -> bool {
        self.is_revealed() && self.owner == Some(player)
    }

    /// Safe tile that counts towards the end of the match.
    pub fn is_resolved_safe(&self) -> bool {
        !self.mine && (self.is_revealed() || self.is_scorched())
    }

    /// Revealed safe tile nobody owns, which any player can claim by stepping on it.
    pub fn is_neutral(&self) -> bool {
        self.is_revealed() && !self.mine && self.owner.is_none()
    }

    /// Hidden tile that can still be revealed.
    pub fn is_open_hidden(&self) -> bool {
        self.is_hidden() && !self.is_scorched()
    }

    /// The mine on this tile is visible to both players.
    pub fn is_known_mine(&self) -> bool {
        self.mine && (!self.is_hidden() || self.is_scorched())
    }

    pub fn found_marker(&self, now: Millis) -> Option<PowerUpKind> {
        self.found
            .filter(|marker| now < marker.until)
            .map(|marker| marker.kind)
    }
}
