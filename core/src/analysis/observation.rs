use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// What a player can see of one tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedCell {
    Unknown,
    /// Revealed safe tile showing its adjacency.
    Clue(u8),
    /// Flagged, detonated, shield-absorbed, or exposed by a blast.
    KnownMine,
    /// Safe tile exposed by a blast; out of play but not a clue.
    KnownSafe,
}

impl ObservedCell {
    pub fn from_tile(tile: &Tile) -> Self {
        if tile.is_known_mine() {
            Self::KnownMine
        } else if tile.is_revealed() {
            Self::Clue(tile.adjacency)
        } else if tile.is_scorched() {
            Self::KnownSafe
        } else {
            Self::Unknown
        }
    }

    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Player-visible view of the board. Hidden mines never leak into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub size: Coord2,
    pub cells: Array2<ObservedCell>,
}

impl Observation {
    pub fn from_engine(engine: &Engine) -> Self {
        let size = engine.size();
        let cells = engine.tiles().map(ObservedCell::from_tile);
        Self { size, cells }
    }

    pub fn cell(&self, coords: Coord2) -> ObservedCell {
        self.cells[coords.to_nd_index()]
    }
}
