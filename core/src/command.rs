use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Step from `coords`, if it stays on a board of `bounds`.
    pub fn step(self, coords: Coord2, bounds: Coord2) -> Option<Coord2> {
        apply_delta(coords, self.delta(), bounds)
    }
}

/// The action primitives shared by every input source. Reveal and flag act on
/// the player's own tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    Reveal,
    Flag,
    RandomAttack,
    PrecisionAttack,
}

/// Result of a [`Command`], whichever rule handled it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Move(MoveOutcome),
    Reveal(RevealOutcome),
    Flag(FlagOutcome),
    Attack(AttackOutcome),
}

impl CommandOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::Move(outcome) => outcome.has_update(),
            Self::Reveal(outcome) => outcome.has_update(),
            Self::Flag(outcome) => outcome.has_update(),
            Self::Attack(outcome) => outcome.has_update(),
        }
    }
}
