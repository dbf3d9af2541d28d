#![no_std]

extern crate alloc;

use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use mineblown_protocol::PowerUpKind;

pub use ai::*;
pub use analysis::*;
pub use command::*;
pub use effects::*;
pub use attack::AttackGate;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use player::*;
pub use session::*;
pub use sync::*;
pub use tile::*;
pub use types::*;

pub mod rules;

mod ai;
mod analysis;
mod attack;
mod command;
mod effects;
mod engine;
mod error;
mod generator;
mod player;
mod powerup;
mod session;
mod sync;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mine_density: f64,
}

impl GameConfig {
    pub const STANDARD_SIZE: Coord2 = (24, 24);
    pub const STANDARD_DENSITY: f64 = 0.15;

    pub const fn standard() -> Self {
        Self {
            size: Self::STANDARD_SIZE,
            mine_density: Self::STANDARD_DENSITY,
        }
    }

    /// Spawns sit in opposite corners, so the board must be at least 2×2 and
    /// the density a fraction in `[0, 1)`.
    pub fn new(size: Coord2, mine_density: f64) -> Result<Self> {
        let config = Self { size, mine_density };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let (x, y) = self.size;
        let density_ok = self.mine_density.is_finite() && (0.0..1.0).contains(&self.mine_density);
        if x < 2 || y < 2 || !density_ok {
            return Err(GameError::InvalidConfig);
        }
        Ok(())
    }

    pub const fn total_tiles(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// `floor(W * H * density)`.
    pub fn mine_count(&self) -> CellCount {
        // float to int casts truncate, which is floor for non-negative values
        (f64::from(self.total_tiles()) * self.mine_density) as CellCount
    }

    pub const fn spawn(&self, player: PlayerId) -> Coord2 {
        match player {
            PlayerId::One => (0, 0),
            PlayerId::Two => (self.size.0.saturating_sub(1), self.size.1.saturating_sub(1)),
        }
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        coords.0 < self.size.0 && coords.1 < self.size.1
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Where the mines are. Produced by a [`MinefieldGenerator`] or built by hand
/// for custom boards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn size(&self) -> Coord2 {
        dim_to_size(self.mine_mask.dim())
    }

    pub fn total_tiles(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap_or(CellCount::MAX)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_tile_count(&self) -> CellCount {
        self.total_tiles() - self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        // at most eight neighbors, always fits
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count() as u8
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.mine_mask[(x as usize, y as usize)]
    }
}

impl IndexMut<Coord2> for MineLayout {
    fn index_mut(&mut self, (x, y): Coord2) -> &mut Self::Output {
        &mut self.mine_mask[(x as usize, y as usize)]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    /// A neutral revealed tile changed hands.
    Claimed,
    /// One or more safe tiles were revealed.
    Revealed { tiles: CellCount },
    /// A shield absorbed the mine; only the mine tile was revealed.
    Absorbed,
    Detonated,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Flagged,
    /// Not a mine; the flagger was stunned.
    WrongFlag,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    NoChange,
    Moved(Coord2),
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttackOutcome {
    /// No ammunition, stunned, or still cooling down.
    Gated,
    /// The opponent has no territory to aim at; nothing was spent.
    NoTarget,
    /// The opponent's shield ate a precision attack.
    Absorbed,
    Landed { center: Coord2, converted: CellCount },
}

impl AttackOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Absorbed | Self::Landed { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerUpOutcome {
    /// Reinforce or drain without any tile to aim at.
    NoTarget,
    Applied { center: Option<Coord2>, tiles: CellCount },
}
