use serde::{Deserialize, Serialize};

use crate::*;

/// Discrete feedback token emitted by the rules for audio and visual
/// collaborators. Effects never feed back into the simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// `adjacency` is the clue on the tile the reveal started from.
    Reveal { player: PlayerId, at: Coord2, tiles: CellCount, adjacency: u8 },
    Claim { player: PlayerId, at: Coord2 },
    Flag { player: PlayerId, at: Coord2 },
    FlagFail { player: PlayerId, at: Coord2 },
    Explosion { at: Coord2 },
    ShieldAbsorb { player: PlayerId },
    Stun { player: PlayerId, until: Millis },
    Teleport { player: PlayerId, to: Coord2 },
    RandomAttack { attacker: PlayerId, center: Coord2 },
    PrecisionAttack { attacker: PlayerId, center: Coord2 },
    PowerUpSpawn { at: Coord2, kind: PowerUpKind },
    PowerUpPickup { player: PlayerId, at: Coord2, kind: PowerUpKind },
    PowerUpActivate { player: PlayerId, kind: PowerUpKind },
    /// Attacked or drained tile, shaken briefly by the renderer.
    Rumble { at: Coord2 },
    GameOver { winner: Option<PlayerId> },
}

impl Effect {
    /// Sound cue name, matching the browser client's sound bank.
    pub const fn sound(&self) -> Option<&'static str> {
        Some(match self {
            Self::Reveal { adjacency: 0, .. } => "claim",
            Self::Reveal { .. } => "reveal",
            Self::Claim { .. } => "claim",
            Self::Flag { .. } => "flag",
            Self::FlagFail { .. } => "flagFail",
            Self::Explosion { .. } => "explosion",
            Self::ShieldAbsorb { .. } | Self::PowerUpActivate { .. } => "powerUpActivate",
            Self::Teleport { .. } => "teleport",
            Self::RandomAttack { .. } => "attackRandom",
            Self::PrecisionAttack { .. } => "attackPrecision",
            Self::PowerUpPickup { .. } => "powerUpPickup",
            Self::GameOver { .. } => "gameOver",
            Self::Stun { .. } | Self::PowerUpSpawn { .. } | Self::Rumble { .. } => return None,
        })
    }
}
