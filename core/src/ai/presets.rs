use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GameError, Millis, Result};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Practice,
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [Self::Practice, Self::Easy, Self::Medium, Self::Hard];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub const fn preset(self) -> AiPreset {
        match self {
            Self::Practice => AiPreset {
                tick: 450,
                analysis_interval: 4000,
                mistake_chance: 0.40,
                flag_chance: 0.40,
                hesitate_chance: 0.45,
                hesitation: (300, 600),
                attack_skip_chance: 0.90,
                attack_min_tiles: 20,
                precision_max_distance: 3,
                precision_min_tiles: 30,
                precision_min_mines: 4,
                random_min_tiles: 25,
                random_min_mines: 5,
                stockpile_mines: 6,
            },
            Self::Easy => AiPreset {
                tick: 300,
                analysis_interval: 2500,
                mistake_chance: 0.20,
                flag_chance: 0.65,
                hesitate_chance: 0.30,
                hesitation: (200, 400),
                attack_skip_chance: 0.65,
                attack_min_tiles: 12,
                precision_max_distance: 5,
                precision_min_tiles: 20,
                precision_min_mines: 2,
                random_min_tiles: 15,
                random_min_mines: 3,
                stockpile_mines: 4,
            },
            Self::Medium => AiPreset {
                tick: 220,
                analysis_interval: 1500,
                mistake_chance: 0.10,
                flag_chance: 0.80,
                hesitate_chance: 0.18,
                hesitation: (100, 250),
                attack_skip_chance: 0.45,
                attack_min_tiles: 8,
                precision_max_distance: 6,
                precision_min_tiles: 15,
                precision_min_mines: 1,
                random_min_tiles: 10,
                random_min_mines: 2,
                stockpile_mines: 3,
            },
            Self::Hard => AiPreset {
                tick: 160,
                analysis_interval: 800,
                mistake_chance: 0.04,
                flag_chance: 0.95,
                hesitate_chance: 0.08,
                hesitation: (50, 100),
                attack_skip_chance: 0.25,
                attack_min_tiles: 5,
                precision_max_distance: 8,
                precision_min_tiles: 10,
                precision_min_mines: 1,
                random_min_tiles: 8,
                random_min_mines: 1,
                stockpile_mines: 2,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownDifficulty;

impl fmt::Display for UnknownDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: practice, easy, medium, hard")
    }
}

impl core::error::Error for UnknownDifficulty {}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(UnknownDifficulty)
    }
}

/// Tuning of one difficulty level.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiPreset {
    /// Time between decisions.
    pub tick: Millis,
    /// Time between two board analyses.
    pub analysis_interval: Millis,
    /// Chance to wander to a random hidden tile instead of the best target.
    pub mistake_chance: f64,
    /// Chance to go after a known mine when one is available.
    pub flag_chance: f64,
    pub hesitate_chance: f64,
    /// `(base, spread)`: idle time after an action is `base` plus a uniform
    /// draw from `0..=spread`.
    pub hesitation: (Millis, Millis),
    /// Chance to pass on an otherwise possible attack.
    pub attack_skip_chance: f64,
    pub attack_min_tiles: u16,
    pub precision_max_distance: u16,
    pub precision_min_tiles: u16,
    pub precision_min_mines: u16,
    pub random_min_tiles: u16,
    pub random_min_mines: u16,
    /// Ammunition at which the AI fires random attacks regardless of targets.
    pub stockpile_mines: u16,
}

impl AiPreset {
    /// Every chance must be a probability.
    pub fn validate(&self) -> Result<()> {
        let chances = [
            self.mistake_chance,
            self.flag_chance,
            self.hesitate_chance,
            self.attack_skip_chance,
        ];
        if chances.iter().all(|chance| (0.0..=1.0).contains(chance)) {
            Ok(())
        } else {
            Err(GameError::InvalidPreset)
        }
    }
}
