//! Gameplay timings and radii shared by both peers. Changing any of these
//! breaks compatibility with peers running the old values.

use crate::Millis;

/// Minimum time between two steps of the same player.
pub const MOVE_COOLDOWN: Millis = 150;

/// Minimum time between two attacks of the same player.
pub const ATTACK_COOLDOWN: Millis = 2000;

pub const RANDOM_ATTACK_RADIUS: u8 = 2;
pub const PRECISION_ATTACK_RADIUS: u8 = 1;
pub const RANDOM_ATTACK_STUN: Millis = 750;
pub const PRECISION_ATTACK_STUN: Millis = 2000;

/// Stun after stepping on an unshielded mine, followed by a teleport to spawn.
pub const MINE_HIT_STUN: Millis = 1500;

/// Stun for flagging a tile that is not a mine.
pub const WRONG_FLAG_STUN: Millis = 500;

pub const POWER_UP_SPAWN_INTERVAL: Millis = 15_000;
pub const POWER_UP_MAX_ON_BOARD: usize = 3;

/// Power-ups never spawn within this Chebyshev distance of a player.
pub const POWER_UP_PLAYER_CLEARANCE: u8 = 2;

/// Delay between picking up a power-up and its activation.
pub const POWER_UP_ACTIVATION_DELAY: Millis = 2000;

pub const FIREWALL_DURATION: Millis = 30_000;
pub const REINFORCE_RADIUS: u8 = 2;
pub const DRAIN_RADIUS: u8 = 3;

/// Mines are never placed within this Chebyshev distance of a spawn.
pub const SPAWN_CLEARANCE: u8 = 1;

/// Radius of the scorch blast around a detonated mine (3×3).
pub const BLAST_RADIUS: u8 = 1;
