use alloc::collections::VecDeque;
use serde::{Deserialize, Serialize};

use crate::rules::{ATTACK_COOLDOWN, MOVE_COOLDOWN};
use crate::*;

/// A collected power-up waiting for its activation deadline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPowerUp {
    pub kind: PowerUpKind,
    pub activate_at: Millis,
}

/// Per-player state. Created once per session and reset in place between
/// games, so the identity of a player never changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub spawn: Coord2,
    pub position: Coord2,
    /// Can go negative through drains and attacks.
    pub score: i32,
    /// Attack ammunition, one per correctly flagged mine.
    pub mine_stock: u16,
    pub stun_until: Millis,
    pub last_move_at: Option<Millis>,
    pub last_attack_at: Option<Millis>,
    pub pending_power_ups: VecDeque<PendingPowerUp>,
    pub has_shield: bool,
    pub firewall_until: Millis,
    pub teleport_pending: bool,
}

impl Player {
    pub fn new(id: PlayerId, spawn: Coord2) -> Self {
        Self {
            id,
            spawn,
            position: spawn,
            score: 0,
            mine_stock: 0,
            stun_until: 0,
            last_move_at: None,
            last_attack_at: None,
            pending_power_ups: VecDeque::new(),
            has_shield: false,
            firewall_until: 0,
            teleport_pending: false,
        }
    }

    pub fn reset(&mut self, spawn: Coord2) {
        *self = Self::new(self.id, spawn);
    }

    pub fn is_stunned(&self, now: Millis) -> bool {
        now < self.stun_until
    }

    pub fn has_firewall(&self, now: Millis) -> bool {
        now < self.firewall_until
    }

    pub fn can_move(&self, now: Millis) -> bool {
        !self.is_stunned(now)
            && self
                .last_move_at
                .is_none_or(|at| now.saturating_sub(at) >= MOVE_COOLDOWN)
    }

    /// Ammunition, not stunned, and the attack cooldown has elapsed.
    pub fn can_attack(&self, now: Millis) -> bool {
        self.mine_stock > 0
            && !self.is_stunned(now)
            && self
                .last_attack_at
                .is_none_or(|at| now.saturating_sub(at) >= ATTACK_COOLDOWN)
    }

    /// Extends the stun to `until`; a longer running stun is kept.
    pub(crate) fn extend_stun(&mut self, until: Millis) {
        self.stun_until = self.stun_until.max(until);
    }

    pub(crate) fn spend_attack(&mut self, now: Millis) {
        self.mine_stock = self.mine_stock.saturating_sub(1);
        self.last_attack_at = Some(now);
    }
}
