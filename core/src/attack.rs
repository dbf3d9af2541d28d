use alloc::vec::Vec;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::rules::{
    PRECISION_ATTACK_RADIUS, PRECISION_ATTACK_STUN, RANDOM_ATTACK_RADIUS, RANDOM_ATTACK_STUN,
};
use crate::*;

/// How much of the attack gate to check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttackGate {
    /// Ammunition, stun and cooldown, against the local clock.
    Local,
    /// Ammunition only. The originating peer already checked stun and
    /// cooldown against its own clock.
    Trusted,
}

impl Engine {
    pub fn can_attack(&self, attacker: PlayerId, now: Millis) -> bool {
        !self.is_finished() && self.player(attacker).can_attack(now)
    }

    /// Revealed tiles owned by `player`, row-major.
    pub fn territory(&self, player: PlayerId) -> Vec<Coord2> {
        iter_coords(self.size())
            .filter(|&coords| self.board[coords.to_nd_index()].is_territory_of(player))
            .collect()
    }

    pub fn territory_size(&self, player: PlayerId) -> CellCount {
        // bounded by the board size
        self.board.iter().filter(|tile| tile.is_territory_of(player)).count() as CellCount
    }

    /// Random tile of the opponent's territory to aim a random attack at.
    pub fn pick_random_attack_center<R: Rng + ?Sized>(&self, attacker: PlayerId, rng: &mut R) -> Option<Coord2> {
        self.territory(attacker.other()).choose(rng).copied()
    }

    /// Converts the opponent's territory in a radius-2 disc around `center`.
    ///
    /// Spends one mine and stuns the opponent briefly if anything converted.
    /// Nothing happens while the opponent owns no territory.
    pub fn random_attack(
        &mut self,
        attacker: PlayerId,
        center: Coord2,
        gate: AttackGate,
        now: Millis,
    ) -> Result<AttackOutcome> {
        let center = self.config().validate_coords(center)?;
        self.check_active()?;
        if !self.passes_gate(attacker, gate, now) {
            return Ok(AttackOutcome::Gated);
        }
        let opponent = attacker.other();
        if self.territory_size(opponent) == 0 {
            return Ok(AttackOutcome::NoTarget);
        }

        let converted = self.strike(attacker, center, RANDOM_ATTACK_RADIUS, now);
        self.players[attacker.index()].spend_attack(now);
        if converted > 0 {
            let until = now + RANDOM_ATTACK_STUN;
            self.players[opponent.index()].extend_stun(until);
            self.effects.push(Effect::Stun {
                player: opponent,
                until,
            });
        }
        self.effects.push(Effect::RandomAttack { attacker, center });

        log::debug!("{:?} random attack at {:?} converted {}", attacker, center, converted);
        Ok(AttackOutcome::Landed { center, converted })
    }

    /// Hits the 3×3 around the opponent's current position, then stuns and
    /// teleports them. A shield absorbs the whole attack instead.
    pub fn precision_attack(&mut self, attacker: PlayerId, gate: AttackGate, now: Millis) -> Result<AttackOutcome> {
        self.check_active()?;
        if !self.passes_gate(attacker, gate, now) {
            return Ok(AttackOutcome::Gated);
        }
        let opponent = attacker.other();

        if self.players[opponent.index()].has_shield {
            self.players[opponent.index()].has_shield = false;
            self.players[attacker.index()].spend_attack(now);
            self.effects.push(Effect::ShieldAbsorb { player: opponent });
            return Ok(AttackOutcome::Absorbed);
        }

        let center = self.players[opponent.index()].position;
        let converted = self.strike(attacker, center, PRECISION_ATTACK_RADIUS, now);
        self.players[attacker.index()].spend_attack(now);

        let until = now + PRECISION_ATTACK_STUN;
        let target = &mut self.players[opponent.index()];
        target.extend_stun(until);
        target.teleport_pending = true;
        self.effects.push(Effect::Stun {
            player: opponent,
            until,
        });
        self.effects.push(Effect::PrecisionAttack { attacker, center });

        log::debug!("{:?} precision attack at {:?} converted {}", attacker, center, converted);
        Ok(AttackOutcome::Landed { center, converted })
    }

    fn passes_gate(&self, attacker: PlayerId, gate: AttackGate, now: Millis) -> bool {
        let player = self.player(attacker);
        match gate {
            AttackGate::Local => player.can_attack(now),
            AttackGate::Trusted => player.mine_stock > 0,
        }
    }

    /// Resolves every opponent tile in the disc: a firewall makes it immune, a
    /// reinforcement is spent instead of the tile, otherwise it converts.
    fn strike(&mut self, attacker: PlayerId, center: Coord2, radius: u8, now: Millis) -> CellCount {
        let opponent = attacker.other();
        let firewalled = self.players[opponent.index()].has_firewall(now);
        let mut converted = 0;

        for pos in iter_disc(center, radius, self.size()) {
            let tile = &mut self.board[pos.to_nd_index()];
            if !tile.is_territory_of(opponent) {
                continue;
            }
            self.effects.push(Effect::Rumble { at: pos });
            if firewalled {
                continue;
            }
            if tile.reinforced {
                tile.reinforced = false;
                continue;
            }
            tile.owner = Some(attacker);
            self.players[attacker.index()].score += 1;
            self.players[opponent.index()].score -= 1;
            converted += 1;
        }
        converted
    }
}
