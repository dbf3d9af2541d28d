use alloc::vec::Vec;
use rand::Rng;
use rand::seq::IndexedRandom;
use smallvec::SmallVec;

use crate::rules::{
    DRAIN_RADIUS, FIREWALL_DURATION, POWER_UP_MAX_ON_BOARD, POWER_UP_PLAYER_CLEARANCE, REINFORCE_RADIUS,
};
use crate::*;

impl Engine {
    pub fn power_ups_on_board(&self) -> usize {
        self.board.iter().filter(|tile| tile.power_up.is_some()).count()
    }

    /// Hidden, safe, unscorched tiles without a power-up and out of reach of
    /// both players, row-major.
    pub fn power_up_spawn_candidates(&self) -> Vec<Coord2> {
        let positions = self.players.each_ref().map(|player| player.position);
        iter_coords(self.size())
            .filter(|&coords| {
                let tile = &self.board[coords.to_nd_index()];
                tile.is_open_hidden() && !tile.mine && tile.power_up.is_none()
            })
            .filter(|&coords| {
                positions
                    .iter()
                    .all(|&position| chebyshev(coords, position) > POWER_UP_PLAYER_CLEARANCE)
            })
            .collect()
    }

    /// One spawn attempt: a random eligible tile gets a random power-up,
    /// unless the board already holds the maximum.
    pub fn try_spawn_power_up<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(Coord2, PowerUpKind)> {
        if self.is_finished() || self.power_ups_on_board() >= POWER_UP_MAX_ON_BOARD {
            return None;
        }
        let coords = *self.power_up_spawn_candidates().choose(rng)?;
        let kind = *PowerUpKind::ALL.choose(rng)?;
        self.board[coords.to_nd_index()].power_up = Some(kind);
        self.effects.push(Effect::PowerUpSpawn { at: coords, kind });
        log::debug!("Spawned {} at {:?}", kind.name(), coords);
        Some((coords, kind))
    }

    /// Places a power-up decided elsewhere, as announced by the spawning peer.
    pub fn place_power_up(&mut self, coords: Coord2, kind: PowerUpKind) -> Result<()> {
        let coords = self.config().validate_coords(coords)?;
        self.check_active()?;
        self.board[coords.to_nd_index()].power_up = Some(kind);
        self.effects.push(Effect::PowerUpSpawn { at: coords, kind });
        Ok(())
    }

    /// Tiles a `kind` activation by `player` could be centered on. Empty for
    /// kinds that need no center.
    pub fn power_up_center_pool(&self, player: PlayerId, kind: PowerUpKind) -> Vec<Coord2> {
        match kind {
            PowerUpKind::Shield | PowerUpKind::Firewall => Vec::new(),
            PowerUpKind::Reinforce => self
                .territory(player)
                .into_iter()
                .filter(|&coords| !self.board[coords.to_nd_index()].reinforced)
                .collect(),
            PowerUpKind::Drain => self.territory(player.other()),
        }
    }

    pub fn pick_power_up_center<R: Rng + ?Sized>(
        &self,
        player: PlayerId,
        kind: PowerUpKind,
        rng: &mut R,
    ) -> Option<Coord2> {
        self.power_up_center_pool(player, kind).choose(rng).copied()
    }

    /// Removes and returns the entries of `player`'s queue that are due,
    /// keeping the order of the rest.
    pub fn take_due_power_ups(&mut self, player: PlayerId, now: Millis) -> SmallVec<[PowerUpKind; 2]> {
        let queue = &mut self.players[player.index()].pending_power_ups;
        let due = queue
            .iter()
            .filter(|pending| now >= pending.activate_at)
            .map(|pending| pending.kind)
            .collect();
        queue.retain(|pending| now < pending.activate_at);
        due
    }

    /// Applies an activated power-up. Reinforce and drain use `center`, which
    /// the activating peer resolved with [`Engine::pick_power_up_center`];
    /// they do nothing while there is no tile to aim at.
    pub fn apply_power_up(
        &mut self,
        player: PlayerId,
        kind: PowerUpKind,
        center: Option<Coord2>,
        now: Millis,
    ) -> Result<PowerUpOutcome> {
        self.check_active()?;
        let center = center.map(|coords| self.config().validate_coords(coords)).transpose()?;

        let outcome = match kind {
            PowerUpKind::Shield => {
                self.players[player.index()].has_shield = true;
                PowerUpOutcome::Applied { center: None, tiles: 0 }
            }
            PowerUpKind::Firewall => {
                self.players[player.index()].firewall_until = now + FIREWALL_DURATION;
                PowerUpOutcome::Applied { center: None, tiles: 0 }
            }
            PowerUpKind::Reinforce | PowerUpKind::Drain => {
                if self.power_up_center_pool(player, kind).is_empty() {
                    PowerUpOutcome::NoTarget
                } else {
                    let center = center.ok_or(GameError::UnresolvedCenter)?;
                    let tiles = if kind == PowerUpKind::Reinforce {
                        self.reinforce(player, center)
                    } else {
                        self.drain(player.other(), center)
                    };
                    PowerUpOutcome::Applied {
                        center: Some(center),
                        tiles,
                    }
                }
            }
        };

        self.effects.push(Effect::PowerUpActivate { player, kind });
        log::debug!("{:?} activated {} ({:?})", player, kind.name(), outcome);
        Ok(outcome)
    }

    fn reinforce(&mut self, player: PlayerId, center: Coord2) -> CellCount {
        let mut reinforced = 0;
        for pos in iter_disc(center, REINFORCE_RADIUS, self.size()) {
            let tile = &mut self.board[pos.to_nd_index()];
            if tile.is_territory_of(player) {
                tile.reinforced = true;
                reinforced += 1;
            }
        }
        reinforced
    }

    fn drain(&mut self, victim: PlayerId, center: Coord2) -> CellCount {
        let mut drained = 0;
        for pos in iter_disc(center, DRAIN_RADIUS, self.size()) {
            let tile = &mut self.board[pos.to_nd_index()];
            if tile.is_territory_of(victim) {
                tile.owner = None;
                tile.reinforced = false;
                self.players[victim.index()].score -= 1;
                self.effects.push(Effect::Rumble { at: pos });
                drained += 1;
            }
        }
        drained
    }
}
