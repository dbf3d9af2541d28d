use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cmp::Ordering;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::rules::{BLAST_RADIUS, MINE_HIT_STUN, POWER_UP_ACTIVATION_DELAY, WRONG_FLAG_STUN};
use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Active,
    /// `winner` is `None` on a tie.
    Finished { winner: Option<PlayerId> },
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    pub const fn winner(self) -> Option<PlayerId> {
        match self {
            Self::Active => None,
            Self::Finished { winner } => winner,
        }
    }
}

/// Board and players of one match, plus every rule that mutates them.
///
/// Time is always passed in by the caller, so two engines fed the same calls
/// with the same timestamps end up in the same state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Engine {
    config: GameConfig,
    pub(crate) board: Array2<Tile>,
    pub(crate) players: [Player; 2],
    pub(crate) resolved_safe: CellCount,
    total_safe: CellCount,
    state: EngineState,
    #[serde(skip)]
    pub(crate) effects: Vec<Effect>,
}

/// The parts of a player that both peers must agree on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub position: Coord2,
    pub score: i32,
    pub mine_stock: u16,
    pub stun_until: Millis,
    pub has_shield: bool,
    pub firewall_until: Millis,
    pub teleport_pending: bool,
}

/// Comparable view of an engine, used to check that two peers converged.
/// Local bookkeeping such as move timestamps and queued effects is left out.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub board: Array2<Tile>,
    pub players: [PlayerSnapshot; 2],
    pub resolved_safe: CellCount,
    pub state: EngineState,
}

impl Engine {
    /// Generates the board for `seed` and places both players on their spawns.
    pub fn new(config: GameConfig, seed: u32) -> Result<Self> {
        config.validate()?;
        let layout = SeededGenerator::new(seed).generate(&config);
        Ok(Self::build(config, &layout))
    }

    /// Engine over a hand-made layout.
    pub fn from_layout(layout: &MineLayout) -> Result<Self> {
        let total = f64::from(layout.total_tiles());
        let config = GameConfig::new(layout.size(), f64::from(layout.mine_count()) / total)
            .or_else(|_| GameConfig::new(layout.size(), 0.0))?;
        Ok(Self::build(config, layout))
    }

    fn build(config: GameConfig, layout: &MineLayout) -> Self {
        let players = PlayerId::ALL.map(|id| Player::new(id, config.spawn(id)));
        let mut engine = Self {
            config,
            board: Array2::default(config.size.to_nd_index()),
            players,
            resolved_safe: 0,
            total_safe: 0,
            state: EngineState::Active,
            effects: Vec::new(),
        };
        engine.load_layout(layout);
        engine
    }

    /// Starts a new game on `layout`, resetting both players in place.
    pub fn restart(&mut self, layout: &MineLayout) -> Result<()> {
        if layout.size() != self.config.size {
            return Err(GameError::InvalidConfig);
        }
        for player in &mut self.players {
            player.reset(self.config.spawn(player.id));
        }
        self.state = EngineState::Active;
        self.effects.clear();
        self.load_layout(layout);
        Ok(())
    }

    fn load_layout(&mut self, layout: &MineLayout) {
        for coords in iter_coords(self.config.size) {
            let mine = layout.contains_mine(coords);
            self.board[coords.to_nd_index()] = Tile {
                mine,
                adjacency: if mine { 0 } else { layout.adjacent_mine_count(coords) },
                ..Tile::default()
            };
        }
        self.resolved_safe = 0;
        self.total_safe = layout.safe_tile_count();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.state.winner()
    }

    pub fn tile(&self, coords: Coord2) -> Option<&Tile> {
        self.board.get(coords.to_nd_index())
    }

    pub fn tiles(&self) -> &Array2<Tile> {
        &self.board
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn resolved_safe_tiles(&self) -> CellCount {
        self.resolved_safe
    }

    pub fn total_safe_tiles(&self) -> CellCount {
        self.total_safe
    }

    /// Recounts resolved safe tiles from the board. Always equal to
    /// [`Engine::resolved_safe_tiles`].
    pub fn count_resolved_safe_tiles(&self) -> CellCount {
        // bounded by the board size, which fits a CellCount
        self.board.iter().filter(|tile| tile.is_resolved_safe()).count() as CellCount
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        core::mem::take(&mut self.effects)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            board: self.board.clone(),
            players: self.players.each_ref().map(|player| PlayerSnapshot {
                position: player.position,
                score: player.score,
                mine_stock: player.mine_stock,
                stun_until: player.stun_until,
                has_shield: player.has_shield,
                firewall_until: player.firewall_until,
                teleport_pending: player.teleport_pending,
            }),
            resolved_safe: self.resolved_safe,
            state: self.state,
        }
    }

    /// Steps `player` one tile, unless stunned, cooling down, at the edge, or
    /// blocked by the other player.
    pub fn try_move(&mut self, player: PlayerId, direction: Direction, now: Millis) -> Result<MoveOutcome> {
        self.check_active()?;

        let actor = &self.players[player.index()];
        if !actor.can_move(now) {
            return Ok(MoveOutcome::NoChange);
        }
        let Some(next) = direction.step(actor.position, self.config.size) else {
            return Ok(MoveOutcome::NoChange);
        };
        if self.players[player.other().index()].position == next {
            return Ok(MoveOutcome::NoChange);
        }

        let actor = &mut self.players[player.index()];
        actor.position = next;
        actor.last_move_at = Some(now);
        Ok(MoveOutcome::Moved(next))
    }

    /// Puts `player` at `coords` as reported by its own peer.
    pub fn place_player(&mut self, player: PlayerId, coords: Coord2) -> Result<MoveOutcome> {
        let coords = self.config.validate_coords(coords)?;
        self.check_active()?;
        self.players[player.index()].position = coords;
        Ok(MoveOutcome::Moved(coords))
    }

    pub fn reveal(&mut self, player: PlayerId, coords: Coord2, now: Millis) -> Result<RevealOutcome> {
        let coords = self.config.validate_coords(coords)?;
        self.check_active()?;

        let tile = self.board[coords.to_nd_index()];
        Ok(match tile.state {
            TileState::Flagged => RevealOutcome::NoChange,
            TileState::Revealed if tile.is_neutral() => {
                self.claim(player, coords);
                RevealOutcome::Claimed
            }
            TileState::Revealed => RevealOutcome::NoChange,
            TileState::Hidden if tile.is_scorched() => RevealOutcome::NoChange,
            TileState::Hidden if tile.mine => self.detonate(player, coords, now),
            TileState::Hidden => {
                let tiles = self.flood_reveal(player, coords, now);
                self.effects.push(Effect::Reveal {
                    player,
                    at: coords,
                    tiles,
                    adjacency: tile.adjacency,
                });
                self.check_end();
                RevealOutcome::Revealed { tiles }
            }
        })
    }

    /// Reveals `start` and expands through zero-adjacency tiles breadth first,
    /// neighbors in row-major order. Neutral revealed tiles reached on the way
    /// are claimed; flagged and scorched tiles stop the expansion.
    fn flood_reveal(&mut self, player: PlayerId, start: Coord2, now: Millis) -> CellCount {
        let mut revealed = 0;
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            let tile = self.board[coords.to_nd_index()];
            if tile.is_neutral() {
                self.claim(player, coords);
                continue;
            }
            if !tile.is_open_hidden() || tile.mine {
                continue;
            }

            self.reveal_safe_tile(player, coords, now);
            revealed += 1;

            if tile.adjacency == 0 {
                to_visit.extend(self.board.iter_neighbors(coords).filter(|&pos| {
                    let neighbor = &self.board[pos.to_nd_index()];
                    neighbor.is_open_hidden() || neighbor.is_neutral()
                }));
            }
        }

        log::trace!("Flood fill from {:?} revealed {} tiles for {:?}", start, revealed, player);
        revealed
    }

    fn reveal_safe_tile(&mut self, player: PlayerId, coords: Coord2, now: Millis) {
        let tile = &mut self.board[coords.to_nd_index()];
        let actor = &mut self.players[player.index()];

        tile.state = TileState::Revealed;
        self.resolved_safe += 1;
        if tile.owner.is_none() {
            tile.owner = Some(player);
            actor.score += 1;
        }

        if let Some(kind) = tile.power_up.take() {
            let activate_at = now + POWER_UP_ACTIVATION_DELAY;
            actor.pending_power_ups.push_back(PendingPowerUp { kind, activate_at });
            tile.found = Some(FoundMarker {
                kind,
                until: activate_at,
            });
            self.effects.push(Effect::PowerUpPickup {
                player,
                at: coords,
                kind,
            });
        }
    }

    fn claim(&mut self, player: PlayerId, coords: Coord2) {
        self.board[coords.to_nd_index()].owner = Some(player);
        self.players[player.index()].score += 1;
        self.effects.push(Effect::Claim { player, at: coords });
    }

    fn detonate(&mut self, player: PlayerId, coords: Coord2, now: Millis) -> RevealOutcome {
        let actor = &mut self.players[player.index()];

        if actor.has_shield {
            actor.has_shield = false;
            self.board[coords.to_nd_index()].state = TileState::Revealed;
            self.effects.push(Effect::ShieldAbsorb { player });
            return RevealOutcome::Absorbed;
        }

        for pos in iter_disc(coords, BLAST_RADIUS, self.config.size) {
            let tile = &mut self.board[pos.to_nd_index()];
            if tile.is_open_hidden() {
                tile.scorched = ScorchMask::BOTH;
                if !tile.mine {
                    self.resolved_safe += 1;
                }
            }
        }
        self.board[coords.to_nd_index()].state = TileState::Revealed;

        let until = now + MINE_HIT_STUN;
        actor.extend_stun(until);
        actor.teleport_pending = true;
        self.effects.push(Effect::Explosion { at: coords });
        self.effects.push(Effect::Stun { player, until });

        self.check_end();
        RevealOutcome::Detonated
    }

    pub fn flag(&mut self, player: PlayerId, coords: Coord2, now: Millis) -> Result<FlagOutcome> {
        let coords = self.config.validate_coords(coords)?;
        self.check_active()?;

        let tile = &mut self.board[coords.to_nd_index()];
        let actor = &mut self.players[player.index()];
        if !tile.is_hidden() {
            return Ok(FlagOutcome::NoChange);
        }

        if tile.mine {
            tile.state = TileState::Flagged;
            tile.flagged_by = Some(player);
            tile.owner = Some(player);
            actor.score += 1;
            actor.mine_stock += 1;
            self.effects.push(Effect::Flag { player, at: coords });
            self.check_end();
            Ok(FlagOutcome::Flagged)
        } else {
            let until = now + WRONG_FLAG_STUN;
            actor.extend_stun(until);
            self.effects.push(Effect::FlagFail { player, at: coords });
            self.effects.push(Effect::Stun { player, until });
            Ok(FlagOutcome::WrongFlag)
        }
    }

    /// Sends every player whose stun ran out after a blast or precision hit
    /// back to its spawn.
    pub fn process_teleports(&mut self, now: Millis) {
        if self.is_finished() {
            return;
        }
        for player in &mut self.players {
            if player.teleport_pending && now >= player.stun_until {
                player.position = player.spawn;
                player.teleport_pending = false;
                self.effects.push(Effect::Teleport {
                    player: player.id,
                    to: player.spawn,
                });
            }
        }
    }

    /// Ends the game once every safe tile is resolved. Fires at most once.
    pub(crate) fn check_end(&mut self) {
        if self.state.is_finished() || self.resolved_safe < self.total_safe {
            return;
        }

        let [one, two] = &self.players;
        let winner = match one.score.cmp(&two.score) {
            Ordering::Greater => Some(PlayerId::One),
            Ordering::Less => Some(PlayerId::Two),
            Ordering::Equal => None,
        };
        log::debug!(
            "Game over, scores {} to {}, winner {:?}",
            one.score,
            two.score,
            winner
        );
        self.state = EngineState::Finished { winner };
        self.effects.push(Effect::GameOver { winner });
    }

    pub(crate) fn check_active(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}
