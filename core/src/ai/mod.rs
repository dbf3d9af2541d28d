pub use presets::*;

mod presets;

use alloc::vec::Vec;
use core::cmp::Reverse;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::*;

/// Where an input source sends its commands. The AI reads the board through
/// `view` and acts only through `submit`, the same path a keyboard takes.
pub trait ActionSink {
    fn view(&self) -> &Engine;
    fn submit(&mut self, player: PlayerId, command: Command, now: Millis) -> Result<CommandOutcome>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Reveal,
    Flag,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AiTarget {
    pub coords: Coord2,
    pub intent: Intent,
}

const FRONTIER_PICKS: usize = 5;
const FALLBACK_PICKS: usize = 3;

/// Computer opponent driving one player.
#[derive(Clone, Debug)]
pub struct AiAgent {
    player: PlayerId,
    difficulty: Difficulty,
    preset: AiPreset,
    rng: SmallRng,
    memory: Deductions,
    target: Option<AiTarget>,
    hesitation: Millis,
    last_tick: Option<Millis>,
    last_analysis: Option<Millis>,
}

impl AiAgent {
    pub fn new(player: PlayerId, difficulty: Difficulty, seed: u64) -> Self {
        Self::build(player, difficulty, difficulty.preset(), seed)
    }

    /// Agent with a hand-tuned preset, labelled as `difficulty`.
    pub fn with_preset(player: PlayerId, difficulty: Difficulty, preset: AiPreset, seed: u64) -> Result<Self> {
        preset.validate()?;
        Ok(Self::build(player, difficulty, preset, seed))
    }

    fn build(player: PlayerId, difficulty: Difficulty, preset: AiPreset, seed: u64) -> Self {
        Self {
            player,
            difficulty,
            preset,
            rng: SmallRng::seed_from_u64(seed),
            memory: Deductions::default(),
            target: None,
            hesitation: 0,
            last_tick: None,
            last_analysis: None,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn preset(&self) -> &AiPreset {
        &self.preset
    }

    pub fn target(&self) -> Option<AiTarget> {
        self.target
    }

    pub fn memory(&self) -> &Deductions {
        &self.memory
    }

    /// Forgets everything learned about the previous board.
    pub fn reset(&mut self) {
        self.memory = Deductions::default();
        self.target = None;
        self.hesitation = 0;
        self.last_tick = None;
        self.last_analysis = None;
    }

    /// One decision step. Does nothing between ticks, while stunned, or while
    /// hesitating after an action.
    pub fn tick<S: ActionSink + ?Sized>(&mut self, sink: &mut S, now: Millis) -> Result<()> {
        let engine = sink.view();
        if engine.is_finished() || engine.player(self.player).is_stunned(now) {
            return Ok(());
        }
        if self
            .last_tick
            .is_some_and(|last| now.saturating_sub(last) < self.preset.tick)
        {
            return Ok(());
        }
        self.last_tick = Some(now);

        if self.hesitation > 0 {
            self.hesitation = self.hesitation.saturating_sub(self.preset.tick);
            return Ok(());
        }

        if self
            .last_analysis
            .is_none_or(|last| now.saturating_sub(last) >= self.preset.analysis_interval)
        {
            self.analyze(sink.view());
            self.last_analysis = Some(now);
        }

        let position = sink.view().player(self.player).position;
        if let Some(target) = self.target.filter(|target| target.coords == position) {
            self.act_on(sink, target, now)?;
            if sink.view().is_finished() {
                return Ok(());
            }
            if self.rng.random_bool(self.preset.hesitate_chance) {
                self.hesitation = self.roll_hesitation();
            }
        }

        if self.target.is_none_or(|target| is_stale(sink.view(), target)) {
            self.target = if self.rng.random_bool(self.preset.mistake_chance) {
                self.random_target(sink.view())
            } else {
                self.choose_target(sink.view())
            };
        }

        self.walk(sink, now)?;
        self.consider_attack(sink, now)
    }

    fn roll_hesitation(&mut self) -> Millis {
        let (base, spread) = self.preset.hesitation;
        base + self.rng.random_range(0..=spread)
    }

    fn analyze(&mut self, engine: &Engine) {
        self.memory = deduce(&Observation::from_engine(engine));
        log::trace!(
            "{:?} AI knows {} mines and {} safe tiles",
            self.player,
            self.memory.mines.len(),
            self.memory.safe.len()
        );
    }

    fn act_on<S: ActionSink + ?Sized>(&mut self, sink: &mut S, target: AiTarget, now: Millis) -> Result<()> {
        self.target = None;
        let Some(tile) = sink.view().tile(target.coords).copied() else {
            return Ok(());
        };

        match target.intent {
            Intent::Flag if tile.is_hidden() => {
                let outcome = sink.submit(self.player, Command::Flag, now)?;
                if outcome != CommandOutcome::Flag(FlagOutcome::Flagged) {
                    self.memory.mines.remove(&target.coords);
                }
            }
            Intent::Reveal if tile.is_hidden() || tile.is_neutral() => {
                sink.submit(self.player, Command::Reveal, now)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Best target by priority: a known mine to flag, a known safe tile, a
    /// neutral tile to claim, the frontier, then any hidden tile.
    fn choose_target(&mut self, engine: &Engine) -> Option<AiTarget> {
        let me = engine.player(self.player).position;
        let opponent = engine.player(self.player.other()).position;
        let open_hidden = |coords: &Coord2| engine.tile(*coords).is_some_and(Tile::is_open_hidden);
        let nearest = |candidates: &mut dyn Iterator<Item = Coord2>| {
            candidates.min_by_key(|&coords| manhattan(me, coords))
        };

        // the flag roll only happens when there is something to flag
        let flaggable = nearest(&mut self.memory.mines.iter().copied().filter(open_hidden));
        if let Some(coords) = flaggable.filter(|_| self.rng.random_bool(self.preset.flag_chance)) {
            return Some(AiTarget {
                coords,
                intent: Intent::Flag,
            });
        }

        let reveal = |coords| AiTarget {
            coords,
            intent: Intent::Reveal,
        };
        if let Some(coords) = nearest(&mut self.memory.safe.iter().copied().filter(open_hidden)) {
            return Some(reveal(coords));
        }
        let neutral = &mut iter_coords(engine.size()).filter(|&coords| engine.tile(coords).is_some_and(Tile::is_neutral));
        if let Some(coords) = nearest(neutral) {
            return Some(reveal(coords));
        }

        let unexplored: Vec<Coord2> = iter_coords(engine.size())
            .filter(open_hidden)
            .filter(|coords| !self.memory.mines.contains(coords))
            .collect();

        let mut frontier: Vec<Coord2> = unexplored
            .iter()
            .copied()
            .filter(|&coords| {
                engine
                    .tiles()
                    .iter_neighbors(coords)
                    .any(|pos| engine.tile(pos).is_some_and(Tile::is_revealed))
            })
            .collect();
        frontier.sort_by_key(|&coords| {
            Reverse(i32::from(manhattan(coords, opponent)) - i32::from(manhattan(coords, me)))
        });
        let top = frontier.len().min(FRONTIER_PICKS);
        if let Some(&coords) = frontier[..top].choose(&mut self.rng) {
            return Some(reveal(coords));
        }

        let mut rest = unexplored;
        rest.sort_by_key(|&coords| manhattan(coords, me));
        let top = rest.len().min(FALLBACK_PICKS);
        rest[..top].choose(&mut self.rng).copied().map(reveal)
    }

    fn random_target(&mut self, engine: &Engine) -> Option<AiTarget> {
        let hidden: Vec<Coord2> = iter_coords(engine.size())
            .filter(|&coords| engine.tile(coords).is_some_and(Tile::is_open_hidden))
            .collect();
        hidden.choose(&mut self.rng).map(|&coords| AiTarget {
            coords,
            intent: Intent::Reveal,
        })
    }

    /// Greedy step toward the target, larger axis first. If the opponent
    /// stands in the way the other axis is tried, and failing that the target
    /// is dropped.
    fn walk<S: ActionSink + ?Sized>(&mut self, sink: &mut S, now: Millis) -> Result<()> {
        let Some(target) = self.target else {
            return Ok(());
        };
        let engine = sink.view();
        let position = engine.player(self.player).position;
        let blocker = engine.player(self.player.other()).position;

        let (primary, secondary) = steps_toward(position, target.coords);
        let free = |direction: &Direction| direction.step(position, engine.size()) != Some(blocker);
        let step = primary.filter(free).or(secondary.filter(free));

        match step {
            Some(direction) => {
                sink.submit(self.player, Command::Move(direction), now)?;
            }
            None if primary.is_some() => self.target = None,
            None => {}
        }
        Ok(())
    }

    fn consider_attack<S: ActionSink + ?Sized>(&mut self, sink: &mut S, now: Millis) -> Result<()> {
        let engine = sink.view();
        if !engine.can_attack(self.player, now) {
            return Ok(());
        }
        let opponent = self.player.other();
        let territory = engine.territory_size(opponent);
        if territory < self.preset.attack_min_tiles || self.rng.random_bool(self.preset.attack_skip_chance) {
            return Ok(());
        }

        let me = engine.player(self.player);
        let distance = manhattan(me.position, engine.player(opponent).position);
        let stock = me.mine_stock;
        let preset = &self.preset;

        let command = if distance <= preset.precision_max_distance
            && territory >= preset.precision_min_tiles
            && stock >= preset.precision_min_mines
        {
            Command::PrecisionAttack
        } else if (territory >= preset.random_min_tiles && stock >= preset.random_min_mines)
            || stock >= preset.stockpile_mines
        {
            Command::RandomAttack
        } else {
            return Ok(());
        };

        log::debug!("{:?} AI fires {:?} with {} mines", self.player, command, stock);
        sink.submit(self.player, command, now)?;
        Ok(())
    }
}

/// A target that no longer needs the action it was chosen for.
fn is_stale(engine: &Engine, target: AiTarget) -> bool {
    let Some(tile) = engine.tile(target.coords) else {
        return true;
    };
    match target.intent {
        Intent::Flag => !tile.is_open_hidden(),
        Intent::Reveal => !(tile.is_open_hidden() || tile.is_neutral()),
    }
}

/// Steps along the longer axis, then the shorter one. Both are `None` once
/// `from` reaches `to`.
fn steps_toward(from: Coord2, to: Coord2) -> (Option<Direction>, Option<Direction>) {
    let dx = i16::from(to.0) - i16::from(from.0);
    let dy = i16::from(to.1) - i16::from(from.1);
    let horizontal = match dx {
        0 => None,
        d if d > 0 => Some(Direction::Right),
        _ => Some(Direction::Left),
    };
    let vertical = match dy {
        0 => None,
        d if d > 0 => Some(Direction::Down),
        _ => Some(Direction::Up),
    };
    if dx.abs() >= dy.abs() {
        (horizontal.or(vertical), horizontal.and(vertical))
    } else {
        (vertical, horizontal)
    }
}
