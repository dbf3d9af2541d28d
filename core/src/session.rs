use alloc::string::String;
use alloc::vec::Vec;
use mineblown_protocol::{self as protocol, GameEvent, Inbound, PeerFrame, RelayNotice};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::rules::POWER_UP_SPAWN_INTERVAL;
use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    /// Both players on this machine.
    Local,
    /// `local` is played here, the other player by a remote peer.
    Online { local: PlayerId },
}

impl SessionMode {
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online { .. })
    }

    /// Whether this peer decides what `player` does.
    pub const fn controls(self, player: PlayerId) -> bool {
        match self {
            Self::Local => true,
            Self::Online { local } => local.index() == player.index(),
        }
    }

    /// Only one side rolls power-up spawns, player one's.
    pub const fn spawns_power_ups(self) -> bool {
        self.controls(PlayerId::One)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalReason {
    OpponentLeft,
    ConnectionFailed,
}

/// Engine plus everything a local command needs: randomness for targets the
/// engine leaves open, and the outbox that tells the other peer.
#[derive(Clone, Debug)]
pub struct World {
    engine: Engine,
    rng: SmallRng,
    mode: SessionMode,
    outbox: Vec<GameEvent>,
}

impl World {
    pub(crate) fn new(engine: Engine, mode: SessionMode, seed: u64) -> Self {
        Self {
            engine,
            rng: SmallRng::seed_from_u64(seed),
            mode,
            outbox: Vec::new(),
        }
    }

    fn emit(&mut self, event: GameEvent) {
        if self.mode.is_online() {
            self.outbox.push(event);
        }
    }

    fn perform(&mut self, player: PlayerId, command: Command, now: Millis) -> Result<CommandOutcome> {
        if !self.mode.controls(player) {
            return Err(GameError::NotAuthoritative);
        }

        let position = self.engine.player(player).position;
        let outcome = match command {
            Command::Move(direction) => CommandOutcome::Move(self.engine.try_move(player, direction, now)?),
            Command::Reveal => CommandOutcome::Reveal(self.engine.reveal(player, position, now)?),
            Command::Flag => CommandOutcome::Flag(self.engine.flag(player, position, now)?),
            Command::RandomAttack => CommandOutcome::Attack(self.random_attack(player, now)?),
            Command::PrecisionAttack => {
                CommandOutcome::Attack(self.engine.precision_attack(player, AttackGate::Local, now)?)
            }
        };

        if let Some(event) = command_event(command, outcome, position) {
            self.emit(event);
        }
        Ok(outcome)
    }

    /// Rolls the center only once the gate passed, so a gated attack leaves
    /// the random stream untouched.
    fn random_attack(&mut self, player: PlayerId, now: Millis) -> Result<AttackOutcome> {
        self.engine.check_active()?;
        if !self.engine.can_attack(player, now) {
            return Ok(AttackOutcome::Gated);
        }
        match self.engine.pick_random_attack_center(player, &mut self.rng) {
            Some(center) => self.engine.random_attack(player, center, AttackGate::Local, now),
            None => Ok(AttackOutcome::NoTarget),
        }
    }
}

impl ActionSink for World {
    fn view(&self) -> &Engine {
        &self.engine
    }

    fn submit(&mut self, player: PlayerId, command: Command, now: Millis) -> Result<CommandOutcome> {
        self.perform(player, command, now)
    }
}

/// One match as seen by one machine: the engine, the AI agents playing on it,
/// and the timers that run every frame.
#[derive(Clone, Debug)]
pub struct Session {
    world: World,
    agents: Vec<AiAgent>,
    last_spawn_at: Millis,
    terminal: Option<TerminalReason>,
}

impl Session {
    /// Both players on this machine.
    pub fn local(config: GameConfig, seed: u32, now: Millis) -> Result<Self> {
        Self::start(config, seed, SessionMode::Local, now)
    }

    /// This machine plays `local`; the relay carries the rest.
    pub fn online(config: GameConfig, seed: u32, local: PlayerId, now: Millis) -> Result<Self> {
        Self::start(config, seed, SessionMode::Online { local }, now)
    }

    fn start(config: GameConfig, seed: u32, mode: SessionMode, now: Millis) -> Result<Self> {
        let engine = Engine::new(config, seed)?;
        log::debug!("New {:?} session with seed {}", mode, seed);
        Ok(Self {
            world: World::new(engine, mode, u64::from(seed)),
            agents: Vec::new(),
            last_spawn_at: now,
            terminal: None,
        })
    }

    /// Hands a player over to `agent`. Only players this peer controls can
    /// be driven.
    pub fn add_ai(&mut self, agent: AiAgent) -> Result<()> {
        if !self.world.mode.controls(agent.player()) {
            return Err(GameError::NotAuthoritative);
        }
        self.agents.retain(|existing| existing.player() != agent.player());
        self.agents.push(agent);
        Ok(())
    }

    pub fn engine(&self) -> &Engine {
        &self.world.engine
    }

    pub fn mode(&self) -> SessionMode {
        self.world.mode
    }

    pub fn agents(&self) -> &[AiAgent] {
        &self.agents
    }

    pub fn terminal(&self) -> Option<TerminalReason> {
        self.terminal
    }

    /// Finished by the rules, or cut short by the connection.
    pub fn is_over(&self) -> bool {
        self.terminal.is_some() || self.world.engine.is_finished()
    }

    /// One frame: [`Session::advance_timers`] then [`Session::run_agents`].
    /// Host input is applied after this returns.
    pub fn tick(&mut self, now: Millis) -> Result<()> {
        self.advance_timers(now)?;
        self.run_agents(now)
    }

    /// Teleports, the power-up spawn roll, then due activations, player one
    /// before player two.
    pub fn advance_timers(&mut self, now: Millis) -> Result<()> {
        if self.is_over() {
            return Ok(());
        }
        self.world.engine.process_teleports(now);
        self.spawn_power_up(now);
        self.activate_power_ups(now)
    }

    pub fn run_agents(&mut self, now: Millis) -> Result<()> {
        if self.is_over() {
            return Ok(());
        }
        for agent in &mut self.agents {
            agent.tick(&mut self.world, now)?;
        }
        Ok(())
    }

    fn spawn_power_up(&mut self, now: Millis) {
        if !self.world.mode.spawns_power_ups() || now.saturating_sub(self.last_spawn_at) < POWER_UP_SPAWN_INTERVAL {
            return;
        }
        // the interval restarts even when the roll finds no room
        self.last_spawn_at = now;
        if let Some((coords, kind)) = self.world.engine.try_spawn_power_up(&mut self.world.rng) {
            self.world.emit(spawn_event(coords, kind));
        }
    }

    /// The remote player's due entries are dropped here; their effect arrives
    /// as an activation event with the center the remote peer picked.
    fn activate_power_ups(&mut self, now: Millis) -> Result<()> {
        let world = &mut self.world;
        for player in PlayerId::ALL {
            let due = world.engine.take_due_power_ups(player, now);
            if !world.mode.controls(player) {
                if !due.is_empty() {
                    log::trace!("Leaving {} activations of {:?} to its peer", due.len(), player);
                }
                continue;
            }
            for kind in due {
                let center = if kind.needs_center() {
                    world.engine.pick_power_up_center(player, kind, &mut world.rng)
                } else {
                    None
                };
                world.emit(activation_event(kind, center));
                world.engine.apply_power_up(player, kind, center, now)?;
            }
        }
        Ok(())
    }

    /// Applies a command from a local input source.
    pub fn perform(&mut self, player: PlayerId, command: Command, now: Millis) -> Result<CommandOutcome> {
        if self.terminal.is_some() {
            return Err(GameError::AlreadyEnded);
        }
        self.world.perform(player, command, now)
    }

    /// Replays an event from the remote peer on its player.
    pub fn apply_remote(&mut self, event: &GameEvent, now: Millis) -> Result<()> {
        let SessionMode::Online { local } = self.world.mode else {
            return Err(GameError::NotOnline);
        };
        if self.terminal.is_some() {
            return Err(GameError::AlreadyEnded);
        }
        replay_event(&mut self.world.engine, local.other(), event, now)
    }

    /// Handles one text frame from the relay during a match. Frames that do
    /// not decode, or events the engine rejects, are dropped.
    pub fn handle_relay_text(&mut self, text: &str, now: Millis) {
        match protocol::decode::<Inbound>(text) {
            Ok(Inbound::Peer(PeerFrame::Event { data })) => {
                if let Err(err) = self.apply_remote(&data, now) {
                    log::debug!("Dropping remote {:?}: {}", data, err);
                }
            }
            Ok(Inbound::Notice(RelayNotice::OpponentLeft)) => {
                log::debug!("Opponent left the match");
                self.terminal.get_or_insert(TerminalReason::OpponentLeft);
            }
            Ok(Inbound::Notice(notice)) => log::debug!("Ignoring {:?} during a match", notice),
            Err(err) => log::debug!("Dropping relay frame: {}", err),
        }
    }

    pub fn connection_lost(&mut self) {
        self.terminal.get_or_insert(TerminalReason::ConnectionFailed);
    }

    pub fn drain_outbox(&mut self) -> Vec<GameEvent> {
        core::mem::take(&mut self.world.outbox)
    }

    /// Drains the outbox as frames ready for the relay.
    pub fn drain_outbox_frames(&mut self) -> protocol::Result<Vec<String>> {
        self.drain_outbox().iter().map(event_frame).collect()
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.world.engine.take_effects()
    }

    /// New board from `seed` with the same players and agents.
    pub fn reset(&mut self, seed: u32, now: Millis) -> Result<()> {
        let config = *self.world.engine.config();
        let layout = SeededGenerator::new(seed).generate(&config);
        self.world.engine.restart(&layout)?;
        self.world.rng = SmallRng::seed_from_u64(u64::from(seed));
        self.world.outbox.clear();
        self.agents.iter_mut().for_each(AiAgent::reset);
        self.last_spawn_at = now;
        self.terminal = None;
        log::debug!("Session reset with seed {}", seed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::POWER_UP_ACTIVATION_DELAY;

    fn small() -> GameConfig {
        GameConfig::new((10, 10), 0.15).unwrap()
    }

    fn online_pair(seed: u32) -> (Session, Session) {
        (
            Session::online(small(), seed, PlayerId::One, 0).unwrap(),
            Session::online(small(), seed, PlayerId::Two, 0).unwrap(),
        )
    }

    fn deliver(from: &mut Session, to: &mut Session, now: Millis) {
        for frame in from.drain_outbox_frames().unwrap() {
            to.handle_relay_text(&frame, now);
        }
    }

    #[test]
    fn local_session_emits_nothing() {
        let mut session = Session::local(small(), 5, 0).unwrap();
        session.perform(PlayerId::Two, Command::Reveal, 0).unwrap();
        assert!(session.drain_outbox().is_empty());
    }

    #[test]
    fn online_session_only_drives_its_player() {
        let (mut one, _) = online_pair(5);
        assert_eq!(
            one.perform(PlayerId::Two, Command::Reveal, 0),
            Err(GameError::NotAuthoritative)
        );
        assert_eq!(
            one.add_ai(AiAgent::new(PlayerId::Two, Difficulty::Easy, 1)),
            Err(GameError::NotAuthoritative)
        );
        assert_eq!(
            Session::local(small(), 5, 0)
                .unwrap()
                .apply_remote(&GameEvent::PrecisionAttack, 0),
            Err(GameError::NotOnline)
        );
    }

    #[test]
    fn local_commands_reach_the_peer() {
        let (mut one, mut two) = online_pair(11);

        one.perform(PlayerId::One, Command::Move(Direction::Right), 0).unwrap();
        one.perform(PlayerId::One, Command::Move(Direction::Up), 200).unwrap();
        one.perform(PlayerId::One, Command::Reveal, 300).unwrap();
        assert_eq!(
            one.drain_outbox(),
            [GameEvent::Move { x: 1, y: 0 }, GameEvent::Reveal { x: 1, y: 0 }]
        );

        one.perform(PlayerId::One, Command::Flag, 400).unwrap();
        deliver(&mut one, &mut two, 400);
        two.perform(PlayerId::Two, Command::Reveal, 500).unwrap();
        deliver(&mut two, &mut one, 500);

        assert_eq!(two.engine().player(PlayerId::One).position, (1, 0));
        assert_eq!(one.engine().snapshot(), two.engine().snapshot());
    }

    #[test]
    fn malformed_frames_are_dropped() {
        let (_, mut two) = online_pair(3);
        let before = two.engine().snapshot();

        two.handle_relay_text("{", 0);
        two.handle_relay_text(r#"{"type":"event","data":{"type":"teleport"}}"#, 0);
        two.handle_relay_text(r#"{"type":"event","data":{"type":"reveal","x":40,"y":0}}"#, 0);

        assert_eq!(two.engine().snapshot(), before);
        assert_eq!(two.terminal(), None);
    }

    #[test]
    fn opponent_leaving_ends_the_session() {
        let (mut one, _) = online_pair(3);
        one.handle_relay_text(r#"{"type":"opponent_left"}"#, 0);

        assert_eq!(one.terminal(), Some(TerminalReason::OpponentLeft));
        assert!(one.is_over());
        assert_eq!(
            one.perform(PlayerId::One, Command::Reveal, 0),
            Err(GameError::AlreadyEnded)
        );
        one.connection_lost();
        assert_eq!(one.terminal(), Some(TerminalReason::OpponentLeft));
    }

    #[test]
    fn spawn_interval_restarts_even_without_room() {
        let (mut one, mut two) = online_pair(8);

        one.tick(POWER_UP_SPAWN_INTERVAL - 1).unwrap();
        assert_eq!(one.engine().power_ups_on_board(), 0);

        one.tick(POWER_UP_SPAWN_INTERVAL).unwrap();
        assert_eq!(one.engine().power_ups_on_board(), 1);
        one.tick(POWER_UP_SPAWN_INTERVAL + 10).unwrap();
        assert_eq!(one.engine().power_ups_on_board(), 1);

        // player two never rolls spawns
        two.tick(POWER_UP_SPAWN_INTERVAL * 3).unwrap();
        assert_eq!(two.engine().power_ups_on_board(), 0);

        deliver(&mut one, &mut two, POWER_UP_SPAWN_INTERVAL * 3);
        assert_eq!(two.engine().power_ups_on_board(), 1);
    }

    #[test]
    fn remote_activation_waits_for_its_event() {
        let (mut one, mut two) = online_pair(21);
        // (1, 1) is next to the spawn, so never a mine
        for session in [&mut one, &mut two] {
            session.world.engine.place_power_up((1, 1), PowerUpKind::Shield).unwrap();
            session.world.engine.place_player(PlayerId::One, (1, 1)).unwrap();
        }

        one.perform(PlayerId::One, Command::Reveal, 0).unwrap();
        deliver(&mut one, &mut two, 0);

        let due = POWER_UP_ACTIVATION_DELAY;
        two.tick(due).unwrap();
        assert!(!two.engine().player(PlayerId::One).has_shield);
        assert!(two.engine().player(PlayerId::One).pending_power_ups.is_empty());

        one.tick(due).unwrap();
        assert!(one.engine().player(PlayerId::One).has_shield);
        deliver(&mut one, &mut two, due);
        assert!(two.engine().player(PlayerId::One).has_shield);
    }

    #[test]
    fn reset_keeps_mode_and_agents() {
        let mut session = Session::local(small(), 1, 0).unwrap();
        session.add_ai(AiAgent::new(PlayerId::Two, Difficulty::Hard, 4)).unwrap();
        session.perform(PlayerId::One, Command::Reveal, 0).unwrap();
        session.connection_lost();

        session.reset(2, 1_000).unwrap();

        assert!(!session.is_over());
        assert_eq!(session.engine().resolved_safe_tiles(), 0);
        assert_eq!(session.agents().len(), 1);
        assert_eq!(session.mode(), SessionMode::Local);
    }

    #[test]
    fn ai_duel_finishes() {
        let mut session = Session::local(small(), 77, 0).unwrap();
        session.add_ai(AiAgent::new(PlayerId::One, Difficulty::Hard, 1)).unwrap();
        session.add_ai(AiAgent::new(PlayerId::Two, Difficulty::Medium, 2)).unwrap();

        let mut now = 0;
        while !session.is_over() && now < 600_000 {
            session.tick(now).unwrap();
            now += 20;
        }

        let engine = session.engine();
        assert!(engine.is_finished());
        assert_eq!(engine.resolved_safe_tiles(), engine.total_safe_tiles());
        assert_eq!(engine.count_resolved_safe_tiles(), engine.total_safe_tiles());
    }
}
