//! Drives sessions on a simulated clock.

use anyhow::Result;
use log::{debug, trace, warn};
use mineblown_core::*;
use serde::Serialize;

#[derive(Copy, Clone, Debug)]
pub struct RunLimits {
    pub max_ms: Millis,
    pub tick_ms: Millis,
}

/// Outcome of one run, logged as a single JSON line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub mode: &'static str,
    pub seed: u32,
    pub finished: bool,
    pub winner: Option<u8>,
    pub scores: [i32; 2],
    pub resolved: CellCount,
    pub total_safe: CellCount,
    pub elapsed_ms: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
}

impl Report {
    fn new(mode: &'static str, seed: u32, engine: &Engine, elapsed_ms: Millis) -> Self {
        Self {
            mode,
            seed,
            finished: engine.is_finished(),
            winner: engine.winner().map(PlayerId::number),
            scores: PlayerId::ALL.map(|player| engine.player(player).score),
            resolved: engine.resolved_safe_tiles(),
            total_safe: engine.total_safe_tiles(),
            elapsed_ms,
            frames: None,
            converged: None,
        }
    }
}

fn agent_seed(seed: u32, player: PlayerId) -> u64 {
    (u64::from(seed) << 1) | player.index() as u64
}

fn log_effects(session: &mut Session, label: &str) {
    for effect in session.take_effects() {
        trace!("[{label}] {effect:?}");
    }
}

/// Both players driven by AI agents in one local session.
pub fn duel(config: GameConfig, seed: u32, difficulties: [Difficulty; 2], limits: RunLimits) -> Result<Report> {
    let mut session = Session::local(config, seed, 0)?;
    for player in PlayerId::ALL {
        let difficulty = difficulties[player.index()];
        debug!("Player {} plays {difficulty}", player.number());
        session.add_ai(AiAgent::new(player, difficulty, agent_seed(seed, player)))?;
    }

    let mut now = 0;
    while !session.is_over() && now < limits.max_ms {
        session.tick(now)?;
        log_effects(&mut session, "duel");
        now += limits.tick_ms;
    }

    if !session.is_over() {
        warn!("Gave up after {now}ms without a winner");
    }
    Ok(Report::new("duel", seed, session.engine(), now))
}

/// Two online sessions, one per player, linked by an in-memory relay.
///
/// Each round runs both peers' timers and then both agents, handing every
/// frame to the other peer in order right after it was produced. The engine
/// snapshots are compared after every round.
pub fn mirror(config: GameConfig, seed: u32, difficulty: Difficulty, limits: RunLimits) -> Result<Report> {
    let mut link = Link {
        peers: [
            Link::peer(config, seed, PlayerId::One, difficulty)?,
            Link::peer(config, seed, PlayerId::Two, difficulty)?,
        ],
        frames: 0,
    };

    let mut now = 0;
    let mut converged = true;
    while !link.peers.iter().all(Session::is_over) && now < limits.max_ms {
        link.round(now)?;
        if converged && link.peers[0].engine().snapshot() != link.peers[1].engine().snapshot() {
            warn!("Peers diverged at {now}ms");
            converged = false;
        }
        now += limits.tick_ms;
    }

    let mut report = Report::new("mirror", seed, link.peers[0].engine(), now);
    report.frames = Some(link.frames);
    report.converged = Some(converged);
    Ok(report)
}

struct Link {
    peers: [Session; 2],
    frames: usize,
}

impl Link {
    fn peer(config: GameConfig, seed: u32, local: PlayerId, difficulty: Difficulty) -> Result<Session> {
        let mut session = Session::online(config, seed, local, 0)?;
        session.add_ai(AiAgent::new(local, difficulty, agent_seed(seed, local)))?;
        Ok(session)
    }

    fn round(&mut self, now: Millis) -> Result<()> {
        for player in PlayerId::ALL {
            self.peers[player.index()].advance_timers(now)?;
            self.deliver(player, now)?;
        }
        for player in PlayerId::ALL {
            self.peers[player.index()].run_agents(now)?;
            self.deliver(player, now)?;
        }
        Ok(())
    }

    fn deliver(&mut self, from: PlayerId, now: Millis) -> Result<()> {
        let [one, two] = &mut self.peers;
        let (sender, receiver) = match from {
            PlayerId::One => (one, two),
            PlayerId::Two => (two, one),
        };
        for frame in sender.drain_outbox_frames()? {
            trace!("[P{}] {frame}", from.number());
            receiver.handle_relay_text(&frame, now);
            self.frames += 1;
        }
        log_effects(sender, "sender");
        log_effects(receiver, "receiver");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: RunLimits = RunLimits {
        max_ms: 600_000,
        tick_ms: 20,
    };

    fn small() -> GameConfig {
        GameConfig::new((10, 10), 0.15).unwrap()
    }

    #[test]
    fn agent_seeds_differ_per_player() {
        assert_ne!(agent_seed(5, PlayerId::One), agent_seed(5, PlayerId::Two));
        assert_ne!(agent_seed(5, PlayerId::Two), agent_seed(6, PlayerId::One));
    }

    #[test]
    fn duel_reports_engine_state() {
        let report = duel(small(), 77, [Difficulty::Hard, Difficulty::Medium], LIMITS).unwrap();

        assert_eq!(report.mode, "duel");
        assert!(report.resolved <= report.total_safe);
        assert_eq!(report.finished, report.resolved == report.total_safe);
        assert!(report.elapsed_ms <= LIMITS.max_ms);
        assert_eq!(report.converged, None);
    }

    #[test]
    fn short_duel_stops_at_the_limit() {
        let limits = RunLimits {
            max_ms: 100,
            tick_ms: 20,
        };
        let report = duel(GameConfig::standard(), 3, [Difficulty::Practice; 2], limits).unwrap();
        assert!(!report.finished);
        assert_eq!(report.winner, None);
        assert_eq!(report.elapsed_ms, 100);
    }

    #[test]
    fn mirror_peers_converge() {
        let limits = RunLimits {
            max_ms: 20_000,
            tick_ms: 20,
        };
        let report = mirror(small(), 31, Difficulty::Hard, limits).unwrap();
        assert_eq!(report.converged, Some(true));
        assert!(report.frames.is_some_and(|frames| frames > 0));
    }

    #[test]
    fn report_serializes_without_empty_fields() {
        let engine = Engine::new(small(), 1).unwrap();
        let json = serde_json::to_string(&Report::new("duel", 1, &engine, 0)).unwrap();
        assert!(json.starts_with(r#"{"mode":"duel","seed":1,"finished":false,"winner":null"#));
        assert!(!json.contains("converged"));
    }
}
