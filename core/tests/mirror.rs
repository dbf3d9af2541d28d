//! Two online sessions linked by an in-memory relay must end up identical.

use mineblown_core::*;
use proptest::prelude::*;

const STEP: Millis = 20;

struct Link {
    peers: [Session; 2],
}

impl Link {
    fn new(config: GameConfig, seed: u32, difficulty: Difficulty) -> Self {
        let peers = PlayerId::ALL.map(|local| {
            let mut session = Session::online(config, seed, local, 0).unwrap();
            let agent = AiAgent::new(local, difficulty, u64::from(seed) + local.index() as u64);
            session.add_ai(agent).unwrap();
            session
        });
        Self { peers }
    }

    fn deliver(&mut self, from: PlayerId, now: Millis) {
        let [one, two] = &mut self.peers;
        let (sender, receiver) = match from {
            PlayerId::One => (one, two),
            PlayerId::Two => (two, one),
        };
        for frame in sender.drain_outbox_frames().unwrap() {
            receiver.handle_relay_text(&frame, now);
        }
    }

    /// Timers on both peers, then both agents, each followed by delivery.
    fn round(&mut self, now: Millis) {
        for player in PlayerId::ALL {
            self.peers[player.index()].advance_timers(now).unwrap();
            self.deliver(player, now);
        }
        for player in PlayerId::ALL {
            self.peers[player.index()].run_agents(now).unwrap();
            self.deliver(player, now);
        }
    }

    fn snapshots_match(&self) -> bool {
        self.peers[0].engine().snapshot() == self.peers[1].engine().snapshot()
    }
}

#[test]
fn standard_match_converges() {
    let mut link = Link::new(GameConfig::standard(), 4242, Difficulty::Hard);
    let mut now = 0;

    while !link.peers[0].is_over() && now < 900_000 {
        link.round(now);
        assert!(link.snapshots_match(), "peers diverged at {now}ms");
        now += STEP;
    }

    let [one, two] = &link.peers;
    assert!(one.engine().is_finished());
    assert!(two.engine().is_finished());
    assert_eq!(one.engine().winner(), two.engine().winner());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn small_matches_converge(seed in any::<u32>(), rounds in 50..600usize) {
        let config = GameConfig::new((10, 10), 0.15).unwrap();
        let mut link = Link::new(config, seed, Difficulty::Medium);

        for round in 0..rounds {
            let now = round as Millis * STEP;
            link.round(now);
            prop_assert!(link.snapshots_match(), "peers diverged at {}ms", now);
        }
    }
}
