//! Matchmaking and forwarding rules, without any sockets.
//!
//! Every call returns the frames to send, addressed by [`PeerId`]. The actor
//! in [`crate::server`] owns the sockets and delivers them.

use std::collections::HashMap;

use mineblown_protocol::{self as protocol, ClientRequest, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RelayNotice};
use rand::Rng;

pub type PeerId = u64;

/// Frames at or above this seed would not survive the browser client's
/// integer handling.
const SEED_LIMIT: u32 = 1 << 31;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outgoing {
    pub to: PeerId,
    pub text: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    /// Still talking to the relay.
    Lobby,
    Paired(PeerId),
    /// The partner left; frames go nowhere.
    Orphaned,
}

#[derive(Clone, Debug)]
struct Peer {
    stage: Stage,
    room: Option<String>,
}

#[derive(Debug)]
pub struct Lobby<R> {
    peers: HashMap<PeerId, Peer>,
    waiting: Option<PeerId>,
    rooms: HashMap<String, PeerId>,
    rng: R,
}

impl<R: Rng> Lobby<R> {
    pub fn new(rng: R) -> Self {
        Self {
            peers: HashMap::new(),
            waiting: None,
            rooms: HashMap::new(),
            rng,
        }
    }

    pub fn connect(&mut self, peer: PeerId) {
        log::debug!("[Relay] Peer {peer} connected");
        self.peers.insert(
            peer,
            Peer {
                stage: Stage::Lobby,
                room: None,
            },
        );
    }

    pub fn waiting(&self) -> Option<PeerId> {
        self.waiting
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn partner(&self, peer: PeerId) -> Option<PeerId> {
        match self.peers.get(&peer)?.stage {
            Stage::Paired(partner) => Some(partner),
            Stage::Lobby | Stage::Orphaned => None,
        }
    }

    /// Handles one text frame. Paired peers have their frames forwarded
    /// untouched; everyone else is parsed as a matchmaking request.
    pub fn receive(&mut self, peer: PeerId, text: &str) -> Vec<Outgoing> {
        let Some(stage) = self.peers.get(&peer).map(|state| state.stage) else {
            log::debug!("[Relay] Frame from unknown peer {peer}");
            return Vec::new();
        };

        match stage {
            Stage::Paired(partner) => vec![Outgoing {
                to: partner,
                text: text.to_owned(),
            }],
            Stage::Orphaned => Vec::new(),
            Stage::Lobby => match protocol::decode::<ClientRequest>(text) {
                Ok(ClientRequest::Quickmatch) => self.quickmatch(peer),
                Ok(ClientRequest::CreateRoom) => self.create_room(peer),
                Ok(ClientRequest::JoinRoom { code }) => self.join_room(peer, &code),
                Err(err) => {
                    log::debug!("[Relay] Dropping frame from peer {peer}: {err}");
                    Vec::new()
                }
            },
        }
    }

    fn quickmatch(&mut self, peer: PeerId) -> Vec<Outgoing> {
        match self.waiting.take() {
            Some(waiting) if waiting != peer => self.pair(waiting, peer),
            _ => {
                log::info!("[Relay] Peer {peer} is waiting for a quick match");
                self.waiting = Some(peer);
                notice(peer, &RelayNotice::Waiting).into_iter().collect()
            }
        }
    }

    fn create_room(&mut self, peer: PeerId) -> Vec<Outgoing> {
        let code = self.unused_room_code();
        if let Some(old) = self.peers.get_mut(&peer).and_then(|state| state.room.replace(code.clone())) {
            self.rooms.remove(&old);
        }
        self.rooms.insert(code.clone(), peer);
        log::info!("[Relay] Peer {peer} opened room {code}");
        notice(peer, &RelayNotice::RoomCreated { code }).into_iter().collect()
    }

    fn join_room(&mut self, peer: PeerId, raw_code: &str) -> Vec<Outgoing> {
        let host = protocol::normalize_room_code(raw_code)
            .ok()
            .and_then(|code| self.rooms.get(&code).copied())
            .filter(|&host| host != peer);
        match host {
            Some(host) => self.pair(host, peer),
            None => {
                log::debug!("[Relay] Peer {peer} asked for unknown room {raw_code:?}");
                notice(peer, &RelayNotice::RoomNotFound).into_iter().collect()
            }
        }
    }

    /// Pairs two lobby peers; `first` plays as player one.
    fn pair(&mut self, first: PeerId, second: PeerId) -> Vec<Outgoing> {
        for peer in [first, second] {
            self.leave_lobby(peer);
        }
        if let Some(state) = self.peers.get_mut(&first) {
            state.stage = Stage::Paired(second);
        }
        if let Some(state) = self.peers.get_mut(&second) {
            state.stage = Stage::Paired(first);
        }

        let seed = self.rng.random_range(0..SEED_LIMIT);
        log::info!("[Relay] Matched peer {first} with peer {second}, seed {seed}");
        [(first, 1), (second, 2)]
            .into_iter()
            .filter_map(|(peer, player_num)| notice(peer, &RelayNotice::Matched { player_num, seed }))
            .collect()
    }

    /// Drops the peer from the waiting slot and closes its room.
    fn leave_lobby(&mut self, peer: PeerId) {
        if self.waiting == Some(peer) {
            self.waiting = None;
        }
        if let Some(code) = self.peers.get_mut(&peer).and_then(|state| state.room.take()) {
            self.rooms.remove(&code);
        }
    }

    /// Forgets the peer and tells its partner, if any.
    pub fn disconnect(&mut self, peer: PeerId) -> Vec<Outgoing> {
        self.leave_lobby(peer);
        let Some(state) = self.peers.remove(&peer) else {
            return Vec::new();
        };
        log::debug!("[Relay] Peer {peer} disconnected");

        let Stage::Paired(partner) = state.stage else {
            return Vec::new();
        };
        if let Some(partner_state) = self.peers.get_mut(&partner) {
            partner_state.stage = Stage::Orphaned;
        }
        log::info!("[Relay] Peer {peer} left, notifying peer {partner}");
        notice(partner, &RelayNotice::OpponentLeft).into_iter().collect()
    }

    fn unused_room_code(&mut self) -> String {
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| char::from(ROOM_CODE_ALPHABET[self.rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

fn notice(to: PeerId, notice: &RelayNotice) -> Option<Outgoing> {
    match protocol::encode(notice) {
        Ok(text) => Some(Outgoing { to, text }),
        Err(err) => {
            log::error!("[Relay] Could not encode {notice:?}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const QUICKMATCH: &str = r#"{"type":"quickmatch"}"#;
    const CREATE_ROOM: &str = r#"{"type":"create_room"}"#;

    fn lobby(peers: &[PeerId]) -> Lobby<SmallRng> {
        let mut lobby = Lobby::new(SmallRng::seed_from_u64(9));
        for &peer in peers {
            lobby.connect(peer);
        }
        lobby
    }

    fn decode(out: &Outgoing) -> RelayNotice {
        protocol::decode(&out.text).unwrap()
    }

    fn matched(out: &Outgoing) -> (u8, u32) {
        match decode(out) {
            RelayNotice::Matched { player_num, seed } => (player_num, seed),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    fn room_code(out: &[Outgoing]) -> String {
        match decode(&out[0]) {
            RelayNotice::RoomCreated { code } => code,
            other => panic!("expected a room, got {other:?}"),
        }
    }

    #[test]
    fn quickmatch_pairs_the_waiting_peer_first() {
        let mut lobby = lobby(&[1, 2]);

        let out = lobby.receive(1, QUICKMATCH);
        assert_eq!(decode(&out[0]), RelayNotice::Waiting);
        assert_eq!(lobby.waiting(), Some(1));

        let out = lobby.receive(2, QUICKMATCH);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, 1);
        assert_eq!(out[1].to, 2);
        let (first, seed) = matched(&out[0]);
        let (second, other_seed) = matched(&out[1]);
        assert_eq!((first, second), (1, 2));
        assert_eq!(seed, other_seed);
        assert!(seed < SEED_LIMIT);
        assert_eq!(lobby.waiting(), None);
        assert_eq!(lobby.partner(1), Some(2));
    }

    #[test]
    fn repeated_quickmatch_keeps_waiting() {
        let mut lobby = lobby(&[1]);
        lobby.receive(1, QUICKMATCH);
        let out = lobby.receive(1, QUICKMATCH);
        assert_eq!(decode(&out[0]), RelayNotice::Waiting);
        assert_eq!(lobby.partner(1), None);
    }

    #[test]
    fn rooms_match_case_insensitively() {
        let mut lobby = lobby(&[1, 2]);
        let code = room_code(&lobby.receive(1, CREATE_ROOM));
        assert_eq!(code.len(), ROOM_CODE_LEN);
        assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));

        let join = format!(r#"{{"type":"join_room","code":"{}"}}"#, code.to_lowercase());
        let out = lobby.receive(2, &join);

        assert_eq!(matched(&out[0]).0, 1);
        assert_eq!(out[0].to, 1);
        assert_eq!(lobby.room_count(), 0);
    }

    #[test]
    fn unknown_rooms_are_reported() {
        let mut lobby = lobby(&[1, 2]);
        let code = room_code(&lobby.receive(1, CREATE_ROOM));

        let out = lobby.receive(2, r#"{"type":"join_room","code":"ZZZZ"}"#);
        assert_eq!(decode(&out[0]), RelayNotice::RoomNotFound);

        let own = format!(r#"{{"type":"join_room","code":"{code}"}}"#);
        assert_eq!(decode(&lobby.receive(1, &own)[0]), RelayNotice::RoomNotFound);
    }

    #[test]
    fn matched_frames_are_forwarded_verbatim() {
        let mut lobby = lobby(&[1, 2, 3]);
        lobby.receive(1, QUICKMATCH);
        lobby.receive(2, QUICKMATCH);

        let frame = r#"{"type":"event","data":{"type":"quickmatch"}} trailing junk"#;
        assert_eq!(
            lobby.receive(2, frame),
            vec![Outgoing {
                to: 1,
                text: frame.to_owned()
            }]
        );
        // a paired peer asking again is not parsed, so peer 3 still waits alone
        lobby.receive(1, QUICKMATCH);
        assert_eq!(decode(&lobby.receive(3, QUICKMATCH)[0]), RelayNotice::Waiting);
    }

    #[test]
    fn malformed_lobby_frames_are_dropped() {
        let mut lobby = lobby(&[1]);
        assert!(lobby.receive(1, "hello").is_empty());
        assert!(lobby.receive(1, r#"{"type":"dance"}"#).is_empty());
        assert!(lobby.receive(7, QUICKMATCH).is_empty());
    }

    #[test]
    fn leaving_notifies_the_partner_once() {
        let mut lobby = lobby(&[1, 2]);
        lobby.receive(1, QUICKMATCH);
        lobby.receive(2, QUICKMATCH);

        let out = lobby.disconnect(1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, 2);
        assert_eq!(decode(&out[0]), RelayNotice::OpponentLeft);

        assert!(lobby.receive(2, "anything").is_empty());
        assert!(lobby.disconnect(2).is_empty());
    }

    #[test]
    fn leaving_clears_waiting_slot_and_rooms() {
        let mut lobby = lobby(&[1, 2]);
        lobby.receive(1, QUICKMATCH);
        lobby.receive(2, CREATE_ROOM);

        assert!(lobby.disconnect(1).is_empty());
        assert!(lobby.disconnect(2).is_empty());
        assert_eq!(lobby.waiting(), None);
        assert_eq!(lobby.room_count(), 0);
    }

    #[test]
    fn matching_closes_other_lobby_entries() {
        let mut lobby = lobby(&[1, 2, 3]);
        lobby.receive(1, CREATE_ROOM);
        lobby.receive(1, QUICKMATCH);
        lobby.receive(2, QUICKMATCH);

        assert_eq!(lobby.room_count(), 0);
        assert_eq!(lobby.partner(1), Some(2));
    }
}
