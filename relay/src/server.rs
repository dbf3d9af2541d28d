//! Relay server actor.
//!
//! Owns the [`Lobby`] and the mailbox of every connected socket, and routes
//! whatever the lobby decides to send.

use std::collections::HashMap;

use actix::prelude::*;
use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::lobby::{Lobby, Outgoing, PeerId};

/// Text frame for one socket.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Deliver(pub String);

/// A socket opened; replies with the id it must use from now on.
#[derive(Message)]
#[rtype(result = "PeerId")]
pub struct Connect {
    pub addr: Recipient<Deliver>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Frame {
    pub peer: PeerId,
    pub text: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub peer: PeerId,
}

pub struct RelayServer {
    lobby: Lobby<SmallRng>,
    sessions: HashMap<PeerId, Recipient<Deliver>>,
    next_peer: PeerId,
}

impl RelayServer {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            lobby: Lobby::new(rng),
            sessions: HashMap::new(),
            next_peer: 1,
        }
    }

    fn dispatch(&self, outgoing: Vec<Outgoing>) {
        for Outgoing { to, text } in outgoing {
            match self.sessions.get(&to) {
                Some(session) => session.do_send(Deliver(text)),
                None => debug!("[Relay] Peer {to} is gone, dropping frame"),
            }
        }
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for RelayServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for RelayServer {
    type Result = PeerId;

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        let peer = self.next_peer;
        self.next_peer += 1;
        self.sessions.insert(peer, msg.addr);
        self.lobby.connect(peer);
        peer
    }
}

impl Handler<Frame> for RelayServer {
    type Result = ();

    fn handle(&mut self, msg: Frame, _ctx: &mut Self::Context) {
        let outgoing = self.lobby.receive(msg.peer, &msg.text);
        self.dispatch(outgoing);
    }
}

impl Handler<Disconnect> for RelayServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) {
        self.sessions.remove(&msg.peer);
        let outgoing = self.lobby.disconnect(msg.peer);
        self.dispatch(outgoing);
    }
}
