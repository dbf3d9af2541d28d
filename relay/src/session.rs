//! WebSocket session for one connected client.
//!
//! The session only moves text between its socket and the [`RelayServer`];
//! matchmaking and pairing are decided there.

use actix::prelude::*;
use actix_web::{Error, HttpRequest, HttpResponse, web};
use actix_web_actors::ws;
use log::debug;

use crate::lobby::PeerId;
use crate::server::{Connect, Deliver, Disconnect, Frame, RelayServer};

pub struct PeerSession {
    /// Assigned by the server once `started` completes.
    peer: Option<PeerId>,
    server: Addr<RelayServer>,
}

impl PeerSession {
    pub fn new(server: Addr<RelayServer>) -> Self {
        Self { peer: None, server }
    }

    /// Sessions that never got an id have nothing to release.
    fn disconnect(&self) -> Option<Disconnect> {
        self.peer.map(|peer| Disconnect { peer })
    }
}

impl Actor for PeerSession {
    type Context = ws::WebsocketContext<Self>;

    /// Registers with the server. Frames are held until the id is known.
    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        self.server
            .send(Connect {
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(peer) => act.peer = Some(peer),
                    Err(err) => {
                        debug!("[Relay] Server unreachable: {err}");
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(msg) = self.disconnect() {
            self.server.do_send(msg);
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PeerSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match self.peer {
                Some(peer) => self.server.do_send(Frame {
                    peer,
                    text: text.to_string(),
                }),
                None => debug!("[Relay] Dropping frame from an unregistered socket"),
            },
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) => debug!("[Relay] Ignoring binary frame from peer {:?}", self.peer),
            Err(err) => {
                debug!("[Relay] Protocol error from peer {:?}: {err}", self.peer);
                ctx.stop();
            }
            _ => (),
        }
    }
}

impl Handler<Deliver> for PeerSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

/// Upgrades the request and hands the socket to a new [`PeerSession`].
pub async fn ws_relay(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<RelayServer>>,
) -> Result<HttpResponse, Error> {
    ws::start(PeerSession::new(server.get_ref().clone()), &req, stream)
}
