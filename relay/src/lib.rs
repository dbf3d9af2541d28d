//! WebSocket relay for two-player matches.
//!
//! Clients ask for a quick match or a private room; once two sockets are
//! paired, every text frame one sends reaches the other untouched.

use actix_web::web;

pub mod config;
pub mod lobby;
pub mod server;
pub mod session;

pub use config::RelayArgs;
pub use lobby::{Lobby, Outgoing, PeerId};
pub use server::RelayServer;

/// Both paths accept the relay socket.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").to(session::ws_relay))
        .service(web::resource("/ws").to(session::ws_relay));
}
