use actix::Actor;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use log::info;
use mineblown_relay::{RelayArgs, RelayServer, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = RelayArgs::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level_filter())
        .parse_default_env()
        .init();

    let server = web::Data::new(RelayServer::new().start());

    let http = HttpServer::new(move || App::new().app_data(server.clone()).configure(routes))
        .bind((args.bind.as_str(), args.port))?;
    info!("[Relay] Listening on {}:{}", args.bind, args.port);
    http.run().await?;
    Ok(())
}
