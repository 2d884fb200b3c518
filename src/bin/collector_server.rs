//! Collector server: ingests pose landmark frames over HTTP and keeps a
//! bounded in-memory history for monitors and downstream consumers.

use actix_web::web;
use anyhow::Result;

use pose_relay::config::Config;
use pose_relay::ingest::{run_server, CollectorState};

const CONFIG_PATH: &str = "pose_relay.toml";

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load_or_default(CONFIG_PATH);
    let collector = config.collector;

    // PORT env overrides the config file, matching common PaaS setups
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(collector.port);

    println!("Collector Server ({})", env!("GIT_VERSION"));
    println!("Listening on {}:{}", collector.host, port);
    println!("  POST /pose-landmarks   ingest a landmark frame");
    println!("  GET  /pose-data        recent frames (?limit=N)");
    println!("  GET  /health           health and retention stats");
    println!("  GET  /                 monitor page");

    let state = web::Data::new(CollectorState::new());
    run_server(state, &collector.host, port)?.await?;

    Ok(())
}
