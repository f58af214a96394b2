mod config;
mod errors;
mod files;
mod logging;
mod orders;
mod resolver;
mod security;
mod server;
mod validate;


use crate::config::Config;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("canonlab.toml");
    let mut i = 1;
    while i < args.len() {
        if args[i].as_str() == "--config" {
            i += 1;
            if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
            config_path = PathBuf::from(&args[i]);
        }
        i += 1;
    }

    let mut cfg = Config::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    cfg.apply_env().context("applying environment")?;
    cfg.validate().context("validating config")?;

    let root = config::prepare_root(&cfg.storage.root_dir)?;
    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    info!(
        addr = %addr,
        root = %root.display(),
        insecure_routes = cfg.demo.insecure_routes,
        "canonlab ready"
    );
    println!("canonlab listening on http://{addr} root={}", root.display());

    let state = server::AppState::new(cfg, root, orders::OrderStore::seeded());
    server::serve(state).await
}
