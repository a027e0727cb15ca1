use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use users_api::config::Config;
use users_api::{Server, UserStore, api};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = Arc::new(UserStore::new());

    Server::bind(config.socket_addr())
        .serve(api::routes(store))
        .await?;

    Ok(())
}
