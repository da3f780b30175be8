use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};

use ludo_arena::auth::AuthService;
use ludo_arena::config::Config;
use ludo_arena::logger;
use ludo_arena::persistence::{BoardStore, MongoBoardStore};
use ludo_arena::pool::BoardPool;
use ludo_arena::rest;
use ludo_arena::rng::{BiasedDice, Dice};
use ludo_arena::server::{ws_handler, Server};
use ludo_arena::wallet::HttpWalletClient;

#[derive(Parser, Debug)]
#[command(
    name = "server",
    version,
    about = "Ludo arena — dedicated multiplayer game server",
    long_about = "Accepts websocket connections against a pool of standing boards \
                  and runs authoritative turn-based game sessions.\n\
                  Wire protocol is JSON-over-WebSocket; see src/server.rs for the full spec."
)]
struct Args {
    /// Port the websocket game server listens on
    #[arg(long = "port", default_value_t = 4000)]
    port: u16,

    /// Port the REST lobby server listens on
    #[arg(long = "restPort", default_value_t = 4001)]
    rest_port: u16,

    /// Increase output verbosity (-v verbose, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);

    let config = Config::load();
    let port = if args.port != 4000 { args.port } else { config.port };
    let rest_port = if args.rest_port != 4001 { args.rest_port } else { config.rest_port };

    let store: Arc<dyn BoardStore> = Arc::new(
        MongoBoardStore::connect(&config.mongo_uri, &config.database)
            .await
            .context("failed to connect to MongoDB")?,
    );
    let wallet = Arc::new(HttpWalletClient::new(config.base_platform_api_url.clone()));
    let auth = AuthService::new(config.jwt_secret.clone());

    let dice_factory: Arc<dyn Fn() -> Arc<dyn Dice> + Send + Sync> = Arc::new(|| Arc::new(BiasedDice::new()) as Arc<dyn Dice>);
    let pool = Arc::new(BoardPool::new(wallet, store, dice_factory));

    pool.tick().await.context("failed to provision initial board pool")?;
    spawn_pool_tick(Arc::clone(&pool));

    let server = Arc::new(Server::new(Arc::clone(&pool), auth));

    let ws_app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(Arc::clone(&server));
    let rest_app = rest::router(Arc::clone(&server));

    let ws_listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind websocket server to port {port}"))?;
    let rest_listener = tokio::net::TcpListener::bind(("0.0.0.0", rest_port))
        .await
        .with_context(|| format!("failed to bind REST server to port {rest_port}"))?;

    tracing::info!(port, "websocket server listening");
    tracing::info!(rest_port, "REST lobby server listening");

    let ws_server = axum::serve(ws_listener, ws_app);
    let rest_server = axum::serve(rest_listener, rest_app);

    tokio::try_join!(
        async { ws_server.await.context("websocket server crashed") },
        async { rest_server.await.context("REST server crashed") },
    )?;

    Ok(())
}

fn spawn_pool_tick(pool: Arc<BoardPool>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(err) = pool.tick().await {
                tracing::warn!(%err, "board pool tick failed");
            }
        }
    });
}
