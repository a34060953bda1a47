//! Quarto match server and automated client.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod protocol;
mod room;
mod server;

use server::ServerState;

#[derive(Parser)]
#[command(name = "quarto", version, about = "Play Quarto over WebSocket")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Host games between connecting players
    Server {
        /// Interface to bind
        #[arg(long, default_value = "localhost", env = "QUARTO_HOST")]
        host: String,

        #[arg(short, long, default_value_t = 5000, env = "QUARTO_PORT")]
        port: u16,

        /// Log at debug level, including the board after every move
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },

    /// Join a server and play one game with the heuristic player
    Client {
        /// Name shown to the opponent
        name: String,

        #[arg(long, default_value = "127.0.0.1", env = "QUARTO_HOST")]
        host: String,

        #[arg(short, long, default_value_t = 5000, env = "QUARTO_PORT")]
        port: u16,

        #[arg(short, long, default_value_t = false)]
        verbose: bool,

        /// Seed the player's random choices for reproducible games
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Server {
            host,
            port,
            verbose,
        } => {
            init_tracing(verbose);
            info!("Starting Quarto server...");
            let state = Arc::new(ServerState::new());
            server::run_server(&format!("{}:{}", host, port), state).await
        }
        Command::Client {
            name,
            host,
            port,
            verbose,
            seed,
        } => {
            init_tracing(verbose);
            let url = format!("ws://{}:{}", host, port);
            client::run_client(&name, &url, seed).await
        }
    }
}
