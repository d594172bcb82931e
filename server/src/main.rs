use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, then runs the listener until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "7373")]
        port: u16,
        /// Kills needed to win a round
        #[clap(short, long, default_value = "10")]
        kill_goal: u32,
        /// Hard cap on round length, in seconds
        #[clap(short, long, default_value = "180")]
        round_secs: u64,
        /// Maximum simultaneous connections
        #[clap(short, long, default_value = "256")]
        max_clients: usize,
        /// HTML page served to plain browser requests
        #[clap(short, long)]
        document: Option<PathBuf>,
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = Args::parse();

    let mut config = ServerConfig::new(format!("{}:{}", args.host, args.port));
    config.document = args.document;
    config.game.kill_goal = args.kill_goal;
    config.game.round_duration = Duration::from_secs(args.round_secs);
    config.game.max_clients = args.max_clients;

    info!(
        "Starting arena server: kill goal {}, {}s rounds, up to {} clients",
        config.game.kill_goal, args.round_secs, config.game.max_clients
    );
    let server = Server::new(config).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
