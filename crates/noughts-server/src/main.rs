//! Tic-tac-toe server binary.
//!
//! Run with: `cargo run -p noughts-server -- --bind 0.0.0.0:5555`
//! Then connect any line-oriented client, e.g. `nc localhost 5555`, and
//! send `{"type":"join"}`.

use clap::Parser;
use noughts::transport::DEFAULT_MAX_FRAME_LENGTH;
use noughts::{NoughtsError, Server, DEFAULT_WELCOME_MESSAGE};
use tracing_subscriber::EnvFilter;

/// Two-player tic-tac-toe over newline-delimited JSON.
#[derive(Parser, Debug)]
#[command(name = "noughts-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5555")]
    bind: String,

    /// Text of the welcome message sent to every client
    #[arg(long, default_value = DEFAULT_WELCOME_MESSAGE)]
    welcome: String,

    /// Longest accepted request line, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LENGTH)]
    max_frame_length: usize,

    /// Put every client into matchmaking on connect, without `join`
    #[arg(long)]
    auto_join: bool,

    /// Log filter, e.g. `debug` or `noughts=trace` (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

fn init_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl-C received");
}

#[tokio::main]
async fn main() -> Result<(), NoughtsError> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let server = Server::builder()
        .bind(&args.bind)
        .welcome_message(args.welcome)
        .max_frame_length(args.max_frame_length)
        .auto_join(args.auto_join)
        .build()
        .await?;

    server.run_until(shutdown_signal()).await
}
