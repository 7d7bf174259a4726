//! Checklist server binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve remote terminals over TCP
//! checklist-server --bind 0.0.0.0:2222 --data checklist_data.json
//!
//! # Run a single session on this terminal
//! checklist-server --local alice
//! ```

use checklist_app::{Runtime, Session, SessionEvent};
use checklist_tui::{
    Server, ServerConfig, TerminalDriver,
    server::{DEFAULT_BIND, DEFAULT_DATA_FILE, open_store},
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Shared checklist server
#[derive(Parser, Debug)]
#[command(name = "checklist-server")]
#[command(about = "Multi-user terminal checklist server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Path to the data file
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    data: String,

    /// Run one session on this terminal as the given identity instead of
    /// listening
    #[arg(long, value_name = "IDENTITY")]
    local: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    ///
    /// Defaults to info, or warn with --local.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.local.is_some() { "warn" } else { "info" };
    let level = args.log_level.as_deref().unwrap_or(default_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match args.local {
        Some(identity) => run_local(identity, args.data).await,
        None => run_server(args.bind, args.data).await,
    }
}

async fn run_server(bind: String, data: String) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Checklist server starting");
    tracing::info!("Binding to {bind}");

    let server = Server::bind(ServerConfig { bind_address: bind, data_path: data.into() }).await?;

    tokio::select! {
        () = server.run() => {},
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Stopping checklist server");
        },
    }
    Ok(())
}

async fn run_local(identity: String, data: String) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(data);
    let driver = TerminalDriver::new()?;
    let size = driver.size()?;

    let mut session = Session::new(store, identity);
    session.handle(SessionEvent::Resize(size.0, size.1));

    Runtime::new(driver, session).run().await?;
    Ok(())
}
