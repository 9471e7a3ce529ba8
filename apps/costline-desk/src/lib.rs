//! # Costline Desk Library
//!
//! Session-scoped catalog pricing and cost carts, driven from a terminal.
//!
//! ## Module Organization
//! ```text
//! costline_desk/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── cli.rs          ◄─── Process flags
//! ├── config.rs       ◄─── DeskConfig (defaults → TOML → env → flags)
//! ├── desk.rs         ◄─── Desk context + the per-command evaluation cycle
//! ├── state/
//! │   ├── feed.rs     ◄─── Shared catalog source + FX provider
//! │   ├── session.rs  ◄─── SessionStore (cart + settings per session)
//! │   └── settings.rs ◄─── Per-session VAT / FX / discount settings
//! ├── commands/
//! │   ├── product.rs  ◄─── Fuzzy search
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   └── config.rs   ◄─── Settings + refresh
//! ├── render.rs       ◄─── Text / JSON output
//! ├── shell.rs        ◄─── Line-oriented shell
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod desk;
pub mod error;
pub mod render;
pub mod shell;
pub mod state;

use anyhow::Context;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::DeskConfig;
use desk::Desk;
use render::Renderer;
use shell::{Outcome, Shell};
use state::SessionId;

/// Runs the desk.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging (stderr, RUST_LOG or info,costline=debug)       │
/// │                                                                         │
/// │  2. Load DeskConfig ──────────────────────────────────────────────────► │
/// │     • fails when no catalog source is configured                        │
/// │                                                                         │
/// │  3. Build Desk ───────────────────────────────────────────────────────► │
/// │     • FeedState: catalog source + FX provider, both cached              │
/// │     • SessionStore: empty, seeded with config pricing defaults         │
/// │                                                                         │
/// │  4. One session: a single COMMAND from the flags, or the shell on      │
/// │     stdin until EOF / quit                                              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Costline desk");

    let config = DeskConfig::load(cli.config.clone(), &cli.overrides())
        .context("Failed to load configuration")?;
    let desk = Desk::from_config(&config).context("Failed to set up collaborators")?;

    let session = SessionId::new();
    let shell = Shell::new(&desk, session, Renderer::new(&config.display, cli.json));
    info!(session = %session, "Session opened");

    if !cli.command.is_empty() {
        if let Outcome::Continue(text) = shell.execute(&cli.command.join(" ")).await {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        return Ok(());
    }

    shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("Shell I/O failed")?;

    info!("Costline desk stopped");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=costline_core=trace` - Per-row ingestion detail
/// - Default: `info,costline=debug`
///
/// Logs go to stderr so shell output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,costline=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
