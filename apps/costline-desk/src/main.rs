//! # Costline Desk Entry Point
//!
//! Parses flags and hands off to [`costline_desk::run`].
//!
//! ```text
//! costline-desk --catalog-url https://.../pub?output=csv
//! costline-desk --catalog-file catalog.csv --json search membrane
//! ```

use clap::Parser;
use costline_desk::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    costline_desk::run(Cli::parse()).await
}
