//! Process command line.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;

/// Catalog lookup and cost carts from a terminal.
#[derive(Debug, Parser)]
#[command(name = "costline-desk", version, about)]
pub struct Cli {
    /// Config file (default: platform config dir, costline.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Published CSV sheet to price
    #[arg(long, value_name = "URL", conflicts_with = "catalog_file")]
    pub catalog_url: Option<String>,

    /// Local CSV file to price
    #[arg(long, value_name = "FILE")]
    pub catalog_file: Option<PathBuf>,

    /// Starting VAT percentage for the session
    #[arg(long, value_name = "PCT")]
    pub vat: Option<f64>,

    /// Print responses as JSON
    #[arg(long)]
    pub json: bool,

    /// Run one shell command and exit (e.g. `search membrane`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            catalog_url: self.catalog_url.clone(),
            catalog_path: self.catalog_file.clone(),
            vat_pct: self.vat,
        }
    }
}
