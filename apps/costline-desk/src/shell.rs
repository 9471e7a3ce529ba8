//! # Interactive Shell
//!
//! One session driven from a line-oriented terminal.
//!
//! ## Command Reference
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search [words...]     fuzzy search (no words: list the sheet)          │
//! │  add <n>...            add results from the last search                 │
//! │  qty <line> <n>        set a cart line's quantity                       │
//! │  mark <line>...        mark lines for removal (unmark to undo)          │
//! │  remove                remove marked lines                              │
//! │  clear                 empty the cart                                   │
//! │  reprice               re-price cart lines with current settings        │
//! │  cart                  show the cart and totals                         │
//! │  vat [pct]             show settings / set VAT                          │
//! │  fx <rate|auto>        pin the FX rate or go back to the live quote     │
//! │  discount <n> <pct|clear>  override a result's discount                 │
//! │  refresh               refetch the sheet and the FX quote               │
//! │  help, quit                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each line is parsed with clap; parse errors and help print in place.

use clap::{Parser, Subcommand};
use costline_core::money::parse_decimal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::commands::cart::{self, LineRef};
use crate::commands::{config, product};
use crate::desk::Desk;
use crate::error::ApiError;
use crate::render::Renderer;
use crate::state::SessionId;

const PROMPT: &str = "costline> ";

#[derive(Debug, Parser)]
#[command(
    name = "costline",
    no_binary_name = true,
    disable_version_flag = true,
    subcommand_required = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Search products by name (no words: list the sheet)
    #[command(alias = "s")]
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Add results from the last search to the cart
    #[command(alias = "a")]
    Add {
        #[arg(required = true)]
        picks: Vec<usize>,
    },

    /// Set the quantity of a cart line
    Qty {
        line: usize,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Mark cart lines for removal
    Mark {
        #[arg(required = true)]
        lines: Vec<usize>,
    },

    /// Clear the removal mark
    Unmark {
        #[arg(required = true)]
        lines: Vec<usize>,
    },

    /// Remove marked lines
    Remove,

    /// Empty the cart
    Clear,

    /// Re-price cart lines with the current VAT, FX and discounts
    Reprice,

    /// Show the cart
    Cart,

    /// Show settings, or set the VAT percentage
    Vat {
        #[arg(allow_negative_numbers = true)]
        pct: Option<String>,
    },

    /// Pin the FX rate, or "auto" for the live quote
    Fx { rate: String },

    /// Override a search result's discount, or "clear" it
    Discount { pick: usize, pct: String },

    /// Show current settings
    Settings,

    /// Refetch the catalog and FX quote
    Refresh,

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// What the caller should do after one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

pub struct Shell<'a> {
    desk: &'a Desk,
    session: SessionId,
    renderer: Renderer,
}

impl<'a> Shell<'a> {
    pub fn new(desk: &'a Desk, session: SessionId, renderer: Renderer) -> Self {
        Shell {
            desk,
            session,
            renderer,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Runs one input line.
    pub async fn execute(&self, line: &str) -> Outcome {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Outcome::Continue(String::new());
        }

        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => return Outcome::Continue(e.render().to_string().trim_end().to_string()),
        };

        debug!(session = %self.session, command = ?parsed.command, "Shell command");
        match self.dispatch(parsed.command).await {
            Ok(Some(text)) => Outcome::Continue(text),
            Ok(None) => Outcome::Quit,
            Err(e) => Outcome::Continue(self.renderer.error(&e)),
        }
    }

    /// Reads lines until EOF or `quit`, then ends the session.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        self.prompt(&mut output).await?;

        while let Some(line) = lines.next_line().await? {
            match self.execute(&line).await {
                Outcome::Continue(text) => {
                    if !text.is_empty() {
                        output.write_all(text.as_bytes()).await?;
                        output.write_all(b"\n").await?;
                    }
                }
                Outcome::Quit => break,
            }
            self.prompt(&mut output).await?;
        }

        config::end_session(self.desk, self.session).await;
        output.flush().await
    }

    async fn prompt<W: AsyncWrite + Unpin>(&self, output: &mut W) -> std::io::Result<()> {
        if !self.renderer.is_json() {
            output.write_all(PROMPT.as_bytes()).await?;
        }
        output.flush().await
    }

    async fn dispatch(&self, command: ShellCommand) -> Result<Option<String>, ApiError> {
        let (desk, sid, r) = (self.desk, self.session, &self.renderer);

        let text = match command {
            ShellCommand::Search { words } => {
                r.search(&product::search_products(desk, sid, &words.join(" ")).await?)
            }
            ShellCommand::Add { picks } => r.cart(&cart::add_to_cart(desk, sid, &picks).await?),
            ShellCommand::Qty { line, quantity } => r.cart(
                &cart::update_quantity(desk, sid, LineRef::Number(line), quantity).await?,
            ),
            ShellCommand::Mark { lines } => {
                r.cart(&cart::mark_lines(desk, sid, &line_refs(&lines), true).await?)
            }
            ShellCommand::Unmark { lines } => {
                r.cart(&cart::mark_lines(desk, sid, &line_refs(&lines), false).await?)
            }
            ShellCommand::Remove => r.cart(&cart::remove_marked(desk, sid).await),
            ShellCommand::Clear => r.cart(&cart::clear_cart(desk, sid).await),
            ShellCommand::Reprice => r.cart(&cart::reprice_cart(desk, sid).await?),
            ShellCommand::Cart => r.cart(&cart::get_cart(desk, sid).await),
            ShellCommand::Vat { pct: None } | ShellCommand::Settings => {
                r.settings(&config::get_settings(desk, sid).await)
            }
            ShellCommand::Vat { pct: Some(pct) } => {
                r.settings(&config::set_vat(desk, sid, parse_number("VAT", &pct)?).await?)
            }
            ShellCommand::Fx { rate } => {
                let rate = match rate.trim().to_lowercase().as_str() {
                    "auto" | "live" => None,
                    _ => Some(parse_number("FX rate", &rate)?),
                };
                r.settings(&config::set_fx_rate(desk, sid, rate).await?)
            }
            ShellCommand::Discount { pick, pct } => {
                let pct = match pct.trim().to_lowercase().as_str() {
                    "clear" | "default" => None,
                    _ => Some(parse_number("discount", &pct)?),
                };
                r.settings(&config::set_discount(desk, sid, pick, pct).await?)
            }
            ShellCommand::Refresh => {
                let settings = r.settings(&config::refresh_feeds(desk, sid).await);
                if r.is_json() {
                    settings
                } else {
                    format!("Caches cleared; the next command refetches the catalog.\n{}", settings)
                }
            }
            ShellCommand::Quit => return Ok(None),
        };

        Ok(Some(text))
    }
}

fn line_refs(numbers: &[usize]) -> Vec<LineRef> {
    numbers.iter().map(|&n| LineRef::Number(n)).collect()
}

/// Reads a user-typed number the way sheet prices are read ("34,5" is
/// 34.5), allowing a trailing '%'.
fn parse_number(field: &str, raw: &str) -> Result<f64, ApiError> {
    let raw = raw.trim().trim_end_matches('%');
    parse_decimal(raw).map_err(|e| ApiError::validation(format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_lines() {
        let line = ShellLine::try_parse_from(["search", "ro", "membrane"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Search { ref words } if words.len() == 2));

        let line = ShellLine::try_parse_from(["add", "1", "3"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Add { ref picks } if picks == &vec![1, 3]));

        let line = ShellLine::try_parse_from(["qty", "2", "-1"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Qty { line: 2, quantity: -1 }));

        let line = ShellLine::try_parse_from(["exit"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(ShellLine::try_parse_from(["add"]).is_err());
        assert!(ShellLine::try_parse_from(["add", "first"]).is_err());
        assert!(ShellLine::try_parse_from(["frobnicate"]).is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("VAT", "18").unwrap(), 18.0);
        assert_eq!(parse_number("VAT", "18%").unwrap(), 18.0);
        assert_eq!(parse_number("FX rate", "34,25").unwrap(), 34.25);
        assert!(parse_number("FX rate", "abc").is_err());
    }
}
