use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(
    name = "pricewise",
    version,
    about = "Suggest unit prices from fixed costs, profit targets and a product list"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format: table (default), json
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Currency code (ISO 4217) for amounts, e.g. EUR, GBP
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Columns to display (comma-separated).
    /// Use +col to add, -col to remove from defaults, or plain names to replace.
    /// Available: id,name,method,cost,units,price,revenue,margin,profit_per_unit,profit,units_needed,share
    #[arg(long, global = true, value_delimiter = ',', allow_hyphen_values = true)]
    pub columns: Option<Vec<String>>,

    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

pub const DEFAULT_COLUMNS: &[&str] = &[
    "name", "method", "cost", "units", "price", "revenue", "margin",
];

/// Resolve `--columns` into a final list.
/// - No flag → defaults
/// - All prefixed with +/- → modify defaults (e.g. `+profit,-method`)
/// - Plain names → explicit replacement (e.g. `name,price`)
pub fn resolve_columns(raw: Option<Vec<String>>) -> Vec<String> {
    let Some(raw) = raw else {
        return DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect();
    };

    let is_modifier = raw.iter().all(|c| c.starts_with('+') || c.starts_with('-'));

    if !is_modifier {
        return raw;
    }

    let mut cols: Vec<String> = DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect();
    for entry in &raw {
        if let Some(name) = entry.strip_prefix('+') {
            if !cols.iter().any(|c| c == name) {
                cols.push(name.to_string());
            }
        } else if let Some(name) = entry.strip_prefix('-') {
            cols.retain(|c| c != name);
        }
    }
    cols
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Calculate suggested prices for a pricing document
    Calc {
        /// Pricing document (.toml or .json)
        file: PathBuf,
    },
    /// Validate a pricing document without calculating
    Check { file: PathBuf },
    /// Build quote totals from the suggested prices
    Quote {
        file: PathBuf,
        /// VAT rate in percent
        #[arg(long)]
        vat: Option<f64>,
        /// Discount in percent of subtotal plus additional costs
        #[arg(long)]
        discount: Option<f64>,
        /// Client name printed on the quote
        #[arg(long)]
        client: Option<String>,
        /// Issue date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Days the quote stays valid
        #[arg(long)]
        valid_days: Option<u32>,
    },
    /// Price the product list over a range of target margins
    Sweep {
        file: PathBuf,
        /// First margin in percent
        #[arg(long, default_value = "0")]
        from: f64,
        /// Last margin in percent (below 100)
        #[arg(long, default_value = "90")]
        to: f64,
        #[arg(long, default_value = "10")]
        step: f64,
    },
    /// Bar chart of revenue per product
    Plot { file: PathBuf },
    /// Recalculate whenever the document changes
    Watch {
        file: PathBuf,
        /// Minimum seconds between refreshes (debounce)
        #[arg(long, default_value = "1")]
        interval: u64,
    },
}

impl Command {
    pub fn file(&self) -> &PathBuf {
        match self {
            Command::Calc { file }
            | Command::Check { file }
            | Command::Quote { file, .. }
            | Command::Sweep { file, .. }
            | Command::Plot { file }
            | Command::Watch { file, .. } => file,
        }
    }
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn columns_default_modify_and_replace() {
        assert_eq!(resolve_columns(None), strings(DEFAULT_COLUMNS));

        let modified = resolve_columns(Some(strings(&["+profit", "-method", "+price"])));
        assert_eq!(
            modified,
            strings(&["name", "cost", "units", "price", "revenue", "margin", "profit"])
        );

        let replaced = resolve_columns(Some(strings(&["id", "price"])));
        assert_eq!(replaced, strings(&["id", "price"]));
    }

    #[test]
    fn parses_quote_flags() {
        let cli = Cli::parse_from([
            "pricewise",
            "quote",
            "shop.toml",
            "--vat",
            "20",
            "--date",
            "2026-10-19",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Command::Quote { vat, date, .. } => {
                assert_eq!(vat, Some(20.0));
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 19));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sweep_defaults_and_verbosity() {
        let cli = Cli::parse_from(["pricewise", "-vv", "sweep", "shop.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.file(), &PathBuf::from("shop.toml"));
        match cli.command {
            Command::Sweep { from, to, step, .. } => assert_eq!((from, to, step), (0.0, 90.0, 10.0)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
