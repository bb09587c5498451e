use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pricewise::allocator::calculate;
use pricewise::cli::{self, Cli, Command, OutputFormat};
use pricewise::config;
use pricewise::currency::Currency;
use pricewise::input;
use pricewise::output;
use pricewise::quote::{build_quote, QuoteDefaults, QuoteRequest};
use pricewise::sweep;
use pricewise::types::PricingInputs;
use pricewise::{graph, watch};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load, coerce and validate a document. Every validation problem is
/// printed before giving up.
fn load_inputs(path: &Path) -> Result<(PricingInputs, Option<QuoteDefaults>)> {
    let doc = input::load_document(path)?;
    let inputs = doc
        .normalize()
        .with_context(|| format!("invalid value in {}", path.display()))?;
    let quote = doc
        .quote_defaults()
        .with_context(|| format!("invalid value in {}", path.display()))?;

    let found = input::problems(&inputs);
    if !found.is_empty() {
        output::print_problems(&found);
        bail!(
            "{} has {} configuration problem(s)",
            path.display(),
            found.len()
        );
    }
    Ok((inputs, quote))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config();
    let format = cli.format.or(config.format).unwrap_or_default();
    let currency = cli
        .currency
        .as_deref()
        .or(config.currency.as_deref())
        .map(Currency::from_code)
        .unwrap_or_default();
    let columns = cli::resolve_columns(cli.columns.clone().or(config.columns.clone()));

    match &cli.command {
        Command::Calc { file } => {
            let (inputs, _) = load_inputs(file)?;
            let results = calculate(&inputs.setup, &inputs.products);
            match format {
                OutputFormat::Json => output::print_json(&results)?,
                OutputFormat::Table => output::print_results(&results, &columns, &currency),
            }
        }
        Command::Check { file } => {
            let (inputs, _) = load_inputs(file)?;
            println!(
                "{}: ok ({} products, {} expenses)",
                file.display(),
                inputs.products.len(),
                inputs.setup.expenses.len()
            );
        }
        Command::Quote {
            file,
            vat,
            discount,
            client,
            date,
            valid_days,
        } => {
            let (inputs, defaults) = load_inputs(file)?;
            let results = calculate(&inputs.setup, &inputs.products);

            let mut request = QuoteRequest {
                client: client.clone(),
                issued_on: *date,
                valid_days: *valid_days,
                vat_rate: config.vat_rate.unwrap_or(0.0),
                ..QuoteRequest::from_results(&results)
            };
            if let Some(defaults) = &defaults {
                request = request.with_defaults(defaults);
            }
            if let Some(vat) = vat {
                request.vat_rate = *vat;
            }
            if let Some(discount) = discount {
                request.discount_percent = *discount;
            }

            let quote = build_quote(&request)?;
            match format {
                OutputFormat::Json => output::print_json(&quote)?,
                OutputFormat::Table => output::print_quote(&quote, &currency),
            }
        }
        Command::Sweep {
            file,
            from,
            to,
            step,
        } => {
            let (inputs, _) = load_inputs(file)?;
            let margins = sweep::margin_range(*from, *to, *step)?;
            let points = sweep::sweep(&inputs.setup, &inputs.products, &margins);
            match format {
                OutputFormat::Json => output::print_json(&points)?,
                OutputFormat::Table => println!("{}", output::sweep_table(&points, &currency)),
            }
        }
        Command::Plot { file } => {
            let (inputs, _) = load_inputs(file)?;
            let results = calculate(&inputs.setup, &inputs.products);
            graph::render(&results, &currency)?;
        }
        Command::Watch { file, interval } => {
            watch::run(&watch::WatchOptions {
                file: file.clone(),
                interval: *interval,
                columns,
                currency,
            })?;
        }
    }

    Ok(())
}
