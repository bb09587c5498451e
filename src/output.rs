use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::currency::{format_percent, format_units, Currency};
use crate::input::InputError;
use crate::quote::Quote;
use crate::sweep::SweepPoint;
use crate::types::{CalculatedProduct, PricingResults};

fn column_header(col: &str) -> &str {
    match col {
        "id" => "ID",
        "name" => "Product",
        "method" => "Method",
        "cost" => "Unit Cost",
        "units" => "Units",
        "price" => "Price",
        "revenue" => "Revenue",
        "margin" => "Margin",
        "profit_per_unit" => "Profit/Unit",
        "profit" => "Profit",
        "units_needed" => "Units Needed",
        "share" => "Revenue Share",
        other => other,
    }
}

fn is_numeric(col: &str) -> bool {
    !matches!(col, "id" | "name" | "method")
}

fn product_cell(col: &str, c: &CalculatedProduct, currency: &Currency) -> Cell {
    let p = &c.product;
    let cell = match col {
        "id" => Cell::new(&p.id),
        "name" => Cell::new(if p.name.is_empty() { &p.id } else { &p.name }),
        "method" => Cell::new(p.calculation_method.label()),
        "cost" => Cell::new(currency.format(p.cost_per_unit)),
        "units" => Cell::new(format_units(p.expected_units)),
        "price" => Cell::new(currency.format(c.price)),
        "revenue" => Cell::new(currency.format(c.total_revenue)),
        "margin" => Cell::new(format_percent(c.profit_margin)),
        "profit_per_unit" => Cell::new(currency.format(c.profit_per_unit)),
        "profit" => Cell::new(currency.format(c.suggested_profit)),
        "units_needed" => Cell::new(format_units(c.units_needed)),
        "share" => Cell::new(format_percent(c.percentage_revenue)),
        _ => Cell::new(""),
    };
    if is_numeric(col) {
        cell.set_alignment(CellAlignment::Right)
    } else {
        cell
    }
}

/// Column totals for the TOTAL row. Per-unit and percentage-of-own-revenue
/// columns stay empty, except the overall margin.
fn total_cell(col: &str, results: &PricingResults, currency: &Currency) -> Cell {
    let products = &results.calculated_products;
    let profit: f64 = products.iter().map(|c| c.suggested_profit).sum();
    let cell = match col {
        "id" | "name" => Cell::new("TOTAL"),
        "units" => Cell::new(format_units(
            products.iter().map(|c| c.product.expected_units).sum(),
        )),
        "revenue" => Cell::new(currency.format(results.actual_total_revenue)),
        "profit" => Cell::new(currency.format(profit)),
        "margin" if results.actual_total_revenue != 0.0 => {
            Cell::new(format_percent(profit / results.actual_total_revenue * 100.0))
        }
        "share" => Cell::new(format_percent(
            products.iter().map(|c| c.percentage_revenue).sum(),
        )),
        _ => Cell::new(""),
    };
    if is_numeric(col) {
        cell.set_alignment(CellAlignment::Right)
    } else {
        cell
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn results_table(results: &PricingResults, columns: &[String], currency: &Currency) -> Table {
    let mut table = new_table();
    table.set_header(columns.iter().map(|c| Cell::new(column_header(c))));

    for product in &results.calculated_products {
        table.add_row(columns.iter().map(|c| product_cell(c, product, currency)));
    }

    // Only label the TOTAL row when there is a column to carry the label
    if columns.iter().any(|c| c == "id" || c == "name") {
        table.add_row(columns.iter().map(|c| total_cell(c, results, currency)));
    }
    table
}

pub fn summary_table(results: &PricingResults, currency: &Currency) -> Table {
    let variable_cost: f64 = results
        .inputs
        .products
        .iter()
        .map(|p| p.variable_cost())
        .sum();
    let setup = &results.inputs.setup;
    let target = if setup.use_margin {
        format!("{} margin", format_percent(setup.target_margin))
    } else {
        format!("{} profit", currency.format(setup.target_profit))
    };

    let rows = [
        ("Target", target),
        ("Fixed cost", currency.format(results.actual_cost)),
        ("Variable cost", currency.format(variable_cost)),
        ("Target revenue", currency.format(results.total_revenue)),
        ("Target profit", currency.format(results.calculated_profit)),
        ("Priced revenue", currency.format(results.actual_total_revenue)),
        (
            "Rounding difference",
            currency.format(results.actual_total_revenue - results.total_revenue),
        ),
    ];

    let mut table = new_table();
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn print_results(results: &PricingResults, columns: &[String], currency: &Currency) {
    println!("{}", results_table(results, columns, currency));
    println!("{}", summary_table(results, currency));
}

pub fn print_problems(problems: &[InputError]) {
    for p in problems {
        eprintln!("error: {p}");
    }
}

pub fn quote_table(quote: &Quote, currency: &Currency) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Description", "Qty", "Unit Price", "Amount"]);

    for line in &quote.lines {
        table.add_row(vec![
            Cell::new(&line.description),
            Cell::new(format_units(line.quantity)).set_alignment(CellAlignment::Right),
            Cell::new(currency.format(line.unit_price)).set_alignment(CellAlignment::Right),
            Cell::new(currency.format(line.amount)).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut total_row = |label: String, amount: f64| {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(""),
            Cell::new(""),
            Cell::new(currency.format(amount)).set_alignment(CellAlignment::Right),
        ]);
    };

    total_row("Subtotal".to_string(), quote.subtotal);
    for cost in &quote.additional_costs {
        total_row(cost.label.clone(), cost.amount);
    }
    if quote.discount != 0.0 {
        total_row(
            format!("Discount ({})", format_percent(quote.discount_percent)),
            -quote.discount,
        );
    }
    total_row(format!("VAT ({})", format_percent(quote.vat_rate)), quote.vat);
    total_row("TOTAL".to_string(), quote.grand_total);

    table
}

pub fn print_quote(quote: &Quote, currency: &Currency) {
    if let Some(client) = &quote.client {
        println!("Quote for {client}");
    }
    match (quote.issued_on, quote.valid_until) {
        (Some(issued), Some(until)) => println!("Issued {issued}, valid until {until}"),
        (Some(issued), None) => println!("Issued {issued}"),
        _ => {}
    }
    println!("{}", quote_table(quote, currency));
    for term in &quote.terms {
        println!("  - {term}");
    }
}

pub fn sweep_table(points: &[SweepPoint], currency: &Currency) -> Table {
    let mut table = new_table();

    let mut header = vec![
        Cell::new("Margin"),
        Cell::new("Revenue"),
        Cell::new("Profit"),
    ];
    if let Some(first) = points.first() {
        header.extend(first.prices.iter().map(|p| Cell::new(&p.id)));
    }
    table.set_header(header);

    for point in points {
        let mut row = vec![
            Cell::new(format_percent(point.target_margin)),
            Cell::new(currency.format(point.total_revenue)).set_alignment(CellAlignment::Right),
            Cell::new(currency.format(point.calculated_profit))
                .set_alignment(CellAlignment::Right),
        ];
        row.extend(point.prices.iter().map(|p| {
            Cell::new(currency.format(p.price)).set_alignment(CellAlignment::Right)
        }));
        table.add_row(row);
    }
    table
}

/// One status line, used by watch mode.
pub fn compact_line(results: &PricingResults, currency: &Currency) -> String {
    let prices: Vec<String> = results
        .calculated_products
        .iter()
        .map(|c| {
            let name = if c.product.name.is_empty() {
                &c.product.id
            } else {
                &c.product.name
            };
            format!("{}: {}", name, currency.format(c.price))
        })
        .collect();
    let head = format!(
        "Revenue {} | Profit {}",
        currency.format(results.total_revenue),
        currency.format(results.calculated_profit)
    );
    if prices.is_empty() {
        head
    } else {
        format!("{head} | {}", prices.join(", "))
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
