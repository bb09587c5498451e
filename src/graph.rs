use std::io::stdout;

use anyhow::Result;
use crossterm::execute;
use ratatui::{
    backend::CrosstermBackend,
    style::{Color, Style},
    widgets::{Bar, BarChart, BarGroup, Block},
    Terminal, TerminalOptions, Viewport,
};

use crate::currency::Currency;
use crate::types::{CalculationMethod, PricingResults};

/// One bar per product: label and revenue in whole currency units.
/// Negative and non-finite revenue is drawn as an empty bar.
pub fn revenue_bars(results: &PricingResults) -> Vec<(String, u64, CalculationMethod)> {
    results
        .calculated_products
        .iter()
        .map(|c| {
            let label = if c.product.name.is_empty() {
                c.product.id.clone()
            } else {
                c.product.name.clone()
            };
            let value = if c.total_revenue.is_finite() && c.total_revenue > 0.0 {
                c.total_revenue.round() as u64
            } else {
                0
            };
            (label, value, c.product.calculation_method)
        })
        .collect()
}

pub fn render(results: &PricingResults, currency: &Currency) -> Result<()> {
    let data = revenue_bars(results);

    if data.is_empty() {
        eprintln!("No products to display.");
        return Ok(());
    }

    let bars: Vec<Bar> = data
        .iter()
        .map(|(label, val, method)| {
            let color = match method {
                CalculationMethod::CostPlus => Color::Cyan,
                CalculationMethod::Percentage => Color::Magenta,
            };
            Bar::default()
                .value(*val)
                .label(label.clone().into())
                .text_value(currency.format(*val as f64))
                .style(Style::default().fg(color))
        })
        .collect();

    let title = format!(
        "Revenue per product (target {}) - cyan: cost-plus, magenta: percentage",
        currency.format(results.total_revenue)
    );

    let bar_width = data
        .iter()
        .map(|(label, val, _)| label.len().max(currency.format(*val as f64).len()))
        .max()
        .unwrap_or(3)
        .clamp(3, 16) as u16;

    let chart = BarChart::default()
        .block(Block::bordered().title(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(Style::default().fg(Color::White))
        .label_style(Style::default().fg(Color::DarkGray));

    let chart_height: u16 = 17; // 15 for bars + 2 for border

    let mut terminal = Terminal::with_options(
        CrosstermBackend::new(stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(chart_height),
        },
    )?;

    terminal.draw(|frame| {
        frame.render_widget(chart, frame.area());
    })?;

    // Move cursor below the chart
    execute!(stdout(), crossterm::cursor::MoveDown(1))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::calculate;
    use crate::types::{PricingProduct, PricingSetup};

    #[test]
    fn bars_follow_product_revenue() {
        let setup = PricingSetup {
            total_cost: 500.0,
            target_profit: 1000.0,
            ..Default::default()
        };
        let products = [
            PricingProduct {
                id: "mug".into(),
                name: "Mug".into(),
                cost_per_unit: 10.0,
                expected_units: 100.0,
                ..Default::default()
            },
            PricingProduct {
                id: "print".into(),
                expected_units: 50.0,
                calculation_method: CalculationMethod::Percentage,
                revenue_percentage: 50.0,
                ..Default::default()
            },
        ];
        let bars = revenue_bars(&calculate(&setup, &products));
        assert_eq!(
            bars,
            vec![
                ("Mug".to_string(), 1250, CalculationMethod::CostPlus),
                ("print".to_string(), 1250, CalculationMethod::Percentage),
            ]
        );
    }

    #[test]
    fn negative_revenue_draws_empty_bar() {
        let setup = PricingSetup {
            target_profit: -5000.0,
            ..Default::default()
        };
        let products = [PricingProduct {
            id: "loss".into(),
            cost_per_unit: 1.0,
            expected_units: 10.0,
            ..Default::default()
        }];
        let bars = revenue_bars(&calculate(&setup, &products));
        assert_eq!(bars[0].1, 0);
    }
}
