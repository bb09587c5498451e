//! Allocation of fixed cost and target profit across a product list.
//!
//! [`calculate`] is a pure function: it reads its inputs, allocates a fresh
//! [`PricingResults`] and never fails. Degenerate configurations (a margin of
//! 100% or more, say) surface as non-finite numbers; validating them is the
//! job of [`crate::input::validate`].

use crate::types::{
    CalculatedProduct, CalculationMethod, PricingInputs, PricingProduct, PricingResults,
    PricingSetup,
};

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole`, or 0 when `whole` is zero.
fn ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole
    }
}

/// Profit as a percentage of revenue, 0 for zero revenue.
fn margin_percent(profit: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        profit / revenue * 100.0
    }
}

/// Group-level figures shared by every per-product computation.
struct Allocation {
    fixed_cost: f64,
    total_revenue: f64,
    cost_plus_variable_cost: f64,
    fixed_cost_for_cost_plus_group: f64,
    profit_needed_from_cost_plus_group: f64,
}

/// Revenue target implied by the setup for the given fixed and variable cost.
pub fn target_revenue(setup: &PricingSetup, fixed_cost: f64, variable_cost: f64) -> f64 {
    if setup.use_margin {
        (fixed_cost + variable_cost) / (1.0 - setup.target_margin / 100.0)
    } else {
        fixed_cost + variable_cost + setup.target_profit
    }
}

pub fn calculate(setup: &PricingSetup, products: &[PricingProduct]) -> PricingResults {
    let fixed_cost = setup.fixed_cost();
    let total_variable_cost: f64 = products.iter().map(PricingProduct::variable_cost).sum();
    let total_revenue = target_revenue(setup, fixed_cost, total_variable_cost);
    let calculated_profit = total_revenue - fixed_cost - total_variable_cost;

    let (percentage_group, cost_plus_group): (Vec<&PricingProduct>, Vec<&PricingProduct>) =
        products
            .iter()
            .partition(|p| p.calculation_method == CalculationMethod::Percentage);

    let cost_plus_variable_cost: f64 = cost_plus_group.iter().map(|p| p.variable_cost()).sum();

    // Fixed cost and profit already claimed by revenue-share products
    let mut fixed_cost_for_percentage_group = 0.0;
    let mut profit_from_percentage_group = 0.0;
    for p in &percentage_group {
        let share = p.revenue_percentage / 100.0 * total_revenue;
        let allocated = ratio(share, total_revenue) * fixed_cost;
        fixed_cost_for_percentage_group += allocated;
        profit_from_percentage_group += share - p.variable_cost() - allocated;
    }

    let allocation = Allocation {
        fixed_cost,
        total_revenue,
        cost_plus_variable_cost,
        fixed_cost_for_cost_plus_group: fixed_cost - fixed_cost_for_percentage_group,
        profit_needed_from_cost_plus_group: calculated_profit - profit_from_percentage_group,
    };

    tracing::debug!(
        fixed_cost,
        total_variable_cost,
        total_revenue,
        calculated_profit,
        percentage_products = percentage_group.len(),
        cost_plus_products = cost_plus_group.len(),
        "allocating"
    );

    let calculated_products: Vec<CalculatedProduct> = products
        .iter()
        .map(|p| match p.calculation_method {
            CalculationMethod::Percentage => price_by_percentage(p, &allocation),
            CalculationMethod::CostPlus => price_cost_plus(p, &allocation),
        })
        .collect();

    let actual_total_revenue = calculated_products.iter().map(|c| c.total_revenue).sum();

    PricingResults {
        actual_cost: fixed_cost,
        total_revenue,
        calculated_profit,
        actual_total_revenue,
        calculated_products,
        inputs: PricingInputs {
            setup: setup.clone(),
            products: products.to_vec(),
        },
    }
}

fn price_by_percentage(p: &PricingProduct, a: &Allocation) -> CalculatedProduct {
    let share = p.revenue_percentage / 100.0 * a.total_revenue;
    let price = round2(share / p.safe_units());

    let revenue = price * p.expected_units;
    let allocated_fixed = ratio(revenue, a.total_revenue) * a.fixed_cost;
    let profit = revenue - p.variable_cost() - allocated_fixed;

    let units_needed = if price > 0.0 {
        (share / price).ceil()
    } else {
        0.0
    };

    CalculatedProduct {
        product: p.clone(),
        price,
        total_revenue: revenue,
        profit_per_unit: profit / p.safe_units(),
        profit_margin: margin_percent(profit, revenue),
        units_needed,
        percentage_revenue: ratio(revenue, a.total_revenue) * 100.0,
        suggested_profit: profit,
    }
}

fn price_cost_plus(p: &PricingProduct, a: &Allocation) -> CalculatedProduct {
    let variable_cost = p.variable_cost();
    let cost_share = ratio(variable_cost, a.cost_plus_variable_cost);
    let allocated_fixed = cost_share * a.fixed_cost_for_cost_plus_group;

    let fixed_cost_per_unit = allocated_fixed / p.safe_units();
    let profit_per_unit = cost_share * a.profit_needed_from_cost_plus_group / p.safe_units();
    let price = round2(p.cost_per_unit + fixed_cost_per_unit + profit_per_unit);

    // Raw units: a product expecting zero sales books zero revenue
    let revenue = price * p.expected_units;
    let profit = revenue - (variable_cost + allocated_fixed);

    CalculatedProduct {
        product: p.clone(),
        price,
        total_revenue: revenue,
        profit_per_unit: price - p.cost_per_unit,
        profit_margin: margin_percent(profit, revenue),
        units_needed: p.expected_units,
        percentage_revenue: ratio(revenue, a.total_revenue) * 100.0,
        suggested_profit: profit,
    }
}
