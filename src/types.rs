use serde::{Deserialize, Serialize};

/// How a product's price is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculationMethod {
    /// Price follows from a fixed share of the total target revenue.
    Percentage,
    /// Price = unit cost + share of fixed cost + share of the profit target.
    #[default]
    CostPlus,
}

impl CalculationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            CalculationMethod::Percentage => "percentage",
            CalculationMethod::CostPlus => "cost-plus",
        }
    }
}

/// One itemized fixed cost (rent, salaries, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingSetup {
    /// Flat fixed cost, used when `use_breakdown` is false.
    pub total_cost: f64,
    pub use_breakdown: bool,
    pub expenses: Vec<Expense>,
    /// Derive the revenue target from `target_margin` instead of `target_profit`.
    pub use_margin: bool,
    pub target_profit: f64,
    /// Percentage of revenue, 0-100.
    pub target_margin: f64,
}

impl PricingSetup {
    /// Fixed cost actually in effect: the expense breakdown or the flat total.
    pub fn fixed_cost(&self) -> f64 {
        if self.use_breakdown {
            self.expenses.iter().map(|e| e.amount).sum()
        } else {
            self.total_cost
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingProduct {
    pub id: String,
    pub name: String,
    pub cost_per_unit: f64,
    pub expected_units: f64,
    pub calculation_method: CalculationMethod,
    /// Share (0-100) of total target revenue; only read for `Percentage` products.
    pub revenue_percentage: f64,
}

impl PricingProduct {
    pub fn variable_cost(&self) -> f64 {
        self.cost_per_unit * self.expected_units
    }

    /// Unit count safe to divide by.
    pub fn safe_units(&self) -> f64 {
        self.expected_units.max(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedProduct {
    #[serde(flatten)]
    pub product: PricingProduct,
    pub price: f64,
    pub total_revenue: f64,
    pub profit_per_unit: f64,
    /// Percent of the product's own revenue.
    pub profit_margin: f64,
    pub units_needed: f64,
    /// Percent of the overall revenue target.
    pub percentage_revenue: f64,
    pub suggested_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInputs {
    pub setup: PricingSetup,
    pub products: Vec<PricingProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResults {
    /// Resolved fixed cost.
    pub actual_cost: f64,
    /// Revenue target implied by the setup.
    pub total_revenue: f64,
    pub calculated_profit: f64,
    /// Sum of per-product revenue after price rounding.
    pub actual_total_revenue: f64,
    pub calculated_products: Vec<CalculatedProduct>,
    pub inputs: PricingInputs,
}
