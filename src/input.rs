//! Pricing documents and the validation boundary in front of the allocator.
//!
//! Documents come from hand-edited TOML or from the web editor's JSON, so
//! numbers may be missing, quoted, or non-finite. All coercion happens here,
//! once: missing and blank values become 0, numeric strings are parsed, and
//! anything else is rejected.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use chrono::NaiveDate;

use crate::quote::{AdditionalCost, QuoteDefaults};
use crate::types::{CalculationMethod, Expense, PricingInputs, PricingProduct, PricingSetup};

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: String, value: String },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    #[error("target margin must be below 100% when margin pricing is on (got {0}%)")]
    MarginOutOfRange(f64),

    #[error("percentage-priced products claim {0}% of revenue, more than 100%")]
    RevenueShareOverallocated(f64),

    #[error("duplicate product id `{0}`")]
    DuplicateProductId(String),

    #[error("{field} must be a whole number of days, got {value}")]
    NotADayCount { field: String, value: f64 },
}

/// A number as typed into a form: either a real number or its text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(f64),
    Text(String),
}

impl From<f64> for NumberField {
    fn from(n: f64) -> Self {
        NumberField::Number(n)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExpense {
    pub id: Option<String>,
    pub label: String,
    pub amount: Option<NumberField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSetup {
    #[serde(alias = "totalCost")]
    pub total_cost: Option<NumberField>,
    #[serde(alias = "useBreakdown")]
    pub use_breakdown: bool,
    pub expenses: Vec<RawExpense>,
    #[serde(alias = "useMargin")]
    pub use_margin: bool,
    #[serde(alias = "targetProfit")]
    pub target_profit: Option<NumberField>,
    #[serde(alias = "targetMargin")]
    pub target_margin: Option<NumberField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    pub id: String,
    pub name: String,
    #[serde(alias = "costPerUnit")]
    pub cost_per_unit: Option<NumberField>,
    #[serde(alias = "expectedUnits")]
    pub expected_units: Option<NumberField>,
    #[serde(alias = "calculationMethod")]
    pub calculation_method: Option<String>,
    #[serde(alias = "revenuePercentage")]
    pub revenue_percentage: Option<NumberField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAdditionalCost {
    pub label: String,
    pub amount: Option<NumberField>,
}

/// The `[quote]` table as written. Unset numbers stay unset so the
/// request's own values survive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawQuote {
    pub client: Option<String>,
    #[serde(alias = "vatRate")]
    pub vat_rate: Option<NumberField>,
    #[serde(alias = "discount", alias = "discountPercent")]
    pub discount_percent: Option<NumberField>,
    #[serde(alias = "additionalCosts")]
    pub additional_costs: Vec<RawAdditionalCost>,
    /// ISO date string, e.g. "2026-10-19".
    #[serde(alias = "issuedOn")]
    pub issued_on: Option<NaiveDate>,
    #[serde(alias = "validDays")]
    pub valid_days: Option<NumberField>,
    pub terms: Vec<String>,
}

/// A pricing document: `[setup]`, `[[products]]` and an optional `[quote]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PricingDocument {
    pub setup: RawSetup,
    pub products: Vec<RawProduct>,
    pub quote: Option<RawQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(DocumentFormat::Toml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

pub fn parse_document(data: &str, format: DocumentFormat) -> Result<PricingDocument> {
    match format {
        DocumentFormat::Toml => toml::from_str(data).context("invalid TOML pricing document"),
        DocumentFormat::Json => {
            serde_json::from_str(data).context("invalid JSON pricing document")
        }
    }
}

/// Read a document, picking the format from the file extension. Unknown
/// extensions are tried as TOML first, then JSON.
pub fn load_document(path: &Path) -> Result<PricingDocument> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let doc = match DocumentFormat::from_path(path) {
        Some(format) => parse_document(&data, format),
        None => parse_document(&data, DocumentFormat::Toml)
            .or_else(|_| parse_document(&data, DocumentFormat::Json)),
    };
    let doc = doc.with_context(|| format!("failed to parse {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        products = doc.products.len(),
        "loaded pricing document"
    );
    Ok(doc)
}

fn coerce(field: &str, value: Option<&NumberField>) -> Result<f64, InputError> {
    let n = match value {
        None => return Ok(0.0),
        Some(NumberField::Number(n)) => *n,
        Some(NumberField::Text(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(0.0);
            }
            t.parse::<f64>().map_err(|_| InputError::NotANumber {
                field: field.to_string(),
                value: s.clone(),
            })?
        }
    };

    if !n.is_finite() {
        return Err(InputError::NonFinite {
            field: field.to_string(),
            value: n,
        });
    }
    Ok(n)
}

fn coerce_set(field: &str, value: Option<&NumberField>) -> Result<Option<f64>, InputError> {
    value.map(|v| coerce(field, Some(v))).transpose()
}

fn coerce_days(field: &str, value: Option<&NumberField>) -> Result<Option<u32>, InputError> {
    let Some(days) = coerce_set(field, value)? else {
        return Ok(None);
    };
    if days < 0.0 || days.fract() != 0.0 || days > u32::MAX as f64 {
        return Err(InputError::NotADayCount {
            field: field.to_string(),
            value: days,
        });
    }
    Ok(Some(days as u32))
}

/// `"percentage"` selects revenue-share pricing; anything else is cost-plus.
pub fn parse_method(raw: Option<&str>) -> CalculationMethod {
    match raw.map(str::trim) {
        Some(m) if m.eq_ignore_ascii_case("percentage") => CalculationMethod::Percentage,
        _ => CalculationMethod::CostPlus,
    }
}

impl PricingDocument {
    /// Coerce the raw document into allocator inputs.
    pub fn normalize(&self) -> Result<PricingInputs, InputError> {
        let s = &self.setup;

        let expenses = s
            .expenses
            .iter()
            .enumerate()
            .map(|(i, e)| {
                Ok(Expense {
                    id: e.id.clone().unwrap_or_else(|| format!("expense-{}", i + 1)),
                    label: e.label.clone(),
                    amount: coerce(&format!("expenses[{i}].amount"), e.amount.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>, InputError>>()?;

        let setup = PricingSetup {
            total_cost: coerce("setup.total_cost", s.total_cost.as_ref())?,
            use_breakdown: s.use_breakdown,
            expenses,
            use_margin: s.use_margin,
            target_profit: coerce("setup.target_profit", s.target_profit.as_ref())?,
            target_margin: coerce("setup.target_margin", s.target_margin.as_ref())?,
        };

        let products = self
            .products
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let id = if p.id.trim().is_empty() {
                    format!("product-{}", i + 1)
                } else {
                    p.id.clone()
                };
                Ok(PricingProduct {
                    name: p.name.clone(),
                    cost_per_unit: coerce(
                        &format!("products[{i}].cost_per_unit"),
                        p.cost_per_unit.as_ref(),
                    )?,
                    expected_units: coerce(
                        &format!("products[{i}].expected_units"),
                        p.expected_units.as_ref(),
                    )?,
                    calculation_method: parse_method(p.calculation_method.as_deref()),
                    revenue_percentage: coerce(
                        &format!("products[{i}].revenue_percentage"),
                        p.revenue_percentage.as_ref(),
                    )?,
                    id,
                })
            })
            .collect::<Result<Vec<_>, InputError>>()?;

        Ok(PricingInputs { setup, products })
    }

    /// Coerce the `[quote]` table, if any, with the same rules as the rest
    /// of the document.
    pub fn quote_defaults(&self) -> Result<Option<QuoteDefaults>, InputError> {
        let Some(q) = &self.quote else {
            return Ok(None);
        };

        let additional_costs = q
            .additional_costs
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Ok(AdditionalCost {
                    label: c.label.clone(),
                    amount: coerce(
                        &format!("quote.additional_costs[{i}].amount"),
                        c.amount.as_ref(),
                    )?,
                })
            })
            .collect::<Result<Vec<_>, InputError>>()?;

        Ok(Some(QuoteDefaults {
            client: q.client.clone(),
            vat_rate: coerce_set("quote.vat_rate", q.vat_rate.as_ref())?,
            discount_percent: coerce_set("quote.discount_percent", q.discount_percent.as_ref())?,
            additional_costs,
            issued_on: q.issued_on,
            valid_days: coerce_days("quote.valid_days", q.valid_days.as_ref())?,
            terms: q.terms.clone(),
        }))
    }
}

/// Every configuration problem that would make the allocator's output
/// meaningless, in input order.
pub fn problems(inputs: &PricingInputs) -> Vec<InputError> {
    let mut found = Vec::new();
    let setup = &inputs.setup;

    if setup.use_margin && setup.target_margin >= 100.0 {
        found.push(InputError::MarginOutOfRange(setup.target_margin));
    }

    let claimed: f64 = inputs
        .products
        .iter()
        .filter(|p| p.calculation_method == CalculationMethod::Percentage)
        .map(|p| p.revenue_percentage)
        .sum();
    if claimed > 100.0 {
        found.push(InputError::RevenueShareOverallocated(claimed));
    }

    let mut seen = HashSet::new();
    for p in &inputs.products {
        if !seen.insert(p.id.as_str()) {
            found.push(InputError::DuplicateProductId(p.id.clone()));
        }
    }

    found
}

pub fn validate(inputs: &PricingInputs) -> Result<(), InputError> {
    match problems(inputs).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BAKERY: &str = r#"
[setup]
total_cost = 500
target_profit = "1000"

[[products]]
id = "loaf"
name = "Sourdough loaf"
cost_per_unit = 10
expected_units = 100

[[products]]
id = "catering"
name = "Catering"
calculation_method = "percentage"
revenue_percentage = 20
expected_units = 4

[quote]
client = "Corner Café"
vat_rate = 9
"#;

    #[test]
    fn parses_toml_with_string_numbers() {
        let doc = parse_document(BAKERY, DocumentFormat::Toml).unwrap();
        let inputs = doc.normalize().unwrap();

        assert_eq!(inputs.setup.total_cost, 500.0);
        assert_eq!(inputs.setup.target_profit, 1000.0);
        assert_eq!(inputs.setup.target_margin, 0.0);
        assert_eq!(inputs.products.len(), 2);
        assert_eq!(
            inputs.products[0].calculation_method,
            CalculationMethod::CostPlus
        );
        assert_eq!(
            inputs.products[1].calculation_method,
            CalculationMethod::Percentage
        );
        assert_eq!(inputs.products[1].cost_per_unit, 0.0);
        assert_eq!(doc.quote_defaults().unwrap().unwrap().vat_rate, Some(9.0));
    }

    #[test]
    fn parses_web_editor_json() {
        let json = r#"{
            "setup": {
                "totalCost": 0,
                "useBreakdown": true,
                "expenses": [
                    {"id": "a", "label": "Rent", "amount": "1200.50"},
                    {"label": "Software", "amount": ""}
                ],
                "useMargin": true,
                "targetMargin": 35
            },
            "products": [
                {"id": "p1", "name": "Widget", "costPerUnit": "2.5", "expectedUnits": 40,
                 "calculationMethod": "cost-plus"}
            ]
        }"#;
        let inputs = parse_document(json, DocumentFormat::Json)
            .unwrap()
            .normalize()
            .unwrap();

        assert!(inputs.setup.use_breakdown);
        assert_eq!(inputs.setup.expenses[0].amount, 1200.5);
        assert_eq!(inputs.setup.expenses[1].id, "expense-2");
        assert_eq!(inputs.setup.expenses[1].amount, 0.0);
        assert_eq!(inputs.setup.fixed_cost(), 1200.5);
        assert_eq!(inputs.setup.target_margin, 35.0);
        assert_eq!(inputs.products[0].cost_per_unit, 2.5);
    }

    #[test]
    fn quote_table_follows_coercion_rules() {
        let json = r#"{
            "setup": {"totalCost": "500", "targetProfit": 1000},
            "products": [{"id": "p1", "costPerUnit": 10, "expectedUnits": 100}],
            "quote": {
                "client": "Corner Café",
                "vatRate": "15",
                "discount": "",
                "validDays": "30",
                "additionalCosts": [{"label": "Delivery", "amount": "12.50"}]
            }
        }"#;
        let doc = parse_document(json, DocumentFormat::Json).unwrap();
        assert_eq!(doc.normalize().unwrap().setup.total_cost, 500.0);

        let defaults = doc.quote_defaults().unwrap().unwrap();
        assert_eq!(defaults.vat_rate, Some(15.0));
        assert_eq!(defaults.discount_percent, Some(0.0));
        assert_eq!(defaults.valid_days, Some(30));
        assert_eq!(defaults.additional_costs[0].amount, 12.5);

        let doc = parse_document("[quote]\nvat_rate = \"nine\"\n", DocumentFormat::Toml).unwrap();
        assert_eq!(
            doc.quote_defaults(),
            Err(InputError::NotANumber {
                field: "quote.vat_rate".into(),
                value: "nine".into(),
            })
        );

        let doc = parse_document("[quote]\nvalid_days = 2.5\n", DocumentFormat::Toml).unwrap();
        assert_eq!(
            doc.quote_defaults(),
            Err(InputError::NotADayCount {
                field: "quote.valid_days".into(),
                value: 2.5,
            })
        );

        let bare = parse_document("[setup]\n", DocumentFormat::Toml).unwrap();
        assert_eq!(bare.quote_defaults(), Ok(None));
    }

    #[test]
    fn rejects_non_numeric_and_non_finite() {
        let doc = parse_document(
            "[[products]]\nid = \"x\"\ncost_per_unit = \"ten\"\n",
            DocumentFormat::Toml,
        )
        .unwrap();
        assert_eq!(
            doc.normalize(),
            Err(InputError::NotANumber {
                field: "products[0].cost_per_unit".into(),
                value: "ten".into(),
            })
        );

        let doc = parse_document("[setup]\ntotal_cost = inf\n", DocumentFormat::Toml).unwrap();
        assert!(matches!(
            doc.normalize(),
            Err(InputError::NonFinite { ref field, .. }) if field == "setup.total_cost"
        ));

        let doc = parse_document("[setup]\ntarget_profit = \"NaN\"\n", DocumentFormat::Toml)
            .unwrap();
        assert!(matches!(doc.normalize(), Err(InputError::NonFinite { .. })));
    }

    #[test]
    fn unknown_methods_fall_back_to_cost_plus() {
        assert_eq!(parse_method(None), CalculationMethod::CostPlus);
        assert_eq!(parse_method(Some("markup")), CalculationMethod::CostPlus);
        assert_eq!(
            parse_method(Some(" Percentage ")),
            CalculationMethod::Percentage
        );
    }

    #[test]
    fn blank_ids_get_positional_names() {
        let doc = parse_document("[[products]]\n[[products]]\nid = \"b\"\n", DocumentFormat::Toml)
            .unwrap();
        let inputs = doc.normalize().unwrap();
        assert_eq!(inputs.products[0].id, "product-1");
        assert_eq!(inputs.products[1].id, "b");
    }

    #[test]
    fn validation_reports_every_problem() {
        let inputs = PricingInputs {
            setup: PricingSetup {
                use_margin: true,
                target_margin: 100.0,
                ..Default::default()
            },
            products: vec![
                PricingProduct {
                    id: "a".into(),
                    calculation_method: CalculationMethod::Percentage,
                    revenue_percentage: 70.0,
                    ..Default::default()
                },
                PricingProduct {
                    id: "a".into(),
                    calculation_method: CalculationMethod::Percentage,
                    revenue_percentage: 40.0,
                    ..Default::default()
                },
            ],
        };
        assert_eq!(
            problems(&inputs),
            vec![
                InputError::MarginOutOfRange(100.0),
                InputError::RevenueShareOverallocated(110.0),
                InputError::DuplicateProductId("a".into()),
            ]
        );
        assert_eq!(validate(&inputs), Err(InputError::MarginOutOfRange(100.0)));
    }

    #[test]
    fn margin_is_only_checked_in_margin_mode() {
        let mut inputs = PricingInputs {
            setup: PricingSetup {
                target_margin: 150.0,
                ..Default::default()
            },
            products: Vec::new(),
        };
        assert_eq!(validate(&inputs), Ok(()));
        inputs.setup.use_margin = true;
        assert!(validate(&inputs).is_err());
    }

    #[test]
    fn loads_by_extension_and_sniffs_unknown() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("bakery.toml");
        fs::write(&toml_path, BAKERY).unwrap();
        assert_eq!(load_document(&toml_path).unwrap().products.len(), 2);

        let other = dir.path().join("bakery.pricing");
        let mut f = fs::File::create(&other).unwrap();
        writeln!(f, r#"{{"products": [{{"id": "only"}}]}}"#).unwrap();
        assert_eq!(load_document(&other).unwrap().products[0].id, "only");

        assert!(load_document(&dir.path().join("missing.toml")).is_err());
    }
}
