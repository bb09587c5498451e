//! Quote and invoice totals.
//!
//! This pipeline is independent of the allocator: it works on quoted line
//! items (quantity × selling price) plus additional costs, a discount and
//! VAT. [`QuoteRequest::from_results`] seeds the lines from a pricing run.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::round2;
use crate::types::PricingResults;

#[derive(Debug, Error, PartialEq)]
pub enum QuoteError {
    #[error("line `{description}` has a negative quantity ({quantity})")]
    NegativeQuantity { description: String, quantity: f64 },

    #[error("discount must be between 0 and 100 percent, got {0}")]
    DiscountOutOfRange(f64),

    #[error("VAT rate cannot be negative, got {0}")]
    NegativeVatRate(f64),

    #[error("{0} must be a finite number")]
    NonFinite(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalCost {
    pub label: String,
    pub amount: f64,
}

/// Quote settings carried by a pricing document, already coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuoteDefaults {
    pub client: Option<String>,
    pub vat_rate: Option<f64>,
    pub discount_percent: Option<f64>,
    pub additional_costs: Vec<AdditionalCost>,
    pub issued_on: Option<NaiveDate>,
    pub valid_days: Option<u32>,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub client: Option<String>,
    pub line_items: Vec<LineItem>,
    pub additional_costs: Vec<AdditionalCost>,
    pub discount_percent: f64,
    pub vat_rate: f64,
    pub issued_on: Option<NaiveDate>,
    pub valid_days: Option<u32>,
    pub terms: Vec<String>,
}

impl QuoteRequest {
    /// One line per calculated product selling its expected units at the
    /// suggested price. Products expecting no sales are left out.
    pub fn from_results(results: &PricingResults) -> Self {
        let line_items = results
            .calculated_products
            .iter()
            .filter(|c| c.product.expected_units > 0.0)
            .map(|c| LineItem {
                description: if c.product.name.is_empty() {
                    c.product.id.clone()
                } else {
                    c.product.name.clone()
                },
                quantity: c.product.expected_units,
                unit_price: c.price,
            })
            .collect();

        Self {
            line_items,
            ..Default::default()
        }
    }

    /// Layer a document's `[quote]` table onto the request. A VAT rate or
    /// discount set in the table replaces the request's value; client, dates
    /// and terms are only filled in when the request has none. Additional
    /// costs are appended.
    pub fn with_defaults(mut self, defaults: &QuoteDefaults) -> Self {
        if self.client.is_none() {
            self.client = defaults.client.clone();
        }
        if let Some(rate) = defaults.vat_rate {
            self.vat_rate = rate;
        }
        if let Some(discount) = defaults.discount_percent {
            self.discount_percent = discount;
        }
        self.additional_costs
            .extend(defaults.additional_costs.iter().cloned());
        self.issued_on = self.issued_on.or(defaults.issued_on);
        self.valid_days = self.valid_days.or(defaults.valid_days);
        if self.terms.is_empty() {
            self.terms = defaults.terms.clone();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub client: Option<String>,
    pub lines: Vec<QuotedLine>,
    pub subtotal: f64,
    pub additional_costs: Vec<AdditionalCost>,
    pub additional_total: f64,
    pub discount_percent: f64,
    pub discount: f64,
    pub taxable: f64,
    pub vat_rate: f64,
    pub vat: f64,
    pub grand_total: f64,
    pub issued_on: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub terms: Vec<String>,
}

fn finite(field: &str, value: f64) -> Result<f64, QuoteError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QuoteError::NonFinite(field.to_string()))
    }
}

pub fn build_quote(request: &QuoteRequest) -> Result<Quote, QuoteError> {
    let discount_percent = finite("discount", request.discount_percent)?;
    if !(0.0..=100.0).contains(&discount_percent) {
        return Err(QuoteError::DiscountOutOfRange(discount_percent));
    }
    let vat_rate = finite("VAT rate", request.vat_rate)?;
    if vat_rate < 0.0 {
        return Err(QuoteError::NegativeVatRate(vat_rate));
    }

    let mut lines = Vec::with_capacity(request.line_items.len());
    let mut subtotal = 0.0;
    for item in &request.line_items {
        let quantity = finite(&format!("quantity of `{}`", item.description), item.quantity)?;
        if quantity < 0.0 {
            return Err(QuoteError::NegativeQuantity {
                description: item.description.clone(),
                quantity,
            });
        }
        let unit_price = round2(finite(
            &format!("unit price of `{}`", item.description),
            item.unit_price,
        )?);
        let amount = round2(unit_price * quantity);
        subtotal += amount;

        lines.push(QuotedLine {
            description: item.description.clone(),
            quantity,
            unit_price,
            amount,
        });
    }

    let mut additional_total = 0.0;
    for cost in &request.additional_costs {
        additional_total += finite(&cost.label, cost.amount)?;
    }

    let subtotal = round2(subtotal);
    let additional_total = round2(additional_total);
    let discount = round2((subtotal + additional_total) * discount_percent / 100.0);
    let taxable = round2(subtotal + additional_total - discount);
    let vat = round2(taxable * vat_rate / 100.0);
    let grand_total = round2(taxable + vat);

    let valid_until = match (request.issued_on, request.valid_days) {
        (Some(date), Some(days)) => date.checked_add_days(Days::new(days.into())),
        _ => None,
    };

    tracing::debug!(subtotal, discount, vat, grand_total, "quote totals");

    Ok(Quote {
        client: request.client.clone(),
        lines,
        subtotal,
        additional_costs: request.additional_costs.clone(),
        additional_total,
        discount_percent,
        discount,
        taxable,
        vat_rate,
        vat,
        grand_total,
        issued_on: request.issued_on,
        valid_until,
        terms: request.terms.clone(),
    })
}
