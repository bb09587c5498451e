//! Margin sensitivity: the same product list priced at a range of margins.

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::allocator::calculate;
use crate::types::{PricingProduct, PricingSetup};

#[derive(Debug, Error, PartialEq)]
pub enum SweepError {
    #[error("step must be positive, got {0}")]
    InvalidStep(f64),

    #[error("empty margin range: from {from} is above to {to}")]
    EmptyRange { from: f64, to: f64 },

    #[error("margins must stay below 100%, got {0}")]
    MarginOutOfRange(f64),

    #[error("a sweep is limited to {} margins", MAX_POINTS)]
    TooManyPoints,
}

/// Upper bound on the number of margins one sweep will price.
pub const MAX_POINTS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPrice {
    pub id: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub target_margin: f64,
    pub total_revenue: f64,
    pub calculated_profit: f64,
    pub actual_total_revenue: f64,
    pub prices: Vec<ProductPrice>,
}

/// Margins from `from` to `to` inclusive in `step` increments.
pub fn margin_range(from: f64, to: f64, step: f64) -> Result<Vec<f64>, SweepError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SweepError::InvalidStep(step));
    }
    if !from.is_finite() || to.is_nan() || from > to {
        return Err(SweepError::EmptyRange { from, to });
    }
    if to >= 100.0 {
        return Err(SweepError::MarginOutOfRange(to));
    }

    // Index-based so that accumulated float error cannot add or drop a point
    let intervals = ((to - from) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_POINTS as f64 {
        return Err(SweepError::TooManyPoints);
    }
    let count = (intervals as usize)
        .checked_add(1)
        .ok_or(SweepError::TooManyPoints)?;
    Ok((0..count).map(|i| from + i as f64 * step).collect())
}

/// Price `products` once per margin, in parallel. Output order follows `margins`.
pub fn sweep(setup: &PricingSetup, products: &[PricingProduct], margins: &[f64]) -> Vec<SweepPoint> {
    tracing::debug!(points = margins.len(), "running margin sweep");

    margins
        .par_iter()
        .map(|&margin| {
            let setup = PricingSetup {
                use_margin: true,
                target_margin: margin,
                ..setup.clone()
            };
            let results = calculate(&setup, products);

            SweepPoint {
                target_margin: margin,
                total_revenue: results.total_revenue,
                calculated_profit: results.calculated_profit,
                actual_total_revenue: results.actual_total_revenue,
                prices: results
                    .calculated_products
                    .into_iter()
                    .map(|c| ProductPrice {
                        id: c.product.id,
                        price: c.price,
                    })
                    .collect(),
            }
        })
        .collect()
}
