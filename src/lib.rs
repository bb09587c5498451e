//! Small-business pricing: allocate fixed costs and a profit target across a
//! product list to suggest unit prices.
//!
//! ```
//! use pricewise::allocator::calculate;
//! use pricewise::types::{PricingProduct, PricingSetup};
//!
//! let setup = PricingSetup { total_cost: 500.0, target_profit: 1000.0, ..Default::default() };
//! let mug = PricingProduct {
//!     id: "mug".into(),
//!     cost_per_unit: 10.0,
//!     expected_units: 100.0,
//!     ..Default::default()
//! };
//! let results = calculate(&setup, &[mug]);
//! assert_eq!(results.calculated_products[0].price, 25.0);
//! ```

pub mod allocator;
pub mod cli;
pub mod config;
pub mod currency;
pub mod graph;
pub mod input;
pub mod output;
pub mod quote;
pub mod sweep;
pub mod types;
pub mod watch;
