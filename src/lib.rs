//! Loop Box financial model
//!
//! Pro-forma income statements, unit economics, break-even and sensitivity
//! analysis for a reusable food-packaging service. The calculators in
//! [`calculator`] and [`breakeven`] are pure functions over the assumption
//! records in [`models`]; the remaining modules persist and present them.

pub mod breakeven;
pub mod calculator;
pub mod db;
pub mod error;
pub mod format;
pub mod history;
pub mod import;
pub mod models;
pub mod projection;

pub use breakeven::{
    breakeven, breakeven_chart, sensitivity, BreakevenChart, Scenario, SensitivityReport,
};
pub use calculator::{income_statement, unit_economics};
pub use error::{ModelError, ModelResult};
pub use projection::{Projection, Year};
