//! Three-year projection built on the single-year calculators

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::breakeven::{self, BreakevenChart, SensitivityReport};
use crate::calculator;
use crate::error::ModelResult;
use crate::models::{BreakevenResult, IncomeStatement, UnitEconomics, YearAssumptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Year {
    Year1,
    Year2,
    Year3,
}

impl Year {
    pub const ALL: [Year; 3] = [Year::Year1, Year::Year2, Year::Year3];

    pub fn key(self) -> &'static str {
        match self {
            Year::Year1 => "year1",
            Year::Year2 => "year2",
            Year::Year3 => "year3",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Year::Year1 => "Year 1 (FY 2026)",
            Year::Year2 => "Year 2 (FY 2027)",
            Year::Year3 => "Year 3 (FY 2028)",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Year::Year1 => 1,
            Year::Year2 => 2,
            Year::Year3 => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Year::Year1),
            2 => Some(Year::Year2),
            3 => Some(Year::Year3),
            _ => None,
        }
    }

    fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Accepts `1`, `year1` or `Year 1`
impl FromStr for Year {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        let prefix = s.trim_end_matches(|c: char| c.is_ascii_digit()).trim();
        if !(prefix.is_empty() || prefix.eq_ignore_ascii_case("year")) {
            bail!("Unknown year '{}'", s);
        }
        digits
            .parse::<u8>()
            .ok()
            .and_then(Year::from_number)
            .ok_or_else(|| anyhow!("Unknown year '{}' (expected 1, 2 or 3)", s))
    }
}

impl YearAssumptions {
    pub fn income_statement(&self) -> ModelResult<IncomeStatement> {
        calculator::income_statement(&self.pricing, &self.volume, &self.cogs, &self.opex)
    }

    pub fn unit_economics(&self) -> ModelResult<UnitEconomics> {
        Ok(calculator::unit_economics(&self.income_statement()?))
    }

    pub fn breakeven(&self) -> ModelResult<BreakevenResult> {
        breakeven::breakeven(&self.pricing, &self.volume, &self.cogs, &self.opex)
    }

    pub fn sensitivity(&self) -> ModelResult<SensitivityReport> {
        breakeven::sensitivity(&self.pricing, &self.volume, &self.cogs, &self.opex)
    }

    pub fn breakeven_chart(&self, reference_orders: f64) -> ModelResult<BreakevenChart> {
        breakeven::breakeven_chart(
            &self.pricing,
            &self.volume,
            &self.cogs,
            &self.opex,
            reference_orders,
        )
    }

    /// Read a numeric field by dotted path, e.g. `volume.restaurants`
    pub fn field(&self, path: &str) -> Result<f64> {
        let value = serde_json::to_value(self)?;
        value
            .pointer(&json_pointer(path))
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| anyhow!("Unknown assumption '{}'", path))
    }

    /// Return a copy with one field replaced. Integer fields only accept
    /// whole, non-negative values.
    pub fn with_field(&self, path: &str, new_value: f64) -> Result<Self> {
        let mut value = serde_json::to_value(self)?;
        let slot = value
            .pointer_mut(&json_pointer(path))
            .ok_or_else(|| anyhow!("Unknown assumption '{}'", path))?;

        let replacement = match slot {
            serde_json::Value::Number(n) if n.is_u64() => {
                if new_value < 0.0 || new_value.fract() != 0.0 || !new_value.is_finite() {
                    bail!("'{}' takes a whole number, got {}", path, new_value);
                }
                serde_json::Value::from(new_value as u64)
            }
            serde_json::Value::Number(_) => serde_json::Number::from_f64(new_value)
                .map(serde_json::Value::Number)
                .ok_or_else(|| anyhow!("'{}' must be a finite number", path))?,
            _ => bail!("'{}' is not a numeric assumption", path),
        };
        *slot = replacement;

        serde_json::from_value(value).with_context(|| format!("Failed to update '{}'", path))
    }
}

fn json_pointer(path: &str) -> String {
    format!("/{}", path.trim().replace('.', "/"))
}

/// Per-restaurant view of one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestaurantEconomics {
    pub annual_revenue: f64,
    pub monthly_revenue: f64,
    pub annual_orders: f64,
}

impl RestaurantEconomics {
    pub fn new(year: &YearAssumptions, statement: &IncomeStatement) -> Self {
        let restaurants = f64::from(year.volume.restaurants);
        let annual_revenue = if restaurants > 0.0 {
            statement.revenue.total_revenue / restaurants
        } else {
            0.0
        };
        RestaurantEconomics {
            annual_revenue,
            monthly_revenue: annual_revenue / 12.0,
            annual_orders: year.volume.orders_per_day * f64::from(year.volume.operating_days),
        }
    }
}

/// Year-over-year growth in percent, 0 when there is no prior base
pub fn yoy_growth(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Assumptions for the three modelled years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub year1: YearAssumptions,
    pub year2: YearAssumptions,
    pub year3: YearAssumptions,
}

impl Projection {
    pub fn year(&self, year: Year) -> &YearAssumptions {
        match year {
            Year::Year1 => &self.year1,
            Year::Year2 => &self.year2,
            Year::Year3 => &self.year3,
        }
    }

    pub fn year_mut(&mut self, year: Year) -> &mut YearAssumptions {
        match year {
            Year::Year1 => &mut self.year1,
            Year::Year2 => &mut self.year2,
            Year::Year3 => &mut self.year3,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for year in Year::ALL {
            self.year(year)
                .validate()
                .with_context(|| format!("Invalid assumptions for {}", year.label()))?;
        }
        Ok(())
    }

    pub fn statements(&self) -> ModelResult<[IncomeStatement; 3]> {
        Ok([
            self.year1.income_statement()?,
            self.year2.income_statement()?,
            self.year3.income_statement()?,
        ])
    }

    pub fn statement(&self, year: Year) -> ModelResult<IncomeStatement> {
        self.year(year).income_statement()
    }

    /// Revenue growth for `year` against the year before; `None` for year 1
    pub fn revenue_growth(&self, statements: &[IncomeStatement; 3], year: Year) -> Option<f64> {
        let i = year.index();
        (i > 0).then(|| {
            yoy_growth(
                statements[i - 1].revenue.total_revenue,
                statements[i].revenue.total_revenue,
            )
        })
    }

    /// Year 3 order volume, the reference for break-even charts
    pub fn year3_reference_orders(&self) -> f64 {
        self.year3.volume.total_orders()
    }

    /// Derive years 2 and 3 pricing and COGS from year 1.
    ///
    /// Volume, OpEx and the aggregator pricing terms are left alone since
    /// each year runs at its own scale.
    pub fn cascade_from_year1(&self) -> Projection {
        let y1 = self.year1;
        let mut year2 = self.year2;
        let mut year3 = self.year3;

        year2.pricing.container_price = (y1.pricing.container_price * 0.97).trunc();
        year3.pricing.container_price = (year2.pricing.container_price * 0.97).trunc();

        year2.pricing.monthly_fee = y1.pricing.monthly_fee;
        year3.pricing.monthly_fee = (y1.pricing.monthly_fee * 1.10).trunc();

        for year in [&mut year2, &mut year3] {
            year.pricing.per_use_fee = y1.pricing.per_use_fee;
            year.pricing.deposit = y1.pricing.deposit;
            year.pricing.incentive = y1.pricing.incentive;

            year.cogs.container_cost = y1.cogs.container_cost;
            year.cogs.container_lifespan = y1.cogs.container_lifespan;
            year.cogs.qc_batch_cost = y1.cogs.qc_batch_cost;
            year.cogs.batches_per_month = y1.cogs.batches_per_month;
        }

        // Operational efficiencies compound year over year
        year2.cogs.wash_cost = y1.cogs.wash_cost * 0.92;
        year3.cogs.wash_cost = year2.cogs.wash_cost * 0.91;

        year2.cogs.collection_cost = y1.cogs.collection_cost * 0.90;
        year3.cogs.collection_cost = year2.cogs.collection_cost * 0.89;

        Projection {
            year1: y1,
            year2,
            year3,
        }
    }
}
