//! Break-even analysis, sensitivity scenarios and chart sampling

use serde::Serialize;

use crate::calculator;
use crate::error::ModelResult;
use crate::models::{
    serialize_threshold, BreakevenResult, CogsAssumptions, OpexAssumptions, PricingAssumptions,
    VolumeAssumptions, YearAssumptions,
};

/// Number of intervals in the break-even chart (21 sample points)
pub const CHART_STEPS: u64 = 20;

/// Fixed costs for break-even: OpEx plus the depreciation magnitude.
fn fixed_costs_annual(opex: &OpexAssumptions, volume: &VolumeAssumptions) -> f64 {
    let opex = calculator::opex(opex, volume);
    let other = calculator::other_items(volume);
    opex.total_opex + other.depreciation.abs()
}

/// Revenue attributable to one order, spreading recurring fees and the
/// aggregator channel over the order base.
fn revenue_per_order(pricing: &PricingAssumptions, volume: &VolumeAssumptions) -> f64 {
    let mut revenue_per_order = pricing.per_use_fee;

    if volume.orders_per_day > 0.0 && volume.operating_days > 0 {
        let total_orders_estimate = volume.total_orders();
        if total_orders_estimate > 0.0 {
            let subscription =
                f64::from(volume.restaurants) * pricing.monthly_fee * volume.months_operating();
            let setup = f64::from(volume.new_restaurants) * pricing.setup_fee;

            revenue_per_order += subscription / total_orders_estimate
                + setup / total_orders_estimate
                + pricing.deposit * volume.shrinkage;
        }
    }

    if volume.aggregator_active() {
        let orders_with_aggregator = volume.total_orders() + volume.aggregator_orders();
        let aggregator_revenue =
            volume.aggregator_orders() * pricing.green_fee * pricing.revenue_share_pct;
        if orders_with_aggregator > 0.0 {
            revenue_per_order += aggregator_revenue / orders_with_aggregator;
        }
    }

    revenue_per_order
}

/// Calculate break-even metrics.
///
/// QC batches are left out of the variable cost even though they are part of
/// COGS on the income statement; they are treated as semi-fixed here.
///
/// `months_to_breakeven` scales break-even orders against one year of orders
/// at the current run rate. It is a linear approximation, not a cash-flow
/// timed break-even.
pub fn breakeven(
    pricing: &PricingAssumptions,
    volume: &VolumeAssumptions,
    cogs: &CogsAssumptions,
    opex: &OpexAssumptions,
) -> ModelResult<BreakevenResult> {
    let fixed_costs_annual = fixed_costs_annual(opex, volume);

    let variable_cost_per_order = cogs.amortization_per_order()?
        + cogs.wash_cost * volume.collection_rate
        + cogs.collection_cost;

    let revenue_per_order = revenue_per_order(pricing, volume);
    let contribution_margin_per_order = revenue_per_order - variable_cost_per_order;

    let breakeven_orders = if contribution_margin_per_order > 0.0 {
        fixed_costs_annual / contribution_margin_per_order
    } else {
        f64::INFINITY
    };

    let orders_per_restaurant_annual = volume.orders_per_day * f64::from(volume.operating_days);
    let breakeven_restaurants = if orders_per_restaurant_annual > 0.0 {
        breakeven_orders / orders_per_restaurant_annual
    } else {
        f64::INFINITY
    };

    let year1_total_orders = volume.total_orders();
    let months_to_breakeven = if volume.orders_per_day > 0.0
        && volume.restaurants > 0
        && year1_total_orders > 0.0
        && contribution_margin_per_order > 0.0
    {
        breakeven_orders / year1_total_orders * 12.0
    } else {
        f64::INFINITY
    };

    Ok(BreakevenResult {
        fixed_costs_annual,
        variable_cost_per_order,
        revenue_per_order,
        contribution_margin_per_order,
        breakeven_orders,
        breakeven_restaurants,
        months_to_breakeven,
    })
}

/// A single what-if perturbation of the base assumptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Base,
    CollectionRateDrop,
    WashCostIncrease,
    PerUseFeeIncrease,
    OrdersPerDayDrop,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Base,
        Scenario::CollectionRateDrop,
        Scenario::WashCostIncrease,
        Scenario::PerUseFeeIncrease,
        Scenario::OrdersPerDayDrop,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Scenario::Base => "base",
            Scenario::CollectionRateDrop => "collection_rate_drop",
            Scenario::WashCostIncrease => "wash_cost_increase",
            Scenario::PerUseFeeIncrease => "per_use_fee_increase",
            Scenario::OrdersPerDayDrop => "orders_per_day_drop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Base => "Base Case",
            Scenario::CollectionRateDrop => "Collection Rate -10%",
            Scenario::WashCostIncrease => "Wash Cost +20%",
            Scenario::PerUseFeeIncrease => "Per-Use Fee +₹0.50",
            Scenario::OrdersPerDayDrop => "Orders/Day = 40",
        }
    }

    /// Build the perturbed copy. The base value is left untouched.
    pub fn apply(self, base: &YearAssumptions) -> YearAssumptions {
        let mut year = *base;
        match self {
            Scenario::Base => {}
            Scenario::CollectionRateDrop => {
                year.volume.collection_rate = (base.volume.collection_rate - 0.10).max(0.5);
            }
            Scenario::WashCostIncrease => {
                year.cogs.wash_cost = base.cogs.wash_cost * 1.20;
            }
            Scenario::PerUseFeeIncrease => {
                year.pricing.per_use_fee = base.pricing.per_use_fee + 0.50;
            }
            Scenario::OrdersPerDayDrop => {
                year.volume.orders_per_day = 40.0;
            }
        }
        year
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub base: BreakevenResult,
    pub collection_rate_drop: BreakevenResult,
    pub wash_cost_increase: BreakevenResult,
    pub per_use_fee_increase: BreakevenResult,
    pub orders_per_day_drop: BreakevenResult,
}

impl SensitivityReport {
    pub fn get(&self, scenario: Scenario) -> &BreakevenResult {
        match scenario {
            Scenario::Base => &self.base,
            Scenario::CollectionRateDrop => &self.collection_rate_drop,
            Scenario::WashCostIncrease => &self.wash_cost_increase,
            Scenario::PerUseFeeIncrease => &self.per_use_fee_increase,
            Scenario::OrdersPerDayDrop => &self.orders_per_day_drop,
        }
    }

    /// Scenarios in display order
    pub fn iter(&self) -> impl Iterator<Item = (Scenario, &BreakevenResult)> {
        Scenario::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// Re-run break-even under each scenario, each from the same base
pub fn sensitivity(
    pricing: &PricingAssumptions,
    volume: &VolumeAssumptions,
    cogs: &CogsAssumptions,
    opex: &OpexAssumptions,
) -> ModelResult<SensitivityReport> {
    let base = YearAssumptions {
        pricing: *pricing,
        volume: *volume,
        cogs: *cogs,
        opex: *opex,
    };
    let run = |scenario: Scenario| {
        let year = scenario.apply(&base);
        breakeven(&year.pricing, &year.volume, &year.cogs, &year.opex)
    };

    Ok(SensitivityReport {
        base: run(Scenario::Base)?,
        collection_rate_drop: run(Scenario::CollectionRateDrop)?,
        wash_cost_increase: run(Scenario::WashCostIncrease)?,
        per_use_fee_increase: run(Scenario::PerUseFeeIncrease)?,
        orders_per_day_drop: run(Scenario::OrdersPerDayDrop)?,
    })
}

/// Revenue and cost lines sampled over an order range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakevenChart {
    pub orders_range: Vec<u64>,
    pub revenue_line: Vec<f64>,
    pub cost_line: Vec<f64>,
    /// May be infinite
    #[serde(serialize_with = "serialize_threshold")]
    pub breakeven_point: f64,
}

/// Sample 21 points from zero to 150% of `reference_orders`.
///
/// The step size is truncated to a whole order count, so the last point can
/// fall short of 1.5x the reference by up to one step.
pub fn breakeven_chart(
    pricing: &PricingAssumptions,
    volume: &VolumeAssumptions,
    cogs: &CogsAssumptions,
    opex: &OpexAssumptions,
    reference_orders: f64,
) -> ModelResult<BreakevenChart> {
    let result = breakeven(pricing, volume, cogs, opex)?;

    // Saturating cast: negative or NaN references give an empty range
    let max_orders = (reference_orders * 1.5) as u64;
    let step_size = max_orders / CHART_STEPS;

    let orders_range: Vec<u64> = (0..=CHART_STEPS).map(|i| i * step_size).collect();
    let revenue_line = orders_range
        .iter()
        .map(|&orders| orders as f64 * result.revenue_per_order)
        .collect();
    let cost_line = orders_range
        .iter()
        .map(|&orders| result.fixed_costs_annual + orders as f64 * result.variable_cost_per_order)
        .collect();

    Ok(BreakevenChart {
        orders_range,
        revenue_line,
        cost_line,
        breakeven_point: result.breakeven_orders,
    })
}
