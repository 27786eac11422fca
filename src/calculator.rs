//! Income statement calculator
//!
//! Revenue, COGS, OpEx and below-EBITDA items for a single year, composed
//! into a full income statement. Every function here is pure.

use crate::error::ModelResult;
use crate::models::{
    CogsAssumptions, CogsBreakdown, IncomeStatement, OpexAssumptions, OpexBreakdown, OtherItems,
    PricingAssumptions, RevenueBreakdown, ScaleTier, UnitEconomics, VolumeAssumptions,
};

/// Restaurant count at which the full-scale tier starts
pub const FULL_SCALE_RESTAURANTS: u32 = 2000;

/// Calculate all revenue streams
pub fn revenue(pricing: &PricingAssumptions, volume: &VolumeAssumptions) -> RevenueBreakdown {
    let total_orders = volume.total_orders();

    let usage_revenue = total_orders * pricing.per_use_fee;
    let subscription_revenue =
        f64::from(volume.restaurants) * pricing.monthly_fee * volume.months_operating();
    let setup_revenue = f64::from(volume.new_restaurants) * pricing.setup_fee;
    let shrinkage_revenue = total_orders * pricing.deposit * volume.shrinkage;

    // Aggregator orders are a separate channel and stay out of total_orders
    let aggregator_revenue =
        volume.aggregator_orders() * pricing.green_fee * pricing.revenue_share_pct;

    RevenueBreakdown {
        total_orders,
        usage_revenue,
        subscription_revenue,
        setup_revenue,
        shrinkage_revenue,
        aggregator_revenue,
        total_revenue: usage_revenue
            + subscription_revenue
            + setup_revenue
            + shrinkage_revenue
            + aggregator_revenue,
    }
}

/// Calculate cost of goods sold for `total_orders` restaurant-channel orders
pub fn cogs(
    cogs: &CogsAssumptions,
    volume: &VolumeAssumptions,
    total_orders: f64,
) -> ModelResult<CogsBreakdown> {
    let amortization_per_order = cogs.amortization_per_order()?;
    let amortization = total_orders * amortization_per_order;

    // Only recovered containers get washed
    let washing = total_orders * volume.collection_rate * cogs.wash_cost;
    let collection = total_orders * cogs.collection_cost;
    let qc = cogs.qc_batch_cost * f64::from(cogs.batches_per_month) * volume.months_operating();

    Ok(CogsBreakdown {
        amortization_per_order,
        amortization,
        washing,
        collection,
        qc,
        total_cogs: amortization + washing + collection + qc,
    })
}

/// Calculate operating expenses
pub fn opex(opex: &OpexAssumptions, volume: &VolumeAssumptions) -> OpexBreakdown {
    let sales_salaries = f64::from(opex.num_sales_people) * opex.avg_salary;

    let per_hub_monthly = opex.rent_per_hub
        + opex.utilities_per_hub
        + f64::from(opex.workers_per_hub) * opex.worker_salary;
    let facility_costs = f64::from(opex.num_hubs) * per_hub_monthly * volume.months_operating();

    OpexBreakdown {
        technology: opex.technology,
        marketing: opex.marketing,
        sales_salaries,
        ga: opex.ga,
        facility_costs,
        total_opex: opex.technology + opex.marketing + sales_salaries + opex.ga + facility_costs,
    }
}

impl ScaleTier {
    /// Pick the tier. A partial year always counts as startup.
    pub fn for_volume(volume: &VolumeAssumptions) -> Self {
        if volume.operating_days < 365 {
            ScaleTier::Startup
        } else if volume.restaurants < FULL_SCALE_RESTAURANTS {
            ScaleTier::MidScale
        } else {
            ScaleTier::FullScale
        }
    }

    /// Placeholder depreciation charge standing in for an unmodeled asset
    /// schedule. Always negative.
    pub fn depreciation(self) -> f64 {
        match self {
            ScaleTier::Startup => -2_500_000.0,
            ScaleTier::MidScale => -6_000_000.0,
            ScaleTier::FullScale => -14_500_000.0,
        }
    }

    /// Placeholder interest income.
    pub fn interest(self) -> f64 {
        match self {
            ScaleTier::Startup => 250_000.0,
            ScaleTier::MidScale => 500_000.0,
            ScaleTier::FullScale => 1_500_000.0,
        }
    }
}

/// Depreciation and interest from the coarse scale tiers. These are fixed
/// approximations, not an amortization schedule.
pub fn other_items(volume: &VolumeAssumptions) -> OtherItems {
    let tier = ScaleTier::for_volume(volume);
    OtherItems {
        tier,
        depreciation: tier.depreciation(),
        interest: tier.interest(),
    }
}

/// `numerator / denominator * 100`, or 0 when there is no revenue
fn margin(numerator: f64, total_revenue: f64) -> f64 {
    if total_revenue > 0.0 {
        numerator / total_revenue * 100.0
    } else {
        0.0
    }
}

fn per_order(total: f64, total_orders: f64) -> f64 {
    if total_orders > 0.0 {
        total / total_orders
    } else {
        0.0
    }
}

/// Calculate the complete income statement for one year
pub fn income_statement(
    pricing: &PricingAssumptions,
    volume: &VolumeAssumptions,
    cogs_assumptions: &CogsAssumptions,
    opex_assumptions: &OpexAssumptions,
) -> ModelResult<IncomeStatement> {
    let revenue = revenue(pricing, volume);
    let cogs = cogs(cogs_assumptions, volume, revenue.total_orders)?;

    let gross_profit = revenue.total_revenue - cogs.total_cogs;

    let opex = opex(opex_assumptions, volume);
    let ebitda = gross_profit - opex.total_opex;

    let other = other_items(volume);
    let net_income = ebitda + other.depreciation + other.interest;

    Ok(IncomeStatement {
        revenue,
        cogs,
        gross_profit,
        gross_margin: margin(gross_profit, revenue.total_revenue),
        opex,
        ebitda,
        ebitda_margin: margin(ebitda, revenue.total_revenue),
        other,
        net_income,
        net_margin: margin(net_income, revenue.total_revenue),
    })
}

/// Per-order metrics for a composed income statement
pub fn unit_economics(statement: &IncomeStatement) -> UnitEconomics {
    let total_orders = statement.revenue.total_orders;

    let revenue_per_order = per_order(statement.revenue.total_revenue, total_orders);
    let cogs_per_order = per_order(statement.cogs.total_cogs, total_orders);

    UnitEconomics {
        revenue_per_order,
        cogs_per_order,
        gross_profit_per_order: revenue_per_order - cogs_per_order,
        opex_per_order: per_order(statement.opex.total_opex, total_orders),
    }
}
