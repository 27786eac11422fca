//! Assumption bundles and derived financial records

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};

/// Pricing levers for one year. All amounts are in INR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingAssumptions {
    pub container_price: f64,
    pub monthly_fee: f64,
    pub setup_fee: f64,
    pub per_use_fee: f64,
    pub deposit: f64,
    pub incentive: f64,
    /// Aggregator per-order green fee
    #[serde(default)]
    pub green_fee: f64,
    /// Share of the aggregator fee we keep (0..1)
    #[serde(default)]
    pub revenue_share_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeAssumptions {
    pub restaurants: u32,
    pub new_restaurants: u32,
    pub orders_per_day: f64,
    pub operating_days: u32,
    /// Share of deployed containers recovered for reuse (0..1)
    pub collection_rate: f64,
    /// Share of deposits forfeited (0..1)
    pub shrinkage: f64,
    #[serde(default)]
    pub zomato_orders_per_day: f64,
    #[serde(default)]
    pub zomato_operating_days: u32,
}

impl VolumeAssumptions {
    /// Orders through the restaurant channel for the year.
    pub fn total_orders(&self) -> f64 {
        f64::from(self.restaurants) * self.orders_per_day * f64::from(self.operating_days)
    }

    /// Operating days expressed as 30-day months.
    pub fn months_operating(&self) -> f64 {
        f64::from(self.operating_days) / 30.0
    }

    pub fn aggregator_orders(&self) -> f64 {
        self.zomato_orders_per_day * f64::from(self.zomato_operating_days)
    }

    pub fn aggregator_active(&self) -> bool {
        self.zomato_orders_per_day > 0.0 && self.zomato_operating_days > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CogsAssumptions {
    pub container_cost: f64,
    /// Uses before a container is replaced
    pub container_lifespan: u32,
    pub wash_cost: f64,
    pub collection_cost: f64,
    pub qc_batch_cost: f64,
    pub batches_per_month: u32,
}

impl CogsAssumptions {
    /// Container cost spread over its lifespan.
    pub fn amortization_per_order(&self) -> ModelResult<f64> {
        if self.container_lifespan == 0 {
            return Err(ModelError::DivisionByZero {
                field: "container_lifespan",
            });
        }
        Ok(self.container_cost / f64::from(self.container_lifespan))
    }
}

/// Annual operating expense drivers. Hub rates are monthly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpexAssumptions {
    pub technology: f64,
    pub marketing: f64,
    pub ga: f64,
    pub num_sales_people: u32,
    pub avg_salary: f64,
    pub num_hubs: u32,
    pub rent_per_hub: f64,
    pub utilities_per_hub: f64,
    pub workers_per_hub: u32,
    pub worker_salary: f64,
}

/// Everything needed to model a single year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearAssumptions {
    pub pricing: PricingAssumptions,
    pub volume: VolumeAssumptions,
    pub cogs: CogsAssumptions,
    pub opex: OpexAssumptions,
}

fn non_negative(field: &'static str, value: f64) -> ModelResult<()> {
    if !value.is_finite() {
        return Err(ModelError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ModelError::invalid(field, format!("{} is negative", value)));
    }
    Ok(())
}

fn fraction(field: &'static str, value: f64) -> ModelResult<()> {
    non_negative(field, value)?;
    if value > 1.0 {
        return Err(ModelError::invalid(field, format!("{} is above 1.0", value)));
    }
    Ok(())
}

impl PricingAssumptions {
    pub fn validate(&self) -> ModelResult<()> {
        non_negative("container_price", self.container_price)?;
        non_negative("monthly_fee", self.monthly_fee)?;
        non_negative("setup_fee", self.setup_fee)?;
        non_negative("per_use_fee", self.per_use_fee)?;
        non_negative("deposit", self.deposit)?;
        non_negative("incentive", self.incentive)?;
        non_negative("green_fee", self.green_fee)?;
        fraction("revenue_share_pct", self.revenue_share_pct)
    }
}

impl VolumeAssumptions {
    pub fn validate(&self) -> ModelResult<()> {
        if self.restaurants < 1 {
            return Err(ModelError::invalid("restaurants", "at least one restaurant is required"));
        }
        non_negative("orders_per_day", self.orders_per_day)?;
        if self.operating_days > 365 {
            return Err(ModelError::invalid(
                "operating_days",
                format!("{} exceeds 365", self.operating_days),
            ));
        }
        if self.zomato_operating_days > 365 {
            return Err(ModelError::invalid(
                "zomato_operating_days",
                format!("{} exceeds 365", self.zomato_operating_days),
            ));
        }
        fraction("collection_rate", self.collection_rate)?;
        fraction("shrinkage", self.shrinkage)?;
        non_negative("zomato_orders_per_day", self.zomato_orders_per_day)
    }
}

impl CogsAssumptions {
    pub fn validate(&self) -> ModelResult<()> {
        non_negative("container_cost", self.container_cost)?;
        if self.container_cost == 0.0 {
            return Err(ModelError::invalid("container_cost", "must be greater than zero"));
        }
        if self.container_lifespan == 0 {
            return Err(ModelError::invalid("container_lifespan", "must be greater than zero"));
        }
        non_negative("wash_cost", self.wash_cost)?;
        non_negative("collection_cost", self.collection_cost)?;
        non_negative("qc_batch_cost", self.qc_batch_cost)
    }
}

impl OpexAssumptions {
    pub fn validate(&self) -> ModelResult<()> {
        non_negative("technology", self.technology)?;
        non_negative("marketing", self.marketing)?;
        non_negative("ga", self.ga)?;
        non_negative("avg_salary", self.avg_salary)?;
        non_negative("rent_per_hub", self.rent_per_hub)?;
        non_negative("utilities_per_hub", self.utilities_per_hub)?;
        non_negative("worker_salary", self.worker_salary)
    }
}

impl YearAssumptions {
    /// Range checks for caller-supplied assumptions. The calculators do not
    /// call this; they only guard `container_lifespan`.
    pub fn validate(&self) -> ModelResult<()> {
        self.pricing.validate()?;
        self.volume.validate()?;
        self.cogs.validate()?;
        self.opex.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevenueBreakdown {
    pub total_orders: f64,
    pub usage_revenue: f64,
    pub subscription_revenue: f64,
    pub setup_revenue: f64,
    pub shrinkage_revenue: f64,
    pub aggregator_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CogsBreakdown {
    pub amortization_per_order: f64,
    pub amortization: f64,
    pub washing: f64,
    pub collection: f64,
    pub qc: f64,
    pub total_cogs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpexBreakdown {
    pub technology: f64,
    pub marketing: f64,
    pub sales_salaries: f64,
    pub ga: f64,
    pub facility_costs: f64,
    pub total_opex: f64,
}

/// Coarse scale bands used for depreciation and interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScaleTier {
    /// Partial operating year
    Startup,
    MidScale,
    FullScale,
}

/// Below-EBITDA items. `depreciation` is never positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OtherItems {
    pub tier: ScaleTier,
    pub depreciation: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IncomeStatement {
    pub revenue: RevenueBreakdown,
    pub cogs: CogsBreakdown,
    pub gross_profit: f64,
    pub gross_margin: f64,
    pub opex: OpexBreakdown,
    pub ebitda: f64,
    pub ebitda_margin: f64,
    pub other: OtherItems,
    pub net_income: f64,
    pub net_margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitEconomics {
    pub revenue_per_order: f64,
    pub cogs_per_order: f64,
    pub gross_profit_per_order: f64,
    pub opex_per_order: f64,
}

/// Break-even thresholds. `breakeven_orders`, `breakeven_restaurants` and
/// `months_to_breakeven` are `f64::INFINITY` when the contribution margin is
/// not positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakevenResult {
    pub fixed_costs_annual: f64,
    pub variable_cost_per_order: f64,
    pub revenue_per_order: f64,
    pub contribution_margin_per_order: f64,
    #[serde(serialize_with = "serialize_threshold")]
    pub breakeven_orders: f64,
    #[serde(serialize_with = "serialize_threshold")]
    pub breakeven_restaurants: f64,
    #[serde(serialize_with = "serialize_threshold")]
    pub months_to_breakeven: f64,
}

impl BreakevenResult {
    pub fn is_reachable(&self) -> bool {
        self.breakeven_orders.is_finite()
    }
}

/// JSON has no infinity, so a threshold that is never reached is written as
/// the string `"Infinity"` instead of `null`.
pub(crate) fn serialize_threshold<S: Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if *value == f64::INFINITY {
        serializer.serialize_str(UNREACHABLE)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Serialized form of a break-even threshold that is never reached
pub const UNREACHABLE: &str = "Infinity";
