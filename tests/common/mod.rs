#![allow(dead_code)]

use loopbox_calculator::models::{
    CogsAssumptions, OpexAssumptions, PricingAssumptions, VolumeAssumptions, YearAssumptions,
};
use proptest::prelude::*;

/// 500 restaurants x 50 orders/day x 300 days, no aggregator channel
pub fn base_year() -> YearAssumptions {
    YearAssumptions {
        pricing: PricingAssumptions {
            container_price: 150.0,
            monthly_fee: 1000.0,
            setup_fee: 5000.0,
            per_use_fee: 2.0,
            deposit: 20.0,
            incentive: 5.0,
            green_fee: 0.0,
            revenue_share_pct: 0.0,
        },
        volume: VolumeAssumptions {
            restaurants: 500,
            new_restaurants: 100,
            orders_per_day: 50.0,
            operating_days: 300,
            collection_rate: 0.9,
            shrinkage: 0.05,
            zomato_orders_per_day: 0.0,
            zomato_operating_days: 0,
        },
        cogs: CogsAssumptions {
            container_cost: 100.0,
            container_lifespan: 150,
            wash_cost: 1.0,
            collection_cost: 1.0,
            qc_batch_cost: 15_000.0,
            batches_per_month: 4,
        },
        opex: OpexAssumptions {
            technology: 2_000_000.0,
            marketing: 1_000_000.0,
            ga: 1_000_000.0,
            num_sales_people: 2,
            avg_salary: 500_000.0,
            num_hubs: 1,
            rent_per_hub: 50_000.0,
            utilities_per_hub: 10_000.0,
            workers_per_hub: 5,
            worker_salary: 15_000.0,
        },
    }
}

prop_compose! {
    pub fn arb_pricing()(
        container_price in 50.0..500.0f64,
        monthly_fee in 0.0..50_000.0f64,
        setup_fee in 0.0..50_000.0f64,
        per_use_fee in 0.0..10.0f64,
        deposit in 0.0..100.0f64,
        incentive in 0.0..50.0f64,
        green_fee in 0.0..20.0f64,
        revenue_share_pct in 0.0..=1.0f64,
    ) -> PricingAssumptions {
        PricingAssumptions {
            container_price,
            monthly_fee,
            setup_fee,
            per_use_fee,
            deposit,
            incentive,
            green_fee,
            revenue_share_pct,
        }
    }
}

prop_compose! {
    pub fn arb_volume()(
        restaurants in 1u32..50_000,
        new_restaurants in 0u32..50_000,
        orders_per_day in 0.0..200.0f64,
        operating_days in 0u32..=365,
        collection_rate in 0.0..=1.0f64,
        shrinkage in 0.0..=1.0f64,
        zomato_orders_per_day in 0.0..200_000.0f64,
        zomato_operating_days in 0u32..=365,
    ) -> VolumeAssumptions {
        VolumeAssumptions {
            restaurants,
            new_restaurants,
            orders_per_day,
            operating_days,
            collection_rate,
            shrinkage,
            zomato_orders_per_day,
            zomato_operating_days,
        }
    }
}

prop_compose! {
    pub fn arb_cogs()(
        container_cost in 50.0..500.0f64,
        container_lifespan in 1u32..300,
        wash_cost in 0.0..20.0f64,
        collection_cost in 0.0..50.0f64,
        qc_batch_cost in 0.0..100_000.0f64,
        batches_per_month in 0u32..50,
    ) -> CogsAssumptions {
        CogsAssumptions {
            container_cost,
            container_lifespan,
            wash_cost,
            collection_cost,
            qc_batch_cost,
            batches_per_month,
        }
    }
}

prop_compose! {
    pub fn arb_opex()(
        technology in 0.0..50_000_000.0f64,
        marketing in 0.0..100_000_000.0f64,
        ga in 0.0..100_000_000.0f64,
        num_sales_people in 0u32..100,
        avg_salary in 0.0..5_000_000.0f64,
        num_hubs in 0u32..100,
        rent_per_hub in 0.0..1_000_000.0f64,
        utilities_per_hub in 0.0..500_000.0f64,
        workers_per_hub in 0u32..50,
        worker_salary in 0.0..100_000.0f64,
    ) -> OpexAssumptions {
        OpexAssumptions {
            technology,
            marketing,
            ga,
            num_sales_people,
            avg_salary,
            num_hubs,
            rent_per_hub,
            utilities_per_hub,
            workers_per_hub,
            worker_salary,
        }
    }
}

prop_compose! {
    pub fn arb_year()(
        pricing in arb_pricing(),
        volume in arb_volume(),
        cogs in arb_cogs(),
        opex in arb_opex(),
    ) -> YearAssumptions {
        YearAssumptions { pricing, volume, cogs, opex }
    }
}

/// Relative closeness that tolerates large magnitudes
pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}
