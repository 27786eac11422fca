//! Loop Box Financial Model
//!
//! Command-line front end for the three-year financial model.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loopbox_calculator::calculator;
use loopbox_calculator::db;
use loopbox_calculator::format;
use loopbox_calculator::history::ChangeRecord;
use loopbox_calculator::import;
use loopbox_calculator::models::IncomeStatement;
use loopbox_calculator::projection::{Projection, RestaurantEconomics, Year};

#[derive(Parser)]
#[command(name = "loopbox-calculator")]
#[command(about = "Three-year financial model for Loop Box reusable packaging")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "LOOPBOX_DB", default_value = "loopbox.db")]
    database: PathBuf,

    /// Default assumptions used to seed an empty working model
    #[arg(long, env = "LOOPBOX_DEFAULTS", default_value = "data/defaults.json")]
    defaults: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Reset the working model to the default assumptions
    LoadDefaults,

    /// Show key metrics and the three-year income statement
    Statement {
        /// Print the statements as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-order and per-restaurant economics
    UnitEconomics,

    /// Break-even analysis for one year
    Breakeven {
        #[arg(short, long, default_value = "3")]
        year: Year,
    },

    /// Break-even under the standard what-if scenarios
    Sensitivity {
        #[arg(short, long, default_value = "3")]
        year: Year,
    },

    /// Revenue and cost lines around the break-even point
    Chart {
        #[arg(short, long, default_value = "3")]
        year: Year,

        /// Print the chart data as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change one assumption, e.g. `set 3 volume.restaurants 2500`
    Set {
        year: Year,

        /// Dotted field path (pricing.*, volume.*, cogs.*, opex.*)
        field: String,

        value: f64,
    },

    /// Derive Year 2 and 3 pricing and COGS from Year 1
    Cascade,

    /// Show assumption changes and their effect on Year 3 net income
    History {
        /// Clear the history instead of showing it
        #[arg(long)]
        clear: bool,
    },

    /// Save the working model as a named scenario
    Save { name: String },

    /// Replace the working model with a saved scenario
    Load { name: String },

    /// List saved scenarios
    ListScenarios,

    /// Delete every saved copy of a scenario
    DeleteScenario { name: String },

    /// Import scenario JSON files from a directory
    Import { dir: PathBuf },

    /// Export a saved scenario as a JSON file
    Export { name: String, dir: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loopbox_calculator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadDefaults => {
            let projection = import::load_defaults(&cli.defaults)?;
            db::save_working_model(&conn, &projection)?;
            db::clear_changes(&conn)?;
            println!("Loaded default assumptions from {}", cli.defaults.display());
        }

        Commands::Statement { json } => {
            let projection = working_model(&conn, &cli.defaults)?;
            let statements = projection.statements()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                print_key_metrics(&projection, &statements);
                println!();
                print_income_statement(&statements);
            }
        }

        Commands::UnitEconomics => {
            let projection = working_model(&conn, &cli.defaults)?;
            for year in Year::ALL {
                let assumptions = projection.year(year);
                let statement = assumptions.income_statement()?;
                let unit = calculator::unit_economics(&statement);
                let restaurant = RestaurantEconomics::new(assumptions, &statement);

                println!("=== {} ===", year.label());
                println!("  Revenue/Order:      {}", format::rupees(unit.revenue_per_order));
                println!("  COGS/Order:         {}", format::rupees(unit.cogs_per_order));
                println!("  Gross Profit/Order: {}", format::rupees(unit.gross_profit_per_order));
                println!("  OpEx/Order:         {}", format::rupees(unit.opex_per_order));
                println!("  Per restaurant:");
                println!("    Annual Revenue:   {}", format::lakhs(restaurant.annual_revenue));
                println!("    Monthly Revenue:  {}", format::lakhs(restaurant.monthly_revenue));
                println!("    Annual Orders:    {}", format::count(restaurant.annual_orders));
                println!();
            }
        }

        Commands::Breakeven { year } => {
            let projection = working_model(&conn, &cli.defaults)?;
            let result = projection.year(year).breakeven()?;

            println!("=== Break-Even Analysis: {} ===", year.label());
            println!("  Fixed Costs (Annual):      {}", format::lakhs(result.fixed_costs_annual));
            println!(
                "  Variable Cost/Order:       {}",
                format::rupees(result.variable_cost_per_order)
            );
            println!("  Revenue/Order:             {}", format::rupees(result.revenue_per_order));
            println!(
                "  Contribution Margin/Order: {}",
                format::rupees(result.contribution_margin_per_order)
            );
            println!();
            let note = if result.is_reachable() {
                ""
            } else {
                " (negative margin)"
            };
            println!(
                "  Break-Even Orders:      {}{}",
                format::count(result.breakeven_orders),
                note
            );
            println!(
                "  Break-Even Restaurants: {}{}",
                format::count(result.breakeven_restaurants),
                note
            );
            println!(
                "  Months to Break-Even:   {}{}",
                format::months(result.months_to_breakeven),
                note
            );
        }

        Commands::Sensitivity { year } => {
            let projection = working_model(&conn, &cli.defaults)?;
            let report = projection.year(year).sensitivity()?;

            println!("=== Sensitivity Analysis: {} ===", year.label());
            println!(
                "{:<24} {:>18} {:>18} {:>10}",
                "Scenario", "Break-Even Orders", "Restaurants", "Months"
            );
            println!("{}", "-".repeat(73));
            for (scenario, result) in report.iter() {
                println!(
                    "{:<24} {:>18} {:>18} {:>10}",
                    scenario.label(),
                    format::count(result.breakeven_orders),
                    format::count(result.breakeven_restaurants),
                    format::months(result.months_to_breakeven)
                );
            }
        }

        Commands::Chart { year, json } => {
            let projection = working_model(&conn, &cli.defaults)?;
            let chart = projection
                .year(year)
                .breakeven_chart(projection.year3_reference_orders())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&chart)?);
            } else {
                println!("{:>14} {:>14} {:>14}", "Orders", "Revenue", "Costs");
                println!("{}", "-".repeat(44));
                for ((orders, revenue), cost) in chart
                    .orders_range
                    .iter()
                    .zip(&chart.revenue_line)
                    .zip(&chart.cost_line)
                {
                    println!(
                        "{:>14} {:>14} {:>14}",
                        format::count(*orders as f64),
                        format::lakhs(*revenue),
                        format::lakhs(*cost)
                    );
                }
                println!();
                println!("Break-even point: {} orders", format::count(chart.breakeven_point));
            }
        }

        Commands::Set { year, field, value } => {
            let mut projection = working_model(&conn, &cli.defaults)?;
            let previous_net_income = projection.year3.income_statement()?.net_income;

            let current = projection.year(year);
            let old_value = current.field(&field)?;
            let updated = current.with_field(&field, value)?;
            updated.validate()?;
            *projection.year_mut(year) = updated;

            let new_net_income = projection.year3.income_statement()?.net_income;
            let change = ChangeRecord::for_edit(
                &field,
                year,
                old_value,
                value,
                previous_net_income,
                new_net_income,
            );
            db::save_edit(&conn, &projection, change.as_ref())?;

            match change {
                Some(change) => {
                    info!("{} {} changed from {} to {}", year, field, old_value, value);
                    println!(
                        "{} {}: {} -> {} (Year 3 net income {} / {})",
                        year.label(),
                        field,
                        old_value,
                        value,
                        signed_lakhs(change.impact.impact_abs),
                        format::percentage(change.impact.impact_pct)
                    );
                }
                None => println!("{} {} is already {}", year.label(), field, value),
            }
        }

        Commands::Cascade => {
            let projection = working_model(&conn, &cli.defaults)?;
            let before = projection.year3.income_statement()?.net_income;
            let cascaded = projection.cascade_from_year1();
            let after = cascaded.year3.income_statement()?.net_income;
            db::save_working_model(&conn, &cascaded)?;

            println!("Cascaded Year 1 pricing and COGS into Years 2 and 3");
            println!(
                "Year 3 net income: {} -> {}",
                format::lakhs(before),
                format::lakhs(after)
            );
        }

        Commands::History { clear } => {
            if clear {
                db::clear_changes(&conn)?;
                println!("Change history cleared");
            } else {
                let changes = db::list_changes(&conn)?;
                if changes.is_empty() {
                    println!("No changes recorded. Use 'set' to edit an assumption.");
                } else {
                    println!(
                        "{:<20} {:<6} {:<28} {:>12} {:>12} {:>12} {:>8}",
                        "Time", "Year", "Variable", "Old", "New", "Impact", "Impact %"
                    );
                    println!("{}", "-".repeat(104));
                    for c in changes.iter().rev() {
                        println!(
                            "{:<20} {:<6} {:<28} {:>12} {:>12} {:>12} {:>8}",
                            c.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                            c.year,
                            c.variable,
                            c.old_value,
                            c.new_value,
                            signed_lakhs(c.impact.impact_abs),
                            format::percentage(c.impact.impact_pct)
                        );
                    }
                }
            }
        }

        Commands::Save { name } => {
            let projection = working_model(&conn, &cli.defaults)?;
            let id = db::save_scenario(&conn, &name, Local::now(), &projection)?;
            println!("Saved scenario '{}' (#{})", name, id);
        }

        Commands::Load { name } => {
            db::activate_scenario(&conn, &name)?;
            println!("Loaded scenario '{}'", name);
        }

        Commands::ListScenarios => {
            let scenarios = db::list_scenarios(&conn)?;
            if scenarios.is_empty() {
                println!("No saved scenarios. Run 'save' or 'import' first.");
            } else {
                println!("{:<6} {:<30} {}", "ID", "Name", "Saved");
                println!("{}", "-".repeat(58));
                for s in scenarios {
                    println!(
                        "{:<6} {:<30} {}",
                        s.id,
                        s.name,
                        s.saved_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }

        Commands::DeleteScenario { name } => {
            let removed = db::delete_scenario(&conn, &name)?;
            if removed == 0 {
                println!("Scenario '{}' not found", name);
            } else {
                let copies = if removed == 1 { "copy" } else { "copies" };
                println!("Deleted {} saved {} of '{}'", removed, copies, name);
            }
        }

        Commands::Import { dir } => {
            let stats = import::import_scenarios(&conn, &dir)?;
            println!("\n{}", stats);
        }

        Commands::Export { name, dir } => {
            let projection = db::load_scenario(&conn, &name)?
                .ok_or_else(|| anyhow!("Scenario '{}' not found", name))?;
            let path = import::export_scenario(&dir, &name, Local::now(), &projection)?;
            println!("Exported '{}' to {}", name, path.display());
        }
    }

    Ok(())
}

/// Load the working model, seeding it from the defaults file on first use
fn working_model(conn: &Connection, defaults: &Path) -> Result<Projection> {
    if let Some(projection) = db::load_working_model(conn)? {
        return Ok(projection);
    }

    info!("No working model yet, seeding from {}", defaults.display());
    let projection = import::load_defaults(defaults)?;
    db::save_working_model(conn, &projection)?;
    Ok(projection)
}

fn signed_lakhs(amount: f64) -> String {
    if amount > 0.0 {
        format!("+{}", format::lakhs(amount))
    } else {
        format::lakhs(amount)
    }
}

fn print_key_metrics(projection: &Projection, statements: &[IncomeStatement; 3]) {
    println!("=== Key Metrics ===");
    for (year, s) in Year::ALL.into_iter().zip(statements) {
        let growth = match projection.revenue_growth(statements, year) {
            Some(g) if g >= 0.0 => format!(" (↑{} YoY)", format::percentage(g)),
            Some(g) => format!(" (↓{} YoY)", format::percentage(g.abs())),
            None => String::new(),
        };
        println!(
            "{:<18} Revenue {}{}  EBITDA {}  Net Margin {}",
            year.label(),
            format::crores(s.revenue.total_revenue),
            growth,
            format::lakhs(s.ebitda),
            format::percentage(s.net_margin)
        );
    }
}

fn statement_row(
    label: &str,
    statements: &[IncomeStatement; 3],
    value: impl Fn(&IncomeStatement) -> String,
) {
    print!("{:<32}", label);
    for s in statements {
        print!(" {:>18}", value(s));
    }
    println!();
}

fn print_income_statement(statements: &[IncomeStatement; 3]) {
    let money = |label: &str, f: fn(&IncomeStatement) -> f64| {
        statement_row(label, statements, |s| format::lakhs(f(s)))
    };
    let pct = |label: &str, f: fn(&IncomeStatement) -> f64| {
        statement_row(label, statements, |s| format::percentage(f(s)))
    };

    print!("{:<32}", "Line Item");
    for year in Year::ALL {
        print!(" {:>18}", year.label());
    }
    println!();
    println!("{}", "-".repeat(32 + 19 * 3));

    println!("REVENUE");
    money("  Container Usage Fees", |s| s.revenue.usage_revenue);
    money("  Platform Subscriptions", |s| s.revenue.subscription_revenue);
    money("  Setup Fees", |s| s.revenue.setup_revenue);
    money("  Aggregator Revenue", |s| s.revenue.aggregator_revenue);
    money("  Deposit Shrinkage", |s| s.revenue.shrinkage_revenue);
    money("TOTAL REVENUE", |s| s.revenue.total_revenue);
    println!();

    println!("COST OF GOODS SOLD");
    money("  Container Amortization", |s| s.cogs.amortization);
    money("  Washing & Sanitation", |s| s.cogs.washing);
    money("  Collection & Logistics", |s| s.cogs.collection);
    money("  Quality Control Testing", |s| s.cogs.qc);
    money("TOTAL COGS", |s| s.cogs.total_cogs);
    println!();

    money("GROSS PROFIT", |s| s.gross_profit);
    pct("Gross Margin %", |s| s.gross_margin);
    println!();

    println!("OPERATING EXPENSES");
    money("  Technology & Platform", |s| s.opex.technology);
    money("  Sales & Marketing", |s| s.opex.marketing + s.opex.sales_salaries);
    money("  General & Administrative", |s| s.opex.ga);
    money("  Facility Costs (Micro-hubs)", |s| s.opex.facility_costs);
    money("TOTAL OPEX", |s| s.opex.total_opex);
    println!();

    money("EBITDA", |s| s.ebitda);
    pct("EBITDA Margin %", |s| s.ebitda_margin);
    println!();

    println!("OTHER ITEMS");
    money("  Depreciation & Amortization", |s| s.other.depreciation);
    money("  Interest Income", |s| s.other.interest);
    println!();

    money("NET INCOME", |s| s.net_income);
    pct("Net Margin %", |s| s.net_margin);
}
