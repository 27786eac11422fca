mod common;

use std::fs;
use std::path::Path;

use chrono::{Duration, Local, TimeZone};
use loopbox_calculator::db;
use loopbox_calculator::history::ChangeRecord;
use loopbox_calculator::import;
use loopbox_calculator::projection::{Projection, RestaurantEconomics, Year};
use rusqlite::Connection;
use tempfile::tempdir;

use common::base_year;

fn projection() -> Projection {
    let year1 = base_year();
    let mut year2 = base_year();
    year2.volume.restaurants = 1500;
    year2.volume.operating_days = 365;
    let mut year3 = base_year();
    year3.volume.restaurants = 4000;
    year3.volume.operating_days = 365;
    year3.volume.zomato_orders_per_day = 50_000.0;
    year3.volume.zomato_operating_days = 300;
    year3.pricing.green_fee = 5.0;
    year3.pricing.revenue_share_pct = 0.4;
    Projection { year1, year2, year3 }
}

fn open_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn cascade_derives_later_years_from_year1() {
    let mut base = projection();
    base.year1.pricing.container_price = 150.0;
    base.year1.pricing.monthly_fee = 1500.0;
    base.year1.cogs.wash_cost = 3.0;
    base.year1.cogs.collection_cost = 2.5;
    base.year2.cogs.container_lifespan = 90;

    let cascaded = base.cascade_from_year1();

    assert_eq!(cascaded.year2.pricing.container_price, 145.0);
    assert_eq!(cascaded.year3.pricing.container_price, 140.0);
    assert_eq!(cascaded.year2.pricing.monthly_fee, 1500.0);
    assert_eq!(cascaded.year3.pricing.monthly_fee, 1650.0);
    assert!((cascaded.year2.cogs.wash_cost - 2.76).abs() < 1e-9);
    assert!((cascaded.year3.cogs.wash_cost - 2.76 * 0.91).abs() < 1e-9);
    assert!((cascaded.year2.cogs.collection_cost - 2.25).abs() < 1e-9);
    assert!((cascaded.year3.cogs.collection_cost - 2.25 * 0.89).abs() < 1e-9);
    assert_eq!(cascaded.year2.cogs.container_lifespan, 150);

    // Volume, OpEx and the aggregator terms stay per-year
    assert_eq!(cascaded.year3.volume, base.year3.volume);
    assert_eq!(cascaded.year2.opex, base.year2.opex);
    assert_eq!(cascaded.year3.pricing.green_fee, 5.0);
    assert_eq!(cascaded.year1, base.year1);
    assert_eq!(base.year2.cogs.container_lifespan, 90);
}

#[test]
fn growth_and_restaurant_economics() {
    let p = projection();
    let statements = p.statements().unwrap();

    assert_eq!(p.revenue_growth(&statements, Year::Year1), None);
    let growth = p.revenue_growth(&statements, Year::Year2).unwrap();
    assert!(growth > 0.0);

    let restaurant = RestaurantEconomics::new(&p.year1, &statements[0]);
    assert!((restaurant.annual_revenue - 56_000.0).abs() < 1e-6);
    assert!((restaurant.monthly_revenue * 12.0 - restaurant.annual_revenue).abs() < 1e-6);
    assert_eq!(restaurant.annual_orders, 15_000.0);

    assert_eq!(p.year3_reference_orders(), 4000.0 * 50.0 * 365.0);
}

#[test]
fn fields_are_edited_by_path() {
    let year = base_year();
    assert_eq!(year.field("volume.restaurants").unwrap(), 500.0);
    assert_eq!(year.field("pricing.per_use_fee").unwrap(), 2.0);

    let edited = year.with_field("volume.restaurants", 750.0).unwrap();
    assert_eq!(edited.volume.restaurants, 750);
    assert_eq!(year.volume.restaurants, 500);

    let edited = year.with_field("cogs.wash_cost", 1.25).unwrap();
    assert_eq!(edited.cogs.wash_cost, 1.25);

    assert!(year.with_field("volume.restaurants", 10.5).is_err());
    assert!(year.with_field("volume.restaurants", -1.0).is_err());
    assert!(year.with_field("volume.nonsense", 1.0).is_err());
    assert!(year.with_field("volume", 1.0).is_err());
    assert!(year.field("opex.unknown").is_err());
}

#[test]
fn working_model_round_trips() {
    let conn = open_db();
    assert!(db::load_working_model(&conn).unwrap().is_none());

    let p = projection();
    db::save_working_model(&conn, &p).unwrap();
    assert_eq!(db::load_working_model(&conn).unwrap(), Some(p));

    let cascaded = p.cascade_from_year1();
    db::save_working_model(&conn, &cascaded).unwrap();
    assert_eq!(db::load_working_model(&conn).unwrap(), Some(cascaded));
}

#[test]
fn scenarios_list_newest_first_and_load_latest() {
    let conn = open_db();
    let older = projection();
    let mut newer = projection();
    newer.year3.volume.restaurants = 5000;

    let t0 = Local.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
    db::save_scenario(&conn, "growth", t0, &older).unwrap();
    db::save_scenario(&conn, "growth", t0 + Duration::hours(2), &newer).unwrap();
    db::save_scenario(&conn, "cautious", t0 + Duration::hours(1), &older).unwrap();

    let names: Vec<_> = db::list_scenarios(&conn)
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, ["growth", "cautious", "growth"]);

    assert_eq!(db::load_scenario(&conn, "growth").unwrap(), Some(newer));
    assert_eq!(db::load_scenario(&conn, "missing").unwrap(), None);

    assert_eq!(db::delete_scenario(&conn, "growth").unwrap(), 2);
    assert_eq!(db::list_scenarios(&conn).unwrap().len(), 1);
}

#[test]
fn activating_a_scenario_resets_history() {
    let conn = open_db();
    let p = projection();
    db::save_scenario(&conn, "plan", Local::now(), &p).unwrap();

    let change =
        ChangeRecord::for_edit("volume.restaurants", Year::Year3, 4000.0, 4500.0, 1.0e7, 1.2e7)
            .unwrap();
    db::record_change(&conn, &change).unwrap();

    let stored = db::list_changes(&conn).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].variable, "volume.restaurants");
    assert_eq!(stored[0].year, Year::Year3);
    assert_eq!(stored[0].impact, change.impact);

    let loaded = db::activate_scenario(&conn, "plan").unwrap();
    assert_eq!(loaded, p);
    assert_eq!(db::load_working_model(&conn).unwrap(), Some(p));
    assert!(db::list_changes(&conn).unwrap().is_empty());

    assert!(db::activate_scenario(&conn, "missing").is_err());
}

#[test]
fn exported_scenarios_import_back() {
    let dir = tempdir().unwrap();
    let saved_at = Local.with_ymd_and_hms(2025, 3, 4, 14, 5, 6).unwrap();
    let path = import::export_scenario(dir.path(), "Scenario_1", saved_at, &projection()).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "Scenario_1_20250304_140506.json"
    );

    // Files that do not follow the naming scheme are ignored
    fs::write(dir.path().join("notes.json"), "{}").unwrap();
    // Broken documents are counted, not fatal
    fs::write(dir.path().join("broken_20250101_000000.json"), "{ not json").unwrap();

    let conn = open_db();
    let stats = import::import_scenarios(&conn, dir.path()).unwrap();
    assert_eq!(stats.imported, 1);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.errors, 1);

    let scenarios = db::list_scenarios(&conn).unwrap();
    assert_eq!(scenarios.len(), 1);
    assert_eq!(scenarios[0].name, "Scenario_1");
    assert_eq!(scenarios[0].saved_at, saved_at);
    assert_eq!(db::load_scenario(&conn, "Scenario_1").unwrap(), Some(projection()));
}

#[test]
fn reimporting_a_directory_skips_stored_scenarios() {
    let dir = tempdir().unwrap();
    let saved_at = Local.with_ymd_and_hms(2025, 3, 4, 14, 5, 6).unwrap();
    import::export_scenario(dir.path(), "base", saved_at, &projection()).unwrap();
    import::export_scenario(dir.path(), "base", saved_at + Duration::days(1), &projection())
        .unwrap();

    let conn = open_db();
    let first = import::import_scenarios(&conn, dir.path()).unwrap();
    assert_eq!((first.imported, first.skipped), (2, 0));

    let second = import::import_scenarios(&conn, dir.path()).unwrap();
    assert_eq!((second.imported, second.skipped, second.errors), (0, 2, 0));
    assert_eq!(db::list_scenarios(&conn).unwrap().len(), 2);
    assert!(db::scenario_exists(&conn, "base", saved_at).unwrap());
    assert!(!db::scenario_exists(&conn, "base", saved_at + Duration::hours(1)).unwrap());
}

#[test]
fn export_rejects_names_that_are_paths() {
    let dir = tempdir().unwrap();
    let inner = dir.path().join("out");
    let p = projection();
    let now = Local::now();

    for name in ["../escape", "a/b", "a\\b", "  "] {
        assert!(import::export_scenario(&inner, name, now, &p).is_err(), "{name:?}");
    }
    assert!(!inner.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    let path = import::export_scenario(&inner, "plain", now, &p).unwrap();
    assert_eq!(path.parent(), Some(inner.as_path()));
}

#[test]
fn scenario_times_are_stored_in_utc() {
    let conn = open_db();
    let t0 = Local.with_ymd_and_hms(2025, 1, 20, 10, 30, 0).unwrap();
    db::save_scenario(&conn, "early", t0, &projection()).unwrap();
    db::save_scenario(&conn, "late", t0 + Duration::minutes(90), &projection()).unwrap();

    let stored: Vec<String> = conn
        .prepare("SELECT saved_at FROM scenarios ORDER BY id")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(stored.iter().all(|ts| ts.ends_with('Z')), "{stored:?}");

    let listed = db::list_scenarios(&conn).unwrap();
    assert_eq!(listed[0].name, "late");
    assert_eq!(listed[1].saved_at, t0);
}

#[test]
fn edits_are_saved_with_their_change_record() {
    let conn = open_db();
    let p = projection();
    db::save_working_model(&conn, &p).unwrap();

    let mut edited = p;
    edited.year3.volume.restaurants += 500;
    let change =
        ChangeRecord::for_edit("volume.restaurants", Year::Year3, 4000.0, 4500.0, 1.0e7, 1.2e7);
    db::save_edit(&conn, &edited, change.as_ref()).unwrap();
    assert_eq!(db::load_working_model(&conn).unwrap(), Some(edited));
    assert_eq!(db::list_changes(&conn).unwrap().len(), 1);

    // A failed history write leaves the working model as it was
    conn.execute("DROP TABLE change_history", []).unwrap();
    let mut rejected = edited;
    rejected.year3.volume.restaurants += 500;
    assert!(db::save_edit(&conn, &rejected, change.as_ref()).is_err());
    assert_eq!(db::load_working_model(&conn).unwrap(), Some(edited));
}

#[test]
fn bundled_defaults_are_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/defaults.json");
    let defaults = import::load_defaults(&path).unwrap();
    let statements = defaults.statements().unwrap();
    assert!(statements.iter().all(|s| s.revenue.total_revenue > 0.0));
    assert!(defaults.year3.volume.aggregator_active());
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(import::find_scenario_files(&dir.path().join("absent")).is_err());
}
