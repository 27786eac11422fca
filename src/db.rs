//! Database schema and operations
//!
//! Holds the working model being edited, saved scenarios, and the change
//! history. Assumption bundles are stored as JSON payloads.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::history::{ChangeRecord, NetIncomeImpact};
use crate::projection::{Projection, Year};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- The projection currently being edited (single row)
        CREATE TABLE IF NOT EXISTS working_model (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Named snapshots; a name may be saved more than once
        CREATE TABLE IF NOT EXISTS scenarios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            saved_at TEXT NOT NULL,
            payload TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS change_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recorded_at TEXT NOT NULL,
            variable TEXT NOT NULL,
            year INTEGER NOT NULL,
            old_value REAL NOT NULL,
            new_value REAL NOT NULL,
            impact_abs REAL NOT NULL,
            impact_pct REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_scenarios_name ON scenarios(name);
        "#,
    )?;
    Ok(())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Local>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Bad timestamp '{}' in database", raw))?
        .with_timezone(&Local))
}

/// Timestamps are stored as fixed-width UTC RFC 3339 text so they sort by instant
fn stored_timestamp(ts: DateTime<Local>) -> String {
    ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_projection(payload: &str) -> Result<Projection> {
    serde_json::from_str(payload).context("Stored assumptions are not a valid projection")
}

/// Replace the working model
pub fn save_working_model(conn: &Connection, projection: &Projection) -> Result<()> {
    let payload = serde_json::to_string(projection)?;
    conn.execute(
        "INSERT OR REPLACE INTO working_model (id, payload, updated_at) VALUES (1, ?1, ?2)",
        (&payload, stored_timestamp(Local::now())),
    )?;
    debug!("Saved working model ({} bytes)", payload.len());
    Ok(())
}

pub fn load_working_model(conn: &Connection) -> Result<Option<Projection>> {
    let payload: Option<String> = conn
        .query_row("SELECT payload FROM working_model WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    payload.as_deref().map(decode_projection).transpose()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub id: i64,
    pub name: String,
    pub saved_at: DateTime<Local>,
}

/// Store a named snapshot and return its row id
pub fn save_scenario(
    conn: &Connection,
    name: &str,
    saved_at: DateTime<Local>,
    projection: &Projection,
) -> Result<i64> {
    let payload = serde_json::to_string(projection)?;
    conn.execute(
        "INSERT INTO scenarios (name, saved_at, payload) VALUES (?1, ?2, ?3)",
        (name, stored_timestamp(saved_at), &payload),
    )?;
    let id = conn.last_insert_rowid();
    debug!("Saved scenario '{}' as #{}", name, id);
    Ok(id)
}

/// Whether a snapshot with this name and save time is already stored
pub fn scenario_exists(conn: &Connection, name: &str, saved_at: DateTime<Local>) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM scenarios WHERE name = ?1 AND saved_at = ?2)",
        (name, stored_timestamp(saved_at)),
        |row| row.get(0),
    )?)
}

/// List saved scenarios, newest first
pub fn list_scenarios(conn: &Connection) -> Result<Vec<ScenarioSummary>> {
    let mut stmt =
        conn.prepare("SELECT id, name, saved_at FROM scenarios ORDER BY saved_at DESC, id DESC")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, name, saved_at) = row?;
        results.push(ScenarioSummary {
            id,
            name,
            saved_at: parse_timestamp(&saved_at)?,
        });
    }
    Ok(results)
}

/// Fetch the most recent snapshot saved under `name`
pub fn load_scenario(conn: &Connection, name: &str) -> Result<Option<Projection>> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM scenarios WHERE name = ?1 ORDER BY saved_at DESC, id DESC LIMIT 1",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    payload.as_deref().map(decode_projection).transpose()
}

/// Make a saved scenario the working model. Change history starts over.
pub fn activate_scenario(conn: &Connection, name: &str) -> Result<Projection> {
    let projection =
        load_scenario(conn, name)?.ok_or_else(|| anyhow!("Scenario '{}' not found", name))?;

    let tx = conn.unchecked_transaction()?;
    save_working_model(&tx, &projection)?;
    clear_changes(&tx)?;
    tx.commit()?;

    Ok(projection)
}

/// Delete every snapshot saved under `name`, returning how many were removed
pub fn delete_scenario(conn: &Connection, name: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM scenarios WHERE name = ?1", [name])?)
}

/// Save an edited working model and log the edit in one transaction
pub fn save_edit(
    conn: &Connection,
    projection: &Projection,
    change: Option<&ChangeRecord>,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    save_working_model(&tx, projection)?;
    if let Some(change) = change {
        record_change(&tx, change)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn record_change(conn: &Connection, change: &ChangeRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO change_history
             (recorded_at, variable, year, old_value, new_value, impact_abs, impact_pct)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            stored_timestamp(change.recorded_at),
            &change.variable,
            change.year.number(),
            change.old_value,
            change.new_value,
            change.impact.impact_abs,
            change.impact.impact_pct,
        ),
    )?;
    Ok(())
}

/// All recorded changes, oldest first
pub fn list_changes(conn: &Connection) -> Result<Vec<ChangeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT recorded_at, variable, year, old_value, new_value, impact_abs, impact_pct
         FROM change_history ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u8>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, f64>(4)?,
            row.get::<_, f64>(5)?,
            row.get::<_, f64>(6)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (recorded_at, variable, year, old_value, new_value, impact_abs, impact_pct) = row?;
        results.push(ChangeRecord {
            recorded_at: parse_timestamp(&recorded_at)?,
            variable,
            year: Year::from_number(year)
                .ok_or_else(|| anyhow!("Bad year {} in change history", year))?,
            old_value,
            new_value,
            impact: NetIncomeImpact {
                impact_abs,
                impact_pct,
            },
        });
    }
    Ok(results)
}

pub fn clear_changes(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM change_history", [])?;
    Ok(())
}
