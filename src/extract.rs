//! Run discovery and per-run timing extraction.
//!
//! A SPRO database carries one table per run and detection channel, named
//! `TTIMERECORDS_HEAT<run>_START` / `TTIMERECORDS_HEAT<run>_FINISH`.
//! Which runs exist is not recorded anywhere else, so the set of runs is
//! discovered by pattern-matching the catalog. Table names seen in the wild
//! vary; anything whose run number does not parse is skipped.
//!
//! Columns used: `C_NUM` (bib), `C_HOUR2` (microseconds since epoch,
//! nullable), `C_STATUS` (finish status, 0 = valid).

use std::collections::BTreeSet;
use std::fmt;

use eyre::{Context, Result};
use rusqlite::Connection;

use crate::tod::format_tod;

/// Sentinel ToD value for a bib with no valid finish timestamp.
pub const DNF: &str = "DNF";

const TABLE_PREFIX: &str = "TTIMERECORDS_HEAT";

/// Bib filter shared by both channels: positive, outside the reserved
/// 901–909 range of system/test marker bibs.
const BIB_FILTER: &str = "\"C_NUM\" > 0 AND (\"C_NUM\" < 901 OR \"C_NUM\" > 909)";

/// The two detection points of a run. `Start` orders before `Finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Channel {
    Start,
    Finish,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Start => "Start",
            Channel::Finish => "Finish",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the final report: a bib's reading on one channel of one run.
/// `tod` is either a formatted time of day or the literal `"DNF"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub bib: u32,
    pub run: u32,
    pub channel: Channel,
    pub tod: String,
}

/// Discover which runs exist by listing the timing tables in the catalog.
/// Returns the distinct run numbers in ascending order.
pub fn discover_runs(conn: &Connection) -> Result<Vec<u32>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name LIKE ?1")
        .wrap_err("Failed to query table catalog")?;

    let mut runs = BTreeSet::new();
    let names = stmt
        .query_map([format!("{TABLE_PREFIX}%")], |row| row.get::<_, String>(0))
        .wrap_err("Failed to list timing tables")?;
    for name in names {
        let name = name.wrap_err("Failed to read table name")?;
        if let Some(run) = parse_run_number(&name) {
            runs.insert(run);
        }
    }
    Ok(runs.into_iter().collect())
}

/// Parse the run number out of a table name like `TTIMERECORDS_HEAT1_START`.
/// Returns `None` for names that do not follow the convention.
fn parse_run_number(table: &str) -> Option<u32> {
    let rest = table.strip_prefix(TABLE_PREFIX)?;
    let digits = rest.split('_').next()?;
    digits.parse().ok()
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: u32 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .wrap_err_with(|| format!("Failed to check for table {name}"))?;
    Ok(count > 0)
}

/// Extract all timing records for one run, both channels.
///
/// Start rows emit a record only when a timestamp is present. Finish rows
/// always emit a record: a formatted ToD when the status is 0 and a
/// timestamp is present, `DNF` otherwise. Bibs that started but have no
/// finish row at all get a synthesized `DNF` — but only when the finish
/// table itself exists; a run with no finish table yields no finish records
/// whatsoever. A missing table on either channel is not an error.
pub fn extract_run(conn: &Connection, run: u32) -> Result<Vec<ResultRecord>> {
    let mut records = Vec::new();
    let mut start_bibs = BTreeSet::new();
    let mut finish_bibs = BTreeSet::new();

    // Table names are built from the parsed integer only; catalog strings
    // are never interpolated into SQL.
    let start_table = format!("{TABLE_PREFIX}{run}_START");
    if table_exists(conn, &start_table)? {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT \"C_NUM\", \"C_HOUR2\" FROM \"{start_table}\" \
                 WHERE {BIB_FILTER} ORDER BY \"C_NUM\""
            ))
            .wrap_err_with(|| format!("Failed to query {start_table}"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .wrap_err_with(|| format!("Failed to read {start_table}"))?;
        for row in rows {
            let (bib, micros) = row.wrap_err_with(|| format!("Bad row in {start_table}"))?;
            if let Some(micros) = micros {
                records.push(ResultRecord {
                    bib,
                    run,
                    channel: Channel::Start,
                    tod: format_tod(micros as u64),
                });
                start_bibs.insert(bib);
            }
        }
    }

    let finish_table = format!("{TABLE_PREFIX}{run}_FINISH");
    if table_exists(conn, &finish_table)? {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT \"C_NUM\", \"C_HOUR2\", \"C_STATUS\" FROM \"{finish_table}\" \
                 WHERE {BIB_FILTER} ORDER BY \"C_NUM\""
            ))
            .wrap_err_with(|| format!("Failed to query {finish_table}"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            })
            .wrap_err_with(|| format!("Failed to read {finish_table}"))?;
        for row in rows {
            let (bib, micros, status) =
                row.wrap_err_with(|| format!("Bad row in {finish_table}"))?;
            finish_bibs.insert(bib);
            // Valid only with status 0 and a timestamp; a NULL status is a
            // DNF like any non-zero one.
            let tod = match (micros, status) {
                (Some(micros), Some(0)) => format_tod(micros as u64),
                _ => DNF.to_string(),
            };
            records.push(ResultRecord {
                bib,
                run,
                channel: Channel::Finish,
                tod,
            });
        }

        // Started but never showed up at the finish line.
        for &bib in start_bibs.difference(&finish_bibs) {
            records.push(ResultRecord {
                bib,
                run,
                channel: Channel::Finish,
                tod: DNF.to_string(),
            });
        }
    }

    Ok(records)
}
