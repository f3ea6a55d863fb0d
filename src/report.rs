//! Report assembly: aggregate every run, sort, render CSV.

use std::collections::BTreeSet;
use std::io::{BufWriter, Write};

use eyre::{Context, Result};
use rusqlite::Connection;

use crate::extract::{self, ResultRecord};

/// Counts shown to the operator before the report is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    /// Distinct bibs appearing in the report.
    pub bibs: usize,
    /// Runs discovered in the database (a run with empty tables still counts).
    pub runs: usize,
}

/// Discover all runs and extract their records, sorted ready for rendering:
/// by bib, then run, then channel, with Start before Finish.
pub fn collect_records(conn: &Connection) -> Result<(Vec<ResultRecord>, ReportSummary)> {
    let runs = extract::discover_runs(conn)?;

    let mut records = Vec::new();
    for &run in &runs {
        records.extend(extract::extract_run(conn, run)?);
    }

    let bibs: BTreeSet<u32> = records.iter().map(|r| r.bib).collect();
    let summary = ReportSummary {
        bibs: bibs.len(),
        runs: runs.len(),
    };

    records.sort_by_key(|r| (r.bib, r.run, r.channel));
    Ok((records, summary))
}

/// Write the report as CSV. No field can contain a delimiter or quote, so
/// rows are rendered directly.
pub fn write_csv<W: Write>(out: W, records: &[ResultRecord]) -> Result<()> {
    let mut w = BufWriter::new(out);
    writeln!(w, "Bib,Run,Channel,ToD").wrap_err("Failed to write CSV header")?;
    for r in records {
        writeln!(w, "{},{},{},{}", r.bib, r.run, r.channel, r.tod)
            .wrap_err("Failed to write CSV row")?;
    }
    w.flush().wrap_err("Failed to flush CSV output")?;
    Ok(())
}
