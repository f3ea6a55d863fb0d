//! # spro2tod
//!
//! A CLI tool that extracts Time of Day (ToD) readings from Vola SPRO
//! race-timing archives into a flat CSV report.
//!
//! ## What it does
//!
//! A `.spro` file is a ZIP archive whose `File2` member is a SQLite
//! database written by the timing application. Runs ("heats") live in
//! per-run, per-channel tables named `TTIMERECORDS_HEAT<N>_START` and
//! `TTIMERECORDS_HEAT<N>_FINISH`. This tool discovers every run present,
//! reads both channels for every competitor bib, and writes one CSV with
//! the columns `Bib,Run,Channel,ToD` — where `ToD` is either a formatted
//! UTC time of day like `10h17:07.3180` or the literal `DNF`.
//!
//! The database is opened **read-only** — the archive is never modified.
//!
//! ## Usage
//!
//! ```sh
//! # Explicit input and output
//! spro2tod race.spro race-tod.csv
//!
//! # Output defaults to race-tod.csv; prompts before overwriting
//! spro2tod race.spro
//!
//! # No arguments: prompts for both paths
//! spro2tod
//! ```
//!
//! ## Compatibility
//!
//! Tracks the (undocumented) SPRO database layout. Table name variants
//! whose run number does not parse are skipped rather than rejected, so
//! archives from newer timer firmware degrade gracefully.

pub mod archive;
pub mod extract;
pub mod report;
pub mod tod;
