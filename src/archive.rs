//! SPRO archive loading.
//!
//! A `.spro` file is a plain ZIP container; the timing database is the
//! member named `File2`, a SQLite file. The archive is unpacked into a
//! uniquely-named temporary directory that lives exactly as long as the
//! open database handle and is removed on drop, on every path.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use eyre::{Context, Result, eyre};
use rusqlite::{Connection, OpenFlags};
use tempfile::TempDir;
use zip::ZipArchive;

/// Name of the SQLite member inside the archive.
const DB_MEMBER: &str = "File2";

/// An opened SPRO archive: the extracted tree plus a read-only connection
/// to the embedded timing database.
#[derive(Debug)]
pub struct SproArchive {
    // Field order matters: the connection must close before the directory
    // holding the database file is removed.
    conn: Connection,
    _tempdir: TempDir,
}

impl SproArchive {
    /// Unpack the archive at `path` and open its embedded database.
    ///
    /// Fails if the file is not a readable ZIP or if it lacks the `File2`
    /// member; the temporary directory is cleaned up on every failure.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .wrap_err_with(|| format!("Failed to open archive: {}", path.display()))?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .wrap_err_with(|| format!("Not a valid SPRO archive: {}", path.display()))?;

        let tempdir = tempfile::Builder::new()
            .prefix("spro2tod-")
            .tempdir()
            .wrap_err("Failed to create temporary directory")?;
        zip.extract(tempdir.path())
            .wrap_err_with(|| format!("Failed to extract archive: {}", path.display()))?;

        let db_path = tempdir.path().join(DB_MEMBER);
        if !db_path.exists() {
            return Err(eyre!(
                "Database file '{DB_MEMBER}' not found in {}",
                path.display()
            ));
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .wrap_err_with(|| format!("Failed to open timing database in {}", path.display()))?;

        Ok(Self {
            conn,
            _tempdir: tempdir,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
