//! End-to-end tests over real ZIP+SQLite archives built on the fly.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use rusqlite::Connection;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use spro2tod::archive::SproArchive;
use spro2tod::report;

/// Build a SQLite database with `setup`, then wrap it in a ZIP archive at
/// `archive_path` under the member name `member`.
fn build_archive(archive_path: &Path, member: &str, setup: impl FnOnce(&Connection)) {
    let dir = archive_path.parent().unwrap();
    let db_path = dir.join("timing.db");
    {
        let conn = Connection::open(&db_path).unwrap();
        setup(&conn);
    }
    let db_bytes = fs::read(&db_path).unwrap();

    let mut zip = ZipWriter::new(File::create(archive_path).unwrap());
    zip.start_file(member, SimpleFileOptions::default()).unwrap();
    zip.write_all(&db_bytes).unwrap();
    zip.finish().unwrap();
}

fn convert(archive_path: &Path) -> String {
    let archive = SproArchive::open(archive_path).unwrap();
    let (records, _) = report::collect_records(archive.connection()).unwrap();
    let mut out = Vec::new();
    report::write_csv(&mut out, &records).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn start_only_archive_yields_one_row_and_no_finish() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("race.spro");
    build_archive(&archive_path, "File2", |conn| {
        conn.execute_batch(
            "CREATE TABLE TTIMERECORDS_HEAT1_START (C_NUM INTEGER, C_HOUR2 INTEGER);
             INSERT INTO TTIMERECORDS_HEAT1_START VALUES (101, 36000000000);",
        )
        .unwrap();
    });

    assert_eq!(
        convert(&archive_path),
        "Bib,Run,Channel,ToD\n101,1,Start,10h00:00.0000\n"
    );
}

#[test]
fn full_report_across_runs_and_channels() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("race.spro");
    build_archive(&archive_path, "File2", |conn| {
        conn.execute_batch(
            "CREATE TABLE TTIMERECORDS_HEAT1_START (C_NUM INTEGER, C_HOUR2 INTEGER);
             CREATE TABLE TTIMERECORDS_HEAT1_FINISH (C_NUM INTEGER, C_HOUR2 INTEGER, C_STATUS INTEGER);
             CREATE TABLE TTIMERECORDS_HEAT2_START (C_NUM INTEGER, C_HOUR2 INTEGER);
             -- bib 12: clean run
             INSERT INTO TTIMERECORDS_HEAT1_START VALUES (12, 36627318000);
             INSERT INTO TTIMERECORDS_HEAT1_FINISH VALUES (12, 36687318000, 0);
             -- bib 15: started, never finished
             INSERT INTO TTIMERECORDS_HEAT1_START VALUES (15, 36630000000);
             -- bib 20: finish row flagged invalid
             INSERT INTO TTIMERECORDS_HEAT1_FINISH VALUES (20, 36700000000, 2);
             -- reserved marker bib, excluded everywhere
             INSERT INTO TTIMERECORDS_HEAT1_START VALUES (905, 36600000000);
             -- second run, start only
             INSERT INTO TTIMERECORDS_HEAT2_START VALUES (12, 72000000000);",
        )
        .unwrap();
    });

    assert_eq!(
        convert(&archive_path),
        "Bib,Run,Channel,ToD\n\
         12,1,Start,10h10:27.3180\n\
         12,1,Finish,10h11:27.3180\n\
         12,2,Start,20h00:00.0000\n\
         15,1,Start,10h10:30.0000\n\
         15,1,Finish,DNF\n\
         20,1,Finish,DNF\n"
    );
}

#[test]
fn conversion_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("race.spro");
    build_archive(&archive_path, "File2", |conn| {
        conn.execute_batch(
            "CREATE TABLE TTIMERECORDS_HEAT1_START (C_NUM INTEGER, C_HOUR2 INTEGER);
             CREATE TABLE TTIMERECORDS_HEAT1_FINISH (C_NUM INTEGER, C_HOUR2 INTEGER, C_STATUS INTEGER);
             INSERT INTO TTIMERECORDS_HEAT1_START VALUES (7, 30000000000);
             INSERT INTO TTIMERECORDS_HEAT1_FINISH VALUES (7, 30090000000, 0);",
        )
        .unwrap();
    });

    assert_eq!(convert(&archive_path), convert(&archive_path));
}

#[test]
fn archive_without_database_member_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("race.spro");
    build_archive(&archive_path, "File1", |conn| {
        conn.execute_batch("CREATE TABLE TTIMERECORDS_HEAT1_START (C_NUM INTEGER, C_HOUR2 INTEGER)")
            .unwrap();
    });

    let err = SproArchive::open(&archive_path).unwrap_err();
    assert!(err.to_string().contains("File2"), "got: {err}");
}

#[test]
fn non_zip_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("race.spro");
    fs::write(&archive_path, b"not a zip file").unwrap();

    assert!(SproArchive::open(&archive_path).is_err());
}
