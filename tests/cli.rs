mod common;

use assert_cmd::Command;
use common::{TestWorkspace, dump_table};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn bin() -> Command {
    Command::cargo_bin("sheet-merge").expect("binary exists")
}

#[test]
fn preview_renders_the_sheet_as_a_table() {
    let ws = TestWorkspace::new();
    let csv = ws.write(
        "input.csv",
        "RecordNo,CompanyName\nR1,Acme\nR2,Beta\n",
    );

    bin()
        .args(["preview", "-i", csv.to_str().unwrap(), "--rows", "1"])
        .assert()
        .success()
        .stdout(contains("RecordNo").and(contains("Acme")).and(contains("Beta").not()));
}

#[test]
fn map_shows_match_provenance_per_header() {
    let ws = TestWorkspace::new();
    let csv = ws.write(
        "input.csv",
        "pid,CompanyName,mystery_header\nR1,Acme,x\n",
    );
    let db = ws.create_db(
        "app.db",
        "CREATE TABLE Projects (RecordNo TEXT, CompanyName TEXT);",
    );

    bin()
        .args([
            "map",
            "-i",
            csv.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "--table",
            "Projects",
        ])
        .assert()
        .success()
        .stdout(
            contains("alias")
                .and(contains("fuzzy"))
                .and(contains("unmatched"))
                .and(contains("RecordNo")),
        );
}

#[test]
fn import_json_reports_counts_and_writes_rows() {
    let ws = TestWorkspace::new();
    let csv = ws.write(
        "input.csv",
        "RecordNo,CompanyName,Status\nR1,Acme,Active\nR2,Beta,\n",
    );
    let db = ws.create_db(
        "app.db",
        "CREATE TABLE Projects (RecordNo TEXT, CompanyName TEXT, Status INTEGER);",
    );

    let output = bin()
        .args([
            "import",
            "-i",
            csv.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "--table",
            "Projects",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["success"], serde_json::json!(true));
    assert_eq!(report["inserted"], serde_json::json!(2));
    assert_eq!(report["rows_written"], serde_json::json!(2));

    let rows = dump_table(&db, "Projects");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["R2".to_string(), "Beta".to_string(), "2".to_string()]);
}

#[test]
fn second_identical_import_writes_nothing() {
    let ws = TestWorkspace::new();
    let csv = ws.write(
        "input.csv",
        "RecordNo,CompanyName\nR1,Acme\n",
    );
    let db = ws.create_db(
        "app.db",
        "CREATE TABLE Projects (RecordNo TEXT, CompanyName TEXT);",
    );
    let args = [
        "import",
        "-i",
        csv.to_str().unwrap(),
        "--db",
        db.to_str().unwrap(),
        "--table",
        "Projects",
        "--json",
    ];

    bin().args(args).assert().success();
    let output = bin()
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["unchanged"], serde_json::json!(1));
    assert_eq!(report["rows_written"], serde_json::json!(0));
    assert_eq!(dump_table(&db, "Projects").len(), 1);
}

#[test]
fn import_against_a_missing_table_exits_nonzero() {
    let ws = TestWorkspace::new();
    let csv = ws.write("input.csv", "RecordNo\nR1\n");
    let db = ws.create_db("app.db", "CREATE TABLE Projects (RecordNo TEXT);");

    bin()
        .args([
            "import",
            "-i",
            csv.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "--table",
            "Nonexistent",
        ])
        .assert()
        .failure()
        .stderr(contains("import failed"));
}

#[test]
fn alias_file_flag_redirects_a_header_without_code_changes() {
    let ws = TestWorkspace::new();
    let csv = ws.write("input.csv", "exporter_name_v9,pid\nAcme,R1\n");
    let aliases = ws.write("aliases.yml", "exporter_name_v9: CompanyName\n");
    let db = ws.create_db(
        "app.db",
        "CREATE TABLE Projects (RecordNo TEXT, CompanyName TEXT);",
    );

    bin()
        .args([
            "import",
            "-i",
            csv.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "--table",
            "Projects",
            "--aliases",
            aliases.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(
        dump_table(&db, "Projects"),
        vec![vec!["R1".to_string(), "Acme".to_string()]]
    );
}

#[test]
fn tsv_extension_switches_the_delimiter() {
    let ws = TestWorkspace::new();
    let tsv = ws.write("input.tsv", "RecordNo\tCompanyName\nR1\tAcme\n");
    let db = ws.create_db(
        "app.db",
        "CREATE TABLE Projects (RecordNo TEXT, CompanyName TEXT);",
    );

    bin()
        .args([
            "import",
            "-i",
            tsv.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "--table",
            "Projects",
        ])
        .assert()
        .success();

    assert_eq!(
        dump_table(&db, "Projects"),
        vec![vec!["R1".to_string(), "Acme".to_string()]]
    );
}
