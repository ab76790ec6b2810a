mod common;

use assert_cmd::Command;
use common::{PRODUCT_PROFILE, TestWorkspace};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn csv_staging() -> Command {
    Command::cargo_bin("csv-staging").expect("binary exists")
}

fn product_profile(workspace: &TestWorkspace) -> String {
    workspace
        .write("product.yaml", PRODUCT_PROFILE)
        .to_str()
        .expect("utf-8 path")
        .to_string()
}

#[test]
fn render_create_prints_tagged_statement() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args(["render", "-p", &profile, "create"])
        .assert()
        .success()
        .stdout(contains("-- create\nCREATE TABLE tempCsvData\n"))
        .stdout(contains("`productName` VARCHAR(41) DEFAULT ''"))
        .stdout(contains(") ENGINE=MyISAM DEFAULT CHARSET=utf8;\n"));
}

#[test]
fn render_honours_table_overrides() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args([
            "render",
            "-p",
            &profile,
            "--staging-table",
            "stagedProducts",
            "--target-table",
            "ProductArchive",
            "insert",
            "--set",
            "categoryId=3",
            "--set",
            "updatedBy=nightly",
        ])
        .assert()
        .success()
        .stdout(contains("-- :categoryId = 3\n-- :updatedBy = \"nightly\"\n"))
        .stdout(contains("INSERT INTO ProductArchive\n"))
        .stdout(contains("FROM stagedProducts t2\n"));
}

#[test]
fn render_duplicates_accepts_comma_separated_columns() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args(["render", "-p", &profile, "duplicates", "productCode,categoryId"])
        .assert()
        .success()
        .stdout(contains("-- validateDuplicatedId\n"))
        .stdout(contains("GROUP BY productCode, categoryId"));
}

#[test]
fn render_prefixed_sequence_pads_to_mask() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args([
            "render",
            "-p",
            &profile,
            "prefixed-sequence",
            "productCode",
            "--prefix",
            "apn",
            "--mask",
            "00000",
        ])
        .assert()
        .success()
        .stdout(contains("LPAD("))
        .stdout(contains("'apn'"));
}

#[test]
fn script_renders_workflow_in_order() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    let output = csv_staging()
        .args([
            "script",
            "-p",
            &profile,
            "-i",
            "/var/import/products.csv",
            "--unique",
            "productCode",
            "--merge",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let script = String::from_utf8(output).expect("utf-8 script");
    let tags = script
        .lines()
        .filter(|line| line.starts_with("-- ") && !line.starts_with("-- :"))
        .collect::<Vec<_>>();
    assert_eq!(
        tags,
        vec![
            "-- create:drop",
            "-- create",
            "-- import",
            "-- validateAllFields",
            "-- validateDuplicatedId",
            "-- updateExistingRecords",
            "-- insertNonExistingRecords",
        ]
    );
    assert!(script.contains("LOAD DATA LOCAL INFILE '/var/import/products.csv'\n"));
}

#[test]
fn columns_lists_profile_rules() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args(["columns", "-p", &profile])
        .assert()
        .success()
        .stdout(contains("#  name"))
        .stdout(contains("productCode").and(contains("alphanumeric")))
        .stdout(contains("deleteFlag BETWEEN '0' AND '1'"));
}

#[test]
fn unknown_column_reports_schema_error() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args(["render", "-p", &profile, "duplicates", "sku"])
        .assert()
        .failure()
        .stderr(contains("error: schema error"))
        .stderr(contains("sku"));
}

#[test]
fn missing_profile_fails_with_context() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("absent.yaml");
    csv_staging()
        .args(["render", "-p", missing.to_str().unwrap(), "drop"])
        .assert()
        .failure()
        .stderr(contains("Loading profile from"));
}

#[test]
fn malformed_override_is_rejected_by_argument_parsing() {
    let workspace = TestWorkspace::new();
    let profile = product_profile(&workspace);
    csv_staging()
        .args(["render", "-p", &profile, "update", "--set", "categoryId"])
        .assert()
        .failure()
        .stderr(contains("name=value"));
}
