mod common;

use common::{RecordingExecutor, product_builder};
use csv_staging::{
    DumpExecutor, ErrorKind, ExecutionError, Importer, OperationTag, Outcome, Params, Row,
};
use serde_json::{Value, json};

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object row, got {other}"),
    }
}

#[test]
fn full_workflow_runs_statements_in_call_order() {
    let mut importer = Importer::new(product_builder(), RecordingExecutor::default());
    importer.create().unwrap();
    importer.import("/var/import/products.csv").unwrap();
    assert!(importer.validate_all_fields().unwrap().is_valid());
    importer.validate_duplicate(&["productCode"]).unwrap();
    importer
        .validate_foreign_key("categoryId", "categoryId", "Category", None)
        .unwrap();
    importer.assign_sequence("productId", 1000, None).unwrap();
    importer
        .assign_prefixed_sequence("productCode", "apn", "00000", 0, None)
        .unwrap();
    importer.update_existing(&[]).unwrap();
    importer
        .insert_new(&[("createdBy".to_string(), json!("import"))])
        .unwrap();

    let (_, executor) = importer.into_parts();
    let tags = executor
        .statements
        .iter()
        .map(|recorded| recorded.tag.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        tags,
        vec![
            "create:drop",
            "create",
            "import",
            "validateAllFields",
            "validateDuplicatedId",
            "validateNonExistForeignKey",
            "updateFieldNumberByAutoCount",
            "updateFieldNumberByAutoCountWithPrefix",
            "updateExistingRecords",
            "insertNonExistingRecords",
        ]
    );

    let first = &executor.statements[0];
    assert_eq!(first.sql, "DROP TABLE IF EXISTS tempCsvData");
    assert!(first.params.is_none());

    let insert = executor.statements.last().unwrap();
    let mut expected = Params::new();
    expected.insert("createdBy".to_string(), json!("import"));
    assert_eq!(insert.params.as_ref(), Some(&expected));
    assert!(insert.sql.contains(":createdBy"));
}

#[test]
fn validation_rows_become_a_report() {
    let mut executor = RecordingExecutor::default();
    executor.rows = vec![
        row(json!({
            "id": 2,
            "productId_maxlength": 0,
            "productName_required": 1,
            "price_notinteger": "1",
        })),
        row(json!({ "id": 3, "productName_required": 0 })),
        row(json!({ "id": 7, "productCode_alphanumeric": true })),
    ];
    let mut importer = Importer::new(product_builder(), executor);
    let report = importer.validate_all_fields().unwrap();

    assert!(!report.is_valid());
    assert_eq!(report.failures().len(), 2);
    assert_eq!(report.error_count(), 3);

    let first = &report.failures()[0];
    assert_eq!(first.record_id, json!(2));
    let kinds = first
        .errors
        .iter()
        .map(|error| (error.column.as_str(), error.kind))
        .collect::<Vec<_>>();
    // Schema order, although `price_*` sorts before `productName_*`.
    assert_eq!(
        kinds,
        vec![
            ("productName", ErrorKind::Required),
            ("price", ErrorKind::NotInteger),
        ]
    );

    let counts = report.counts();
    assert_eq!(counts.get("productCode_alphanumeric"), Some(&1));
    assert_eq!(counts.get("productId_maxlength"), None);
}

#[test]
fn execution_failures_surface_and_stop_the_call() {
    let executor = RecordingExecutor {
        fail_on: Some(OperationTag::DropStaging),
        ..RecordingExecutor::default()
    };
    let mut importer = Importer::new(product_builder(), executor);
    let err = importer.create().unwrap_err();
    assert!(!err.is_config());
    assert!(!err.is_schema());
    assert!(err.to_string().contains("simulated failure in create:drop"));

    // The create statement is never attempted after the drop fails.
    assert_eq!(importer.executor_mut().statements.len(), 1);
}

#[test]
fn configuration_errors_do_not_reach_the_executor() {
    let mut importer = Importer::new(product_builder(), RecordingExecutor::default());
    importer.builder_mut().config_mut().target_table = None;
    assert!(importer.update_existing(&[]).unwrap_err().is_config());
    assert!(importer.import("   ").unwrap_err().is_config());
    assert!(importer.executor_mut().statements.is_empty());
}

#[test]
fn closures_act_as_executors() {
    let mut seen = Vec::new();
    {
        let executor = |sql: &str, _params: Option<&Params>, tag: OperationTag| {
            seen.push(format!("{tag}: {}", sql.lines().next().unwrap_or_default()));
            Ok::<_, ExecutionError>(Outcome::Affected(4))
        };
        let mut importer = Importer::new(product_builder(), executor);
        let outcome = importer.import("products.csv").unwrap();
        assert_eq!(outcome.affected(), 4);
    }
    assert_eq!(
        seen,
        vec!["import: LOAD DATA LOCAL INFILE 'products.csv'".to_string()]
    );
}

#[test]
fn dump_executor_collects_a_replayable_script() {
    let mut importer = Importer::new(product_builder(), DumpExecutor::new(Vec::<u8>::new()));
    importer.create().unwrap();
    importer
        .update_existing(&[("categoryId".to_string(), json!(3))])
        .unwrap();
    let (_, dump) = importer.into_parts();
    let script = String::from_utf8(dump.into_inner()).unwrap();

    assert!(script.starts_with("-- create:drop\nDROP TABLE IF EXISTS tempCsvData;\n\n-- create\n"));
    assert!(script.contains("-- updateExistingRecords\n-- :categoryId = 3\nUPDATE\n"));
}
