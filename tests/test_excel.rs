mod common;

use axum::http::header;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

async fn download(server: &axum_test::TestServer, kind: &str) -> (String, Vec<u8>) {
    let response = server.get("/api/excel/download").add_query_param("type", kind).await;
    assert_eq!(response.header(header::CONTENT_TYPE), XLSX);
    let disposition = response
        .header(header::CONTENT_DISPOSITION)
        .to_str()
        .unwrap()
        .to_string();
    (disposition, response.as_bytes().to_vec())
}

fn workbook_form(bytes: Vec<u8>, name: &str) -> MultipartForm {
    MultipartForm::new().add_part("excel", Part::bytes(bytes).file_name(name).mime_type(XLSX))
}

#[tokio::test]
async fn download_names_each_sample() {
    let env = common::TestEnv::start();
    let server = env.server();

    let cases = [
        ("sales", "Sales_Report_Q1_2024.xlsx"),
        ("inventory", "Inventory_Management.xlsx"),
        ("financial", "Financial_Report_2024.xlsx"),
        ("something-else", "Sample_Data.xlsx"),
    ];
    for (kind, file_name) in cases {
        let (disposition, bytes) = download(&server, kind).await;
        assert_eq!(disposition, format!("attachment; filename=\"{file_name}\""));
        assert_eq!(&bytes[..2], b"PK", "{kind} should be a zip container");
    }
}

#[tokio::test]
async fn download_then_parse_then_analyze() {
    let env = common::TestEnv::start();
    let server = env.server();

    let (_, bytes) = download(&server, "inventory").await;

    let workbook: serde_json::Value = server
        .post("/api/excel/parse")
        .multipart(workbook_form(bytes.clone(), "Inventory_Management.xlsx"))
        .await
        .json();

    assert_eq!(workbook["name"], "Inventory_Management.xlsx");
    assert_eq!(workbook["fileSize"], bytes.len());
    let sheets = workbook["sheets"].as_array().unwrap();
    let names: Vec<&str> = sheets.iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Inventory", "Analysis"]);
    assert_eq!(sheets[0]["headers"][0], "Product ID");
    assert_eq!(sheets[0]["hasFormulas"], true);

    let total_formulas: usize = sheets
        .iter()
        .map(|s| s["formulaCells"].as_array().unwrap().len())
        .sum();

    let analysis: serde_json::Value = server
        .post("/api/excel/analyze")
        .json(&json!({ "workbookId": workbook["id"], "workbook": workbook }))
        .await
        .json();

    assert_eq!(analysis["summary"]["totalSheets"], 2);
    assert_eq!(analysis["summary"]["totalFormulas"], total_formulas);
    assert!(!analysis["recommendations"].as_array().unwrap().is_empty());
    assert!(analysis["suggestedFormulas"].as_array().unwrap().len() <= 8);
    assert!(analysis["dataQualityIssues"].as_array().unwrap().len() <= 8);
    assert!(!analysis["suggestedPowerQueries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analyze_without_workbook_uses_placeholder_summary() {
    let env = common::TestEnv::start();
    let server = env.server();

    let analysis: serde_json::Value = server
        .post("/api/excel/analyze")
        .json(&json!({ "workbookId": "workbook_1" }))
        .await
        .json();

    assert_eq!(analysis["summary"]["totalSheets"], 3);
    assert_eq!(analysis["summary"]["totalRows"], 1250);
    assert_eq!(analysis["summary"]["automationPotential"], "high");
}

#[tokio::test]
async fn analyze_requires_workbook_id() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server.post("/api/excel/analyze").json(&json!({})).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Workbook ID is required");
}

#[tokio::test]
async fn parse_rejects_non_workbook() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server
        .post("/api/excel/parse")
        .multipart(workbook_form(b"not a spreadsheet".to_vec(), "broken.xlsx"))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse Excel file"));
}

#[tokio::test]
async fn parse_requires_excel_field() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"PK".to_vec()).file_name("x.xlsx").mime_type(XLSX),
    );
    let response = server.post("/api/excel/parse").multipart(form).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "No Excel file uploaded");
}

#[tokio::test]
async fn parse_rejects_oversized_grid() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook
        .add_worksheet()
        .write_string(20_000, 200, "corner")
        .unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let response = server
        .post("/api/excel/parse")
        .multipart(workbook_form(bytes, "sparse.xlsx"))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("limited to 1000000 cells"));
}
