//! Integration tests for the ingestion pipeline
//!
//! Documents are plain text files, the completion provider is scripted and
//! the store is a real SQLite database in a temporary directory.

use std::path::{Path, PathBuf};
use tally_domain::RecordStore;
use tally_extractor::{Extractor, ExtractorConfig, PlainTextExtractor};
use tally_ingest::{DocumentOutcome, IngestCoordinator, Pipeline};
use tally_llm::MockProvider;
use tally_store::{load_line_items, load_orders, SqliteStore};
use tempfile::TempDir;

fn invoice_json(order_id: &str, quantities: &[u32]) -> String {
    let items: Vec<String> = quantities
        .iter()
        .enumerate()
        .map(|(i, q)| {
            format!(
                r#"{{"product_id": "P{i}", "title": "Item {i}", "quantity": {q}, "unit_price": 2.0, "line_total": {total}}}"#,
                i = i,
                q = q,
                total = *q as f64 * 2.0
            )
        })
        .collect();
    format!(
        r#"{{"order_id": "{}", "customer_name": "Jane Doe", "email": "jane@example.com", "phone": null,
            "items": [{}], "subtotal": 6.0, "vat": 0.3, "grand_total": 6.3}}"#,
        order_id,
        items.join(", ")
    )
}

fn write_document(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("INVOICE {}\n...", name)).unwrap();
    path
}

fn pipeline(
    dir: &Path,
    llm: MockProvider,
) -> Pipeline<PlainTextExtractor, MockProvider, SqliteStore> {
    let store = SqliteStore::new(dir.join("tally.db")).unwrap();
    let coordinator = IngestCoordinator::new(store).with_export_dir(dir.join("exports"));
    let extractor = Extractor::new(PlainTextExtractor, llm, ExtractorConfig::default());
    Pipeline::new(extractor, coordinator)
}

#[tokio::test]
async fn test_a100_ingests_once_then_reports_duplicate() {
    let dir = TempDir::new().unwrap();
    let llm = MockProvider::new(invoice_json("A100", &[1, 2]));
    let mut pipeline = pipeline(dir.path(), llm);
    let doc = write_document(dir.path(), "a100.txt");

    let first = pipeline.process_document(&doc).await;
    let DocumentOutcome::Ingested(summary) = &first else {
        panic!("expected Ingested, got {:?}", first);
    };
    assert_eq!(summary.total_qty, 3);
    assert_eq!(summary.line_items, 2);

    let second = pipeline.process_document(&doc).await;
    assert_eq!(
        second,
        DocumentOutcome::Duplicate {
            order_id: "A100".to_string()
        }
    );

    let store = pipeline.coordinator().store();
    assert_eq!(store.list_orders().unwrap().len(), 1);
    assert_eq!(store.list_line_items().unwrap().len(), 2);
    assert_eq!(store.get_order("A100").unwrap().unwrap().total_qty, Some(3));
}

#[tokio::test]
async fn test_malformed_completion_leaves_store_unchanged() {
    let dir = TempDir::new().unwrap();
    let llm = MockProvider::new("I'm sorry, the scan is unreadable.");
    let mut pipeline = pipeline(dir.path(), llm);
    let doc = write_document(dir.path(), "bad.txt");

    let outcome = pipeline.process_document(&doc).await;
    assert!(matches!(outcome, DocumentOutcome::Failed { .. }));

    let store = pipeline.coordinator().store();
    assert!(store.list_orders().unwrap().is_empty());
    assert!(store.list_line_items().unwrap().is_empty());
    // No commit, so no export either
    assert!(!dir.path().join("exports").exists());
}

#[tokio::test]
async fn test_batch_reports_each_document_in_order() {
    let dir = TempDir::new().unwrap();
    let llm = MockProvider::default();
    llm.push_response(invoice_json("A1", &[1]));
    llm.push_response("not json");
    llm.push_response(invoice_json("A1", &[4]));
    llm.push_response(invoice_json("A2", &[2, 2]));
    let mut pipeline = pipeline(dir.path(), llm);

    let docs: Vec<PathBuf> = ["one.txt", "two.txt", "three.txt", "four.txt"]
        .iter()
        .map(|name| write_document(dir.path(), name))
        .collect();
    let missing = dir.path().join("missing.txt");
    let mut paths = docs.clone();
    paths.insert(2, missing.clone());

    let reports = pipeline.ingest_batch(&paths).await;
    let outcomes: Vec<&DocumentOutcome> = reports.iter().map(|r| &r.outcome).collect();

    assert_eq!(reports.len(), 5);
    assert_eq!(reports[2].path, missing);
    assert!(outcomes[0].is_ingested());
    assert!(matches!(outcomes[1], DocumentOutcome::Failed { .. }));
    assert!(matches!(outcomes[2], DocumentOutcome::Failed { reason } if reason.contains("OCR")));
    assert!(matches!(outcomes[3], DocumentOutcome::Duplicate { order_id } if order_id == "A1"));
    assert!(outcomes[4].is_ingested());
}

#[tokio::test]
async fn test_export_after_n_ingestions_round_trips() {
    let dir = TempDir::new().unwrap();
    let llm = MockProvider::default();
    let ids = ["B1", "B2", "B3", "B4"];
    for id in ids {
        llm.push_response(invoice_json(id, &[1, 2]));
    }
    let mut pipeline = pipeline(dir.path(), llm);

    let mut last_export = None;
    for id in ids {
        let doc = write_document(dir.path(), &format!("{}.txt", id));
        match pipeline.process_document(&doc).await {
            DocumentOutcome::Ingested(summary) => last_export = summary.export,
            other => panic!("expected Ingested, got {:?}", other),
        }
    }

    let export = last_export.unwrap();
    let orders = load_orders(&export.orders_path).unwrap();
    let line_items = load_line_items(&export.line_items_path).unwrap();

    assert_eq!(orders, pipeline.coordinator().store().list_orders().unwrap());
    assert_eq!(orders.len(), ids.len());
    assert!(orders.iter().all(|o| o.total_qty == Some(3) && o.grand_total == Some(6.3)));
    assert_eq!(line_items.len(), ids.len() * 2);
}
