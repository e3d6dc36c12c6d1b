mod common;

use std::sync::Arc;

use common::{EngineNotifier, FaultyStore, config, fields, find};
use leadflow_core::{FieldValue, Fields, RecordId};
use leadflow_operations::OperationError;
use leadflow_operations::operations::{FeesInvoiceInput, FeesInvoiceOperation, FeesInvoiceOutcome};
use leadflow_operations::providers::{MemoryRecordStore, StoreAdminNotifier};
use leadflow_operations::traits::RecordStore;

const PACKAGE_ID: &str = "recPackage01";
const INVOICE_URL: &str = "https://files.example/invoices/PKG-0100-fees.pdf";

fn completed_package() -> Fields {
    fields(&[
        ("Package ID", FieldValue::text("PKG-0100")),
        ("Package Status", FieldValue::select("Completed")),
        ("Student Name", FieldValue::text("Amy Chan")),
        ("Tutor Name", FieldValue::text("Sam Lee")),
        ("Accrued Late Cancellation Fees", FieldValue::Number(250.0)),
        ("Total Additional Fees Invoice Amount", FieldValue::Number(250.0)),
        ("Student/Parent Xero Contact ID", FieldValue::text("XC-3003")),
        ("Subject(s)", FieldValue::MultiSelect(vec!["Chemistry".to_string()])),
    ])
}

fn admin_for<S: RecordStore>(store: &Arc<S>) -> Arc<StoreAdminNotifier<S>> {
    Arc::new(StoreAdminNotifier::new(
        Arc::clone(store),
        Arc::new(config().schema().clone()),
        None,
    ))
}

fn input() -> FeesInvoiceInput {
    FeesInvoiceInput {
        package_id: RecordId::new(PACKAGE_ID),
    }
}

#[tokio::test(start_paused = true)]
async fn engine_attached_invoice_is_recorded_on_package() {
    let store = Arc::new(MemoryRecordStore::new().with_record(
        "Tutoring Packages",
        PACKAGE_ID,
        completed_package(),
    ));
    let engine = Arc::new(EngineNotifier::new(Arc::clone(&store)).attaching_invoice(INVOICE_URL));

    let outcome = FeesInvoiceOperation::new(
        Arc::clone(&store),
        Arc::clone(&engine),
        admin_for(&store),
        &config(),
    )
    .execute(&input())
    .await
    .expect("invoice created");

    let FeesInvoiceOutcome::Created(output) = outcome else {
        panic!("package was skipped");
    };
    assert_eq!(output.invoice_pdf_url, INVOICE_URL);
    assert_eq!(engine.calls(), 1);
    assert_eq!(engine.payloads()[0]["invoiceData"]["subject"], "Chemistry");

    let payment = find(store.records("Payments"), output.payment_record_id.as_str());
    assert_eq!(payment.select("Payment Type"), Some("Additional Fees Invoice"));
    assert_eq!(payment.links("Tutoring Package"), &[RecordId::new(PACKAGE_ID)]);

    let package = find(store.records("Tutoring Packages"), PACKAGE_ID);
    assert!(matches!(
        package.get("Additional Fees Invoice Created At"),
        Some(FieldValue::DateTime(_))
    ));

    let notification_id = output.notification_id.expect("notification written");
    let notification = find(store.records("Admin Notifications"), notification_id.as_str());
    assert_eq!(
        notification.text("Title"),
        Some("✅ Additional Fees Invoice Created - PKG-0100")
    );
    assert!(
        notification
            .text("Details")
            .expect("details")
            .contains("Late Cancellation Fees: 250")
    );
}

#[tokio::test(start_paused = true)]
async fn failed_stamp_removes_payment_record() {
    let inner = Arc::new(MemoryRecordStore::new().with_record(
        "Tutoring Packages",
        PACKAGE_ID,
        completed_package(),
    ));
    // Write 1 creates the payment; write 2 stamps the package.
    let store = Arc::new(FaultyStore::new(Arc::clone(&inner)).failing_write(2));
    let engine = Arc::new(EngineNotifier::new(Arc::clone(&inner)).attaching_invoice(INVOICE_URL));

    let err = FeesInvoiceOperation::new(Arc::clone(&store), engine, admin_for(&store), &config())
        .execute(&input())
        .await
        .expect_err("stamp is refused");

    let OperationError::SagaFailed { step, .. } = &err else {
        panic!("expected a rolled back saga, got {err:?}");
    };
    assert_eq!(step, "stamp_invoice_created");
    assert_eq!(store.deleted_tables(), vec!["Payments".to_string()]);
    assert_eq!(inner.count("Payments"), 0);

    let failures = inner.records("Admin Notifications");
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].text("Title"),
        Some("🚨 CRITICAL ERROR: Additional Fees Invoice Failed")
    );
    assert_eq!(failures[0].select("Priority"), Some("Urgent"));
    let details = failures[0].text("Details").expect("details");
    assert!(details.contains("stamp_invoice_created"));
}

#[tokio::test(start_paused = true)]
async fn unreachable_engine_leaves_no_payment() {
    let store = Arc::new(MemoryRecordStore::new().with_record(
        "Tutoring Packages",
        PACKAGE_ID,
        completed_package(),
    ));
    let engine = Arc::new(
        EngineNotifier::new(Arc::clone(&store))
            .attaching_invoice(INVOICE_URL)
            .failing_times(3),
    );

    let err = FeesInvoiceOperation::new(
        Arc::clone(&store),
        Arc::clone(&engine),
        admin_for(&store),
        &config(),
    )
    .execute(&input())
    .await
    .expect_err("engine never answers");

    assert!(err.is_rolled_back());
    assert_eq!(engine.calls(), 3);
    assert_eq!(store.count("Payments"), 0);
    let package = find(store.records("Tutoring Packages"), PACKAGE_ID);
    assert!(package.get("Additional Fees Invoice Created At").is_none());
}
