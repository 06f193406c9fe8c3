mod common;

use common::{TestApp, TestOptions, TEST_TENANT_ID};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn created_invoice_body() -> serde_json::Value {
    json!({
        "Invoices": [{
            "InvoiceID": "inv-0001",
            "InvoiceNumber": "INV-0042",
            "Reference": "WEB-1234 [6789]",
            "Status": "AUTHORISED"
        }]
    })
}

#[tokio::test]
async fn create_invoice_end_to_end() {
    let app = TestApp::spawn().await;
    app.mock_refresh_success().await;
    app.mock_connections().await;

    // The submitted document must be the wrapped list in the vendor schema,
    // tenant-scoped, with the explicit line item passed through unchanged.
    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Invoices"))
        .and(header("xero-tenant-id", TEST_TENANT_ID))
        .and(body_partial_json(json!({
            "Invoices": [{
                "Type": "ACCREC",
                "Contact": { "Name": "Test Customer" },
                "Reference": "WEB-1234 [6789]",
                "Status": "AUTHORISED",
                "LineAmountTypes": "Exclusive",
                "LineItems": [{
                    "Description": "Test item",
                    "Quantity": 1.0,
                    "UnitAmount": 10.0
                }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_invoice_body()))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app
        .client
        .post(format!("{}/invoices", app.address))
        .json(&json!({
            "order_number": "6789",
            "order_po": "WEB-1234",
            "pl_order": { "customer_name": "Test Customer" },
            "lineItems": [
                { "description": "Test item", "quantity": 1, "unitAmount": 10.0 }
            ]
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid response body");
    assert_eq!(body["invoice_id"], "inv-0001");
    assert_eq!(body["invoice_number"], "INV-0042");
    assert_eq!(body["reference"], "WEB-1234 [6789]");
    assert_eq!(body["status"], "AUTHORISED");

    // The unconditional refresh persisted the rotated token.
    let persisted = app.persisted_token();
    assert_eq!(persisted["refresh_token"], "fresh-refresh");
    assert_eq!(persisted["id_token"], "fresh-id");
}

#[tokio::test]
async fn derived_lines_carry_account_tax_and_tracking() {
    let app = TestApp::spawn().await;
    app.mock_refresh_success().await;
    app.mock_connections().await;

    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Invoices"))
        .and(body_partial_json(json!({
            "Invoices": [{
                "BrandingThemeID": "theme-ebay",
                "LineItems": [{
                    "Description": "Widget (Qty 2)",
                    "Quantity": 1.0,
                    "UnitAmount": 24.0,
                    "AccountCode": "200",
                    "TaxType": "OUTPUT2",
                    "Tracking": [{ "Name": "Channel", "Option": "eBay" }]
                }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_invoice_body()))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app
        .client
        .post(format!("{}/invoices", app.address))
        .json(&json!({
            "order_number": "6789",
            "template": "ebay",
            "pl_order": {
                "items": {
                    "1": { "title": "Widget", "quantity": 2, "price": "24.0", "vat_rate": "20" }
                }
            }
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn mark_as_paid_records_a_payment_on_the_clearing_account() {
    let app = TestApp::spawn().await;
    app.mock_refresh_success().await;
    app.mock_connections().await;

    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_invoice_body()))
        .mount(&app.api)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api.xro/2.0/Payments"))
        .and(body_partial_json(json!({
            "Payments": [{
                "Invoice": { "InvoiceID": "inv-0001" },
                "Account": { "Code": "092" },
                "Amount": 120.0
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Payments": [] })))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app
        .client
        .post(format!("{}/invoices", app.address))
        .json(&json!({
            "order_number": "6789",
            "mark_as_paid": "yes",
            "total_ex_vat": 100.0,
            "vat": 20.0,
            "pl_order": { "customer_name": "Test Customer" },
            "lineItems": [
                { "description": "Test item", "quantity": 1, "unitAmount": 100.0 }
            ]
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn failed_follow_ups_do_not_fail_invoice_creation() {
    let app = TestApp::spawn().await;
    app.mock_refresh_success().await;
    app.mock_connections().await;

    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_invoice_body()))
        .mount(&app.api)
        .await;

    // Both follow-ups blow up on the vendor side.
    Mock::given(method("PUT"))
        .and(path("/api.xro/2.0/Payments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("payment exploded"))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Invoices/inv-0001/Email"))
        .respond_with(ResponseTemplate::new(500).set_body_string("email exploded"))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app
        .client
        .post(format!("{}/invoices", app.address))
        .json(&json!({
            "order_number": "6789",
            "mark_as_paid": true,
            "email_customer": true,
            "total_ex_vat": 50.0,
            "vat": 10.0,
            "lineItems": [
                { "description": "Test item", "quantity": 1, "unitAmount": 50.0 }
            ]
        }))
        .send()
        .await
        .expect("Request failed");

    // Invoice creation succeeded; the follow-up failures are log lines only.
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn unauthenticated_session_rejects_the_request() {
    let app = TestApp::spawn_with(TestOptions {
        seed_token: false,
        ..TestOptions::default()
    })
    .await;

    let response = app
        .client
        .post(format!("{}/invoices", app.address))
        .json(&json!({ "order_number": "6789" }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.expect("Invalid response body");
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn vendor_rejection_surfaces_as_bad_gateway() {
    let app = TestApp::spawn().await;
    app.mock_refresh_success().await;
    app.mock_connections().await;

    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Validation failure: missing contact"),
        )
        .mount(&app.api)
        .await;

    let response = app
        .client
        .post(format!("{}/invoices", app.address))
        .json(&json!({
            "lineItems": [{ "description": "Test item", "quantity": 1, "unitAmount": 1.0 }]
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 502);
    let body: serde_json::Value = response.json().await.expect("Invalid response body");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("missing contact"));
}
