//! Integration tests for the admin back office.
//!
//! These tests require a running server plus an admin account
//! (`real-taste-cli admin create ...`) whose credentials are set in
//! `INTEGRATION_ADMIN_EMAIL` and `INTEGRATION_ADMIN_PASSWORD`. Without
//! them each test returns early.
//!
//! Run with: cargo test -p real-taste-integration-tests -- --ignored

use real_taste_integration_tests::{client, get_json, login_admin, register_customer, url};
use reqwest::{Client, StatusCode, multipart};
use serde_json::{Value, json};

async fn admin_client() -> Option<Client> {
    let client = client();
    login_admin(&client).await.then_some(client)
}

async fn create_category(client: &Client, name: &str, parent: Option<&Value>) -> Value {
    let resp = client
        .post(url("/api/categories"))
        .json(&json!({"name": name, "parentId": parent}))
        .send()
        .await
        .expect("create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("body");
    body["data"].clone()
}

async fn delete(client: &Client, path: &str) -> (StatusCode, Value) {
    let resp = client.delete(url(path)).send().await.expect("delete");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_customer_cannot_reach_admin_routes() {
    let client = client();
    register_customer(&client).await;
    let (status, body) = get_json(&client, "/api/orders/all").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized as an admin");
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_category_hierarchy_lifecycle() {
    let Some(client) = admin_client().await else {
        return;
    };
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    let parent = create_category(&client, &format!("Desserts {suffix}"), None).await;
    assert_eq!(parent["level"], 1);
    let child = create_category(&client, &format!("Kulfi {suffix}"), Some(&parent["id"])).await;
    assert_eq!(child["level"], 2);
    assert_eq!(child["parentId"], parent["id"]);
    assert_eq!(child["path"][0], parent["slug"]);

    let (status, subs) = get_json(
        &client,
        &format!("/api/categories/{}/subcategories", parent["id"]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subs["count"], 1);

    let (status, body) = delete(&client, &format!("/api/categories/{}", parent["id"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete category with subcategories");

    let (status, _) = delete(&client, &format!("/api/categories/{}", child["id"])).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete(&client, &format!("/api/categories/{}", parent["id"])).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_product_admin_lifecycle() {
    let Some(client) = admin_client().await else {
        return;
    };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let category = create_category(&client, &format!("Specials {suffix}"), None).await;

    let resp = client
        .post(url("/api/products"))
        .json(&json!({
            "name": format!("Rose Falooda {suffix}"),
            "description": "Chilled rose milk with vermicelli",
            "price": "120.00",
            "categoryId": category["id"],
            "stock": 5,
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.expect("body");
    let id = product["data"]["id"].clone();

    let resp = client
        .put(url(&format!("/api/products/{id}/stock")))
        .json(&json!({"stock": -1}))
        .send()
        .await
        .expect("stock");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .put(url(&format!("/api/products/{id}/availability")))
        .send()
        .await
        .expect("toggle");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("body");
    assert_eq!(body["data"]["isAvailable"], false);
    assert_eq!(body["message"], "Product is now unavailable");

    let (status, _) = delete(&client, &format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete(&client, &format!("/api/categories/{}", category["id"])).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_order_stats_shape() {
    let Some(client) = admin_client().await else {
        return;
    };
    let (status, body) = get_json(&client, "/api/orders/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["totalOrders"].is_number());
    assert!(body["data"]["dailyOrders"].is_array());
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_bulk_import_reports_row_errors() {
    let Some(client) = admin_client().await else {
        return;
    };
    let file = json!([
        {"name": "Orphan Lassi", "description": "No category given", "price": "60.00"},
    ]);
    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(file.to_string().into_bytes()).file_name("products.json"),
    );
    let resp = client
        .post(url("/api/bulk/products"))
        .multipart(form)
        .send()
        .await
        .expect("import");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("body");
    assert_eq!(body["imported"], 0);
    assert_eq!(body["errors"][0], "Product 1: Category is required");
}

#[tokio::test]
#[ignore = "Requires running server and admin credentials"]
async fn test_bulk_import_rejects_non_array() {
    let Some(client) = admin_client().await else {
        return;
    };
    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(br#"{"name": "not a list"}"#.to_vec()).file_name("c.json"),
    );
    let resp = client
        .post(url("/api/bulk/categories"))
        .multipart(form)
        .send()
        .await
        .expect("import");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("body");
    assert_eq!(body["message"], "JSON file must contain an array of categories");
}
