//! Integration tests for the public catalog, settings and contact endpoints.
//!
//! These tests require:
//! - A migrated and seeded database (`real-taste-cli migrate && real-taste-cli seed`)
//! - The server running (`cargo run -p real-taste-server`)
//!
//! Run with: cargo test -p real-taste-integration-tests -- --ignored

use real_taste_integration_tests::{client, get_json, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Nodes in a category forest, children included.
fn count_nodes(nodes: &Value) -> u64 {
    nodes.as_array().map_or(0, |nodes| {
        nodes.iter().map(|n| 1 + count_nodes(&n["children"])).sum()
    })
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_endpoints() {
    let client = client();
    let resp = client.get(url("/health")).send().await.expect("health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = client.get(url("/health/ready")).send().await.expect("ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_product_listing_is_paginated() {
    let (status, body) = get_json(&client(), "/api/products?page=1&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"].as_array().expect("data array").len() <= 2);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 2);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_search_requires_query() {
    let (status, body) = get_json(&client(), "/api/products/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Please provide a search query");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_unknown_product_is_404() {
    let (status, body) = get_json(&client(), "/api/products/999999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_category_tree_nests_children() {
    let client = client();
    let (status, flat) = get_json(&client, "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    let (status, tree) = get_json(&client, "/api/categories/tree").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(count_nodes(&tree["data"]), flat["count"].as_u64().unwrap_or(0));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_settings_are_public() {
    let (status, body) = get_json(&client(), "/api/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["shopName"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_contact_form_validation() {
    let resp = client()
        .post(url("/api/contact"))
        .json(&json!({"name": "Asha", "email": "not-an-email", "subject": "Hi", "message": "Hello"}))
        .send()
        .await
        .expect("contact");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_contact_form_accepts_message() {
    let resp = client()
        .post(url("/api/contact"))
        .json(&json!({
            "name": "Asha",
            "email": "asha@example.com",
            "subject": "Catering",
            "message": "Do you take orders for 30 people?",
        }))
        .send()
        .await
        .expect("contact");
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_routes_reject_anonymous() {
    let (status, body) = get_json(&client(), "/api/orders/all").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, please log in");
}
