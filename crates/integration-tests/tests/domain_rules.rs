//! Catalog, checkout and import rules exercised through the server's
//! public library API. No database or running server is needed.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use real_taste_core::{CategoryId, Email, OrderStatus, Price, ProductId, Slug};
use real_taste_server::error::AppError;
use real_taste_server::models::category::placement;
use real_taste_server::models::{Cart, CartLine, Category, CategoryInput, build_category_tree};
use real_taste_server::services::import::parse_array;
use real_taste_server::services::{ImportKind, OrderError, OtpError, OtpStore};
use rust_decimal::Decimal;

fn rupees(paise: i64) -> Price {
    Price::new(Decimal::new(paise, 2)).unwrap()
}

fn category(id: i32, name: &str, parent: Option<&Category>) -> Category {
    let slug = Slug::from_name(name).unwrap();
    let (level, path) = placement(parent, &slug).unwrap();
    Category {
        id: CategoryId::new(id),
        name: name.to_owned(),
        slug,
        description: String::new(),
        image: None,
        is_active: true,
        parent_id: parent.map(|p| p.id),
        level,
        path,
        created_by: None,
        updated_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_menu_hierarchy_builds_nested_tree() {
    let drinks = category(1, "Drinks", None);
    let hot = category(2, "Hot Drinks", Some(&drinks));
    let cold = category(3, "Cold Drinks", Some(&drinks));
    let chai = category(4, "Chai", Some(&hot));
    let snacks = category(5, "Snacks", None);

    assert_eq!(chai.level, 3);
    assert_eq!(chai.path, ["drinks", "hot-drinks", "chai"]);

    let tree = build_category_tree(&[chai, snacks, cold, hot, drinks]);
    let roots: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(roots, ["Drinks", "Snacks"]);

    let drinks = &tree[0];
    let children: Vec<&str> = drinks.children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(children, ["Cold Drinks", "Hot Drinks"]);
    assert_eq!(drinks.children[1].children[0].slug, "chai");
}

#[test]
fn test_nesting_stops_at_max_depth() {
    let mut parent = category(1, "Level 1", None);
    for id in 2..=5 {
        parent = category(id, &format!("Level {id}"), Some(&parent));
    }
    assert_eq!(parent.level, 5);

    let slug = Slug::from_name("Level 6").unwrap();
    assert!(placement(Some(&parent), &slug).is_err());
}

#[test]
fn test_category_input_derives_slug() {
    let input = CategoryInput {
        name: "  South Indian Meals ".to_owned(),
        description: String::new(),
        image: Some("   ".to_owned()),
        parent_id: None,
        is_active: true,
    };
    let (input, slug) = input.validate().unwrap();
    assert_eq!(input.name, "South Indian Meals");
    assert_eq!(input.image, None);
    assert_eq!(slug.as_str(), "south-indian-meals");
}

#[test]
fn test_cart_totals() {
    let lines = vec![
        CartLine::new(ProductId::new(1), "Masala Chai".to_owned(), rupees(4_000), 2).unwrap(),
        CartLine::new(ProductId::new(2), "Samosa".to_owned(), rupees(3_000), 3).unwrap(),
    ];
    let cart = Cart::from_lines(lines).unwrap();
    assert_eq!(cart.total_items, 5);
    assert_eq!(cart.total_amount, rupees(17_000));
    assert!(Cart::from_lines(Vec::new()).unwrap().is_empty());
}

#[test]
fn test_order_lifecycle_transitions() {
    use OrderStatus::{Cancelled, Delivered, Pending, Preparing, Ready};

    assert!(Pending.can_transition_to(Preparing));
    assert!(Pending.can_transition_to(Ready));
    assert!(Preparing.can_transition_to(Ready));
    assert!(Ready.can_transition_to(Delivered));
    assert!(Ready.can_transition_to(Cancelled));
    assert!(Preparing.can_transition_to(Preparing));

    assert!(!Preparing.can_transition_to(Pending));
    assert!(!Pending.can_transition_to(Delivered));
    for next in OrderStatus::ALL {
        if next != Delivered {
            assert!(!Delivered.can_transition_to(next));
        }
        if next != Cancelled {
            assert!(!Cancelled.can_transition_to(next));
        }
    }
}

#[tokio::test]
async fn test_otp_code_is_single_use() {
    let store = OtpStore::new(Duration::from_secs(600));
    let email = Email::normalized("Asha@Example.com").unwrap();
    let code = store.issue(&email).await;

    assert_eq!(store.verify(&email, "000000x").await, Err(OtpError::Invalid));
    assert_eq!(store.verify(&email, &code).await, Ok(()));
    assert_eq!(store.verify(&email, &code).await, Err(OtpError::NotFound));
}

#[tokio::test]
async fn test_otp_reissue_replaces_previous_code() {
    let store = OtpStore::new(Duration::from_secs(600));
    let email = Email::normalized("ravi@example.com").unwrap();
    let first = store.issue(&email).await;
    let second = store.issue(&email).await;

    if first != second {
        assert_eq!(store.verify(&email, &first).await, Err(OtpError::Invalid));
    }
    assert_eq!(store.verify(&email, &second).await, Ok(()));
}

#[test]
fn test_import_file_must_be_array() {
    let items = parse_array(br#"[{"name": "Chai"}, {"name": "Coffee"}]"#, ImportKind::Products)
        .unwrap();
    assert_eq!(items.len(), 2);

    let err = AppError::from(parse_array(br#"{"name": "Chai"}"#, ImportKind::Categories).unwrap_err());
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        err.client_message(),
        "JSON file must contain an array of categories"
    );

    let err = AppError::from(parse_array(b"[{", ImportKind::Products).unwrap_err());
    assert_eq!(err.client_message(), "Invalid JSON format");
}

#[test]
fn test_checkout_errors_map_to_client_messages() {
    let cases = [
        (OrderError::ShopClosed, StatusCode::SERVICE_UNAVAILABLE, "Shop is currently closed"),
        (
            OrderError::VerificationRequired,
            StatusCode::FORBIDDEN,
            "Email verification required",
        ),
        (OrderError::ProductNotFound, StatusCode::NOT_FOUND, "Product not found"),
        (
            OrderError::BelowMinimum(rupees(20_000)),
            StatusCode::BAD_REQUEST,
            "Minimum order amount is ₹200.00",
        ),
    ];
    for (err, status, message) in cases {
        let err = AppError::from(err);
        assert_eq!(err.status(), status);
        assert_eq!(err.client_message(), message);
    }
}
