//! API integration tests
//!
//! Run against a live server (`cargo run`) whose database is seeded with a
//! librarian (member id 1), and two members (ids 2 and 3):
//! cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

const LIBRARIAN: (&str, &str) = ("1", "librarian");
const MEMBER: (&str, &str) = ("2", "member");
const MEMBER2: (&str, &str) = ("3", "member");

fn with_identity(req: reqwest::RequestBuilder, identity: (&str, &str)) -> reqwest::RequestBuilder {
    req.header("X-Member-Id", identity.0)
        .header("X-Member-Role", identity.1)
}

/// Create a book as librarian and return its id
async fn create_book(client: &Client, copies_total: i64) -> i64 {
    let response = with_identity(client.post(format!("{}/books", BASE_URL)), LIBRARIAN)
        .json(&json!({
            "title": "Test Book",
            "author": "Test Author",
            "category": "Testing",
            "copies_total": copies_total
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse create response");
    body["id"].as_i64().expect("No book ID")
}

async fn get_book(client: &Client, id: i64) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse response")
}

async fn delete_book(client: &Client, id: i64) {
    let _ = with_identity(client.delete(format!("{}/books/{}", BASE_URL, id)), LIBRARIAN)
        .send()
        .await;
}

async fn return_borrowing(client: &Client, identity: (&str, &str), borrowing_id: i64) -> reqwest::Response {
    with_identity(
        client.post(format!("{}/return/{}", BASE_URL, borrowing_id)),
        identity,
    )
    .send()
    .await
    .expect("Failed to send return request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_paginated() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?page=1&limit=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert_eq!(body["page"], 1);
    assert!(body["total_pages"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_librarian() {
    let client = Client::new();

    let response = with_identity(client.post(format!("{}/books", BASE_URL)), MEMBER)
        .json(&json!({
            "title": "Forbidden",
            "author": "Nobody",
            "category": "Testing",
            "copies_total": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_create_book_rejects_bad_copy_counts() {
    let client = Client::new();

    let response = with_identity(client.post(format!("{}/books", BASE_URL)), LIBRARIAN)
        .json(&json!({
            "title": "Bad Counts",
            "author": "Test Author",
            "category": "Testing",
            "copies_total": 2,
            "copies_available": 5
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_borrow_requires_identity() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;

    let response = client
        .post(format!("{}/borrow/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    delete_book(&client, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_round_trip() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;

    // Borrow: available drops to 0
    let response = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER)
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    let borrowing: Value = response.json().await.expect("Failed to parse response");
    let borrowing_id = borrowing["id"].as_i64().expect("No borrowing ID");
    assert_eq!(borrowing["book"]["id"].as_i64(), Some(book_id));
    assert!(borrowing["return_date"].is_null());
    assert_eq!(borrowing["fine"], 0);

    assert_eq!(get_book(&client, book_id).await["copies_available"], 0);

    // Same member borrowing the same book again is a duplicate loan
    let response = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER)
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 422);

    // Another member hits out-of-stock
    let response = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER2)
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 422);

    // Deleting the book while the loan is open conflicts
    let response = with_identity(client.delete(format!("{}/books/{}", BASE_URL, book_id)), LIBRARIAN)
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 409);

    // Return before the due date: no fine, copy back on the shelf
    let response = return_borrowing(&client, MEMBER, borrowing_id).await;
    assert!(response.status().is_success());

    let returned: Value = response.json().await.expect("Failed to parse response");
    assert!(!returned["return_date"].is_null());
    assert_eq!(returned["fine"], 0);

    assert_eq!(get_book(&client, book_id).await["copies_available"], 1);

    // Second return fails
    let response = return_borrowing(&client, MEMBER, borrowing_id).await;
    assert_eq!(response.status(), 422);

    delete_book(&client, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_return_anothers_borrowing() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;

    let response = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER)
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.expect("Failed to parse response");
    let borrowing_id = borrowing["id"].as_i64().expect("No borrowing ID");

    let response = return_borrowing(&client, MEMBER2, borrowing_id).await;
    assert_eq!(response.status(), 403);

    // Cleanup
    let response = return_borrowing(&client, MEMBER, borrowing_id).await;
    assert!(response.status().is_success());
    delete_book(&client, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrowing_limit() {
    let client = Client::new();

    let mut book_ids = Vec::new();
    for _ in 0..4 {
        book_ids.push(create_book(&client, 1).await);
    }

    let mut borrowing_ids = Vec::new();
    for book_id in &book_ids[..3] {
        let response = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER)
            .send()
            .await
            .expect("Failed to send borrow request");
        assert_eq!(response.status(), 201);
        let borrowing: Value = response.json().await.expect("Failed to parse response");
        borrowing_ids.push(borrowing["id"].as_i64().expect("No borrowing ID"));
    }

    // Fourth open borrowing exceeds the limit
    let response = with_identity(
        client.post(format!("{}/borrow/{}", BASE_URL, book_ids[3])),
        MEMBER,
    )
    .send()
    .await
    .expect("Failed to send borrow request");
    assert_eq!(response.status(), 422);

    // Cleanup
    for borrowing_id in borrowing_ids {
        let response = return_borrowing(&client, MEMBER, borrowing_id).await;
        assert!(response.status().is_success());
    }
    for book_id in book_ids {
        delete_book(&client, book_id).await;
    }
}

#[tokio::test]
#[ignore]
async fn test_member_listing_is_scoped_to_caller() {
    let client = Client::new();

    let response = with_identity(
        client.get(format!("{}/borrowings?status=active&member_id=1", BASE_URL)),
        MEMBER,
    )
    .send()
    .await
    .expect("Failed to send request");

    assert!(response.status().is_success());

    // The member_id filter is overridden at the boundary: every row belongs
    // to the caller regardless of what was asked for
    let body: Value = response.json().await.expect("Failed to parse response");
    for item in body["items"].as_array().expect("items missing") {
        assert_eq!(item["member_id"], 2);
    }
}

#[tokio::test]
#[ignore]
async fn test_history_includes_returned_loans() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;

    let response = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER)
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);
    let borrowing: Value = response.json().await.expect("Failed to parse response");
    let borrowing_id = borrowing["id"].as_i64().expect("No borrowing ID");

    let response = return_borrowing(&client, MEMBER, borrowing_id).await;
    assert!(response.status().is_success());

    let response = with_identity(
        client.get(format!("{}/history?sort=borrow_date&order=desc", BASE_URL)),
        MEMBER,
    )
    .send()
    .await
    .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let found = body["items"]
        .as_array()
        .expect("items missing")
        .iter()
        .any(|item| item["id"].as_i64() == Some(borrowing_id));
    assert!(found, "returned borrowing missing from history");

    delete_book(&client, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;

    // Two members race for the single copy: exactly one wins
    let first = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER).send();
    let second = with_identity(client.post(format!("{}/borrow/{}", BASE_URL, book_id)), MEMBER2).send();
    let (first, second) = tokio::join!(first, second);

    let first = first.expect("Failed to send borrow request");
    let second = second.expect("Failed to send borrow request");

    let statuses = [first.status().as_u16(), second.status().as_u16()];
    assert_eq!(
        statuses.iter().filter(|s| **s == 201).count(),
        1,
        "exactly one borrow must succeed, got {:?}",
        statuses
    );
    assert_eq!(statuses.iter().filter(|s| **s == 422).count(), 1);

    assert_eq!(get_book(&client, book_id).await["copies_available"], 0);

    // Cleanup: return whichever borrowing won
    for (response, identity) in [(first, MEMBER), (second, MEMBER2)] {
        if response.status() == 201 {
            let borrowing: Value = response.json().await.expect("Failed to parse response");
            let borrowing_id = borrowing["id"].as_i64().expect("No borrowing ID");
            let response = return_borrowing(&client, identity, borrowing_id).await;
            assert!(response.status().is_success());
        }
    }
    delete_book(&client, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_stats_requires_librarian() {
    let client = Client::new();

    let response = with_identity(client.get(format!("{}/stats", BASE_URL)), MEMBER)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = with_identity(client.get(format!("{}/stats", BASE_URL)), LIBRARIAN)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["books_total"].is_number());
    assert!(body["borrowings_active"].is_number());
    assert!(body["fines_collected"].is_number());
}
