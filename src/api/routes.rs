//! API routes

use crate::api::handlers::{
    create_book, create_member, delete_member, get_book, get_member, import_books, issue_book,
    list_books, list_member_transactions, list_members, list_transactions, return_book,
    search_books, search_members, update_book, AppState,
};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        // Catalog endpoints
        .route("/api/books", get(list_books).post(create_book))
        .route("/api/books/search", get(search_books))
        .route("/api/books/:id", get(get_book).put(update_book))
        // Member endpoints
        .route("/api/members", get(list_members).post(create_member))
        .route("/api/members/search", get(search_members))
        .route("/api/members/:id", get(get_member).delete(delete_member))
        // Lending endpoints
        .route("/api/transactions", get(list_transactions))
        .route("/api/transactions/issue", post(issue_book))
        .route("/api/transactions/return/:id", put(return_book))
        .route(
            "/api/transactions/member/:memberId",
            get(list_member_transactions),
        )
        // Import endpoint
        .route("/api/import", post(import_books))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::import::{FrappeCatalog, ImportService};
    use crate::core::lending::LendingService;
    use crate::db::manager::DatabaseManager;
    use crate::db::repository::{BookRepository, MemberRepository, TransactionRepository};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn test_app() -> Router {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let book_repo = Arc::new(BookRepository::new(db.clone()));
        let member_repo = Arc::new(MemberRepository::new(db.clone()));
        let ledger = Arc::new(TransactionRepository::new(db.clone()));
        let lending_service = Arc::new(LendingService::new(db.clone(), ledger));
        // Never contacted in these tests
        let catalog = Arc::new(
            FrappeCatalog::new("http://127.0.0.1:9/unreachable", Duration::from_secs(1)).unwrap(),
        );
        let import_service = Arc::new(ImportService::new(catalog, book_repo.clone()));

        build_api_routes(AppState {
            book_repo,
            member_repo,
            lending_service,
            import_service,
        })
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_book_requires_title_and_authors() {
        let app = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/books",
                serde_json::json!({"title": "No Authors"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "ValidationError");
        assert!(body["trace_id"].is_string());
    }

    #[tokio::test]
    async fn test_full_lending_flow_over_http() {
        let app = test_app();

        // Create a book; authors as a sequence, stock as a numeric string
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/books",
                serde_json::json!({
                    "title": "Good Omens",
                    "authors": ["Terry Pratchett", "Neil Gaiman"],
                    "stock": "2"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["book"]["authors"], "Terry Pratchett/Neil Gaiman");
        assert_eq!(body["book"]["stock"], 2);
        assert_eq!(body["book"]["rentPerDay"], 10.0);
        let book_id = body["book"]["id"].as_str().unwrap().to_string();

        // Register a member; email is case-normalized
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/members",
                serde_json::json!({"name": "Ada", "email": "ADA@Example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["member"]["email"], "ada@example.com");
        let member_id = body["member"]["id"].as_str().unwrap().to_string();

        // Duplicate email is a conflict
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/members",
                serde_json::json!({"name": "Ada Again", "email": "ada@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Issue the book
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/transactions/issue",
                serde_json::json!({"bookId": book_id, "memberId": member_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["transaction"]["status"], "issued");
        let transaction_id = body["transaction"]["id"].as_str().unwrap().to_string();
        let issue_date = body["transaction"]["issueDate"].as_str().unwrap().to_string();

        // Stock went down
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/books/{}", book_id)))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["book"]["stock"], 1);

        // Return at the issue instant: zero days, zero fee
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/transactions/return/{}", transaction_id),
                serde_json::json!({"returnDate": issue_date}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["transaction"]["status"], "returned");
        assert_eq!(body["transaction"]["rentFee"], 0.0);
        assert_eq!(body["memberDebt"], 0.0);

        // Stock restored
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/books/{}", book_id)))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["book"]["stock"], 2);

        // A second return is rejected
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/transactions/return/{}", transaction_id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The ledger lists the loan with denormalized book and member fields
        let response = app
            .clone()
            .oneshot(get_request("/api/transactions"))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["transactions"][0]["book"]["title"], "Good Omens");
        assert_eq!(body["transactions"][0]["member"]["email"], "ada@example.com");

        // Issuing a missing book is a 404
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/transactions/issue",
                serde_json::json!({"bookId": "ghost", "memberId": member_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(get_request("/api/books/search"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get_request("/api/members/search?q="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_pagination_envelope() {
        let app = test_app();

        for i in 0..3 {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/books",
                    serde_json::json!({"title": format!("Book {}", i), "authors": "Someone"}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(get_request("/api/books?page=2&limit=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 2);
        assert_eq!(body["total"], 3);
        assert_eq!(body["pages"], 2);
        assert_eq!(body["books"].as_array().unwrap().len(), 1);
    }
}
