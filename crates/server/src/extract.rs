//! Request extractors whose rejections render as [`AppError`].
//!
//! Drop-in replacements for axum's `Json`, `Path` and `Query` so malformed
//! bodies, path segments and query strings get the same
//! `{"success": false, "message"}` body as every other error.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// JSON body extractor and response.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameter extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::{get, post};
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct EmailBody {
        email: String,
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: u32,
    }

    async fn echo_email(Json(body): Json<EmailBody>) -> Json<String> {
        Json(body.email)
    }

    async fn by_id(Path(id): Path<i32>) -> String {
        id.to_string()
    }

    async fn paged(Query(paging): Query<Paging>) -> String {
        paging.page.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/otp/send", post(echo_email))
            .route("/products/{id}", get(by_id))
            .route("/products", get(paged))
    }

    async fn send(req: Request<Body>) -> (StatusCode, String, serde_json::Value) {
        let response = app().oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, content_type, body)
    }

    fn post_json(body: &'static str) -> Request<Body> {
        Request::post("/otp/send")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_wrong_json_type_is_enveloped() {
        let (status, content_type, body) = send(post_json(r#"{"email":5}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(content_type, "application/json");
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_enveloped() {
        let (status, content_type, body) = send(post_json("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_enveloped() {
        let req = Request::post("/otp/send")
            .body(Body::from(r#"{"email":"asha@example.com"}"#))
            .unwrap();
        let (status, _, body) = send(req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_valid_json_passes_through() {
        let (status, _, body) = send(post_json(r#"{"email":"asha@example.com"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "asha@example.com");
    }

    #[tokio::test]
    async fn test_bad_path_parameter_is_enveloped() {
        let req = Request::get("/products/abc").body(Body::empty()).unwrap();
        let (status, content_type, body) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_bad_query_is_enveloped() {
        let req = Request::get("/products?page=first").body(Body::empty()).unwrap();
        let (status, _, body) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
