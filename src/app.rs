use std::net::SocketAddr;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{analyzer, articles, auth, blood_sugar, chat, foods, health, meal_plans, profiles, scans};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(health::router())
                .merge(auth::router())
                .merge(profiles::router())
                .merge(foods::router())
                .merge(articles::router())
                .merge(scans::router())
                .merge(analyzer::router())
                .merge(chat::router())
                .merge(meal_plans::router())
                .merge(blood_sugar::router()),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else if status.is_client_error() {
                            tracing::warn!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::JwtKeys;

    async fn call(req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let app = build_app(AppState::fake());
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn bearer() -> String {
        let state = AppState::fake();
        let token = JwtKeys::from_config(&state.config.jwt)
            .sign_access(Uuid::new_v4())
            .unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (status, body) = call(get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn food_search_and_lookup() {
        let (status, body) = call(get("/api/v1/foods?query=rice&category=dish")).await;
        assert_eq!(status, StatusCode::OK);
        let hits: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert!(hits.iter().any(|h| h["name"] == "jollof rice"));
        assert!(hits.iter().all(|h| h["category"] == "dish"));

        let (status, body) = call(get("/api/v1/foods/Jollof%20Rice")).await;
        assert_eq!(status, StatusCode::OK);
        let food: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(food["name"], "jollof rice");
        assert_eq!(food["gi_category"], "high");

        let (status, _) = call(get("/api/v1/foods/xylophone")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(get("/api/v1/foods?category=spaceship")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn articles_list_filter_and_detail() {
        let (status, body) = call(get("/api/v1/articles")).await;
        assert_eq!(status, StatusCode::OK);
        let all: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(all.len(), 30);
        assert_eq!(all[0]["id"], 1);
        assert!(all[0].get("content").is_none());

        let (status, body) = call(get("/api/v1/articles?category=low-carb")).await;
        assert_eq!(status, StatusCode::OK);
        let low_carb: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(low_carb.len(), 6);
        assert!(low_carb.iter().all(|a| a["category"] == "low-carb"));

        let (status, body) = call(get("/api/v1/articles/1")).await;
        assert_eq!(status, StatusCode::OK);
        let article: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            article["title"],
            "Understanding Glycemic Index for Better Blood Sugar Control"
        );
        assert!(article["content"].as_str().unwrap().len() > 200);
    }

    #[tokio::test]
    async fn articles_reject_unknown_ids_and_categories() {
        let (status, body) = call(get("/api/v1/articles/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(String::from_utf8(body).unwrap(), "Article not found: 999");

        let (status, _) = call(get("/api/v1/articles?category=keto")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(get("/api/v1/articles/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        for uri in ["/api/v1/profile", "/api/v1/food-logs", "/api/v1/blood-sugar", "/api/v1/meal-plans"] {
            let (status, _) = call(get(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn analyzer_rejects_bad_base64_and_maps_model_failure() {
        let post = |body: Value| {
            Request::builder()
                .method("POST")
                .uri("/api/v1/analyzer/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let (status, _) = call(post(json!({ "image_base64": "***" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // the fake vision model answers "none", which is not an analysis
        let (status, body) = call(post(json!({ "image_base64": "YWJj" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(String::from_utf8(body).unwrap(), "Failed to analyze food image");
    }

    #[tokio::test]
    async fn scan_requires_a_file_field() {
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/scan-food")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(header::AUTHORIZATION, bearer())
            .body(Body::from(body))
            .unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "file is required");
    }

    fn scan_upload(file_len: usize) -> Request<Body> {
        let boundary = "X-BOUNDARY";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"meal.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .into_bytes();
        body.extend(std::iter::repeat(0xFFu8).take(file_len));
        body.extend(format!("\r\n--{boundary}--\r\n").into_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/v1/scan-food")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(header::AUTHORIZATION, bearer())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn scan_body_limit_leaves_room_for_multipart_framing() {
        use crate::scans::handlers::{MAX_UPLOAD_BYTES, MULTIPART_OVERHEAD_BYTES};

        // a full-size file plus its part headers must fit under the route limit
        let framed = scan_upload(MAX_UPLOAD_BYTES);
        let framing = axum::body::to_bytes(framed.into_body(), usize::MAX)
            .await
            .unwrap()
            .len()
            - MAX_UPLOAD_BYTES;
        assert!(framing < MULTIPART_OVERHEAD_BYTES);

        let (status, _) = call(scan_upload(MAX_UPLOAD_BYTES + 1)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
