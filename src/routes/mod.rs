//! Router assembly: HTTP endpoints, CORS and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::error::panic_response;
use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - every generation endpoint at the root path
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
/// - handler panics answered as 500 `{"detail": ...}`
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::http_health))
        .route("/detect-domain-from-file", post(http::http_detect_domain))
        .route("/course-recommendation", post(http::http_course_recommendation))
        .route("/doubt-chatbot", post(http::http_doubt_chatbot))
        .route("/generate-course", post(http::http_generate_course))
        .route("/predict-level", post(http::http_predict_level))
        .route("/generate-question", post(http::http_generate_question))
        // State + panic guard + CORS + HTTP tracing
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{docx_bytes, outline_json, quoted_title, state_with, ScriptedModel, StaticDocuments};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn app(model: Arc<ScriptedModel>, docs: StaticDocuments) -> Router {
        build_router(Arc::new(state_with(model, docs)))
    }

    #[tokio::test]
    async fn predict_level_returns_a_bare_string() {
        let app = app(ScriptedModel::always("{}"), StaticDocuments::failing());
        let (status, body) = post_json(app, "/predict-level", json!({"score": 7, "time_taken": 81})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Beginner"));
    }

    #[tokio::test]
    async fn out_of_range_score_is_unprocessable() {
        let app = app(ScriptedModel::always("{}"), StaticDocuments::failing());
        let (status, body) = post_json(app, "/predict-level", json!({"score": 10, "time_taken": 5})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("score"));
    }

    #[tokio::test]
    async fn bad_course_requests_never_reach_the_model() {
        let model = ScriptedModel::always("{}");
        let (status, _) = post_json(
            app(model.clone(), StaticDocuments::failing()),
            "/generate-course",
            json!({"subject": "Math", "difficulty": "easy", "focus_area": "Algebra", "units": 11}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = post_json(
            app(model.clone(), StaticDocuments::failing()),
            "/generate-question",
            json!({"subject": "Math", "difficulty": "impossible", "focus_area": "Algebra", "units": 2}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_upload_is_a_client_error() {
        let app = app(ScriptedModel::always("{}"), StaticDocuments::new(b"hello".to_vec()));
        let (status, body) = post_json(app, "/detect-domain-from-file", json!({"file_url": "https://x.example/readme.txt"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Unsupported file type: txt");
    }

    #[tokio::test]
    async fn detect_domain_happy_path() {
        let model = ScriptedModel::always(r#"{"domain": "Mathematics", "subdomain": "Algebra", "explanation": "Equations."}"#);
        let app = app(model, StaticDocuments::new(docx_bytes(&["Solve x + 2 = 4"])));
        let (status, body) = post_json(app, "/detect-domain-from-file", json!({"file_url": "https://x.example/hw.docx"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"filename": "hw.docx", "domain": "Mathematics", "subdomain": "Algebra", "explanation": "Equations."}));
    }

    #[tokio::test]
    async fn recommendation_parse_failure_is_a_server_error() {
        let app = app(ScriptedModel::always("no idea"), StaticDocuments::failing());
        let (status, body) = post_json(app, "/course-recommendation", json!({"student_level": "Beginner", "course": "Go"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().starts_with("Failed to parse recommendations"));
    }

    #[tokio::test]
    async fn doubt_chatbot_wraps_the_answer() {
        let app = app(ScriptedModel::always("Use a HashMap."), StaticDocuments::failing());
        let (status, body) = post_json(app, "/doubt-chatbot", json!({"ques": "How do I count words?"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"answer": "Use a HashMap."}));
    }

    #[tokio::test]
    async fn no_surviving_units_is_a_500_for_both_pipelines() {
        let failing = || {
            ScriptedModel::new(|prompt| {
                if prompt.contains("comprehensive course structure") {
                    Ok(outline_json(&["Only"]))
                } else {
                    Err(crate::error::ModelError::Empty)
                }
            })
        };
        let req = json!({"subject": "Art", "difficulty": "medium", "focus_area": "Color", "units": 1});

        for path in ["/generate-course", "/generate-question"] {
            let (status, body) = post_json(app(failing(), StaticDocuments::failing()), path, req.clone()).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", path);
            assert_eq!(body["detail"], "Failed to generate any unit details");
        }
    }

    #[tokio::test]
    async fn generate_question_returns_units() {
        let model = ScriptedModel::new(|prompt| {
            if prompt.contains("comprehensive course structure") {
                return Ok(outline_json(&["Pigments", "Light"]));
            }
            let title = quoted_title(prompt);
            if prompt.contains("multiple choice questions") {
                Ok(json!({"unitAssessment": [{"topic": title, "questions": []}]}).to_string())
            } else {
                Ok(json!({"unitTitle": title}).to_string())
            }
        });
        let req = json!({"subject": "Art", "difficulty": "medium", "focus_area": "Color", "units": 2});
        let (status, body) = post_json(app(model, StaticDocuments::failing()), "/generate-question", req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["units"][0]["unitTitle"], "Pigments");
        assert_eq!(body["units"][1]["assessment"]["unitAssessment"][0]["topic"], "Light");
    }

    #[tokio::test]
    async fn handler_panic_is_a_500_with_detail() {
        let model = ScriptedModel::new(|_| panic!("model exploded"));
        let (status, body) = post_json(app(model, StaticDocuments::failing()), "/doubt-chatbot", json!({"ques": "Why?"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error: model exploded");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = app(ScriptedModel::always("{}"), StaticDocuments::failing());
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/generate-course")
            .header("origin", "https://somewhere.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
    }
}
